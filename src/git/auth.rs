//! Credential selection per transport.
//!
//! Supported methods:
//! - http basic auth: locator username + `GIT_HTTP_PASSWORD`
//! - http bearer token: `GIT_HTTP_TOKEN` (rarely what a forge wants)
//! - ssh private key: `GIT_SSH_KEY`, raw or base64-encoded, no passphrase
//! - ssh agent: used when no key is configured
//!
//! Local and native-protocol transports are always anonymous.

use std::collections::HashMap;
use std::fmt;

use base64::Engine as _;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{Result, SourceError};
use crate::locator::Transport;

pub const HTTP_PASSWORD_VAR: &str = "GIT_HTTP_PASSWORD";
pub const HTTP_TOKEN_VAR: &str = "GIT_HTTP_TOKEN";
pub const SSH_KEY_VAR: &str = "GIT_SSH_KEY";

const DEFAULT_SSH_USER: &str = "git";

/// Where secret values come from. Empty values count as absent.
pub trait Secrets: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
///
/// When `NAME` is unset, `NAME_FILE` may point at a file holding the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl Secrets for EnvSecrets {
    fn get(&self, name: &str) -> Option<String> {
        if let Some(value) = std::env::var(name).ok().filter(|v| !v.is_empty()) {
            return Some(value);
        }

        let file_var = format!("{}_FILE", name);
        let file = std::env::var(&file_var).ok().filter(|v| !v.is_empty())?;
        match std::fs::read_to_string(&file) {
            Ok(value) => {
                let value = value.trim_end_matches(['\r', '\n']).to_string();
                (!value.is_empty()).then_some(value)
            }
            Err(e) => {
                tracing::warn!("Ignoring {}: can't read {}: {}", file_var, file, e);
                None
            }
        }
    }
}

impl Secrets for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).filter(|v| !v.is_empty()).cloned()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Anonymous,
    Basic { username: String, password: String },
    Token(String),
    SshKey { username: String, private_key: String },
    SshAgent { username: String },
}

impl Credential {
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Anonymous => "anonymous",
            Credential::Basic { .. } => "basic",
            Credential::Token(_) => "token",
            Credential::SshKey { .. } => "ssh-key",
            Credential::SshAgent { .. } => "ssh-agent",
        }
    }
}

// Secrets never reach logs or error messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Anonymous => f.write_str("Anonymous"),
            Credential::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credential::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Credential::SshKey { username, .. } => f
                .debug_struct("SshKey")
                .field("username", username)
                .field("private_key", &"<redacted>")
                .finish(),
            Credential::SshAgent { username } => f
                .debug_struct("SshAgent")
                .field("username", username)
                .finish(),
        }
    }
}

pub fn select_credential<S: Secrets + ?Sized>(
    transport: Transport,
    locator: &Url,
    secrets: &S,
) -> Result<Credential> {
    let username = percent_decode_str(locator.username())
        .decode_utf8_lossy()
        .into_owned();

    match transport {
        Transport::Http | Transport::Https => {
            if let Some(password) = secrets.get(HTTP_PASSWORD_VAR) {
                Ok(Credential::Basic { username, password })
            } else if let Some(token) = secrets.get(HTTP_TOKEN_VAR) {
                Ok(Credential::Token(token))
            } else {
                Ok(Credential::Anonymous)
            }
        }
        Transport::Ssh => {
            let username = if username.is_empty() {
                DEFAULT_SSH_USER.to_string()
            } else {
                username
            };
            match secrets.get(SSH_KEY_VAR) {
                Some(key) => Ok(Credential::SshKey {
                    username,
                    private_key: decode_private_key(&key)?,
                }),
                None => Ok(Credential::SshAgent { username }),
            }
        }
        Transport::File | Transport::Git => Ok(Credential::Anonymous),
    }
}

/// Accepts a private key as base64 or as-is; the decoded form wins when valid.
fn decode_private_key(raw: &str) -> Result<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .unwrap_or_else(|_| raw.as_bytes().to_vec());

    let key = String::from_utf8(bytes).map_err(|_| SourceError::AuthResolutionFailed {
        transport: "ssh",
        reason: format!("{} is not valid key text", SSH_KEY_VAR),
    })?;

    let trimmed = key.trim_start();
    if !trimmed.starts_with("-----BEGIN ") || !trimmed.contains("PRIVATE KEY-----") {
        return Err(SourceError::AuthResolutionFailed {
            transport: "ssh",
            reason: format!("{} does not hold a PEM or OpenSSH private key", SSH_KEY_VAR),
        });
    }

    if key.ends_with('\n') {
        Ok(key)
    } else {
        Ok(format!("{}\n", key))
    }
}
