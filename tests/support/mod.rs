#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use git2::{Oid, Repository, Signature};
use git_source::git::{Dispatcher, Git2Fetcher};
use git_source::{GitSource, SourceConfig};

pub type LocalSource = GitSource<Git2Fetcher, HashMap<String, String>>;

/// A source that resolves `git+file` locators under `root` and never reads
/// secrets from the environment.
pub fn local_source(root: &Path) -> LocalSource {
    GitSource::new(Dispatcher::new(
        Git2Fetcher,
        HashMap::new(),
        SourceConfig::default().with_root(root),
    ))
}

/// Writes a nested tree from `(path, content)` pairs.
pub fn write_tree(repo: &Repository, files: &[(&str, &str)]) -> Oid {
    let mut builder = repo.treebuilder(None).expect("Failed to create tree builder");
    let mut dirs: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();

    for (path, content) in files {
        match path.split_once('/') {
            Some((dir, rest)) => dirs.entry(dir).or_default().push((rest, *content)),
            None => {
                let blob = repo.blob(content.as_bytes()).expect("Failed to write blob");
                builder
                    .insert(*path, blob, 0o100644)
                    .expect("Failed to insert blob");
            }
        }
    }

    for (dir, children) in dirs {
        let subtree = write_tree(repo, &children);
        builder
            .insert(dir, subtree, 0o040000)
            .expect("Failed to insert tree");
    }

    builder.write().expect("Failed to write tree")
}

/// Commits `files` as the full content of `reference`, on top of its
/// current tip if it has one.
pub fn commit(repo: &Repository, reference: &str, files: &[(&str, &str)]) -> Oid {
    let tree_id = write_tree(repo, files);
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let sig = Signature::now("John Doe", "john@doe.org").expect("Failed to create signature");

    let parent = repo
        .find_reference(reference)
        .ok()
        .and_then(|r| r.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();

    repo.commit(Some(reference), &sig, &sig, "commit", &tree, &parents)
        .expect("Failed to commit")
}

/// Working copy at `<root>/<name>` with its database under `.git`.
pub fn init_working_copy(root: &Path, name: &str) -> Repository {
    Repository::init(root.join(name)).expect("Failed to init repository")
}

/// Bare repository at `<root>/<name>`.
pub fn init_bare(root: &Path, name: &str) -> Repository {
    Repository::init_bare(root.join(name)).expect("Failed to init bare repository")
}

pub const HELLO: &[(&str, &str)] = &[("foo/bar/hi.txt", "hello world")];
