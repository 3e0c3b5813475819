//! Repositories with fixed authors and timestamps for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

use repostats::collector::{CollectedStatistics, Collector, CollectorConfig};
use repostats::git::RepositoryTarget;

pub const DAY: i64 = 86_400;
/// 2020-09-13 12:26:40 UTC
pub const T0: i64 = 1_600_000_000;

/// A work tree named `name` inside its own temporary directory
pub struct FixtureRepo {
    _dir: TempDir,
    path: PathBuf,
    repo: Repository,
}

impl FixtureRepo {
    pub fn new(name: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join(name);
        fs::create_dir_all(&path).expect("Failed to create work tree");
        let repo = Repository::init(&path).expect("Failed to init repository");
        Self {
            _dir: dir,
            path,
            repo,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `files` and commit them as `author` at `stamp`
    pub fn commit(&self, author: &str, email: &str, stamp: i64, files: &[(&str, &str)]) -> Oid {
        let mut index = self.repo.index().expect("Failed to open index");
        for (name, content) in files {
            let file = self.path.join(name);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent).expect("Failed to create directory");
            }
            fs::write(&file, content).expect("Failed to write file");
            index.add_path(Path::new(name)).expect("Failed to stage file");
        }
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let signature = Signature::new(author, email, &Time::new(stamp, 0)).expect("Failed to create signature");
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, &format!("change at {}", stamp), &tree, &parents)
            .expect("Failed to commit")
    }

    /// Commit a flat tree of exactly `files` on top of `parents`, moving `reference`
    ///
    /// Leaves index and work tree alone, so side branches and merges can be
    /// built in any order.
    pub fn commit_tree(
        &self,
        reference: &str,
        author: &str,
        email: &str,
        stamp: i64,
        files: &[(&str, &str)],
        parents: &[Oid],
    ) -> Oid {
        let mut builder = self.repo.treebuilder(None).expect("Failed to create tree builder");
        for (name, content) in files {
            let blob = self.repo.blob(content.as_bytes()).expect("Failed to write blob");
            builder.insert(*name, blob, 0o100644).expect("Failed to insert tree entry");
        }
        let tree_id = builder.write().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let signature = Signature::new(author, email, &Time::new(stamp, 0)).expect("Failed to create signature");
        let parents: Vec<git2::Commit> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).expect("Failed to find parent"))
            .collect();
        let parents: Vec<&git2::Commit> = parents.iter().collect();

        self.repo
            .commit(Some(reference), &signature, &signature, &format!("change at {}", stamp), &tree, &parents)
            .expect("Failed to commit")
    }

    /// Lightweight tag on `target`
    pub fn tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).expect("Failed to find tag target");
        self.repo
            .tag_lightweight(name, &object, false)
            .expect("Failed to create tag");
    }
}

/// Three commits by two authors over four days with two tags
///
/// | commit | author | day | change |
/// |---|---|---|---|
/// | c1 | Alice | 0 | a.rs (3 lines), README (1 line) |
/// | c2 | Bob   | 1 | a.rs down to 2 lines, b.py (1 line); tag v1 |
/// | c3 | Alice | 3 | docs/notes.md (2 lines); tag v2 |
pub fn sample_repository(name: &str) -> FixtureRepo {
    let repo = FixtureRepo::new(name);
    repo.commit(
        "Alice",
        "alice@example.com",
        T0,
        &[("a.rs", "1\n2\n3\n"), ("README", "hello\n")],
    );
    let c2 = repo.commit(
        "Bob",
        "bob@corp.org",
        T0 + DAY,
        &[("a.rs", "1\n2\n"), ("b.py", "x\n")],
    );
    repo.tag("v1", c2);
    let c3 = repo.commit(
        "Alice",
        "alice@example.com",
        T0 + 3 * DAY,
        &[("docs/notes.md", "a\nb\n")],
    );
    repo.tag("v2", c3);
    repo
}

/// A side branch merged back with a merge commit of its own
///
/// | commit | author | day | parents | change |
/// |---|---|---|---|---|
/// | c1 | Alice  | 0 | - | a.txt (2 lines) |
/// | t1 | Bob    | 1 | c1 | t.txt (3 lines), on `topic` |
/// | m1 | Alice  | 2 | c1 | m.txt (1 line) |
/// | mg | Merger | 3 | m1, t1 | union of both sides |
pub fn merge_repository(name: &str) -> FixtureRepo {
    let repo = FixtureRepo::new(name);
    let a = ("a.txt", "1\n2\n");
    let t = ("t.txt", "t1\nt2\nt3\n");
    let m = ("m.txt", "m\n");

    let c1 = repo.commit_tree("HEAD", "Alice", "alice@example.com", T0, &[a], &[]);
    let t1 = repo.commit_tree("refs/heads/topic", "Bob", "bob@corp.org", T0 + DAY, &[a, t], &[c1]);
    let m1 = repo.commit_tree("HEAD", "Alice", "alice@example.com", T0 + 2 * DAY, &[a, m], &[c1]);
    repo.commit_tree(
        "HEAD",
        "Merger",
        "merger@example.com",
        T0 + 3 * DAY,
        &[a, m, t],
        &[m1, t1],
    );
    repo
}

pub fn test_config() -> CollectorConfig {
    CollectorConfig {
        processes: 2,
        ..CollectorConfig::default()
    }
}

/// Resolve `paths` and run a collector over them
pub async fn collect(paths: &[&Path], config: CollectorConfig) -> CollectedStatistics {
    let targets: Vec<RepositoryTarget> = paths
        .iter()
        .map(|path| RepositoryTarget::resolve(path).expect("Failed to resolve repository"))
        .collect();
    let mut collector = Collector::new(config).expect("Invalid collector configuration");
    collector.collect_all(&targets).await.expect("Collection failed");
    collector.finish()
}
