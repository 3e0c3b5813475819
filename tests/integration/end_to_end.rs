//! End-to-End Integration Tests
//!
//! Runs every extraction pass with the real git binary over repositories
//! built with known authors, timestamps and contents.

mod fixtures;

use std::fs;

use tempfile::TempDir;

use repostats::app;
use repostats::cli;
use repostats::config::{ConfigManager, Configuration};
use repostats::stats::{ExtensionStats, StampKey};

use fixtures::{collect, sample_repository, test_config, FixtureRepo, DAY, T0};

#[tokio::test]
async fn test_commit_graph_and_authors() {
    let repo = sample_repository("alpha");
    let collected = collect(&[repo.path()], test_config()).await;
    let stats = &collected.statistics;

    assert_eq!(collected.project_name, "alpha");
    assert_eq!(collected.repositories, vec!["alpha"]);
    assert_eq!(stats.total_commits(), 3);
    assert_eq!(stats.commit_delta_days(), 4);
    assert_eq!(stats.active_days().len(), 3);
    assert_eq!(stats.first_commit_date().unwrap().timestamp(), T0);
    assert_eq!(stats.last_commit_date().unwrap().timestamp(), T0 + 3 * DAY);
    assert_eq!(
        stats.domains_sorted(),
        vec![("example.com", 2), ("corp.org", 1)]
    );
    assert_eq!(stats.activity().hour_of_day.get(&12), 3);
    assert_eq!(stats.commits_by_year().get(&2020), Some(&3));

    let names: Vec<&str> = stats.total_authors().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert_eq!(stats.authors_sorted(None), vec!["Alice", "Bob"]);

    let alice = stats.author("Alice").unwrap();
    assert_eq!(alice.commits, 2);
    assert_eq!(alice.lines_added, 6);
    assert_eq!(alice.lines_removed, 0);
    assert_eq!(alice.first_commit_stamp, Some(T0));
    assert_eq!(alice.last_commit_stamp, Some(T0 + 3 * DAY));
    assert_eq!(alice.active_day_count(), 2);

    let bob = stats.author("Bob").unwrap();
    assert_eq!(bob.commits, 1);
    assert_eq!(bob.lines_added, 1);
    assert_eq!(bob.lines_removed, 1);
}

#[tokio::test]
async fn test_files_and_extensions() {
    let repo = sample_repository("alpha");
    let collected = collect(&[repo.path()], test_config()).await;
    let stats = &collected.statistics;

    assert_eq!(stats.total_files(), 4);
    assert_eq!(stats.total_size(), 4 + 6 + 2 + 4);
    assert_eq!(stats.extensions().get("rs"), Some(&ExtensionStats { files: 1, lines: 2 }));
    assert_eq!(stats.extensions().get("py"), Some(&ExtensionStats { files: 1, lines: 1 }));
    assert_eq!(stats.extensions().get("md"), Some(&ExtensionStats { files: 1, lines: 2 }));
    assert_eq!(stats.extensions().get(""), Some(&ExtensionStats { files: 1, lines: 1 }));

    let lines: u64 = stats.extensions().iter().map(|(_, ext)| ext.lines).sum();
    assert_eq!(lines as i64, stats.total_lines_of_code());
}

#[tokio::test]
async fn test_non_ascii_file_names() {
    let repo = FixtureRepo::new("unicode");
    repo.commit(
        "Alice",
        "alice@example.com",
        T0,
        &[("na\u{ef}ve.RS", "1\n2\n3\n"), ("plain.rs", "x\n")],
    );
    let mut config = test_config();
    config.lines_by_date = true;
    let collected = collect(&[repo.path()], config).await;
    let stats = &collected.statistics;

    assert_eq!(stats.extensions().len(), 1);
    assert_eq!(stats.extensions().get("rs"), Some(&ExtensionStats { files: 2, lines: 4 }));

    let owners = &stats.lines_by_date_by_author()[&StampKey::new(T0, "unicode")];
    assert_eq!(owners["Alice"].lines, 4);
    assert_eq!(owners["Alice"].delta_lines, 4);
}

#[tokio::test]
async fn test_line_timeline() {
    let repo = sample_repository("alpha");
    let collected = collect(&[repo.path()], test_config()).await;
    let stats = &collected.statistics;

    assert_eq!(stats.total_lines_of_code(), 6);
    assert_eq!(stats.total_lines_added(), 7);
    assert_eq!(stats.total_lines_removed(), 1);

    let running: Vec<(i64, i64)> = stats
        .changes_by_date()
        .iter()
        .map(|(key, change)| (key.stamp, change.lines))
        .collect();
    assert_eq!(running, vec![(T0, 4), (T0 + DAY, 4), (T0 + 3 * DAY, 6)]);

    let first = &stats.changes_by_date()[&StampKey::new(T0, "alpha")];
    assert_eq!(first.files, 2);
    assert_eq!(first.inserted, 4);

    let by_author = &stats.changes_by_date_by_author()[&StampKey::new(T0 + 3 * DAY, "alpha")];
    assert_eq!(by_author["Alice"].commits, 2);
    assert_eq!(by_author["Alice"].lines_added, 2);
}

#[tokio::test]
async fn test_tag_partition_is_disjoint_and_covers_history() {
    let repo = sample_repository("alpha");
    let collected = collect(&[repo.path()], test_config()).await;
    let tags = &collected.statistics.tags()["alpha"];

    assert_eq!(tags.len(), 2);
    assert_eq!(tags["v1"].stamp, T0 + DAY);
    assert_eq!(tags["v1"].commits, 2);
    assert_eq!(tags["v1"].authors["Alice"], 1);
    assert_eq!(tags["v1"].authors["Bob"], 1);
    assert_eq!(tags["v2"].commits, 1);
    assert_eq!(tags["v2"].authors["Alice"], 1);
    assert!(!tags["v2"].authors.contains_key("Bob"));

    let covered: u64 = tags.values().map(|tag| tag.commits).sum();
    assert_eq!(covered, collected.statistics.total_commits());
}

#[tokio::test]
async fn test_revisions_and_line_ownership() {
    let repo = sample_repository("alpha");
    let mut config = test_config();
    config.lines_by_date = true;
    let collected = collect(&[repo.path()], config).await;
    let stats = &collected.statistics;

    let files: Vec<(u64, i64)> = stats
        .files_by_stamp()
        .values()
        .map(|count| (count.files, count.delta_files))
        .collect();
    assert_eq!(files, vec![(2, 2), (3, 1), (4, 1)]);

    let ownership = stats.lines_by_date_by_author();
    assert_eq!(ownership.len(), 3);
    assert_eq!(ownership[&StampKey::new(T0, "alpha")]["Alice"].lines, 4);

    let middle = &ownership[&StampKey::new(T0 + DAY, "alpha")];
    assert_eq!(middle["Alice"].lines, 3);
    assert_eq!(middle["Alice"].delta_lines, -1);
    assert_eq!(middle["Bob"].lines, 1);

    let last = &ownership[&StampKey::new(T0 + 3 * DAY, "alpha")];
    assert_eq!(last["Alice"].lines, 5);
    assert_eq!(last["Bob"].lines, 1);
    assert_eq!(last["Bob"].delta_lines, 0);
}

#[tokio::test]
async fn test_commit_range_and_subdirectory() {
    let repo = sample_repository("alpha");

    let mut config = test_config();
    config.commit_end = "v1".to_string();
    let collected = collect(&[repo.path()], config).await;
    assert_eq!(collected.statistics.total_commits(), 2);
    assert_eq!(collected.statistics.total_files(), 3);

    let mut config = test_config();
    config.commit_begin = "v1".to_string();
    let collected = collect(&[repo.path()], config).await;
    assert_eq!(collected.statistics.total_commits(), 1);
    assert_eq!(collected.statistics.total_authors().len(), 1);

    let docs = repo.path().join("docs");
    let collected = collect(&[docs.as_path()], test_config()).await;
    assert_eq!(collected.repositories, vec!["docs"]);
    assert_eq!(collected.statistics.total_commits(), 1);
    assert_eq!(collected.statistics.total_files(), 1);
    assert_eq!(collected.statistics.extensions().get("md").map(|e| e.lines), Some(2));
}

#[tokio::test]
async fn test_worker_count_does_not_change_results() {
    let repo = sample_repository("alpha");

    let mut single = test_config();
    single.processes = 1;
    single.lines_by_date = true;
    let mut wide = single.clone();
    wide.processes = 8;

    let a = collect(&[repo.path()], single).await;
    let b = collect(&[repo.path()], wide).await;

    let a = serde_json::to_value(&a.statistics).unwrap();
    let b = serde_json::to_value(&b.statistics).unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_application_writes_statistics_json() {
    let repo = sample_repository("alpha");
    let out = TempDir::new().unwrap();
    let target = out.path().join("report");

    let args = cli::parse_args_from([
        "repostats",
        "-c",
        "project_name=Sample",
        "-c",
        "processes=2",
        repo.path().to_str().unwrap(),
        target.to_str().unwrap(),
    ])
    .unwrap();
    let manager = ConfigManager::from_config(Configuration::new());

    let outcome = app::collect(&args, &manager).await.unwrap();
    assert_eq!(outcome.collected.project_name, "Sample");
    assert!(outcome.statistics_file.ends_with("statistics.json"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outcome.statistics_file).unwrap()).unwrap();
    assert_eq!(json["project_name"], "Sample");
    assert_eq!(json["statistics"]["total_commits"], 3);
    assert!(json["statistics"]["changes_by_date"]
        .as_object()
        .unwrap()
        .contains_key(&format!("{} alpha", T0)));
    assert!(json["exec_time"]["commands"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_non_repository_is_rejected() {
    let plain = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let args = cli::parse_args_from([
        "repostats",
        plain.path().to_str().unwrap(),
        out.path().to_str().unwrap(),
    ])
    .unwrap();
    let manager = ConfigManager::from_config(Configuration::new());

    let err = app::collect(&args, &manager).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Not a git repository"));
}
