//! Collection over several repositories into one aggregate

mod fixtures;

use repostats::stats::StampKey;

use fixtures::{collect, sample_repository, test_config, FixtureRepo, DAY, T0};

/// A second repository whose first commit lands in the same second as the sample's
fn sibling_repository(name: &str) -> FixtureRepo {
    let repo = FixtureRepo::new(name);
    repo.commit("Carol", "carol@example.com", T0, &[("main.go", "package main\n")]);
    repo.commit(
        "Alice",
        "alice@example.com",
        T0 + 10 * DAY,
        &[("main.go", "package main\nfunc main() {}\n")],
    );
    repo
}

#[tokio::test]
async fn test_same_timestamp_in_two_repositories_keeps_both() {
    let alpha = sample_repository("alpha");
    let beta = sibling_repository("beta");
    let collected = collect(&[alpha.path(), beta.path()], test_config()).await;
    let changes = collected.statistics.changes_by_date();

    let same_second: Vec<&StampKey> = changes.keys().filter(|key| key.stamp == T0).collect();
    assert_eq!(
        same_second,
        vec![&StampKey::new(T0, "alpha"), &StampKey::new(T0, "beta")]
    );
    assert_eq!(changes[&StampKey::new(T0, "alpha")].inserted, 4);
    assert_eq!(changes[&StampKey::new(T0, "beta")].inserted, 1);

    let files = collected.statistics.files_by_stamp();
    assert!(files.contains_key(&StampKey::new(T0, "alpha")));
    assert!(files.contains_key(&StampKey::new(T0, "beta")));
}

#[tokio::test]
async fn test_running_line_totals_are_per_repository() {
    let alpha = sample_repository("alpha");
    let beta = sibling_repository("beta");
    let collected = collect(&[alpha.path(), beta.path()], test_config()).await;
    let stats = &collected.statistics;

    assert_eq!(stats.changes_by_date()[&StampKey::new(T0 + 10 * DAY, "beta")].lines, 2);
    assert_eq!(stats.changes_by_date()[&StampKey::new(T0 + 3 * DAY, "alpha")].lines, 6);
    assert_eq!(stats.total_lines_of_code(), 8);
}

#[tokio::test]
async fn test_authors_merge_across_repositories() {
    let alpha = sample_repository("alpha");
    let beta = sibling_repository("beta");
    let collected = collect(&[alpha.path(), beta.path()], test_config()).await;
    let stats = &collected.statistics;

    assert_eq!(collected.project_name, "alpha, beta");
    assert_eq!(collected.repositories, vec!["alpha", "beta"]);
    assert_eq!(stats.total_commits(), 5);
    assert_eq!(stats.total_authors().len(), 3);

    let alice = stats.author("Alice").unwrap();
    assert_eq!(alice.commits, 3);
    assert_eq!(alice.lines_added, 6 + 1);
    assert_eq!(alice.first_commit_stamp, Some(T0));
    assert_eq!(alice.last_commit_stamp, Some(T0 + 10 * DAY));
    assert_eq!(alice.active_day_count(), 3);

    assert_eq!(stats.author("Carol").unwrap().commits, 1);
    assert_eq!(stats.authors_sorted(Some(1)), vec!["Alice"]);
    assert_eq!(stats.commit_delta_days(), 11);

    assert_eq!(stats.tags().len(), 2);
    assert!(stats.tags()["beta"].is_empty());
}

#[tokio::test]
async fn test_repository_order_does_not_change_the_aggregate() {
    let alpha = sample_repository("alpha");
    let beta = sibling_repository("beta");

    let forward = collect(&[alpha.path(), beta.path()], test_config()).await;
    let backward = collect(&[beta.path(), alpha.path()], test_config()).await;

    let forward = serde_json::to_value(&forward.statistics).unwrap();
    let backward = serde_json::to_value(&backward.statistics).unwrap();
    assert_eq!(forward, backward);
}
