//! Collection over a history with a merge commit
//!
//! The line timeline follows the first parent when `linear_linestats` is set
//! and every commit otherwise; the per-author pass always walks every commit
//! and books merges without a diffstat as merge commits.

mod fixtures;

use repostats::stats::{AuthorChange, StampKey};

use fixtures::{collect, merge_repository, test_config, DAY, T0};

fn running_totals(stats: &repostats::stats::StatisticsAggregator) -> Vec<(i64, i64)> {
    stats
        .changes_by_date()
        .iter()
        .map(|(key, change)| (key.stamp, change.lines))
        .collect()
}

#[tokio::test]
async fn test_merge_is_booked_as_merge_commit() {
    for linear in [true, false] {
        let repo = merge_repository("merged");
        let mut config = test_config();
        config.linear_linestats = linear;
        let collected = collect(&[repo.path()], config).await;
        let stats = &collected.statistics;

        assert_eq!(stats.total_commits(), 4);
        assert_eq!(stats.total_lines_of_code(), 6, "linear_linestats={}", linear);

        let merge = &stats.changes_by_date_by_author()[&StampKey::new(T0 + 3 * DAY, "merged")];
        assert_eq!(
            merge["Merger"],
            AuthorChange {
                lines_added: 0,
                lines_removed: 0,
                commits: 1,
                merge_commit: true,
            }
        );

        let merger = stats.author("Merger").unwrap();
        assert_eq!(merger.commits, 1);
        assert_eq!(merger.lines_added, 0);
        assert_eq!(stats.author("Bob").unwrap().lines_added, 3);
        assert_eq!(stats.author("Alice").unwrap().commits, 2);
        assert_eq!(stats.author("Alice").unwrap().lines_added, 3);
    }
}

#[tokio::test]
async fn test_linear_timeline_follows_first_parent() {
    let repo = merge_repository("merged");
    let mut config = test_config();
    config.linear_linestats = true;
    let collected = collect(&[repo.path()], config).await;
    let stats = &collected.statistics;

    assert_eq!(
        running_totals(stats),
        vec![(T0, 2), (T0 + 2 * DAY, 3), (T0 + 3 * DAY, 6)]
    );

    // The timeline credits the side branch to the merge, the author pass to its author
    let merge = &stats.changes_by_date()[&StampKey::new(T0 + 3 * DAY, "merged")];
    assert_eq!(merge.inserted, 3);
    assert_eq!(stats.author("Merger").unwrap().lines_added, 0);
    assert!(!stats.changes_by_date().contains_key(&StampKey::new(T0 + DAY, "merged")));
}

#[tokio::test]
async fn test_full_timeline_walks_every_commit() {
    let repo = merge_repository("merged");
    let mut config = test_config();
    config.linear_linestats = false;
    let collected = collect(&[repo.path()], config).await;
    let stats = &collected.statistics;

    assert_eq!(
        running_totals(stats),
        vec![(T0, 2), (T0 + DAY, 5), (T0 + 2 * DAY, 6)]
    );
    assert_eq!(stats.changes_by_date()[&StampKey::new(T0 + DAY, "merged")].inserted, 3);
    assert!(!stats.changes_by_date().contains_key(&StampKey::new(T0 + 3 * DAY, "merged")));
    assert_eq!(stats.total_lines_added(), 6);
}
