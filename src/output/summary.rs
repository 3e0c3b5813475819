//! Compact summary of a collection run

use std::time::Duration;

use chrono::{DateTime, Utc};
use prettytable::{format, Cell, Row, Table};

use crate::collector::CollectedStatistics;
use crate::command::ExecTime;

/// Format a compact table with headers and rows using prettytable-rs clean format
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    if !headers.is_empty() {
        table.add_row(Row::new(headers.iter().map(|header| Cell::new(header)).collect()));
    }
    for row in rows {
        table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
    }

    let mut result = String::new();
    for line in table.to_string().lines() {
        result.push_str("  ");
        result.push_str(line);
        result.push('\n');
    }
    result
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_stamp(stamp: Option<i64>) -> String {
    format_date(stamp.and_then(|s| DateTime::from_timestamp(s, 0)))
}

/// Project-level figures as label/value rows
pub fn overview_rows(collected: &CollectedStatistics) -> Vec<Vec<String>> {
    let stats = &collected.statistics;
    let tags: usize = stats.tags().values().map(|tags| tags.len()).sum();
    vec![
        vec!["Project".into(), collected.project_name.clone()],
        vec!["Repositories".into(), collected.repositories.join(", ")],
        vec![
            "Period".into(),
            format!(
                "{} to {}",
                format_date(stats.first_commit_date()),
                format_date(stats.last_commit_date())
            ),
        ],
        vec![
            "Age".into(),
            format!("{} days, {} active", stats.commit_delta_days(), stats.active_days().len()),
        ],
        vec!["Files".into(), stats.total_files().to_string()],
        vec!["Lines of code".into(), stats.total_lines_of_code().to_string()],
        vec![
            "Changes".into(),
            format!("+{} -{}", stats.total_lines_added(), stats.total_lines_removed()),
        ],
        vec!["Commits".into(), stats.total_commits().to_string()],
        vec!["Authors".into(), stats.total_authors().len().to_string()],
        vec!["Tags".into(), tags.to_string()],
    ]
}

/// Top authors by commits
pub fn author_rows(collected: &CollectedStatistics) -> Vec<Vec<String>> {
    let stats = &collected.statistics;
    stats
        .authors_sorted(Some(collected.config.max_authors))
        .into_iter()
        .filter_map(|name| stats.author(name).map(|author| (name, author)))
        .map(|(name, author)| {
            vec![
                name.to_string(),
                author.commits.to_string(),
                format!("+{} -{}", author.lines_added, author.lines_removed),
                format_stamp(author.first_commit_stamp),
                format_stamp(author.last_commit_stamp),
                author.active_day_count().to_string(),
            ]
        })
        .collect()
}

/// Top e-mail domains by commits
pub fn domain_rows(collected: &CollectedStatistics) -> Vec<Vec<String>> {
    collected
        .statistics
        .domains_sorted()
        .into_iter()
        .take(collected.config.max_domains)
        .map(|(domain, commits)| vec![domain.to_string(), commits.to_string()])
        .collect()
}

/// Render the whole summary
pub fn render_summary(collected: &CollectedStatistics) -> String {
    let mut out = String::new();
    out.push_str(&format_compact_table(&[], &overview_rows(collected)));

    let authors = author_rows(collected);
    if !authors.is_empty() {
        out.push('\n');
        out.push_str(&format_compact_table(
            &["Author", "Commits", "Lines", "First", "Last", "Active days"],
            &authors,
        ));
    }

    let domains = domain_rows(collected);
    if !domains.is_empty() {
        out.push('\n');
        out.push_str(&format_compact_table(&["Domain", "Commits"], &domains));
    }
    out
}

/// `Execution time X secs, Y secs (Z %) in external commands, cumulative over N commands`
///
/// Y sums the time of every command, including those that ran side by side,
/// so Z may exceed 100 with more than one worker.
pub fn execution_time_line(total: Duration, exec: ExecTime) -> String {
    let total_secs = total.as_secs_f64();
    let exec_secs = exec.as_secs_f64();
    let percent = if total_secs > 0.0 { exec_secs * 100.0 / total_secs } else { 0.0 };
    format!(
        "Execution time {:.5} secs, {:.5} secs ({:.2} %) in external commands, cumulative over {} commands",
        total_secs, exec_secs, percent, exec.commands
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectorConfig;
    use crate::stats::StatisticsAggregator;

    fn empty_collection() -> CollectedStatistics {
        CollectedStatistics {
            project_name: "demo".to_string(),
            repositories: vec!["demo".to_string()],
            generated_at: Utc::now(),
            config: CollectorConfig::default(),
            exec_time: ExecTime::default(),
            statistics: StatisticsAggregator::new(),
        }
    }

    #[test]
    fn test_format_compact_table() {
        let table = format_compact_table(
            &["Author", "Commits"],
            &[vec!["Alice".into(), "3".into()], vec!["Bob".into(), "1".into()]],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.starts_with("  ")));
        assert!(lines[0].contains("Author"));
        assert!(lines[1].contains("Alice"));
        assert!(format_compact_table(&["x"], &[]).is_empty());
    }

    #[test]
    fn test_empty_summary() {
        let collected = empty_collection();
        let summary = render_summary(&collected);
        assert!(summary.contains("demo"));
        assert!(summary.contains("- to -"));
        assert!(author_rows(&collected).is_empty());
        assert!(domain_rows(&collected).is_empty());
    }

    #[test]
    fn test_execution_time_line() {
        let exec = ExecTime {
            commands: 4,
            elapsed: Duration::from_millis(500),
        };
        assert_eq!(
            execution_time_line(Duration::from_secs(2), exec),
            "Execution time 2.00000 secs, 0.50000 secs (25.00 %) in external commands, cumulative over 4 commands"
        );
        assert!(execution_time_line(Duration::ZERO, ExecTime::default()).contains("(0.00 %)"));
    }

    #[test]
    fn test_parallel_command_time_is_labelled_cumulative() {
        let exec = ExecTime {
            commands: 8,
            elapsed: Duration::from_secs(3),
        };
        let line = execution_time_line(Duration::from_secs(1), exec);
        assert!(line.contains("(300.00 %)"));
        assert!(line.ends_with("cumulative over 8 commands"));
    }
}
