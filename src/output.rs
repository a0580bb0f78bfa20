use crate::model::{
    AggregatedCommitGroup, AuthorsOutput, ChartData, CommitsOutput, DateRange, ExtendedCommit,
    GroupSummary, GroupsOutput, Line, LinesOutput, SCHEMA_VERSION,
};
use anyhow::Result;
use chrono::Utc;
use console::style;
use serde::Serialize;
use std::sync::Arc;

const TABLE_ROWS: usize = 50;

pub fn output_ndjson<T: Serialize>(items: &[T]) -> Result<()> {
    for item in items {
        println!("{}", serde_json::to_string(item)?);
    }
    Ok(())
}

pub fn output_commits_json(commits: &[ExtendedCommit], range: &DateRange) -> Result<()> {
    let output = CommitsOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        since: range.start,
        until: range.end,
        entries: commits.to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn output_commits_table(commits: &[ExtendedCommit]) -> Result<()> {
    println!(
        "{:<10} {:<20} {:<16} {:<40} {:>7} {:>7}",
        style("Hash").bold(),
        style("Date").bold(),
        style("Author").bold(),
        style("Title").bold(),
        style("Added").bold(),
        style("Deleted").bold()
    );
    println!("{}", "─".repeat(105));
    for c in commits.iter().take(TABLE_ROWS) {
        let line = format!(
            "{:<10} {:<20} {:<16} {:<40} {:>7} {:>7}",
            c.hash.chars().take(8).collect::<String>(),
            c.committer.time.format("%Y-%m-%d %H:%M"),
            truncate(&c.author.name, 16),
            truncate(&c.title, 40),
            c.additions,
            c.deletions
        );
        if c.excluded {
            println!("{}", style(line).dim());
        } else {
            println!("{line}");
        }
    }
    if commits.len() > TABLE_ROWS {
        println!("\n... and {} more commits", commits.len() - TABLE_ROWS);
    }

    let included = commits.iter().filter(|c| !c.excluded).count();
    let added: u64 = commits.iter().map(|c| c.additions).sum();
    let deleted: u64 = commits.iter().map(|c| c.deletions).sum();
    println!(
        "\nCommits: {} ({} excluded), lines {} / {}",
        style(commits.len()).cyan(),
        style(commits.len() - included).dim(),
        style(format!("+{added}")).green(),
        style(format!("-{deleted}")).red()
    );
    Ok(())
}

pub fn output_authors(authors: Vec<String>, aliases_resolved: bool, json: bool) -> Result<()> {
    if json {
        let output = AuthorsOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            aliases_resolved,
            authors,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for name in &authors {
            println!("{name}");
        }
    }
    Ok(())
}

pub fn group_summaries(groups: &[AggregatedCommitGroup]) -> Vec<GroupSummary> {
    groups.iter().map(GroupSummary::from).collect()
}

pub fn output_groups_json(groups: &[AggregatedCommitGroup], range: &DateRange, periods: usize) -> Result<()> {
    let output = GroupsOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        since: range.start,
        until: range.end,
        periods,
        groups: group_summaries(groups),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn output_groups_table(groups: &[AggregatedCommitGroup], periods: usize) -> Result<()> {
    if groups.is_empty() {
        println!("No data to display");
        return Ok(());
    }
    println!(
        "{:<32} {:>8} {:>10} {:>10} {:<12} {:<12}",
        style("Group").bold(),
        style("Commits").bold(),
        style("Total").bold(),
        style("Average").bold(),
        style("First").bold(),
        style("Last").bold()
    );
    println!("{}", "─".repeat(90));
    for g in groups.iter().take(TABLE_ROWS) {
        println!(
            "{:<32} {:>8} {:>10} {:>10.2} {:<12} {:<12}",
            truncate(&g.group.name, 32),
            g.group.commits.len(),
            g.aggregate,
            g.average,
            g.group.first_commit.format("%Y-%m-%d"),
            g.group.last_commit.format("%Y-%m-%d")
        );
    }
    if groups.len() > TABLE_ROWS {
        println!("\n... and {} more groups", groups.len() - TABLE_ROWS);
    }
    println!("\nAverages over {} periods", style(periods).cyan());
    Ok(())
}

pub fn output_lines_json(chart: &Arc<ChartData>, range: &DateRange) -> Result<()> {
    let output = LinesOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        since: range.start,
        until: range.end,
        chart: Arc::clone(chart),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// One sparkline row per line, scaled to the largest absolute value in the chart.
pub fn output_lines_table(chart: &ChartData) -> Result<()> {
    if chart.lines.is_empty() {
        println!("No data to display");
        return Ok(());
    }
    let max = chart
        .lines
        .iter()
        .flat_map(|l| l.data.iter().map(|p| p.y.unsigned_abs()))
        .max()
        .unwrap_or(0)
        .max(1);

    println!("{}", style("Activity").bold());
    println!("{}", "─".repeat(50));
    for line in &chart.lines {
        println!(
            "{:<24} {} {:>8}",
            truncate(&line.label, 24),
            style(sparkline(line, max)).green(),
            line.data.iter().map(|p| p.y).sum::<i64>()
        );
    }
    if !chart.others.is_empty() {
        println!("\nOthers: {}", style(chart.others.join(", ")).dim());
    }
    if chart.has_negatives {
        println!("{}", style("Series contain negative values").yellow());
    }
    Ok(())
}

fn sparkline(line: &Line, max: u64) -> String {
    line.data
        .iter()
        .map(|p| {
            let intensity = ((p.y.unsigned_abs() as f64 / max as f64) * 5.0) as u32;
            match intensity {
                0 if p.y == 0 => ' ',
                0 | 1 => '▁',
                2 => '▃',
                3 => '▅',
                4 => '▇',
                _ => '█',
            }
        })
        .collect()
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
