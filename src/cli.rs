use crate::aggregate::Aggregation;
use crate::alias::{raw_author_names, real_author_names};
use crate::config::{load_config, FilterConfig, PipelineSettings};
use crate::error::LensError;
use crate::group::GroupBy;
use crate::model::DateRange;
use crate::order::{sort_commits, OrderBy};
use crate::output;
use crate::pipeline::{ChartRequest, DatasetContext, Pipeline};
use crate::reduce::MAX_DATA_POINTS;
use crate::timeseries::TimeUnit;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commitlens")]
#[command(about = "Commit analytics over git statistics datasets: filtering, grouping and time series")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to the dataset JSON file")]
    pub dataset: PathBuf,

    #[arg(long, help = "Path to the filter config JSON file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Include merge commits regardless of config")]
    pub include_merges: bool,

    #[arg(long, help = "Start of range (RFC3339, YYYY-MM-DD, or e.g. \"3 weeks ago\")")]
    pub since: Option<String>,

    #[arg(long, help = "End of range (RFC3339, YYYY-MM-DD, or e.g. \"3 weeks ago\")")]
    pub until: Option<String>,

    #[arg(long, help = "Entries kept per pipeline stage cache", default_value_t = 16)]
    pub cache_capacity: usize,
}

#[derive(Args, Clone, Copy)]
pub struct ChartArgs {
    #[arg(long, value_enum, default_value_t = GroupBy::Author)]
    pub group_by: GroupBy,

    #[arg(long = "aggregate", value_enum, default_value_t = Aggregation::Commits)]
    pub aggregation: Aggregation,

    #[arg(long, value_enum, default_value_t = TimeUnit::Week)]
    pub unit: TimeUnit,
}

#[derive(Subcommand)]
pub enum Commands {
    Commits {
        #[arg(long, value_enum, default_value_t = OrderBy::Time)]
        order_by: OrderBy,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    Authors {
        #[arg(long, help = "List names as recorded, ignoring aliases")]
        raw: bool,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    Groups {
        #[clap(flatten)]
        chart: ChartArgs,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    Lines {
        #[clap(flatten)]
        chart: ChartArgs,

        #[arg(long, help = "Plot running totals")]
        accumulated: bool,

        #[arg(long, help = "Fold lowest ranked lines into \"Others\" above this many points", default_value_t = MAX_DATA_POINTS)]
        max_points: usize,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        let ctx = DatasetContext::from_path(&self.common.dataset).context("Failed to load dataset")?;
        let mut config = load_config(self.common.config.as_deref()).context("Failed to load config")?;
        if self.common.include_merges {
            config.include_merge_commits = true;
        }
        let mut pipeline = Pipeline::new(PipelineSettings {
            cache_capacity: self.common.cache_capacity,
            ..PipelineSettings::default()
        });

        match self.command {
            Commands::Commits { order_by, json, ndjson } => {
                let range = resolve_range(&self.common, &mut pipeline, &ctx, &config)?;
                let commits = pipeline
                    .extended_commits(&ctx, &config)
                    .context("Failed to build extended commits")?;
                let in_range = crate::filter::commits_in_range(&commits, &range);
                let sorted = sort_commits(&in_range, order_by);
                if json {
                    output::output_commits_json(&sorted, &range)
                } else if ndjson {
                    output::output_ndjson(&sorted)
                } else {
                    output::output_commits_table(&sorted)
                }
            }
            Commands::Authors { raw, json } => {
                let names = if raw {
                    raw_author_names(ctx.dataset())
                } else {
                    real_author_names(ctx.dataset(), &config)
                };
                output::output_authors(names, !raw, json)
            }
            Commands::Groups { chart, json, ndjson } => {
                let range = resolve_range(&self.common, &mut pipeline, &ctx, &config)?;
                let request = chart_request(chart, range);
                let out = pipeline
                    .run(&ctx, &config, &request)
                    .context("Failed to compute groups")?;
                if json {
                    output::output_groups_json(&out.groups, &range, out.periods)
                } else if ndjson {
                    output::output_ndjson(&output::group_summaries(&out.groups))
                } else {
                    output::output_groups_table(&out.groups, out.periods)
                }
            }
            Commands::Lines { chart, accumulated, max_points, json } => {
                let range = resolve_range(&self.common, &mut pipeline, &ctx, &config)?;
                let request = ChartRequest {
                    accumulated,
                    max_data_points: Some(max_points),
                    ..chart_request(chart, range)
                };
                let out = pipeline
                    .run(&ctx, &config, &request)
                    .context("Failed to compute chart lines")?;
                if json {
                    output::output_lines_json(&out.chart, &range)
                } else {
                    output::output_lines_table(&out.chart)
                }
            }
        }
    }
}

fn chart_request(chart: ChartArgs, range: DateRange) -> ChartRequest {
    ChartRequest {
        group_by: chart.group_by,
        aggregation: chart.aggregation,
        unit: chart.unit,
        ..ChartRequest::new(range)
    }
}

/// Explicit bounds win; missing ones come from the first and last commit.
fn resolve_range(
    common: &CommonArgs,
    pipeline: &mut Pipeline,
    ctx: &DatasetContext,
    config: &FilterConfig,
) -> Result<DateRange> {
    let since = common.since.as_deref().map(parse_date).transpose()?;
    let until = common.until.as_deref().map(parse_until).transpose()?;

    if let (Some(s), Some(u)) = (since, until) {
        if s > u {
            return Err(LensError::InvalidDate(format!(
                "Invalid range: since ({s}) is after until ({u})"
            ))
            .into());
        }
    }

    let default = pipeline
        .default_range(ctx, config)
        .context("Failed to determine date range")?;
    let start = since.unwrap_or(default.start);
    let end = until.unwrap_or(default.end).max(start);
    Ok(DateRange::new(start, end))
}

/// Like [`parse_date`], but a bare `YYYY-MM-DD` covers that whole day.
pub fn parse_until(input: &str) -> std::result::Result<DateTime<Utc>, LensError> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| LensError::InvalidDate(format!("Invalid end of day for '{input}'")))?;
        return Ok(Utc.from_utc_datetime(&date.and_time(end_of_day)));
    }
    parse_date(input)
}

pub fn parse_date(input: &str) -> std::result::Result<DateTime<Utc>, LensError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }

    // "3 weeks ago", "90days ago"
    if let Some(span) = input.trim().strip_suffix("ago") {
        let compact: String = span.chars().filter(|c| !c.is_whitespace()).collect();
        let duration = humantime::parse_duration(&compact)
            .map_err(|e| LensError::InvalidDate(format!("Invalid duration '{input}': {e}")))?;
        let duration = chrono::Duration::from_std(duration)
            .map_err(|_| LensError::InvalidDate(format!("Duration overflow for '{input}'")))?;
        return Utc::now()
            .checked_sub_signed(duration)
            .ok_or_else(|| LensError::InvalidDate(format!("Duration overflow for '{input}'")));
    }

    Err(LensError::InvalidDate(format!("Unrecognized date '{input}'")))
}
