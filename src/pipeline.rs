//! Memoized end-to-end pipeline: extended commits, ranked groups, chart lines.
//!
//! Each stage is cached under a fingerprint chained from the previous stage's
//! key, so changing only the chart options reuses the filtered commits and
//! groups.

use crate::aggregate::{aggregate, Aggregation};
use crate::cache::{Fingerprint, StageCache};
use crate::config::{FilterConfig, PipelineSettings};
use crate::error::Result;
use crate::filter::{build_extended_commits, commits_in_range, first_commit_time, last_commit_time};
use crate::group::{group_by, GroupBy};
use crate::model::{AggregatedCommitGroup, ChartData, Dataset, DateRange, ExtendedCommit};
use crate::reduce::cap_data_points;
use crate::timeseries::{build_lines, period_count, TimeUnit};
use chrono::Utc;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// The currently loaded dataset. Replaced wholesale on each successful load.
#[derive(Debug, Clone)]
pub struct DatasetContext {
    dataset: Arc<Dataset>,
    fingerprint: Fingerprint,
}

impl DatasetContext {
    pub fn empty() -> Self {
        Self {
            dataset: Arc::new(Dataset::default()),
            fingerprint: Fingerprint::from_bytes(b""),
        }
    }

    pub fn new(dataset: Dataset) -> Result<Self> {
        let fingerprint = Fingerprint::of(&dataset)?;
        Ok(Self {
            dataset: Arc::new(dataset),
            fingerprint,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let dataset: Dataset = serde_json::from_reader(reader)?;
        info!(
            path = %path.display(),
            projects = dataset.projects.len(),
            "loaded dataset"
        );
        Self::new(dataset)
    }

    /// Swaps in `dataset`; on error the current dataset stays loaded.
    pub fn replace(&mut self, dataset: Dataset) -> Result<()> {
        *self = Self::new(dataset)?;
        Ok(())
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

impl Default for DatasetContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-invocation chart options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartRequest {
    pub group_by: GroupBy,
    pub aggregation: Aggregation,
    pub unit: TimeUnit,
    pub range: DateRange,
    pub accumulated: bool,
    /// Falls back to [`PipelineSettings::max_data_points`].
    pub max_data_points: Option<usize>,
}

impl ChartRequest {
    pub fn new(range: DateRange) -> Self {
        Self {
            group_by: GroupBy::default(),
            aggregation: Aggregation::default(),
            unit: TimeUnit::default(),
            range,
            accumulated: false,
            max_data_points: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// All extended commits, unrestricted by the requested range.
    pub commits: Arc<Vec<ExtendedCommit>>,
    pub groups: Arc<Vec<AggregatedCommitGroup>>,
    pub chart: Arc<ChartData>,
    pub periods: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

pub struct Pipeline {
    settings: PipelineSettings,
    commits: StageCache<Arc<Vec<ExtendedCommit>>>,
    groups: StageCache<Arc<Vec<AggregatedCommitGroup>>>,
    charts: StageCache<Arc<ChartData>>,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            commits: StageCache::new("commits", settings.cache_capacity),
            groups: StageCache::new("groups", settings.cache_capacity),
            charts: StageCache::new("chart", settings.cache_capacity),
        }
    }

    pub fn extended_commits(
        &mut self,
        ctx: &DatasetContext,
        config: &FilterConfig,
    ) -> Result<Arc<Vec<ExtendedCommit>>> {
        let key = ctx.fingerprint().chain("commits", config)?;
        self.commits_for(key, ctx, config)
    }

    fn commits_for(
        &mut self,
        key: Fingerprint,
        ctx: &DatasetContext,
        config: &FilterConfig,
    ) -> Result<Arc<Vec<ExtendedCommit>>> {
        self.commits
            .get_or_try_insert(key, || Ok(Arc::new(build_extended_commits(ctx.dataset(), config)?)))
    }

    /// First through last commit time, or a single instant when there are no commits.
    pub fn default_range(&mut self, ctx: &DatasetContext, config: &FilterConfig) -> Result<DateRange> {
        let commits = self.extended_commits(ctx, config)?;
        let now = Utc::now();
        let start = first_commit_time(&commits).unwrap_or(now);
        let end = last_commit_time(&commits).unwrap_or(start);
        Ok(DateRange::new(start, end))
    }

    pub fn run(
        &mut self,
        ctx: &DatasetContext,
        config: &FilterConfig,
        request: &ChartRequest,
    ) -> Result<PipelineOutput> {
        let commits_key = ctx.fingerprint().chain("commits", config)?;
        let commits = self.commits_for(commits_key, ctx, config)?;

        let range = request.range;
        let periods = period_count(range.start, range.end, request.unit);
        let groups_key = commits_key.chain(
            "groups",
            &(request.group_by, request.aggregation, request.unit, range),
        )?;
        let groups = self.groups.get_or_try_insert(groups_key, || {
            let in_range = commits_in_range(&commits, &range);
            let grouped = group_by(&in_range, request.group_by);
            Ok(Arc::new(aggregate(grouped, request.aggregation, periods)))
        })?;

        let max_points = request
            .max_data_points
            .unwrap_or(self.settings.max_data_points);
        let chart_key = groups_key.chain("chart", &(request.accumulated, max_points))?;
        let chart = self.charts.get_or_try_insert(chart_key, || {
            let set = build_lines(
                &groups,
                request.aggregation,
                request.unit,
                range.start,
                range.end,
                request.accumulated,
            );
            let capped = cap_data_points(set.lines, request.unit, range.start, range.end, max_points);
            Ok(Arc::new(ChartData {
                lines: capped.lines,
                others: capped.others,
                has_negatives: set.has_negatives,
            }))
        })?;

        debug!(
            commits = commits.len(),
            groups = groups.len(),
            lines = chart.lines.len(),
            periods,
            "pipeline run complete"
        );
        Ok(PipelineOutput {
            commits,
            groups,
            chart,
            periods,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.commits.hits() + self.groups.hits() + self.charts.hits(),
            misses: self.commits.misses() + self.groups.misses() + self.charts.misses(),
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineSettings::default())
    }
}
