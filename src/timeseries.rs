use crate::aggregate::Aggregation;
use crate::model::{AggregatedCommitGroup, ChartPoint, Line, LineColor};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

const PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hour,
    Day,
    /// ISO weeks, starting Monday.
    #[default]
    Week,
    Month,
    Quarter,
    Year,
}

/// Start of the bucket containing `time`.
pub fn floor(time: DateTime<Utc>, unit: TimeUnit) -> DateTime<Utc> {
    let date = time.date_naive();
    if unit == TimeUnit::Hour {
        let hour = NaiveTime::from_hms_opt(time.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
        return Utc.from_utc_datetime(&date.and_time(hour));
    }
    let day = match unit {
        TimeUnit::Hour | TimeUnit::Day => date,
        TimeUnit::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
        TimeUnit::Month => first_of(date.year(), date.month()).unwrap_or(date),
        TimeUnit::Quarter => first_of(date.year(), (date.month0() / 3) * 3 + 1).unwrap_or(date),
        TimeUnit::Year => first_of(date.year(), 1).unwrap_or(date),
    };
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

fn first_of(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Next bucket start; `None` past the representable range.
pub fn advance(bucket: DateTime<Utc>, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Hour => bucket.checked_add_signed(Duration::hours(1)),
        TimeUnit::Day => bucket.checked_add_signed(Duration::days(1)),
        TimeUnit::Week => bucket.checked_add_signed(Duration::days(7)),
        TimeUnit::Month => bucket.checked_add_months(Months::new(1)),
        TimeUnit::Quarter => bucket.checked_add_months(Months::new(3)),
        TimeUnit::Year => bucket.checked_add_months(Months::new(12)),
    }
}

/// Bucket starts from `floor(start)` through `floor(end)`; always yields at least one.
pub fn bucket_starts(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    unit: TimeUnit,
) -> impl Iterator<Item = DateTime<Utc>> {
    let last = floor(end, unit);
    std::iter::successors(Some(floor(start, unit)), move |p| advance(*p, unit))
        .enumerate()
        .take_while(move |(i, p)| *i == 0 || *p <= last)
        .map(|(_, p)| p)
}

pub fn period_count(start: DateTime<Utc>, end: DateTime<Utc>, unit: TimeUnit) -> usize {
    bucket_starts(start, end, unit).count()
}

pub fn zero_fill(start: DateTime<Utc>, end: DateTime<Utc>, unit: TimeUnit) -> Vec<ChartPoint> {
    bucket_starts(start, end, unit)
        .map(|x| ChartPoint { x, y: 0 })
        .collect()
}

pub fn color_for(rank: usize) -> LineColor {
    let hex = PALETTE[rank % PALETTE.len()];
    LineColor {
        border_color: hex.to_string(),
        background_color: format!("{hex}33"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSet {
    pub lines: Vec<Line>,
    pub has_negatives: bool,
}

/// One zero-filled line per ranked group, in rank order.
pub fn build_lines(
    groups: &[AggregatedCommitGroup],
    aggregation: Aggregation,
    unit: TimeUnit,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    accumulated: bool,
) -> LineSet {
    let lines: Vec<Line> = groups
        .iter()
        .enumerate()
        .map(|(rank, g)| {
            let mut data = zero_fill(start, end, unit);
            for commit in &g.group.commits {
                let bucket = floor(commit.committer.time, unit);
                match data.binary_search_by_key(&bucket, |p| p.x) {
                    Ok(i) => data[i].y += aggregation.apply(commit),
                    Err(_) => trace!(hash = %commit.hash, "commit outside chart range, skipped"),
                }
            }
            if accumulated {
                accumulate(&mut data);
            }
            Line {
                label: g.group.name.clone(),
                data,
                color: color_for(rank),
            }
        })
        .collect();

    let has_negatives = lines.iter().any(|l| l.data.iter().any(|p| p.y < 0));
    debug!(lines = lines.len(), ?unit, accumulated, "built chart lines");
    LineSet { lines, has_negatives }
}

/// In-place prefix sum.
pub fn accumulate(data: &mut [ChartPoint]) {
    let mut running = 0;
    for point in data.iter_mut() {
        running += point.y;
        point.y = running;
    }
}
