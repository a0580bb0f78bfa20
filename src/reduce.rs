use crate::model::Line;
use crate::timeseries::{zero_fill, TimeUnit};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Above this many points lines are folded into "Others".
pub const MAX_DATA_POINTS: usize = 2000;

pub const OTHERS_LABEL: &str = "Others";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CappedLines {
    pub lines: Vec<Line>,
    /// Labels of the lines folded into "Others", lowest ranked first.
    pub others: Vec<String>,
}

/// Folds trailing (lowest ranked) lines into a single "Others" line until the
/// total point count fits `max_points` or one line is left.
///
/// Per-bucket sums across all lines are preserved.
pub fn cap_data_points(
    mut lines: Vec<Line>,
    unit: TimeUnit,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_points: usize,
) -> CappedLines {
    let mut total: usize = lines.iter().map(|l| l.data.len()).sum();
    let mut others = Vec::new();
    if lines.len() <= 1 || total <= max_points {
        return CappedLines { lines, others };
    }

    let mut folded = zero_fill(start, end, unit);
    let mut last_removed = None;
    while total > max_points && lines.len() > 1 {
        let Some(removed) = lines.pop() else { break };
        total -= removed.data.len();
        for point in &removed.data {
            match folded.binary_search_by_key(&point.x, |p| p.x) {
                Ok(i) => folded[i].y += point.y,
                Err(i) => {
                    warn!(label = %removed.label, x = %point.x, "point off the chart grid");
                    folded.insert(i, *point);
                }
            }
        }
        others.push(removed.label.clone());
        last_removed = Some(removed);
    }

    if let Some(removed) = last_removed {
        lines.push(Line {
            label: OTHERS_LABEL.to_string(),
            data: folded,
            color: removed.color,
        });
    }
    debug!(kept = lines.len(), folded = others.len(), "capped chart data points");
    CappedLines { lines, others }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChartPoint, LineColor};
    use crate::testutil::ymd;
    use crate::timeseries::{accumulate, bucket_starts, color_for};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn line(label: &str, ys: &[i64], start: DateTime<Utc>, rank: usize) -> Line {
        let data = bucket_starts(start, start + chrono::Duration::days(ys.len() as i64 - 1), TimeUnit::Day)
            .zip(ys)
            .map(|(x, &y)| ChartPoint { x, y })
            .collect();
        Line {
            label: label.to_string(),
            data,
            color: color_for(rank),
        }
    }

    fn bucket_sums(lines: &[Line]) -> BTreeMap<DateTime<Utc>, i64> {
        let mut sums = BTreeMap::new();
        for l in lines {
            for p in &l.data {
                *sums.entry(p.x).or_insert(0) += p.y;
            }
        }
        sums
    }

    #[test]
    fn under_threshold_is_untouched() {
        let start = ymd(2024, 1, 1);
        let lines = vec![line("a", &[1, 2, 3], start, 0), line("b", &[0, 1, 0], start, 1)];
        let capped = cap_data_points(lines.clone(), TimeUnit::Day, start, ymd(2024, 1, 3), 6);
        assert_eq!(capped.lines, lines);
        assert!(capped.others.is_empty());
    }

    #[test]
    fn folds_lowest_ranked_into_others() {
        let start = ymd(2024, 1, 1);
        let end = ymd(2024, 1, 3);
        let lines = vec![
            line("top", &[5, 5, 5], start, 0),
            line("mid", &[1, 2, 3], start, 1),
            line("low", &[0, 1, 0], start, 2),
            line("least", &[1, 0, 0], start, 3),
        ];
        let capped = cap_data_points(lines, TimeUnit::Day, start, end, 6);

        let labels: Vec<_> = capped.lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["top", "mid", "Others"]);
        assert_eq!(capped.others, vec!["least".to_string(), "low".to_string()]);
        let ys: Vec<i64> = capped.lines[2].data.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![1, 1, 0]);
        assert_eq!(capped.lines[2].color, color_for(2));
    }

    #[test]
    fn keeps_at_least_one_real_line() {
        let start = ymd(2024, 1, 1);
        let lines = vec![line("a", &[1, 1], start, 0), line("b", &[2, 2], start, 1)];
        let capped = cap_data_points(lines, TimeUnit::Day, start, ymd(2024, 1, 2), 0);
        assert_eq!(capped.lines.len(), 2);
        assert_eq!(capped.lines[0].label, "a");
        assert_eq!(capped.lines[1].label, OTHERS_LABEL);
        assert_eq!(capped.others, vec!["b".to_string()]);
    }

    #[test]
    fn single_line_is_never_folded() {
        let start = ymd(2024, 1, 1);
        let lines = vec![line("only", &[1, 2, 3], start, 0)];
        let capped = cap_data_points(lines.clone(), TimeUnit::Day, start, ymd(2024, 1, 3), 1);
        assert_eq!(capped.lines, lines);
    }

    #[test]
    fn others_keeps_last_removed_color() {
        let start = ymd(2024, 1, 1);
        let custom = LineColor {
            border_color: "#000000".to_string(),
            background_color: "#00000033".to_string(),
        };
        let mut last_removed = line("second", &[1], start, 1);
        last_removed.color = custom.clone();
        let lines = vec![line("first", &[1], start, 0), last_removed, line("third", &[1], start, 2)];
        let capped = cap_data_points(lines, TimeUnit::Day, start, start, 1);
        assert_eq!(capped.lines.last().unwrap().color, custom);
    }

    proptest! {
        #[test]
        fn folding_conserves_every_bucket(
            rows in prop::collection::vec(prop::collection::vec(-50i64..50, 5), 1..12),
            max_points in 0usize..60,
            accumulated in any::<bool>(),
        ) {
            let start = ymd(2024, 1, 1);
            let end = ymd(2024, 1, 5);
            let lines: Vec<Line> = rows
                .iter()
                .enumerate()
                .map(|(i, ys)| {
                    let mut l = line(&format!("l{i}"), ys, start, i);
                    if accumulated {
                        accumulate(&mut l.data);
                    }
                    l
                })
                .collect();
            let before = bucket_sums(&lines);
            let capped = cap_data_points(lines, TimeUnit::Day, start, end, max_points);
            prop_assert_eq!(before, bucket_sums(&capped.lines));
        }
    }
}
