use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use egui_plot::{Line, PlotPoints};

use crate::models::{BodyMetric, RECORDED_AT_FORMAT};

/// Which body metric value to plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSeries {
    Weight,
    BodyFat,
}

impl MetricSeries {
    pub fn name(self) -> &'static str {
        match self {
            MetricSeries::Weight => "体重 (kg)",
            MetricSeries::BodyFat => "体脂肪率 (%)",
        }
    }
}

/// X coordinate of a timestamp: days since the common era plus the fraction
/// of the day.
fn x_value(dt: NaiveDateTime) -> f64 {
    let day = f64::from(dt.date().num_days_from_ce());
    day + f64::from(dt.time().num_seconds_from_midnight()) / 86_400.0
}

/// Points for one metric series in chronological order.
///
/// Metrics with an unparseable timestamp are skipped.
pub fn metric_points(metrics: &[BodyMetric], series: MetricSeries) -> Vec<[f64; 2]> {
    let mut points: Vec<[f64; 2]> = metrics
        .iter()
        .filter_map(|m| {
            let dt = NaiveDateTime::parse_from_str(&m.recorded_at, RECORDED_AT_FORMAT).ok()?;
            let y = match series {
                MetricSeries::Weight => m.weight,
                MetricSeries::BodyFat => m.body_fat_pct,
            };
            Some([x_value(dt), y])
        })
        .collect();
    points.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(std::cmp::Ordering::Equal));
    points
}

pub fn metric_line(metrics: &[BodyMetric], series: MetricSeries) -> Line {
    Line::new(PlotPoints::from(metric_points(metrics, series))).name(series.name())
}

/// Axis label for an x value produced by [`metric_points`].
pub fn date_axis_label(value: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.floor() as i32)
        .map(|d| format!("{}/{}", d.month(), d.day()))
        .unwrap_or_else(|| format!("{:.0}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(weight: f64, fat: f64, recorded_at: &str) -> BodyMetric {
        BodyMetric {
            id: recorded_at.into(),
            weight,
            body_fat_pct: fat,
            recorded_at: recorded_at.into(),
        }
    }

    #[test]
    fn points_are_chronological_and_skip_bad_timestamps() {
        let metrics = vec![
            metric(70.0, 15.0, "2026-02-23 07:00"),
            metric(71.0, 15.5, "2026-02-20 19:00"),
            metric(99.0, 99.0, "yesterday"),
        ];
        let weights = metric_points(&metrics, MetricSeries::Weight);
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0][1], 71.0);
        assert_eq!(weights[1][1], 70.0);
        assert!(weights[0][0] < weights[1][0]);

        let fat = metric_points(&metrics, MetricSeries::BodyFat);
        assert_eq!(fat[0][1], 15.5);
    }

    #[test]
    fn axis_label_shows_month_and_day() {
        let metrics = vec![metric(70.0, 15.0, "2026-02-23 18:00")];
        let x = metric_points(&metrics, MetricSeries::Weight)[0][0];
        assert_eq!(date_axis_label(x), "2/23");
    }
}
