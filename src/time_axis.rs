// src/time_axis.rs

//! Time axis handling: timestamps are plotted as seconds since the Unix epoch, read as
//! naive (wall-clock) time so hour boundaries fall on whole hours.

use chrono::{DateTime, NaiveDateTime};
use std::ops::Range;

use crate::plot_framework::{LegendPosition, Panel};
use crate::types::TickLabels;

const SECONDS_PER_HOUR: f64 = 3600.0;

pub fn to_plot_x(timestamp: NaiveDateTime) -> f64 {
    timestamp.and_utc().timestamp_millis() as f64 / 1000.0
}

pub fn from_plot_x(x: f64) -> Option<NaiveDateTime> {
    let millis = (x * 1000.0).round() as i64;
    DateTime::from_timestamp(millis.div_euclid(1000), (millis.rem_euclid(1000) * 1_000_000) as u32)
        .map(|dt| dt.naive_utc())
}

/// Formats an x coordinate with a strftime pattern.
pub fn format_time_label(x: f64, pattern: &str) -> String {
    from_plot_x(x)
        .map(|t| t.format(pattern).to_string())
        .unwrap_or_default()
}

/// "2016-03-01 Tuesday" style day title.
pub fn day_title(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %A").to_string()
}

/// Major tick locator/formatter for time panels.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxisFormat {
    pub interval_hours: u32,
    pub label_format: String,
    pub legend: Option<LegendPosition>,
}

impl Default for TimeAxisFormat {
    fn default() -> Self {
        Self {
            interval_hours: 1,
            label_format: "%H:%M".to_string(),
            legend: Some(LegendPosition::UpperRight),
        }
    }
}

impl TimeAxisFormat {
    pub fn with_legend(mut self, legend: Option<LegendPosition>) -> Self {
        self.legend = legend;
        self
    }

    pub fn with_label_format(mut self, label_format: &str) -> Self {
        self.label_format = label_format.to_string();
        self
    }
}

/// Ticks on every `interval_hours` boundary within `range`, both ends inclusive.
pub fn hour_ticks(range: &Range<f64>, interval_hours: u32, label_format: &str) -> TickLabels {
    let step = SECONDS_PER_HOUR * f64::from(interval_hours.max(1));
    if !range.start.is_finite() || !range.end.is_finite() || range.end < range.start {
        return Vec::new();
    }
    let mut ticks = Vec::new();
    let mut tick = (range.start / step).ceil() * step;
    while tick <= range.end {
        ticks.push((tick, format_time_label(tick, label_format)));
        tick += step;
    }
    ticks
}

/// Applies uniform time-axis formatting to every visible panel: x range pinned to the
/// data extent (no horizontal margin), hour ticks, legend position.
///
/// The result depends only on each panel's content, so running the pass again, or
/// before/after other panels are drawn, yields the same ticks.
pub fn format_time_panels(panels: &mut [Panel], format: &TimeAxisFormat) {
    for panel in panels.iter_mut().filter(|p| p.visible) {
        let Some(range) = panel.x_extent() else {
            continue;
        };
        panel.x_ticks = Some(hour_ticks(&range, format.interval_hours, &format.label_format));
        panel.x_range = Some(range);
        panel.legend = format.legend;
    }
}
