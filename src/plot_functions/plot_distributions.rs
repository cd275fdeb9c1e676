// src/plot_functions/plot_distributions.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use plotters::style::RGBColor;

use crate::constants::{COLOR_HISTOGRAM, COLOR_TIME_DISTRIBUTION};
use crate::data_input::matrix::format_axis_value;
use crate::error::{PlotError, Result};
use crate::layout::PanelGrid;
use crate::output::OutputFormat;
use crate::plot_framework::{Bar, Figure, Panel};
use crate::plot_functions::panel_builders::save_figure;

const TIME_BAR_WIDTH: f64 = 0.9;
const TIME_DISTRIBUTION_MIN_Y_MAX: f64 = 50.0;
const TIME_DISTRIBUTION_TITLES: [&str; 3] = [
    "All non-wear time",
    "< 60 mins non-wear time",
    ">= 60 mins non-wear time",
];

/// Counts of `data` per bin. Bins are half open except the last, which also takes
/// values equal to the final edge. NaN and out-of-range values are not counted.
pub fn histogram(data: &[f64], edges: &[f64]) -> Result<Vec<usize>> {
    if edges.len() < 2 {
        return Err(PlotError::InvalidConfig(
            "a histogram needs at least two bin edges".to_string(),
        ));
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err(PlotError::InvalidConfig(format!(
            "histogram edges must be finite and increasing: {edges:?}"
        )));
    }
    let bins = edges.len() - 1;
    let (first, last) = (edges[0], edges[bins]);
    let mut counts = vec![0; bins];
    for value in data.iter().copied().filter(|v| *v >= first && *v <= last) {
        let bin = edges.partition_point(|e| *e <= value).saturating_sub(1).min(bins - 1);
        counts[bin] += 1;
    }
    Ok(counts)
}

/// 1, 5, 10, ..., 60 minutes.
pub fn short_episode_edges() -> Vec<f64> {
    std::iter::once(1.0).chain((5..=60u32).step_by(5).map(f64::from)).collect()
}

/// 60, 120, ..., 600 minutes.
pub fn long_episode_edges() -> Vec<f64> {
    (60..=600u32).step_by(60).map(f64::from).collect()
}

fn draw_histogram(panel: &mut Panel, data: &[f64], edges: &[f64], color: RGBColor) -> Result<()> {
    let counts = histogram(data, edges)?;
    for (i, count) in counts.iter().enumerate() {
        panel.bar(Bar::new(edges[i], edges[i + 1], *count as f64, color));
    }
    panel.x_ticks = Some(edges.iter().map(|e| (*e, format_axis_value(*e))).collect());
    panel.set_xlim(edges[0], edges[edges.len() - 1]);
    Ok(())
}

/// Histograms of non-wear episode lengths in minutes: up to an hour, and in hours.
pub fn build_nw_distribution(episode_minutes: &[f64]) -> Result<Figure> {
    let mut figure = Figure::new(PanelGrid::new(1, 2), (1000, 500));
    for (i, (title, edges)) in [("(a)", short_episode_edges()), ("(b)", long_episode_edges())]
        .into_iter()
        .enumerate()
    {
        let panel = figure.panel_mut(i)?;
        panel.title = title.to_string();
        draw_histogram(panel, episode_minutes, &edges, COLOR_HISTOGRAM)?;
        panel.set_labels("Non-wear time episode (mins)", "Frequency");
    }
    Ok(figure)
}

pub fn plot_nw_distribution(
    episode_minutes: &[f64],
    plot_folder: &Path,
    plot_name: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_nw_distribution(episode_minutes)?;
    save_figure(&figure, plot_folder, plot_name, format)
}

/// Non-wear time per starting hour in three panels: all episodes, episodes under an
/// hour, and episodes of an hour or more. Each bar carries its share of the panel total.
pub fn build_time_distribution(hourly: &BTreeMap<u32, [f64; 3]>) -> Result<Figure> {
    if hourly.is_empty() {
        return Err(PlotError::EmptySeries("hourly non-wear time".to_string()));
    }
    let labels: Vec<String> = hourly.keys().map(|hour| format!("{hour}:00")).collect();
    let mut figure = Figure::new(PanelGrid::new(1, 3), (1500, 500));

    for (i, title) in TIME_DISTRIBUTION_TITLES.iter().enumerate() {
        let heights: Vec<f64> = hourly.values().map(|v| v[i]).collect();
        let total: f64 = heights.iter().sum();
        let panel = figure.panel_mut(i)?;
        panel.title = title.to_string();

        for (x, height) in heights.iter().enumerate() {
            let x = x as f64;
            let mut bar = Bar::new(x, x + TIME_BAR_WIDTH, *height, COLOR_TIME_DISTRIBUTION[i]);
            if *height != 0.0 {
                bar = bar.with_value_label(format!(" {:.1} %", height / total * 100.0));
            }
            panel.bar(bar);
        }
        panel.x_ticks = Some(
            labels
                .iter()
                .enumerate()
                .map(|(x, label)| (x as f64, label.clone()))
                .collect(),
        );
        panel.set_xlim(0.0, labels.len() as f64);
        let top = heights.iter().copied().fold(0.0, f64::max);
        panel.set_ylim(0.0, TIME_DISTRIBUTION_MIN_Y_MAX.max(top * 1.1));
        if i == 0 {
            panel.y_label = "Absolute frequency".to_string();
        }
    }
    Ok(figure)
}

pub fn plot_time_distribution(
    hourly: &BTreeMap<u32, [f64; 3]>,
    plot_folder: &Path,
    plot_name: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_time_distribution(hourly)?;
    save_figure(&figure, plot_folder, plot_name, format)
}
