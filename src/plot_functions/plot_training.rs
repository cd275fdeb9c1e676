// src/plot_functions/plot_training.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{
    COLOR_ROC_CURVE, COLOR_ROC_DIAGONAL, LINE_CYCLE, SCENARIO_ACCELERATION_RANGE,
};
use crate::error::{PlotError, Result};
use crate::layout::PanelGrid;
use crate::output::OutputFormat;
use crate::plot_framework::{dash_segments, Figure, LegendPosition, Panel, PlotSeries};
use crate::plot_functions::panel_builders::save_figure;
use crate::types::NamedSeries;

/// Metrics recorded per training epoch; each has a `val_` counterpart.
pub const TRAINING_METRICS: [&str; 6] = ["loss", "accuracy", "precision", "recall", "F1", "auc"];
const METRIC_Y_RANGE: (f64, f64) = (0.8, 1.0);

/// Panels in the small-multiples grid of one label.
const EPISODE_GRID: (usize, usize) = (10, 10);
const COMBINED_COLUMNS: usize = 10;
/// Rows per label in the combined grid.
const COMBINED_ROWS_PER_LABEL: usize = 2;
const COMBINED_LABELS: [(&str, &str); 2] = [("0", "(a) non-wear time"), ("1", "(b) wear time")];

/// Acceleration window used to train the episode classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEpisode {
    pub id: String,
    pub values: Vec<f64>,
}

fn history<'a>(data: &'a NamedSeries, key: &str) -> Result<&'a [f64]> {
    data.get(key)
        .map(Vec::as_slice)
        .ok_or_else(|| PlotError::MissingColumn(key.to_string()))
}

fn per_epoch(values: &[f64]) -> Vec<(f64, f64)> {
    values.iter().enumerate().map(|(i, v)| ((i + 1) as f64, *v)).collect()
}

/// Training and validation curves of every metric over the epochs.
pub fn build_training_results_per_epoch(data: &NamedSeries) -> Result<Figure> {
    let mut figure = Figure::new(PanelGrid::new(2, 3), (1500, 1000));
    for (i, metric) in TRAINING_METRICS.iter().enumerate() {
        let training = history(data, metric)?;
        let validation_key = format!("val_{metric}");
        let validation = history(data, &validation_key)?;
        if training.len() != validation.len() {
            return Err(PlotError::LengthMismatch {
                name: validation_key,
                expected: training.len(),
                found: validation.len(),
            });
        }

        let panel = figure.panel_mut(i)?;
        panel.plot(PlotSeries::new(format!("training {metric}"), per_epoch(training), LINE_CYCLE[0]));
        panel.plot(PlotSeries::new(format!("validation {metric}"), per_epoch(validation), LINE_CYCLE[1]));
        panel.set_xlim(0.0, training.len() as f64);
        if *metric != "loss" {
            panel.set_ylim(METRIC_Y_RANGE.0, METRIC_Y_RANGE.1);
        }
        panel.legend = Some(LegendPosition::UpperRight);
    }
    Ok(figure)
}

pub fn plot_training_results_per_epoch(
    data: &NamedSeries,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_training_results_per_epoch(data)?;
    save_figure(&figure, plot_folder, "cnn_training_results_per_epoch", format)
}

fn draw_episode(panel: &mut Panel, episode: &TrainingEpisode) {
    let points = episode
        .values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i as f64, *v))
        .collect();
    panel.plot(PlotSeries::new("", points, LINE_CYCLE[0]));
    panel.set_ylim(SCENARIO_ACCELERATION_RANGE.0, SCENARIO_ACCELERATION_RANGE.1);
    panel.show_x_axis = false;
    panel.show_y_axis = false;
}

/// Up to 100 training episodes of one label as 10x10 small multiples; further episodes
/// are not drawn.
pub fn build_episodes_used_for_training(episodes: &[TrainingEpisode]) -> Result<Figure> {
    let grid = PanelGrid::new(EPISODE_GRID.0, EPISODE_GRID.1);
    let mut figure = Figure::new(grid, (2000, 2000));
    if episodes.len() > grid.capacity() {
        log::debug!(
            "Drawing {} of {} training episodes",
            grid.capacity(),
            episodes.len()
        );
    }
    for (i, episode) in episodes.iter().take(grid.capacity()).enumerate() {
        draw_episode(figure.panel_mut(i)?, episode);
    }
    let unused: Vec<usize> = (episodes.len().min(grid.capacity())..grid.capacity()).collect();
    figure.hide_panels(&unused)?;
    Ok(figure)
}

/// One image per label, named `episodes_used_for_training_<label>`.
pub fn plot_episodes_used_for_training(
    plot_data: &BTreeMap<String, Vec<TrainingEpisode>>,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<Vec<PathBuf>> {
    plot_data
        .iter()
        .map(|(label, episodes)| {
            let figure = build_episodes_used_for_training(episodes)?;
            save_figure(
                &figure,
                plot_folder,
                &format!("episodes_used_for_training_{label}"),
                format,
            )
        })
        .collect()
}

/// Non-wear episodes (label "0") in the top two rows, wear episodes (label "1") in the
/// bottom two, ten per row.
pub fn build_episodes_used_for_training_combined(
    plot_data: &BTreeMap<String, Vec<TrainingEpisode>>,
) -> Result<Figure> {
    let rows = COMBINED_ROWS_PER_LABEL * COMBINED_LABELS.len();
    let grid = PanelGrid::new(rows, COMBINED_COLUMNS);
    let per_label = COMBINED_ROWS_PER_LABEL * COMBINED_COLUMNS;
    let mut figure = Figure::new(grid, (1800, 1000));
    let mut unused = Vec::new();

    for (block, (label, title)) in COMBINED_LABELS.iter().enumerate() {
        let episodes = plot_data
            .get(*label)
            .ok_or_else(|| PlotError::MissingColumn(label.to_string()))?;
        let first = block * per_label;
        for slot in 0..per_label {
            let index = first + slot;
            let Some(episode) = episodes.get(slot) else {
                unused.push(index);
                continue;
            };
            let panel = figure.panel_mut(index)?;
            draw_episode(panel, episode);
            let (row, column) = (index / COMBINED_COLUMNS, index % COMBINED_COLUMNS);
            if column == 0 {
                panel.show_y_axis = true;
                panel.y_label = "acceleration (g)".to_string();
            }
            if (row + 1) % COMBINED_ROWS_PER_LABEL == 0 {
                panel.show_x_axis = true;
                panel.x_label = "time (ms)".to_string();
            }
            if slot == 0 {
                panel.title = title.to_string();
            }
        }
    }
    figure.hide_panels(&unused)?;
    Ok(figure)
}

pub fn plot_episodes_used_for_training_combined(
    plot_data: &BTreeMap<String, Vec<TrainingEpisode>>,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_episodes_used_for_training_combined(plot_data)?;
    save_figure(&figure, plot_folder, "episodes_used_for_training", format)
}

/// ROC curve with the chance diagonal; the legend carries the area under the curve.
pub fn build_roc_curve(fpr: &[f64], tpr: &[f64], auc: f64) -> Result<Figure> {
    if fpr.len() != tpr.len() {
        return Err(PlotError::LengthMismatch {
            name: "true positive rate".to_string(),
            expected: fpr.len(),
            found: tpr.len(),
        });
    }
    if fpr.is_empty() {
        return Err(PlotError::EmptySeries("false positive rate".to_string()));
    }

    let mut figure = Figure::new(PanelGrid::new(1, 1), (640, 480));
    let panel = figure.panel_mut(0)?;
    panel.title = "Receiver operating characteristic".to_string();
    let curve = fpr.iter().copied().zip(tpr.iter().copied()).collect();
    panel.plot(
        PlotSeries::new(format!("ROC curve (area = {auc:.2})"), curve, COLOR_ROC_CURVE)
            .with_stroke_width(2),
    );
    for dash in dash_segments((0.0, 0.0), (1.0, 1.0)) {
        panel.plot(PlotSeries::new("", dash, COLOR_ROC_DIAGONAL).with_stroke_width(2));
    }
    panel.set_xlim(0.0, 1.0);
    panel.set_ylim(0.0, 1.05);
    panel.set_labels("False Positive Rate", "True Positive Rate");
    panel.legend = Some(LegendPosition::LowerRight);
    Ok(figure)
}

pub fn plot_roc_curve(
    fpr: &[f64],
    tpr: &[f64],
    auc: f64,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_roc_curve(fpr, tpr, auc)?;
    save_figure(&figure, plot_folder, "roc_curve", format)
}
