// src/plot_functions/plot_classification.rs

use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{
    BAR_OPACITY, COLOR_BAR_PRIMARY, COLOR_BAR_SECONDARY, DEFAULT_CI_SAMPLE_SIZE, SCORE_RANGE, Z_95,
};
use crate::data_input::matrix::format_axis_value;
use crate::error::{PlotError, Result};
use crate::layout::PanelGrid;
use crate::output::OutputFormat;
use crate::plot_framework::{Bar, Figure, LegendPosition, LineStyle, Panel};
use crate::plot_functions::panel_builders::save_figure;

/// Bar width; the second bar of a pair starts where the first ends.
const BAR_WIDTH: f64 = 0.4;
/// Upper y limit of the 4x4 comparison, leaving room for labels above the error bars.
const COMPARISON_ALL_Y_MAX: f64 = 1.19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Accuracy,
    Precision,
    Recall,
    F1,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Accuracy, Metric::Precision, Metric::Recall, Metric::F1];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::F1 => "f1",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per classification metric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricScores {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl MetricScores {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Accuracy => self.accuracy,
            Metric::Precision => self.precision,
            Metric::Recall => self.recall,
            Metric::F1 => self.f1,
        }
    }

    /// 95 % confidence half-width of every score.
    pub fn confidence_intervals(&self, n: usize) -> Result<MetricScores> {
        Ok(MetricScores {
            accuracy: confidence_interval(self.accuracy, n)?,
            precision: confidence_interval(self.precision, n)?,
            recall: confidence_interval(self.recall, n)?,
            f1: confidence_interval(self.f1, n)?,
        })
    }
}

/// Normal-approximation 95 % interval half-width of a proportion `p` over `n` samples.
pub fn confidence_interval(p: f64, n: usize) -> Result<f64> {
    if n == 0 {
        return Err(PlotError::InvalidConfig(
            "confidence interval sample size must be positive".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(PlotError::InvalidData(format!(
            "score {p} is not a proportion"
        )));
    }
    Ok(Z_95 * (p * (1.0 - p) / n as f64).sqrt())
}

/// Scores of one non-wear method with their confidence half-widths.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodPerformance {
    pub method: String,
    pub scores: MetricScores,
    pub ci: MetricScores,
}

/// Default versus optimized value of one metric for each method.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceComparison {
    pub title: String,
    /// (method, default, optimized)
    pub methods: Vec<(String, f64, f64)>,
}

/// Scores of one method when its parameters are optimized for each metric in turn.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationComparison {
    pub method: String,
    /// (metric optimized for, default scores, optimized scores)
    pub optimized_for: Vec<(Metric, MetricScores, MetricScores)>,
}

fn bar_pair(
    panel: &mut Panel,
    x: f64,
    (first, first_error): (f64, Option<f64>),
    (second, second_error): (f64, Option<f64>),
) {
    for (offset, height, error, color) in [
        (0.0, first, first_error, COLOR_BAR_PRIMARY),
        (BAR_WIDTH, second, second_error, COLOR_BAR_SECONDARY),
    ] {
        let center = x + offset;
        let mut bar = Bar::new(center - BAR_WIDTH / 2.0, center + BAR_WIDTH / 2.0, height, color)
            .with_opacity(BAR_OPACITY)
            .with_value_label(format_axis_value((height * 1000.0).round() / 1000.0));
        if let Some(error) = error {
            bar = bar.with_error(error);
        }
        panel.bar(bar);
    }
}

/// Category ticks between the two bars of each pair.
fn pair_ticks(panel: &mut Panel, labels: &[String]) {
    panel.x_ticks = Some(
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| (i as f64 + BAR_WIDTH / 2.0, label.clone()))
            .collect(),
    );
    let last = labels.len().max(1) as f64 - 1.0;
    panel.set_xlim(-0.5, last + BAR_WIDTH + 0.5);
    panel.y_grid = Some(LineStyle::Dashed);
}

fn legend_patches(panel: &mut Panel, first: &str, second: &str, position: LegendPosition) {
    panel.legend_patch(first, COLOR_BAR_PRIMARY);
    panel.legend_patch(second, COLOR_BAR_SECONDARY);
    panel.legend = Some(position);
}

/// One panel per metric with each method's score on all data next to its score on
/// 07:00 - 23:00 data only.
pub fn build_classification_results(
    all_data: &[MethodPerformance],
    filtered: &[MethodPerformance],
) -> Result<Figure> {
    if all_data.len() != filtered.len() {
        return Err(PlotError::LengthMismatch {
            name: "filtered classification results".to_string(),
            expected: all_data.len(),
            found: filtered.len(),
        });
    }
    if let Some((a, b)) = all_data.iter().zip(filtered).find(|(a, b)| a.method != b.method) {
        return Err(PlotError::InvalidData(format!(
            "method order differs: '{}' against '{}'",
            a.method, b.method
        )));
    }
    if all_data.is_empty() {
        return Err(PlotError::EmptySeries("classification results".to_string()));
    }

    let methods: Vec<String> = all_data.iter().map(|m| m.method.clone()).collect();
    let mut figure = Figure::new(PanelGrid::new(1, Metric::ALL.len()), (1400, 400));
    for (i, metric) in Metric::ALL.iter().enumerate() {
        let panel = figure.panel_mut(i)?;
        panel.title = metric.to_string();
        for (x, (all, part)) in all_data.iter().zip(filtered).enumerate() {
            bar_pair(
                panel,
                x as f64,
                (all.scores.get(*metric), Some(all.ci.get(*metric))),
                (part.scores.get(*metric), Some(part.ci.get(*metric))),
            );
        }
        pair_ticks(panel, &methods);
        panel.set_ylim(SCORE_RANGE.0, SCORE_RANGE.1);
        if i == 0 {
            panel.y_label = "score".to_string();
        }
    }
    legend_patches(figure.panel_mut(1)?, "all data", "07:00 - 23:00", LegendPosition::UpperRight);
    Ok(figure)
}

pub fn plot_classification_results(
    all_data: &[MethodPerformance],
    filtered: &[MethodPerformance],
    plot_folder: &Path,
    plot_name: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_classification_results(all_data, filtered)?;
    save_figure(&figure, plot_folder, plot_name, format)
}

/// Default against optimized parameters, one panel per comparison.
pub fn build_classification_results_comparison(comparisons: &[PerformanceComparison]) -> Result<Figure> {
    let grid = PanelGrid::new(1, 4);
    if comparisons.len() > grid.capacity() {
        return Err(PlotError::GridCapacity {
            required: comparisons.len(),
            capacity: grid.capacity(),
        });
    }
    let mut figure = Figure::new(grid, (1400, 400));
    for (i, comparison) in comparisons.iter().enumerate() {
        let panel = figure.panel_mut(i)?;
        panel.title = comparison.title.clone();
        for (x, (_, default, optimized)) in comparison.methods.iter().enumerate() {
            bar_pair(panel, x as f64, (*default, None), (*optimized, None));
        }
        let labels: Vec<String> = comparison.methods.iter().map(|m| m.0.clone()).collect();
        pair_ticks(panel, &labels);
        panel.set_ylim(SCORE_RANGE.0, SCORE_RANGE.1);
        if i == 0 {
            panel.y_label = "score".to_string();
        }
    }
    let unused: Vec<usize> = (comparisons.len()..grid.capacity()).collect();
    figure.hide_panels(&unused)?;
    if !comparisons.is_empty() {
        let legend_panel = if comparisons.len() > 1 { 1 } else { 0 };
        legend_patches(figure.panel_mut(legend_panel)?, "default", "optimized", LegendPosition::UpperLeft);
    }
    Ok(figure)
}

pub fn plot_classification_results_comparison(
    comparisons: &[PerformanceComparison],
    plot_folder: &Path,
    plot_name: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_classification_results_comparison(comparisons)?;
    save_figure(&figure, plot_folder, plot_name, format)
}

/// 4x4 grid: one row per method, one panel per optimization target, bars for all four
/// metrics with 95 % confidence intervals over `sample_size` samples. The panel of
/// method `row` optimized for target `item` is `row * 4 + item`.
pub fn build_classification_results_comparison_all(
    comparisons: &[OptimizationComparison],
    sample_size: usize,
) -> Result<Figure> {
    let grid = PanelGrid::new(4, 4);
    let metric_labels: Vec<String> = Metric::ALL.iter().map(|m| m.to_string()).collect();
    if comparisons.len() > grid.rows {
        return Err(PlotError::GridCapacity {
            required: comparisons.len() * grid.columns,
            capacity: grid.capacity(),
        });
    }
    let mut figure = Figure::new(grid, (1400, 1200));
    let mut used = vec![false; grid.capacity()];

    for (row, comparison) in comparisons.iter().enumerate() {
        if comparison.optimized_for.len() > grid.columns {
            return Err(PlotError::GridCapacity {
                required: comparison.optimized_for.len(),
                capacity: grid.columns,
            });
        }
        for (item, (target, default, optimized)) in comparison.optimized_for.iter().enumerate() {
            let index = row * grid.columns + item;
            let default_ci = default.confidence_intervals(sample_size)?;
            let optimized_ci = optimized.confidence_intervals(sample_size)?;
            let panel = figure.panel_mut(index)?;
            panel.title = format!("{} - Optimized for {}", comparison.method, target);
            for (x, metric) in Metric::ALL.iter().enumerate() {
                bar_pair(
                    panel,
                    x as f64,
                    (default.get(*metric), Some(default_ci.get(*metric))),
                    (optimized.get(*metric), Some(optimized_ci.get(*metric))),
                );
            }
            pair_ticks(panel, &metric_labels);
            panel.set_ylim(0.0, COMPARISON_ALL_Y_MAX);
            if item == 0 {
                panel.y_label = "score".to_string();
                legend_patches(panel, "default", "optimized", LegendPosition::UpperRight);
            }
            used[index] = true;
        }
    }
    let unused: Vec<usize> = (0..grid.capacity()).filter(|i| !used[*i]).collect();
    figure.hide_panels(&unused)?;
    Ok(figure)
}

pub fn plot_classification_results_comparison_all(
    comparisons: &[OptimizationComparison],
    sample_size: Option<usize>,
    plot_folder: &Path,
    plot_name: &str,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_classification_results_comparison_all(
        comparisons,
        sample_size.unwrap_or(DEFAULT_CI_SAMPLE_SIZE),
    )?;
    save_figure(&figure, plot_folder, plot_name, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(base: f64) -> MetricScores {
        MetricScores {
            accuracy: base,
            precision: base - 0.1,
            recall: base - 0.2,
            f1: base - 0.3,
        }
    }

    fn performance(method: &str, base: f64) -> MethodPerformance {
        MethodPerformance {
            method: method.to_string(),
            scores: scores(base),
            ci: MetricScores {
                accuracy: 0.01,
                precision: 0.02,
                recall: 0.03,
                f1: 0.04,
            },
        }
    }

    #[test]
    fn test_confidence_interval() {
        let ci = confidence_interval(0.9, DEFAULT_CI_SAMPLE_SIZE).unwrap();
        let expected = 1.96 * (0.9_f64 * 0.1 / 583.0).sqrt();
        assert!((ci - expected).abs() < 1e-12);
        assert_eq!(confidence_interval(1.0, 10).unwrap(), 0.0);
        assert!(matches!(confidence_interval(0.5, 0), Err(PlotError::InvalidConfig(_))));
        assert!(confidence_interval(1.2, 10).is_err());
    }

    #[test]
    fn test_results_bars_are_paired() {
        let all = vec![performance("hecht", 0.95), performance("choi", 0.9)];
        let filtered = vec![performance("hecht", 0.97), performance("choi", 0.92)];
        let figure = build_classification_results(&all, &filtered).unwrap();
        assert_eq!(figure.panels().len(), 4);

        let precision = figure.panel(1).unwrap();
        assert_eq!(precision.title, "precision");
        assert_eq!(precision.bars.len(), 4);
        let (a, b) = (&precision.bars[0], &precision.bars[1]);
        assert!((a.center() - 0.0).abs() < 1e-12);
        assert!((b.center() - 0.4).abs() < 1e-12);
        assert!((a.height - 0.85).abs() < 1e-12);
        assert_eq!(a.error, Some(0.02));
        assert_eq!(b.value_label.as_deref(), Some("0.87"));
        let (tick, label) = &precision.x_ticks.as_ref().unwrap()[1];
        assert!((tick - 1.2).abs() < 1e-12);
        assert_eq!(label, "choi");
        let patches: Vec<_> = precision.legend_patches.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(patches, ["all data", "07:00 - 23:00"]);
        assert_eq!(figure.panel(0).unwrap().y_label, "score");
    }

    #[test]
    fn test_results_require_matching_methods() {
        let all = vec![performance("hecht", 0.95)];
        let other = vec![performance("choi", 0.95)];
        assert!(matches!(
            build_classification_results(&all, &other),
            Err(PlotError::InvalidData(_))
        ));
        assert!(matches!(
            build_classification_results(&all, &[]),
            Err(PlotError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_comparison_hides_unused_panels() {
        let comparison = PerformanceComparison {
            title: "accuracy".to_string(),
            methods: vec![("hecht".to_string(), 0.8, 0.9)],
        };
        let figure = build_classification_results_comparison(&[comparison.clone()]).unwrap();
        assert_eq!(figure.visible_panel_count(), 1);
        let only = figure.panel(0).unwrap();
        assert!(only.bars[0].error.is_none());
        assert_eq!(only.legend, Some(LegendPosition::UpperLeft));
        assert_eq!(only.legend_patches.len(), 2);

        let figure = build_classification_results_comparison(&[comparison.clone(), comparison]).unwrap();
        assert!(figure.panel(0).unwrap().legend.is_none());
        assert_eq!(figure.panel(1).unwrap().legend, Some(LegendPosition::UpperLeft));

        let figure = build_classification_results_comparison(&[]).unwrap();
        assert_eq!(figure.visible_panel_count(), 0);
    }

    #[test]
    fn test_bar_panels_use_dashed_y_grid() {
        let all = vec![performance("hecht", 0.95)];
        let figure = build_classification_results(&all, &all).unwrap();
        assert!(figure.panels().iter().all(|p| p.y_grid == Some(LineStyle::Dashed)));

        let comparison = PerformanceComparison {
            title: "f1".to_string(),
            methods: vec![("choi".to_string(), 0.7, 0.8)],
        };
        let figure = build_classification_results_comparison(&[comparison]).unwrap();
        assert_eq!(figure.panel(0).unwrap().y_grid, Some(LineStyle::Dashed));
    }

    #[test]
    fn test_comparison_all_places_row_by_method() {
        let comparisons: Vec<OptimizationComparison> = ["hecht", "troiano"]
            .iter()
            .map(|method| OptimizationComparison {
                method: method.to_string(),
                optimized_for: Metric::ALL
                    .iter()
                    .map(|m| (*m, scores(0.9), scores(0.95)))
                    .collect(),
            })
            .collect();
        let figure = build_classification_results_comparison_all(&comparisons, 100).unwrap();
        let panel = figure.panel(6).unwrap();
        assert_eq!(panel.title, "troiano - Optimized for recall");
        assert_eq!(panel.y_range, Some(0.0..1.19));
        let expected_ci = confidence_interval(0.9, 100).unwrap();
        assert!((panel.bars[0].error.unwrap() - expected_ci).abs() < 1e-12);
        assert!(figure.panel(4).unwrap().legend.is_some());
        assert!(figure.panel(5).unwrap().legend.is_none());
        assert_eq!(figure.visible_panel_count(), 8);
    }
}
