// src/plot_functions/plot_heatmaps.rs

use std::path::{Path, PathBuf};

use colorous::Gradient;

use crate::constants::{PLOT_HEIGHT, PLOT_WIDTH};
use crate::data_input::matrix::LabelledMatrix;
use crate::error::{PlotError, Result};
use crate::layout::{allocate_panels, Arrangement, PanelGrid};
use crate::output::{OutputFormat, OutputTarget};
use crate::plot_framework::{contrasting_text_color, scale_color, Figure, HeatCell, Panel};
use crate::plot_functions::panel_builders::save_figure;

/// Color scale and labelling of an annotated heatmap.
#[derive(Clone, Copy)]
pub struct HeatmapStyle {
    pub gradient: Gradient,
    pub value_range: (f64, f64),
    pub reversed: bool,
    /// Significant digits of the cell annotations.
    pub significant_digits: usize,
}

impl HeatmapStyle {
    pub fn new(gradient: Gradient, value_range: (f64, f64)) -> Self {
        Self {
            gradient,
            value_range,
            reversed: false,
            significant_digits: 3,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

/// One titled table of a heatmap grid.
#[derive(Clone)]
pub struct HeatmapTable {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub matrix: LabelledMatrix,
    pub style: HeatmapStyle,
}

impl HeatmapTable {
    pub fn new(title: impl Into<String>, matrix: LabelledMatrix, style: HeatmapStyle) -> Self {
        Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            matrix,
            style,
        }
    }

    pub fn with_labels(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
        self
    }
}

/// `printf`-style `%.{digits}g`: fixed notation for moderate exponents, scientific
/// otherwise, trailing zeros removed.
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Fills `panel` with one cell per matrix entry. Row 0 is drawn at the top; NaN cells
/// are left white without annotation.
pub fn draw_heatmap(panel: &mut Panel, table: &HeatmapTable) {
    let matrix = &table.matrix;
    let style = &table.style;
    let (rows, columns) = matrix.values.dim();
    let (min, max) = style.value_range;

    for ((row, column), value) in matrix.values.indexed_iter() {
        let color = scale_color(style.gradient, *value, min, max, style.reversed);
        let annotation = match &matrix.annotations {
            Some(text) => Some(text[[row, column]].clone()).filter(|t| !t.is_empty()),
            None if value.is_nan() => None,
            None => Some(format_significant(*value, style.significant_digits)),
        };
        let top = (rows - row) as f64;
        panel.cell(HeatCell {
            x: column as f64..(column + 1) as f64,
            y: top - 1.0..top,
            color,
            annotation,
            text_color: contrasting_text_color(color),
        });
    }

    panel.x_ticks = Some(
        matrix
            .column_labels
            .iter()
            .enumerate()
            .map(|(j, label)| (j as f64 + 0.5, label.clone()))
            .collect(),
    );
    panel.y_ticks = Some(
        matrix
            .row_labels
            .iter()
            .enumerate()
            .map(|(i, label)| ((rows - i) as f64 - 0.5, label.clone()))
            .collect(),
    );
    panel.title = table.title.clone();
    panel.set_xlim(0.0, columns as f64);
    panel.set_ylim(0.0, rows as f64);
    panel.set_labels(table.x_label.clone(), table.y_label.clone());
}

/// Lays `tables` out on `grid` in reading order; unused panels are hidden.
pub fn build_heatmap_grid(tables: &[HeatmapTable], grid: PanelGrid, size: (u32, u32)) -> Result<Figure> {
    let allocation = allocate_panels(tables.len(), grid, Arrangement::one_per_group())?;
    let mut figure = Figure::new(grid, size);
    for (group, table) in tables.iter().enumerate() {
        draw_heatmap(figure.panel_mut(allocation.groups[group][0])?, table);
    }
    figure.hide_panels(&allocation.unused)?;
    log::debug!("Heatmap grid with {} tables on {}x{}", tables.len(), grid.rows, grid.columns);
    Ok(figure)
}

pub fn plot_heatmap_grid(
    tables: &[HeatmapTable],
    grid: PanelGrid,
    size: (u32, u32),
    target: &OutputTarget,
) -> Result<PathBuf> {
    build_heatmap_grid(tables, grid, size)?.save(target)
}

/// Deviation from the default Hecht (2009) parameters; `matrix` annotations carry the
/// significance marks.
pub fn build_sensitivity_analysis(matrix: &LabelledMatrix, n: usize) -> Result<Figure> {
    let title = format!(
        "Average non-wear time deviation in mins/day compared to default Hecht (2009) values \
         (n={n}, * = p<0.05, \u{2020} = p<0.01, \u{2021} = p<0.001)"
    );
    let table = HeatmapTable::new(title, matrix.clone(), HeatmapStyle::new(colorous::RED_BLUE, (-300.0, 300.0)))
        .with_labels("Threshold (VMU)", "Time Interval (mins)");
    build_heatmap_grid(&[table], PanelGrid::new(1, 1), (PLOT_WIDTH, PLOT_HEIGHT))
}

/// Saved under a timestamped name so repeated runs never overwrite each other.
pub fn plot_sensitivity_analysis(
    matrix: &LabelledMatrix,
    n: usize,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_sensitivity_analysis(matrix, n)?;
    figure.save(&OutputTarget::timestamped(plot_folder, "sensitivity-analysis", format))
}

/// Classification accuracy per CNN architecture, window size by sampling.
pub fn build_cnn_classification_performance(tables: &[(String, LabelledMatrix)]) -> Result<Figure> {
    let style = HeatmapStyle::new(colorous::BLUES, (0.9, 1.0));
    let tables: Vec<HeatmapTable> = tables
        .iter()
        .map(|(architecture, matrix)| {
            HeatmapTable::new(format!("CNN architecture {architecture}"), matrix.clone(), style)
                .with_labels("window size (sec)", "")
        })
        .collect();
    build_heatmap_grid(&tables, PanelGrid::new(2, 2), (1200, 1600))
}

pub fn plot_cnn_classification_performance(
    tables: &[(String, LabelledMatrix)],
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_cnn_classification_performance(tables)?;
    save_figure(&figure, plot_folder, "cnn_classification_performance", format)
}

/// Baseline method performance. Each table is scaled from the mean of its column
/// means to its maximum, then missing cells are shown as zero.
pub fn build_baseline_performance(tables: &[(String, LabelledMatrix)]) -> Result<Figure> {
    let mut heatmaps = Vec::with_capacity(tables.len());
    for (classification, matrix) in tables {
        let (Some(vmin), Some((_, vmax))) = (matrix.mean_of_column_means(), matrix.value_range()) else {
            return Err(PlotError::EmptySeries(classification.clone()));
        };
        heatmaps.push(
            HeatmapTable::new(
                classification.clone(),
                matrix.clone().fill_nan(0.0),
                HeatmapStyle::new(colorous::BLUES, (vmin, vmax)),
            )
            .with_labels("minimum interval length (min)", "standard deviation threshold (mg)"),
        );
    }
    build_heatmap_grid(&heatmaps, PanelGrid::new(2, 2), (1200, 900))
}

pub fn plot_baseline_performance(
    tables: &[(String, LabelledMatrix)],
    plot_name: &str,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_baseline_performance(tables)?;
    save_figure(&figure, plot_folder, &format!("baseline_performance_{plot_name}"), format)
}

/// Performance of the CNN non-wear method against the baselines.
pub fn build_performance_cnn_nw_method(matrix: &LabelledMatrix) -> Result<Figure> {
    let table = HeatmapTable::new("", matrix.clone(), HeatmapStyle::new(colorous::BLUES, (0.95, 1.0)));
    build_heatmap_grid(&[table], PanelGrid::new(1, 1), (1000, 600))
}

pub fn plot_performance_cnn_nw_method(
    matrix: &LabelledMatrix,
    plot_folder: &Path,
    format: OutputFormat,
) -> Result<PathBuf> {
    let figure = build_performance_cnn_nw_method(matrix)?;
    save_figure(&figure, plot_folder, "cnn_nw_performance", format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn matrix() -> LabelledMatrix {
        LabelledMatrix::new(
            labels(&["30", "60"]),
            labels(&["1", "2", "3"]),
            array![[0.91, 0.95, f64::NAN], [0.99, 1.0, 0.9234]],
        )
        .unwrap()
    }

    #[test]
    fn test_format_significant() {
        assert_eq!(format_significant(0.9523, 3), "0.952");
        assert_eq!(format_significant(0.95, 3), "0.95");
        assert_eq!(format_significant(1.0, 3), "1");
        assert_eq!(format_significant(123.4, 3), "123");
        assert_eq!(format_significant(-250.0, 3), "-250");
        assert_eq!(format_significant(12345.0, 3), "1.23e+04");
        assert_eq!(format_significant(0.00001234, 3), "1.23e-05");
        assert_eq!(format_significant(999.7, 3), "1e+03");
        assert_eq!(format_significant(0.0, 3), "0");
    }

    #[test]
    fn test_cells_put_first_row_on_top() {
        let mut panel = Panel::default();
        let table = HeatmapTable::new("t", matrix(), HeatmapStyle::new(colorous::BLUES, (0.9, 1.0)));
        draw_heatmap(&mut panel, &table);

        assert_eq!(panel.cells.len(), 6);
        let first = &panel.cells[0];
        assert_eq!(first.x, 0.0..1.0);
        assert_eq!(first.y, 1.0..2.0);
        assert_eq!(first.annotation.as_deref(), Some("0.91"));

        let missing = &panel.cells[2];
        assert_eq!(missing.annotation, None);
        assert_eq!(missing.color, plotters::style::RGBColor(255, 255, 255));

        assert_eq!(panel.cells[5].annotation.as_deref(), Some("0.923"));
        assert_eq!(panel.y_ticks.as_ref().unwrap()[0], (1.5, "30".to_string()));
        assert_eq!(panel.x_ticks.as_ref().unwrap()[2], (2.5, "3".to_string()));
        assert_eq!(panel.x_range, Some(0.0..3.0));
    }

    #[test]
    fn test_annotations_override_values() {
        let marks = Array2::from_shape_vec(
            (2, 3),
            labels(&["-12*", "3", "", "40\u{2021}", "0", "7"]),
        )
        .unwrap();
        let annotated = matrix().with_annotations(marks).unwrap();
        let figure = build_sensitivity_analysis(&annotated, 25).unwrap();
        let panel = &figure.panels()[0];
        assert!(panel.title.contains("(n=25,"));
        assert_eq!(panel.cells[0].annotation.as_deref(), Some("-12*"));
        assert_eq!(panel.cells[2].annotation, None);
        assert_eq!(panel.x_label, "Threshold (VMU)");
    }

    #[test]
    fn test_grid_hides_unused_and_rejects_overflow() {
        let tables: Vec<_> = ["A", "B", "C"]
            .iter()
            .map(|t| (t.to_string(), matrix()))
            .collect();
        let figure = build_cnn_classification_performance(&tables).unwrap();
        assert_eq!(figure.visible_panel_count(), 3);
        assert_eq!(figure.panels()[1].title, "CNN architecture B");

        let five: Vec<_> = (0..5).map(|i| (i.to_string(), matrix())).collect();
        assert!(matches!(
            build_cnn_classification_performance(&five),
            Err(PlotError::GridCapacity { required: 5, capacity: 4 })
        ));
    }

    #[test]
    fn test_baseline_scale_uses_mean_before_filling() {
        let tables = vec![("accuracy".to_string(), matrix())];
        let figure = build_baseline_performance(&tables).unwrap();
        let panel = &figure.panels()[0];
        // NaN cell is filled with zero and annotated.
        assert_eq!(panel.cells[2].annotation.as_deref(), Some("0"));

        let empty = LabelledMatrix::new(labels(&["a"]), labels(&["b"]), array![[f64::NAN]]).unwrap();
        assert!(matches!(
            build_baseline_performance(&[("f1".to_string(), empty)]),
            Err(PlotError::EmptySeries(name)) if name == "f1"
        ));
    }
}
