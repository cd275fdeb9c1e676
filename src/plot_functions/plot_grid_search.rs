// src/plot_functions/plot_grid_search.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::PlotParameters;
use crate::constants::{
    COLOR_OPTIMUM, COLOR_REFERENCE_LINE, FONT_SIZE_CONTOUR_LABEL, LINE_WIDTH_CONTOUR,
    MARKER_SIZE_OPTIMUM, REFERENCE_LINE_OPACITY,
};
use crate::contour::{iso_lines, ContourLevels};
use crate::data_input::matrix::{format_axis_value, GridSearchMatrix};
use crate::error::{PlotError, Result};
use crate::layout::{allocate_panels, Arrangement};
use crate::plot_framework::{
    scale_color, Figure, LineStyle, Panel, PlotSeries, ReferenceLine, ScatterSeries,
    TextAnnotation,
};
use crate::plot_functions::panel_builders::{save_figure, title_case};
use crate::types::XYSeries;

/// Level intervals across the value range of one matrix.
const CONTOUR_LEVEL_BINS: usize = 8;

/// Splits a "<x>_<y>" combination key into its axis names.
pub fn split_combination(combination: &str) -> Result<(&str, &str)> {
    match combination.split('_').collect::<Vec<_>>().as_slice() {
        [x, y] if !x.is_empty() && !y.is_empty() => Ok((*x, *y)),
        _ => Err(PlotError::InvalidData(format!(
            "grid search combination '{combination}' is not of the form <x>_<y>"
        ))),
    }
}

fn axis_label<'a>(labels: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str> {
    labels
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| PlotError::MissingColumn(name.to_string()))
}

/// Optimum (x, y) for the annotation: the configured parameter values when both axes
/// have one, the best cell otherwise.
fn optimum_location(
    matrix: &GridSearchMatrix,
    optimum: &BTreeMap<String, f64>,
    x_name: &str,
    y_name: &str,
) -> Option<(f64, f64)> {
    match (optimum.get(x_name), optimum.get(y_name)) {
        (Some(x), Some(y)) => Some((*x, *y)),
        _ => matrix.optimum().map(|(x, y, _)| (x, y)),
    }
}

fn axis_extent(values: &[f64]) -> Option<(f64, f64)> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let lo = finite.clone().reduce(f64::min)?;
    let hi = finite.reduce(f64::max)?;
    (hi > lo).then_some((lo, hi))
}

/// Iso-lines of the matrix, one series per level colored along the reversed magma
/// scale, each labelled with its level on its longest piece.
fn draw_contours(panel: &mut Panel, matrix: &GridSearchMatrix) -> Result<()> {
    let levels = matrix
        .value_range()
        .map(|(min, max)| ContourLevels::between(min, max, CONTOUR_LEVEL_BINS))
        .unwrap_or_default();
    if levels.is_empty() {
        log::warn!("Grid search matrix is flat or empty; no contour levels to draw");
    }
    let (lowest, highest) = match (levels.values.first(), levels.values.last()) {
        (Some(lo), Some(hi)) => (*lo, *hi),
        _ => (0.0, 1.0),
    };

    for &level in &levels.values {
        let lines = iso_lines(&matrix.x_values, &matrix.y_values, &matrix.values, level)?;
        let Some(longest) = lines.iter().max_by_key(|line| line.len()) else {
            continue;
        };
        let label_at = longest[longest.len() / 2];
        let color = scale_color(colorous::MAGMA, level, lowest, highest, true);
        let label = levels.label(level);

        let mut data: XYSeries = Vec::new();
        for line in &lines {
            if !data.is_empty() {
                data.push((f64::NAN, f64::NAN));
            }
            data.extend_from_slice(line);
        }
        panel.plot(PlotSeries::new(label.clone(), data, color).with_stroke_width(LINE_WIDTH_CONTOUR));
        panel.annotate(
            TextAnnotation::new(label, label_at)
                .with_color(color)
                .with_font_size(FONT_SIZE_CONTOUR_LABEL)
                .centered(),
        );
    }

    panel.x_ticks = Some(matrix.x_values.iter().map(|v| (*v, format_axis_value(*v))).collect());
    panel.y_ticks = Some(matrix.y_values.iter().map(|v| (*v, format_axis_value(*v))).collect());
    if let Some((lo, hi)) = axis_extent(&matrix.x_values) {
        panel.set_xlim(lo, hi);
    }
    if let Some((lo, hi)) = axis_extent(&matrix.y_values) {
        panel.set_ylim(lo, hi);
    }
    Ok(())
}

/// One panel per parameter combination, in the order given. The grid, figure size,
/// annotation flag and hidden panels come from `parameters`.
pub fn build_grid_search(
    data: &[(String, GridSearchMatrix)],
    nw_method: &str,
    classification: &str,
    labels: &BTreeMap<String, String>,
    optimum: &BTreeMap<String, f64>,
    parameters: &PlotParameters,
) -> Result<Figure> {
    parameters.validate()?;
    let grid = parameters.grid();
    let allocation = allocate_panels(data.len(), grid, Arrangement::one_per_group())?;
    let mut figure = Figure::new(grid, parameters.figsize);
    let title = format!("{} {}", title_case(nw_method), title_case(classification));

    for (group, (combination, matrix)) in data.iter().enumerate() {
        let (x_name, y_name) = split_combination(combination)?;
        let (x_label, y_label) = (axis_label(labels, x_name)?, axis_label(labels, y_name)?);

        let panel = figure.panel_mut(allocation.groups[group][0])?;
        panel.title = title.clone();
        panel.set_labels(x_label, y_label);
        draw_contours(panel, matrix)?;

        if !parameters.annotations {
            continue;
        }
        let Some((x, y)) = optimum_location(matrix, optimum, x_name, y_name) else {
            log::warn!("No optimum to annotate for combination '{combination}'");
            continue;
        };
        panel.scatter(
            ScatterSeries::new("optimum", vec![(x, y)], COLOR_OPTIMUM, MARKER_SIZE_OPTIMUM)
                .without_legend(),
        );
        if y.trunc() != 0.0 {
            panel.reference_line(
                ReferenceLine::horizontal(y, COLOR_REFERENCE_LINE, LineStyle::Dashed)
                    .with_opacity(REFERENCE_LINE_OPACITY),
            );
        }
        panel.reference_line(
            ReferenceLine::vertical(x, COLOR_REFERENCE_LINE, LineStyle::Dashed)
                .with_opacity(REFERENCE_LINE_OPACITY),
        );
    }

    figure.hide_panels(&allocation.unused)?;
    figure.hide_panels(&parameters.remove_plots)?;
    Ok(figure)
}

#[allow(clippy::too_many_arguments)]
pub fn plot_grid_search(
    data: &[(String, GridSearchMatrix)],
    nw_method: &str,
    classification: &str,
    labels: &BTreeMap<String, String>,
    optimum: &BTreeMap<String, f64>,
    parameters: &PlotParameters,
    plot_name: &str,
    plot_folder: &Path,
) -> Result<PathBuf> {
    let figure = build_grid_search(data, nw_method, classification, labels, optimum, parameters)?;
    save_figure(&figure, plot_folder, plot_name, parameters.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot_framework::Orientation;
    use ndarray::array;

    fn matrix() -> GridSearchMatrix {
        GridSearchMatrix::new(
            vec![10.0, 20.0, 40.0],
            vec![0.0, 5.0],
            array![[0.5, 0.8, 0.7], [0.6, 0.9, 0.4]],
        )
        .unwrap()
    }

    fn labels() -> BTreeMap<String, String> {
        [("at", "activity threshold"), ("mpl", "minimum period length")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn parameters(annotations: bool) -> PlotParameters {
        PlotParameters {
            num_rows: 1,
            num_columns: 3,
            annotations,
            ..PlotParameters::default()
        }
    }

    #[test]
    fn test_split_combination() {
        assert_eq!(split_combination("at_mpl").unwrap(), ("at", "mpl"));
        assert!(matches!(split_combination("at"), Err(PlotError::InvalidData(_))));
        assert!(split_combination("a_b_c").is_err());
    }

    #[test]
    fn test_panels_follow_combinations() {
        let data = vec![("at_mpl".to_string(), matrix()), ("mpl_at".to_string(), matrix())];
        let figure =
            build_grid_search(&data, "hecht", "f1", &labels(), &BTreeMap::new(), &parameters(false)).unwrap();
        let first = figure.panel(0).unwrap();
        assert_eq!(first.title, "Hecht F1");
        assert_eq!(first.x_label, "activity threshold");
        assert_eq!(first.y_label, "minimum period length");
        assert_eq!(figure.panel(1).unwrap().x_label, "minimum period length");
        assert!(first.cells.is_empty());
        assert_eq!(first.x_range, Some(10.0..40.0));
        assert_eq!(first.y_range, Some(0.0..5.0));
        assert!(first.scatters.is_empty());
        assert!(!figure.panel(2).unwrap().visible);
    }

    #[test]
    fn test_unknown_axis_label() {
        let data = vec![("at_unknown".to_string(), matrix())];
        assert!(matches!(
            build_grid_search(&data, "hecht", "f1", &labels(), &BTreeMap::new(), &parameters(false)),
            Err(PlotError::MissingColumn(name)) if name == "unknown"
        ));
    }

    #[test]
    fn test_annotations_mark_optimum() {
        let data = vec![("at_mpl".to_string(), matrix())];
        let figure =
            build_grid_search(&data, "hecht", "f1", &labels(), &BTreeMap::new(), &parameters(true)).unwrap();
        let panel = figure.panel(0).unwrap();
        assert_eq!(panel.find_scatter("optimum").unwrap().points, vec![(20.0, 5.0)]);
        assert_eq!(panel.reference_lines.len(), 2);

        // An optimum at y = 0 keeps only the vertical line.
        let optimum: BTreeMap<String, f64> =
            [("at".to_string(), 10.0), ("mpl".to_string(), 0.0)].into_iter().collect();
        let figure = build_grid_search(&data, "hecht", "f1", &labels(), &optimum, &parameters(true)).unwrap();
        let panel = figure.panel(0).unwrap();
        assert_eq!(panel.reference_lines.len(), 1);
        assert_eq!(panel.reference_lines[0].orientation, Orientation::Vertical);
        assert_eq!(panel.reference_lines[0].at, 10.0);
    }

    #[test]
    fn test_remove_plots_hides_panels() {
        let data = vec![("at_mpl".to_string(), matrix()), ("mpl_at".to_string(), matrix())];
        let mut params = parameters(false);
        params.remove_plots = vec![1];
        let figure = build_grid_search(&data, "hecht", "f1", &labels(), &BTreeMap::new(), &params).unwrap();
        assert_eq!(figure.visible_panel_count(), 1);

        params.remove_plots = vec![7];
        assert!(matches!(
            build_grid_search(&data, "hecht", "f1", &labels(), &BTreeMap::new(), &params),
            Err(PlotError::PanelOutOfRange { index: 7, capacity: 3 })
        ));
    }

    #[test]
    fn test_one_labelled_iso_line_per_level() {
        // Values rise along x only, so every level is a vertical line.
        let ramp = GridSearchMatrix::new(
            vec![0.0, 1.0, 2.0],
            vec![0.0, 5.0, 10.0],
            array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0], [0.0, 1.0, 2.0]],
        )
        .unwrap();
        let data = vec![("at_mpl".to_string(), ramp)];
        let figure =
            build_grid_search(&data, "hecht", "f1", &labels(), &BTreeMap::new(), &parameters(false)).unwrap();
        let panel = figure.panel(0).unwrap();

        let expected = ["0.25", "0.50", "0.75", "1.00", "1.25", "1.50", "1.75"];
        let series: Vec<&str> = panel.lines.iter().map(|l| l.label.as_str()).collect();
        let texts: Vec<&str> = panel.texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(series, expected);
        assert_eq!(texts, expected);

        let one = panel.find_line("1.00").unwrap();
        assert_eq!(one.data.len(), 3);
        assert!(one.data.iter().all(|(x, _)| (x - 1.0).abs() < 1e-9));
        assert_eq!(one.stroke_width, LINE_WIDTH_CONTOUR);
        assert!((panel.texts[3].position.0 - 1.0).abs() < 1e-9);
        assert_eq!(panel.texts[3].color, one.color);

        let low = panel.find_line("0.25").unwrap().color;
        let high = panel.find_line("1.75").unwrap().color;
        assert_eq!(low, scale_color(colorous::MAGMA, 0.0, 0.0, 1.0, true));
        assert_eq!(high, scale_color(colorous::MAGMA, 1.0, 0.0, 1.0, true));
    }

    #[test]
    fn test_separate_pieces_share_one_series() {
        // Two peaks give two closed rings on the same level.
        let peaks = GridSearchMatrix::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![0.0, 1.0, 2.0],
            array![
                [0.0, 0.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 0.0, 0.0]
            ],
        )
        .unwrap();
        let data = vec![("at_mpl".to_string(), peaks)];
        let figure =
            build_grid_search(&data, "hecht", "f1", &labels(), &BTreeMap::new(), &parameters(false)).unwrap();
        let ring = figure.panel(0).unwrap().find_line("0.4").unwrap();
        assert_eq!(ring.data.iter().filter(|(x, _)| x.is_nan()).count(), 1);
        assert_eq!(ring.data.len(), 11);
    }

    #[test]
    fn test_flat_matrix_has_no_iso_lines() {
        let flat = GridSearchMatrix::new(vec![1.0, 2.0], vec![1.0, 2.0], array![[0.9, 0.9], [0.9, 0.9]])
            .unwrap();
        let data = vec![("at_mpl".to_string(), flat)];
        let figure =
            build_grid_search(&data, "hecht", "f1", &labels(), &BTreeMap::new(), &parameters(false)).unwrap();
        let panel = figure.panel(0).unwrap();
        assert!(panel.lines.is_empty());
        assert!(panel.texts.is_empty());
    }
}
