// src/data_input/matrix.rs

use ndarray::{Array2, Axis};
use ndarray_stats::QuantileExt;

use crate::error::{PlotError, Result};

/// Performance values of a two-parameter sweep. Rows follow `y_values`, columns follow
/// `x_values`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSearchMatrix {
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
    pub values: Array2<f64>,
}

impl GridSearchMatrix {
    pub fn new(x_values: Vec<f64>, y_values: Vec<f64>, values: Array2<f64>) -> Result<Self> {
        check_shape(values.dim(), y_values.len(), x_values.len())?;
        Ok(Self {
            x_values,
            y_values,
            values,
        })
    }

    /// Smallest and largest non-NaN cell.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.values)
    }

    /// (x, y, value) of the best (largest) cell.
    pub fn optimum(&self) -> Option<(f64, f64, f64)> {
        let (row, col) = self.values.argmax_skipnan().ok()?;
        Some((self.x_values[col], self.y_values[row], self.values[[row, col]]))
    }
}

/// A 2-D result table with categorical row and column labels, optionally carrying
/// per-cell annotation text that replaces the formatted value.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledMatrix {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    pub values: Array2<f64>,
    pub annotations: Option<Array2<String>>,
}

impl LabelledMatrix {
    pub fn new(row_labels: Vec<String>, column_labels: Vec<String>, values: Array2<f64>) -> Result<Self> {
        check_shape(values.dim(), row_labels.len(), column_labels.len())?;
        Ok(Self {
            row_labels,
            column_labels,
            values,
            annotations: None,
        })
    }

    pub fn with_annotations(mut self, annotations: Array2<String>) -> Result<Self> {
        if annotations.dim() != self.values.dim() {
            return Err(PlotError::LengthMismatch {
                name: "annotations".to_string(),
                expected: self.values.len(),
                found: annotations.len(),
            });
        }
        self.annotations = Some(annotations);
        Ok(self)
    }

    /// Replaces NaN cells with `value`.
    pub fn fill_nan(mut self, value: f64) -> Self {
        self.values.mapv_inplace(|v| if v.is_nan() { value } else { v });
        self
    }

    pub fn value_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.values)
    }

    /// Mean of the per-column means, NaN cells skipped.
    pub fn mean_of_column_means(&self) -> Option<f64> {
        let means: Vec<f64> = self
            .values
            .axis_iter(Axis(1))
            .filter_map(|column| {
                let finite: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
                if finite.is_empty() {
                    None
                } else {
                    Some(finite.iter().sum::<f64>() / finite.len() as f64)
                }
            })
            .collect();
        if means.is_empty() {
            None
        } else {
            Some(means.iter().sum::<f64>() / means.len() as f64)
        }
    }
}

fn check_shape(dim: (usize, usize), rows: usize, columns: usize) -> Result<()> {
    if rows == 0 || columns == 0 {
        return Err(PlotError::EmptySeries("matrix".to_string()));
    }
    if dim != (rows, columns) {
        return Err(PlotError::InvalidData(format!(
            "matrix has shape {}x{} but {} row and {} column labels",
            dim.0, dim.1, rows, columns
        )));
    }
    Ok(())
}

fn finite_range(values: &Array2<f64>) -> Option<(f64, f64)> {
    let min = *values.min_skipnan();
    let max = *values.max_skipnan();
    if min.is_nan() || max.is_nan() {
        None
    } else {
        Some((min, max))
    }
}

/// Whole numbers print without decimals; everything else keeps up to three.
pub fn format_axis_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        let text = format!("{value:.3}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
