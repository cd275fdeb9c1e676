// src/data_input/time_frame.rs

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{PlotError, Result};
use crate::time_axis::to_plot_x;
use crate::types::XYSeries;

/// A named column of samples aligned to a `TimeFrame` index. `NaN` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Timestamp-indexed table of `f64` columns.
///
/// The index is strictly increasing and every column has exactly one value per
/// timestamp; both are checked when the frame is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeFrame {
    index: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl TimeFrame {
    pub fn new(index: Vec<NaiveDateTime>) -> Result<Self> {
        if let Some(pos) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PlotError::NonMonotonicIndex(pos + 1));
        }
        Ok(Self {
            index,
            columns: Vec::new(),
        })
    }

    /// Builder form of `insert_column`.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Adds a column, replacing an existing one with the same name.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(PlotError::LengthMismatch {
                name,
                expected: self.index.len(),
                found: values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| PlotError::MissingColumn(name.to_string()))
    }

    /// Fails with the first name that is not a column of this frame.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(PlotError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.index.first().copied()
    }

    /// Index converted to plot x coordinates.
    pub fn x_values(&self) -> Vec<f64> {
        self.index.iter().map(|t| to_plot_x(*t)).collect()
    }

    /// (x, value) pairs for a column with missing values dropped.
    pub fn series(&self, name: &str) -> Result<XYSeries> {
        let values = self.column(name)?;
        Ok(self
            .index
            .iter()
            .zip(values)
            .filter(|(_, v)| v.is_finite())
            .map(|(t, v)| (to_plot_x(*t), *v))
            .collect())
    }

    /// Largest finite value of a column, if any.
    pub fn column_max(&self, name: &str) -> Result<Option<f64>> {
        let values = self.column(name)?;
        Ok(values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v)))))
    }

    /// Row positions whose timestamp lies in `[start, stop]`.
    pub fn positions_between(
        &self,
        start: NaiveDateTime,
        stop: NaiveDateTime,
    ) -> std::ops::Range<usize> {
        let lo = self.index.partition_point(|t| *t < start);
        let hi = self.index.partition_point(|t| *t <= stop);
        lo..hi.max(lo)
    }

    /// Rows `range` as a new frame.
    pub fn slice(&self, range: std::ops::Range<usize>) -> TimeFrame {
        let range = range.start.min(self.len())..range.end.min(self.len());
        TimeFrame {
            index: self.index[range.clone()].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[range.clone()].to_vec(),
                })
                .collect(),
        }
    }

    /// Rows with timestamps in `[start, stop]`.
    pub fn between(&self, start: NaiveDateTime, stop: NaiveDateTime) -> TimeFrame {
        self.slice(self.positions_between(start, stop))
    }

    /// Splits the frame into one frame per calendar day, in chronological order.
    pub fn split_by_day(&self) -> Vec<(NaiveDate, TimeFrame)> {
        let mut days = Vec::new();
        let mut start = 0;
        while start < self.len() {
            let day = self.index[start].date();
            let end = start + self.index[start..].partition_point(|t| t.date() == day);
            days.push((day, self.slice(start..end)));
            start = end;
        }
        days
    }
}
