// src/data_input/csv_reader.rs

use csv::{ReaderBuilder, StringRecord};
use chrono::NaiveDateTime;
use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::data_input::episodes::{Episode, EpisodeLabel};
use crate::data_input::matrix::{GridSearchMatrix, LabelledMatrix};
use crate::data_input::time_frame::TimeFrame;
use crate::error::{PlotError, Result};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
];

const EPISODE_HEADERS: [&str; 4] = ["counter", "start", "stop", "label"];

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| PlotError::InvalidData(format!("unrecognised timestamp '{trimmed}'")))
}

/// Empty cells and `NaN` literals become `f64::NAN`.
fn parse_cell(value: &str, row: usize, column: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| {
        PlotError::InvalidData(format!(
            "row {row}, column '{column}': '{trimmed}' is not a number"
        ))
    })
}

fn reader_from<R: Read>(input: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Parses a CSV file whose first column holds timestamps and whose remaining columns
/// hold numeric samples.
pub fn parse_time_frame(input_file_path: &Path) -> Result<TimeFrame> {
    let file = File::open(input_file_path)?;
    let frame = read_time_frame(BufReader::new(file))?;
    log::info!(
        "Read {} rows x {} columns from '{}'",
        frame.len(),
        frame.column_names().count(),
        input_file_path.display()
    );
    Ok(frame)
}

pub fn read_time_frame<R: Read>(input: R) -> Result<TimeFrame> {
    let mut reader = reader_from(input);
    let header_record = reader.headers()?.clone();
    if header_record.len() < 2 {
        return Err(PlotError::InvalidData(
            "expected a timestamp column followed by at least one value column".to_string(),
        ));
    }
    let value_headers: Vec<String> = header_record.iter().skip(1).map(str::to_string).collect();
    log::debug!("Headers found in CSV: {:?}", header_record);

    let mut index = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); value_headers.len()];
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        let timestamp = record
            .get(0)
            .ok_or_else(|| PlotError::InvalidData(format!("row {row_index} has no timestamp")))?;
        index.push(parse_timestamp(timestamp)?);
        for (col, name) in value_headers.iter().enumerate() {
            let cell = record.get(col + 1).unwrap_or("");
            columns[col].push(parse_cell(cell, row_index, name)?);
        }
    }

    let mut frame = TimeFrame::new(index)?;
    for (name, values) in value_headers.into_iter().zip(columns) {
        frame.insert_column(name, values)?;
    }
    Ok(frame)
}

fn header_positions(header_record: &StringRecord, targets: &[&str]) -> Result<Vec<usize>> {
    targets
        .iter()
        .map(|&target| {
            header_record
                .iter()
                .position(|h| h.eq_ignore_ascii_case(target))
                .ok_or_else(|| PlotError::MissingColumn(target.to_string()))
        })
        .collect()
}

/// Parses an episode table with `counter,start,stop,label` columns (any order).
pub fn parse_episodes(input_file_path: &Path) -> Result<Vec<Episode>> {
    let file = File::open(input_file_path)?;
    read_episodes(BufReader::new(file))
}

pub fn read_episodes<R: Read>(input: R) -> Result<Vec<Episode>> {
    let mut reader = reader_from(input);
    let positions = header_positions(reader.headers()?, &EPISODE_HEADERS)?;

    let mut episodes = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        let field = |i: usize| record.get(positions[i]).unwrap_or("");
        let label_code = field(3).parse::<f64>().map_err(|_| {
            PlotError::InvalidData(format!("row {row_index}: label '{}' is not a number", field(3)))
        })?;
        episodes.push(Episode::new(
            field(0),
            parse_timestamp(field(1))?,
            parse_timestamp(field(2))?,
            EpisodeLabel::from(label_code as i64),
        )?);
    }
    Ok(episodes)
}

/// Reads a table whose header row (after the corner cell) labels the columns and whose
/// first column labels the rows.
fn read_table<R: Read>(input: R) -> Result<(Vec<String>, Vec<String>, Array2<f64>)> {
    let mut reader = reader_from(input);
    let column_labels: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();
    let mut row_labels = Vec::new();
    let mut cells = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        row_labels.push(record.get(0).unwrap_or("").to_string());
        for (col, name) in column_labels.iter().enumerate() {
            cells.push(parse_cell(record.get(col + 1).unwrap_or(""), row_index, name)?);
        }
    }
    let values = Array2::from_shape_vec((row_labels.len(), column_labels.len()), cells)
        .map_err(|e| PlotError::InvalidData(e.to_string()))?;
    Ok((row_labels, column_labels, values))
}

pub fn read_labelled_matrix<R: Read>(input: R) -> Result<LabelledMatrix> {
    let (rows, columns, values) = read_table(input)?;
    LabelledMatrix::new(rows, columns, values)
}

pub fn parse_grid_matrix(input_file_path: &Path) -> Result<GridSearchMatrix> {
    let file = File::open(input_file_path)?;
    read_grid_matrix(BufReader::new(file))
}

/// Grid-search table: header values are the x parameter, first column the y parameter.
pub fn read_grid_matrix<R: Read>(input: R) -> Result<GridSearchMatrix> {
    let (rows, columns, values) = read_table(input)?;
    let parse_axis = |labels: Vec<String>, axis: &str| -> Result<Vec<f64>> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let value = parse_cell(label, i, axis)?;
                if value.is_nan() {
                    Err(PlotError::InvalidData(format!("{axis} value {i} is empty")))
                } else {
                    Ok(value)
                }
            })
            .collect()
    };
    let x_values = parse_axis(columns, "x")?;
    let y_values = parse_axis(rows, "y")?;
    GridSearchMatrix::new(x_values, y_values, values)
}
