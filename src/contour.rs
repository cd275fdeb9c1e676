// src/contour.rs

//! Iso-lines of a value grid by marching squares.
//!
//! Values sit on the nodes of a rectilinear mesh: `z[[row, column]]` lies at
//! `(x[column], y[row])`. Each level yields polylines through the points where the
//! linear interpolation along a mesh edge equals the level. Cells touching a NaN node
//! are skipped.

use std::collections::HashMap;

use ndarray::Array2;

use crate::error::{PlotError, Result};
use crate::types::XYSeries;

/// Step multipliers tried per decade when picking level spacing.
const NICE_STEPS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];
const MAX_LABEL_DECIMALS: usize = 6;

type Node = (usize, usize);
type Edge = (Node, Node);

/// Evenly spaced contour levels strictly inside a value range.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContourLevels {
    pub step: f64,
    pub values: Vec<f64>,
}

impl ContourLevels {
    /// Multiples of a 1-2-2.5-5 step that splits `[min, max]` into at most `bins`
    /// intervals. Levels equal to `min` or `max` are dropped. A flat or non-finite
    /// range has no levels.
    pub fn between(min: f64, max: f64, bins: usize) -> Self {
        if !min.is_finite() || !max.is_finite() || max <= min || bins == 0 {
            return Self::default();
        }
        let raw = (max - min) / bins as f64;
        let magnitude = 10f64.powi(raw.log10().floor() as i32);
        let step = NICE_STEPS
            .iter()
            .map(|m| m * magnitude)
            .find(|s| *s >= raw * (1.0 - 1e-9))
            .unwrap_or(10.0 * magnitude);
        let first = (min / step).ceil() as i64;
        let last = (max / step).floor() as i64;
        let values = (first..=last)
            .map(|k| k as f64 * step)
            .filter(|level| *level > min + step * 1e-9 && *level < max - step * 1e-9)
            .collect();
        Self { step, values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Level text with as many decimals as the step needs.
    pub fn label(&self, level: f64) -> String {
        let decimals = (0..=MAX_LABEL_DECIMALS)
            .find(|d| {
                let scaled = self.step * 10f64.powi(*d as i32);
                (scaled - scaled.round()).abs() < 1e-6
            })
            .unwrap_or(MAX_LABEL_DECIMALS);
        format!("{level:.decimals$}")
    }
}

fn is_above(value: f64, level: f64) -> bool {
    value >= level
}

/// Polylines where `z` crosses `level`. A closed line repeats its first point at
/// the end.
pub fn iso_lines(x: &[f64], y: &[f64], z: &Array2<f64>, level: f64) -> Result<Vec<XYSeries>> {
    let (rows, columns) = z.dim();
    if rows != y.len() || columns != x.len() {
        return Err(PlotError::LengthMismatch {
            name: "contour grid".to_string(),
            expected: y.len() * x.len(),
            found: rows * columns,
        });
    }
    if rows < 2 || columns < 2 || !level.is_finite() {
        return Ok(Vec::new());
    }

    let mut crossings: HashMap<Edge, (f64, f64)> = HashMap::new();
    let mut crossing = |a: Node, b: Node| -> Option<Edge> {
        let (za, zb) = (z[a], z[b]);
        if is_above(za, level) == is_above(zb, level) {
            return None;
        }
        let t = (level - za) / (zb - za);
        crossings.entry((a, b)).or_insert_with(|| {
            let (xa, ya) = (x[a.1], y[a.0]);
            let (xb, yb) = (x[b.1], y[b.0]);
            (xa + t * (xb - xa), ya + t * (yb - ya))
        });
        Some((a, b))
    };

    let mut segments: Vec<(Edge, Edge)> = Vec::new();
    for row in 0..rows - 1 {
        for column in 0..columns - 1 {
            let n00 = (row, column);
            let n01 = (row, column + 1);
            let n10 = (row + 1, column);
            let n11 = (row + 1, column + 1);
            let corners = [z[n00], z[n01], z[n11], z[n10]];
            if corners.iter().any(|v| v.is_nan()) {
                continue;
            }
            // Bottom, right, top, left.
            let edges = [(n00, n01), (n01, n11), (n10, n11), (n00, n10)];
            let crossed: Vec<Option<Edge>> = edges.iter().map(|(a, b)| crossing(*a, *b)).collect();
            let found: Vec<Edge> = crossed.iter().flatten().copied().collect();
            match found.as_slice() {
                [a, b] => segments.push((*a, *b)),
                [_, _, _, _] => {
                    let center = corners.iter().sum::<f64>() / 4.0;
                    let [bottom, right, top, left] = edges;
                    if is_above(center, level) == is_above(corners[0], level) {
                        segments.push((bottom, right));
                        segments.push((top, left));
                    } else {
                        segments.push((bottom, left));
                        segments.push((right, top));
                    }
                }
                _ => {}
            }
        }
    }

    let chains = join_segments(&segments);
    Ok(chains
        .into_iter()
        .map(|chain| chain.iter().filter_map(|edge| crossings.get(edge).copied()).collect())
        .collect())
}

/// Chains segments that share an edge crossing. Open chains are walked from an end.
fn join_segments(segments: &[(Edge, Edge)]) -> Vec<Vec<Edge>> {
    let mut by_edge: HashMap<Edge, Vec<usize>> = HashMap::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        by_edge.entry(*a).or_default().push(i);
        by_edge.entry(*b).or_default().push(i);
    }
    let is_open_end = |edge: &Edge| by_edge.get(edge).map_or(0, Vec::len) == 1;

    let mut used = vec![false; segments.len()];
    let open_first = (0..segments.len())
        .filter(|i| is_open_end(&segments[*i].0) || is_open_end(&segments[*i].1))
        .chain(0..segments.len());

    let mut chains = Vec::new();
    for start in open_first.collect::<Vec<_>>() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (a, b) = segments[start];
        let mut chain = if is_open_end(&b) && !is_open_end(&a) {
            vec![b, a]
        } else {
            vec![a, b]
        };
        extend_chain(&mut chain, segments, &by_edge, &mut used);
        chain.reverse();
        extend_chain(&mut chain, segments, &by_edge, &mut used);
        chains.push(chain);
    }
    chains
}

fn extend_chain(
    chain: &mut Vec<Edge>,
    segments: &[(Edge, Edge)],
    by_edge: &HashMap<Edge, Vec<usize>>,
    used: &mut [bool],
) {
    while let Some(&tail) = chain.last() {
        let next = by_edge
            .get(&tail)
            .and_then(|candidates| candidates.iter().copied().find(|j| !used[*j]));
        let Some(j) = next else {
            break;
        };
        used[j] = true;
        let (a, b) = segments[j];
        chain.push(if a == tail { b } else { a });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn test_levels_use_nice_steps_inside_range() {
        let levels = ContourLevels::between(0.0, 2.0, 8);
        assert!((levels.step - 0.25).abs() < 1e-12);
        let expected = [0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75];
        assert_eq!(levels.values.len(), expected.len());
        assert!(levels.values.iter().zip(expected).all(|(a, b)| (a - b).abs() < 1e-9));
        assert_eq!(levels.label(0.5), "0.50");

        let levels = ContourLevels::between(0.62, 0.91, 8);
        assert!((levels.step - 0.05).abs() < 1e-12);
        assert_eq!(levels.values.len(), 6);
        assert_eq!(levels.label(levels.values[0]), "0.65");

        let levels = ContourLevels::between(3.0, 70.0, 8);
        assert!((levels.step - 10.0).abs() < 1e-9);
        assert_eq!(levels.values.len(), 6);
        assert_eq!(levels.label(20.0), "20");

        assert!(ContourLevels::between(1.0, 1.0, 8).is_empty());
        assert!(ContourLevels::between(f64::NAN, 1.0, 8).is_empty());
    }

    #[test]
    fn test_iso_line_through_linear_ramp() {
        let z = array![[0.0, 1.0, 2.0], [0.0, 1.0, 2.0]];
        let lines = iso_lines(&[0.0, 10.0, 20.0], &[0.0, 5.0], &z, 1.5).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 2);
        assert!(lines[0].iter().all(|p| (p.0 - 15.0).abs() < 1e-9));
        let ys: Vec<f64> = lines[0].iter().map(|p| p.1).collect();
        assert!(ys.contains(&0.0) && ys.contains(&5.0));
    }

    #[test]
    fn test_peak_gives_closed_loop() {
        let z = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let lines = iso_lines(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], &z, 0.5).unwrap();
        assert_eq!(lines.len(), 1);
        let ring = &lines[0];
        assert_eq!(ring.len(), 5);
        assert!(close(ring[0], ring[4]));
        for corner in [(1.0, 0.5), (1.5, 1.0), (1.0, 1.5), (0.5, 1.0)] {
            assert!(ring.iter().any(|p| close(*p, corner)));
        }
    }

    #[test]
    fn test_saddle_splits_into_two_lines() {
        // Diagonal highs with a low center: the highs stay apart.
        let z = array![[1.0, 0.0], [0.0, 1.0]];
        let lines = iso_lines(&[0.0, 1.0], &[0.0, 1.0], &z, 0.6).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.len() == 2));
        let around_origin = lines
            .iter()
            .find(|l| l.iter().any(|p| close(*p, (0.4, 0.0))))
            .unwrap();
        assert!(around_origin.iter().any(|p| close(*p, (0.0, 0.4))));
    }

    #[test]
    fn test_nan_cells_are_skipped() {
        let z = array![[0.0, 1.0, f64::NAN], [0.0, 1.0, 2.0]];
        let lines = iso_lines(&[0.0, 1.0, 2.0], &[0.0, 1.0], &z, 1.5).unwrap();
        assert!(lines.is_empty());
        let lines = iso_lines(&[0.0, 1.0, 2.0], &[0.0, 1.0], &z, 0.5).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_shape_mismatch() {
        let z = array![[0.0, 1.0]];
        assert!(matches!(
            iso_lines(&[0.0, 1.0, 2.0], &[0.0], &z, 0.5),
            Err(PlotError::LengthMismatch { .. })
        ));
        assert!(iso_lines(&[0.0, 1.0], &[0.0], &z, 0.5).unwrap().is_empty());
    }
}
