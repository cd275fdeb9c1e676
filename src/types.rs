// src/types.rs
// Type aliases shared by the framework and the chart routines

/// (x, y) points in plot coordinates. Time series use seconds since the Unix epoch as x.
pub type XYSeries = Vec<(f64, f64)>;

/// Explicit tick positions paired with their rendered label.
pub type TickLabels = Vec<(f64, String)>;

/// Per-group panel indices, one entry per slot.
pub type GroupPanels = Vec<Vec<usize>>;

/// Named, optional per-metric values (training histories, result columns).
pub type NamedSeries = std::collections::BTreeMap<String, Vec<f64>>;
