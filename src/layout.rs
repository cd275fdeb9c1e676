// src/layout.rs

//! Maps logical groups (days, subjects, scenarios) and their per-group slots onto a
//! flattened panel grid.

use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};
use crate::types::GroupPanels;

/// Rows × columns of a figure's panel grid. Panels are indexed row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelGrid {
    pub rows: usize,
    pub columns: usize,
}

impl PanelGrid {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    /// Single column with one row per panel.
    pub fn column(rows: usize) -> Self {
        Self { rows, columns: 1 }
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.columns
    }
}

/// How a group's slots are placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrangement {
    /// Group `g`, slot `s` → `g * panels_per_group + s`. One row per group when the
    /// grid has a single column; wraps row by row otherwise.
    Stacked { panels_per_group: usize },
    /// Group `g` owns column `g`; slot `s` → `s * columns + g`.
    Columnar { panels_per_group: usize },
}

impl Arrangement {
    pub fn one_per_group() -> Self {
        Arrangement::Stacked { panels_per_group: 1 }
    }

    fn panels_per_group(&self) -> usize {
        match *self {
            Arrangement::Stacked { panels_per_group } | Arrangement::Columnar { panels_per_group } => {
                panels_per_group
            }
        }
    }
}

/// Result of `allocate_panels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelAllocation {
    pub groups: GroupPanels,
    /// Panels no group was assigned to. Callers hide these.
    pub unused: Vec<usize>,
}

impl PanelAllocation {
    /// Panel index of `slot` within `group`.
    pub fn index(&self, group: usize, slot: usize) -> Option<usize> {
        self.groups.get(group).and_then(|slots| slots.get(slot)).copied()
    }
}

/// Assigns a deterministic panel index to every (group, slot) pair.
///
/// Groups that do not fit are rejected with `PlotError::GridCapacity` instead of being
/// dropped.
pub fn allocate_panels(
    groups: usize,
    grid: PanelGrid,
    arrangement: Arrangement,
) -> Result<PanelAllocation> {
    let per_group = arrangement.panels_per_group();
    if per_group == 0 {
        return Err(PlotError::InvalidConfig(
            "an arrangement needs at least one panel per group".to_string(),
        ));
    }
    if grid.capacity() == 0 {
        return Err(PlotError::InvalidConfig(format!(
            "panel grid {}x{} has no panels",
            grid.rows, grid.columns
        )));
    }

    let assigned: GroupPanels = match arrangement {
        Arrangement::Stacked { panels_per_group } => {
            let required = groups * panels_per_group;
            if required > grid.capacity() {
                return Err(PlotError::GridCapacity {
                    required,
                    capacity: grid.capacity(),
                });
            }
            (0..groups)
                .map(|g| (0..panels_per_group).map(|s| g * panels_per_group + s).collect())
                .collect()
        }
        Arrangement::Columnar { panels_per_group } => {
            if groups > grid.columns || panels_per_group > grid.rows {
                return Err(PlotError::GridCapacity {
                    required: groups.max(1) * panels_per_group,
                    capacity: grid.capacity(),
                });
            }
            (0..groups)
                .map(|g| (0..panels_per_group).map(|s| s * grid.columns + g).collect())
                .collect()
        }
    };

    let mut used = vec![false; grid.capacity()];
    for index in assigned.iter().flatten() {
        used[*index] = true;
    }
    let unused = used
        .iter()
        .enumerate()
        .filter(|(_, in_use)| !**in_use)
        .map(|(index, _)| index)
        .collect();

    Ok(PanelAllocation {
        groups: assigned,
        unused,
    })
}
