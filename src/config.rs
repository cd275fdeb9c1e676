// src/config.rs

//! Explicit figure parameters. Every recognised key is a field; anything else in a
//! TOML file is rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{PLOT_HEIGHT, PLOT_WIDTH};
use crate::error::{PlotError, Result};
use crate::layout::PanelGrid;
use crate::output::OutputFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PlotParameters {
    pub num_rows: usize,
    pub num_columns: usize,
    /// Figure size in pixels (width, height).
    pub figsize: (u32, u32),
    /// Draw optimum markers and reference lines where the chart supports them.
    pub annotations: bool,
    /// Panel indices to hide after drawing.
    pub remove_plots: Vec<usize>,
    pub format: OutputFormat,
}

impl Default for PlotParameters {
    fn default() -> Self {
        Self {
            num_rows: 1,
            num_columns: 1,
            figsize: (PLOT_WIDTH, PLOT_HEIGHT),
            annotations: false,
            remove_plots: Vec::new(),
            format: OutputFormat::Png,
        }
    }
}

impl PlotParameters {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let parameters: PlotParameters = toml::from_str(content)?;
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        log::debug!("Loaded plot parameters from '{}'", path.display());
        Self::from_toml_str(&content)
    }

    pub fn grid(&self) -> PanelGrid {
        PanelGrid::new(self.num_rows, self.num_columns)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_rows == 0 || self.num_columns == 0 {
            return Err(PlotError::InvalidConfig(format!(
                "num_rows and num_columns must be positive (got {}x{})",
                self.num_rows, self.num_columns
            )));
        }
        if self.figsize.0 == 0 || self.figsize.1 == 0 {
            return Err(PlotError::InvalidConfig(
                "figsize must be non-zero in both dimensions".to_string(),
            ));
        }
        let capacity = self.grid().capacity();
        if let Some(&index) = self.remove_plots.iter().find(|&&i| i >= capacity) {
            return Err(PlotError::PanelOutOfRange { index, capacity });
        }
        Ok(())
    }
}
