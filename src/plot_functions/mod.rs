// src/plot_functions/mod.rs

pub mod panel_builders;
pub mod plot_activity_by_day;
pub mod plot_classification;
pub mod plot_device_comparison;
pub mod plot_distributions;
pub mod plot_grid_search;
pub mod plot_heatmaps;
pub mod plot_non_wear_algorithms;
pub mod plot_training;
