// src/main.rs

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use actiplot::config::PlotParameters;
use actiplot::data_input::csv_reader::{parse_grid_matrix, parse_time_frame};
use actiplot::output::OutputFormat;
use actiplot::plot_functions::plot_activity_by_day::plot_raw_activity_by_day;
use actiplot::plot_functions::plot_grid_search::plot_grid_search;
use actiplot::plot_functions::plot_non_wear_algorithms::{
    plot_cnn_inferred_nw_time, plot_non_wear_algorithms,
};

/// Publication plots for accelerometer non-wear time research data
#[derive(Parser)]
#[command(name = "actiplot")]
#[command(author, version = actiplot::crate_version(), about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory the figures are written to
    #[arg(short, long, default_value = "plots", global = true)]
    output_dir: PathBuf,

    /// Image format (png or svg)
    #[arg(short, long, default_value = "png", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Raw Y/X/Z acceleration, one panel per day
    RawByDay {
        /// Raw acceleration CSV (timestamp column first)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Subject identifier used in the title and file name
        #[arg(short, long)]
        subject: String,

        /// Overlay the non-wear mask column
        #[arg(long)]
        non_wear: bool,
    },

    /// Raw acceleration against the non-wear algorithm masks
    NonWearAlgorithms {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(short, long)]
        subject: String,
    },

    /// Raw acceleration against true and inferred non-wear time
    InferredNwTime {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(short, long)]
        subject: String,
    },

    /// Grid-search result matrices, one panel per parameter combination
    GridSearch {
        /// Matrix CSV files; each file stem names its "<x>_<y>" combination
        #[arg(value_name = "MATRIX", required = true)]
        inputs: Vec<PathBuf>,

        /// TOML file with plot parameters (grid, figsize, annotations, remove_plots, format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Axis label per parameter name, e.g. --label at="activity threshold"
        #[arg(short, long = "label", value_parser = parse_key_value::<String>)]
        labels: Vec<(String, String)>,

        /// Optimum parameter value to annotate, e.g. --optimum at=10
        #[arg(long = "optimum", value_parser = parse_key_value::<f64>)]
        optimum: Vec<(String, f64)>,

        #[arg(long, default_value = "hecht")]
        nw_method: String,

        #[arg(long, default_value = "f1")]
        classification: String,

        #[arg(long, default_value = "grid_search")]
        plot_name: String,
    },
}

fn parse_key_value<T>(s: &str) -> Result<(String, T), String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let value = value.parse::<T>().map_err(|e| format!("'{value}': {e}"))?;
    Ok((key.trim().to_string(), value))
}

fn combination_name(path: &Path) -> Result<String, Box<dyn Error>> {
    let stem = path
        .file_stem()
        .ok_or_else(|| format!("'{}' has no file name", path.display()))?;
    Ok(stem.to_string_lossy().into_owned())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let output_dir = cli.output_dir.as_path();
    let written = match cli.command {
        Commands::RawByDay {
            input,
            subject,
            non_wear,
        } => {
            let data = parse_time_frame(&input)?;
            plot_raw_activity_by_day(&data, output_dir, &subject, non_wear, cli.format)?
        }
        Commands::NonWearAlgorithms { input, subject } => {
            let data = parse_time_frame(&input)?;
            plot_non_wear_algorithms(&data, &subject, output_dir, cli.format)?
        }
        Commands::InferredNwTime { input, subject } => {
            let data = parse_time_frame(&input)?;
            plot_cnn_inferred_nw_time(&subject, &data, output_dir, cli.format)?
        }
        Commands::GridSearch {
            inputs,
            config,
            labels,
            optimum,
            nw_method,
            classification,
            plot_name,
        } => {
            let parameters = match config {
                Some(path) => PlotParameters::load(&path)?,
                None => PlotParameters {
                    num_columns: inputs.len(),
                    format: cli.format,
                    ..PlotParameters::default()
                },
            };
            let data = inputs
                .iter()
                .map(|path| Ok((combination_name(path)?, parse_grid_matrix(path)?)))
                .collect::<Result<Vec<_>, Box<dyn Error>>>()?;
            let labels: BTreeMap<String, String> = labels.into_iter().collect();
            let optimum: BTreeMap<String, f64> = optimum.into_iter().collect();
            plot_grid_search(
                &data,
                &nw_method,
                &classification,
                &labels,
                &optimum,
                &parameters,
                &plot_name,
                output_dir,
            )?
        }
    };

    log::info!("Wrote {}", written.display());
    println!("{}", written.display());
    Ok(())
}
