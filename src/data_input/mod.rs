// src/data_input/mod.rs

pub mod csv_reader;
pub mod episodes;
pub mod matrix;
pub mod time_frame;
