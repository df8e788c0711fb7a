//! This crate measures the BLER-versus-SNR performance of PUCCH format 2 by driving an external
//! channel-simulation program over a two-dimensional parameter grid (code size × SNR). For each
//! grid point, a JSON request artifact is handed to the simulator process and a JSON response
//! artifact holding the estimated block error rate is read back. The per-point results are
//! collected into an aligned table, saved to a JSON file, and rendered as one comparative chart
//! with a curve per code size.
//!
//! The simulator itself is a black box: any program that accepts the path to a request artifact
//! as its sole argument, exits with status zero on success, and writes a `result.json` response
//! can be swept.
//!
//! Build the executable with `cargo build --release` and then run
//! `./target/release/pucch-bler -h` for help on the command-line interface.

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

mod chart;
mod grid;
mod simulator;
mod sweep;

pub use chart::render_bler_chart;
pub use grid::GridSpec;
pub use simulator::{InvokeError, ProcessSimulator, SimRequest, SimResponse, SimulatorChannel};
pub use sweep::{run_sweep, SweepResults, FAILED_POINT_BLER};

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
    /// Chart rendering error
    #[error("{0}")]
    ChartRenderError(String),
}
