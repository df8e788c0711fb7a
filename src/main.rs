//! This binary sweeps an external PUCCH format 2 channel simulator over a code-size × SNR grid,
//! collects the per-point BLER estimates, saves them to a JSON file, and renders a comparative
//! chart. Sweep parameters are specified on the command line.
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

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Result};
use clap::{crate_name, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use pucch_bler::{render_bler_chart, run_sweep, GridSpec, ProcessSimulator};

/// Main function
fn main() -> Result<()> {
    let timer = Instant::now();
    let matches = command_line_parser().get_matches();
    let grid = grid_spec_from_matches(&matches);
    grid.check()?;
    let executable = executable_from_matches(&matches);
    if !executable.exists() {
        bail!("simulator executable {} not found", executable.display());
    }
    print_banner(&grid);
    let mut channel =
        ProcessSimulator::new(&executable, Path::new("."), timeout_s_from_matches(&matches));
    let results = run_sweep(&grid, &mut channel)?;
    let results_path = json_filename_from_matches(&matches);
    results.to_json_file(&results_path)?;
    println!("\nResults saved to {}", results_path.display());
    println!("\nGenerating plot...");
    let chart_path = chart_filename_from_matches(&matches);
    match render_bler_chart(&results, &chart_path) {
        Ok(()) => {
            println!("Chart saved to {}", chart_path.display());
            if show_from_matches(&matches) {
                show_chart(&chart_path);
            }
        }
        // The results file is already on disk; a failed render must not discard it.
        Err(error) => eprintln!("Chart rendering failed: {error}"),
    }
    eprintln!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Prints the sweep summary banner.
fn print_banner(grid: &GridSpec) {
    let snr_values = grid.snr_values();
    println!("{}", "=".repeat(60));
    println!("BLER vs SNR Simulation");
    println!("{}", "=".repeat(60));
    println!(
        "SNR range: {:.1} to {:.1} dB",
        snr_values[0],
        snr_values[snr_values.len() - 1]
    );
    println!("Step: {:.1} dB", grid.snr_step_db);
    println!("Code sizes: {:?}", grid.code_sizes);
    println!("Iterations per point: {}", grid.iterations);
    println!("Total grid points: {}", grid.points().count());
    println!("{}", "=".repeat(60));
    println!("\nStarting simulation...");
}

/// Opens the rendered chart in the platform image viewer, best effort.
fn show_chart(path: &Path) {
    if let Err(error) = std::process::Command::new("xdg-open").arg(path).spawn() {
        eprintln!("Cannot open image viewer: {error}");
    }
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Sweeps an external PUCCH format 2 channel simulator and charts BLER versus SNR")
        .arg(first_snr_db())
        .arg(snr_step_db())
        .arg(num_snr())
        .arg(code_sizes())
        .arg(iterations())
        .arg(executable())
        .arg(timeout_s())
        .arg(json_filename())
        .arg(chart_filename())
        .arg(show())
}

/// Returns argument for first SNR (dB).
fn first_snr_db() -> Arg {
    Arg::new("first_snr_db")
        .short('r')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("-20.0")
        .help("First SNR (dB)")
}

/// Returns argument for SNR step (dB).
fn snr_step_db() -> Arg {
    Arg::new("snr_step_db")
        .short('p')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("1.0")
        .help("SNR step (dB)")
}

/// Returns argument for number of SNR values.
fn num_snr() -> Arg {
    Arg::new("num_snr")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("30")
        .help("Number of SNR values")
}

/// Returns argument for code sizes.
fn code_sizes() -> Arg {
    Arg::new("code_sizes")
        .short('c')
        .value_parser(value_parser!(u32))
        .num_args(1 ..)
        .default_values(["2", "4", "6", "8", "11"])
        .help("Code sizes (PUCCH format 2 payload bits)")
}

/// Returns argument for number of simulation iterations per grid point.
fn iterations() -> Arg {
    Arg::new("iterations")
        .short('i')
        .value_parser(value_parser!(u32))
        .default_value("1000")
        .help("Number of simulation iterations per grid point")
}

/// Returns argument for path to the simulator executable.
fn executable() -> Arg {
    Arg::new("executable")
        .short('e')
        .value_parser(value_parser!(PathBuf))
        .default_value("../build/qpsk")
        .help("Path to the simulator executable")
}

/// Returns argument for per-call timeout (seconds).
fn timeout_s() -> Arg {
    Arg::new("timeout_s")
        .short('t')
        .value_parser(value_parser!(u64))
        .default_value("60")
        .help("Ceiling (seconds) on one simulator call")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .value_parser(value_parser!(PathBuf))
        .default_value("bler_results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns argument for name of PNG file to which the chart must be rendered.
fn chart_filename() -> Arg {
    Arg::new("chart_filename")
        .short('g')
        .value_parser(value_parser!(PathBuf))
        .default_value("bler_curves.png")
        .help("Name of PNG file to which the chart must be rendered")
}

/// Returns argument for opening the chart in an image viewer.
fn show() -> Arg {
    Arg::new("show")
        .long("show")
        .action(ArgAction::SetTrue)
        .help("Open the rendered chart in the platform image viewer")
}

// OK to unwrap in the accessors below: all command-line arguments have default values, so a
// missing value cannot occur.

/// Returns sweep grid based on command-line arguments.
fn grid_spec_from_matches(matches: &ArgMatches) -> GridSpec {
    GridSpec {
        first_snr_db: *matches.get_one("first_snr_db").unwrap(),
        snr_step_db: *matches.get_one("snr_step_db").unwrap(),
        num_snr: *matches.get_one("num_snr").unwrap(),
        code_sizes: matches
            .get_many("code_sizes")
            .unwrap()
            .copied()
            .collect(),
        iterations: *matches.get_one("iterations").unwrap(),
    }
}

/// Returns path to the simulator executable.
fn executable_from_matches(matches: &ArgMatches) -> PathBuf {
    matches.get_one::<PathBuf>("executable").unwrap().clone()
}

/// Returns per-call timeout (seconds).
fn timeout_s_from_matches(matches: &ArgMatches) -> u64 {
    *matches.get_one("timeout_s").unwrap()
}

/// Returns name of JSON file to which results must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> PathBuf {
    matches.get_one::<PathBuf>("json_filename").unwrap().clone()
}

/// Returns name of PNG file to which the chart must be rendered.
fn chart_filename_from_matches(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("chart_filename")
        .unwrap()
        .clone()
}

/// Returns whether the chart must be opened in an image viewer.
fn show_from_matches(matches: &ArgMatches) -> bool {
    matches.get_flag("show")
}
