//! Sweep orchestration and result aggregation

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, GridSpec, InvokeError, SimRequest, SimulatorChannel};

/// BLER recorded for a grid point whose simulator call failed
///
/// Substituting the worst-case rate keeps every per-code-size sequence aligned with the SNR axis,
/// so consumers never see ragged or sparse data.
pub const FAILED_POINT_BLER: f64 = 1.0;

/// Completed sweep results
///
/// For every code size there is exactly one BLER value per SNR value, in SNR order; failed grid
/// points hold [`FAILED_POINT_BLER`]. Serializes to the results artifact schema as-is.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct SweepResults {
    /// SNR values (dB) in sweep order
    pub snr_values: Vec<f64>,
    /// Code sizes (bits) in display order
    pub code_sizes: Vec<u32>,
    /// BLER sequence per code size, keyed by the decimal form of the code size
    pub results: BTreeMap<String, Vec<f64>>,
    /// Number of simulation iterations per grid point
    pub iterations: u32,
}

impl SweepResults {
    /// Returns the BLER sequence for a given code size.
    #[must_use]
    pub fn blers_for(&self, code_size: u32) -> Option<&[f64]> {
        self.results
            .get(&code_size.to_string())
            .map(Vec::as_slice)
    }

    /// Saves results to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_json_file(&self, path: &Path) -> Result<(), Error> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reads results from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold valid results.
    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// Runs the full sweep, one simulator call per grid point.
///
/// Grid points are evaluated in declared order, code size major and SNR minor. A failed call is
/// reported on standard error and recorded as [`FAILED_POINT_BLER`]; no per-point failure aborts
/// the sweep, so the result table is always fully aligned on completion.
///
/// # Errors
///
/// Returns an error only if the grid itself is invalid; this is checked before any simulator
/// call is made.
pub fn run_sweep<C: SimulatorChannel>(
    grid: &GridSpec,
    channel: &mut C,
) -> Result<SweepResults, Error> {
    grid.check()?;
    let snr_values = grid.snr_values();
    let mut results: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for &code_size in &grid.code_sizes {
        println!("\nCode size: {code_size} bits");
        let mut blers = Vec::with_capacity(snr_values.len());
        for &snr_db in &snr_values {
            let request = SimRequest::new(code_size, snr_db, grid.iterations);
            match channel.send(&request) {
                Ok(response) => blers.push(response.bler),
                Err(failure) => {
                    report_failure(code_size, snr_db, &failure);
                    blers.push(FAILED_POINT_BLER);
                }
            }
        }
        results.insert(code_size.to_string(), blers);
    }
    Ok(SweepResults {
        snr_values,
        code_sizes: grid.code_sizes.clone(),
        results,
        iterations: grid.iterations,
    })
}

/// Prints a per-point failure report identifying the grid point and the cause.
fn report_failure(code_size: u32, snr_db: f64, failure: &InvokeError) {
    eprintln!("  [n={code_size}, SNR={snr_db:.1}] {failure}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimResponse;
    use float_eq::assert_float_eq;
    use std::collections::VecDeque;

    /// Channel that replays a fixed outcome per call and records the requests it saw.
    struct ScriptedChannel {
        outcomes: VecDeque<Result<SimResponse, InvokeError>>,
        requests: Vec<SimRequest>,
    }

    impl ScriptedChannel {
        fn new(outcomes: Vec<Result<SimResponse, InvokeError>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                requests: Vec::new(),
            }
        }
    }

    impl SimulatorChannel for ScriptedChannel {
        fn send(&mut self, request: &SimRequest) -> Result<SimResponse, InvokeError> {
            self.requests.push(request.clone());
            self.outcomes.pop_front().expect("unexpected request")
        }
    }

    fn ok(bler: f64) -> Result<SimResponse, InvokeError> {
        Ok(SimResponse { bler })
    }

    fn grid_for_test() -> GridSpec {
        GridSpec {
            first_snr_db: -2.0,
            snr_step_db: 1.0,
            num_snr: 3,
            code_sizes: vec![2, 4],
            iterations: 100,
        }
    }

    #[test]
    fn test_failed_points_keep_table_aligned() {
        let grid = grid_for_test();
        let mut channel = ScriptedChannel::new(vec![
            ok(0.9),
            Err(InvokeError::Timeout(60)),
            ok(0.1),
            Err(InvokeError::Simulator("diverged".to_string())),
            Err(InvokeError::Protocol("no response artifact".to_string())),
            ok(0.01),
        ]);
        let results = run_sweep(&grid, &mut channel).unwrap();
        for &code_size in &grid.code_sizes {
            assert_eq!(
                results.blers_for(code_size).unwrap().len(),
                results.snr_values.len()
            );
        }
        let blers = results.blers_for(2).unwrap();
        assert_float_eq!(blers[0], 0.9, abs <= 1e-12);
        assert_float_eq!(blers[1], FAILED_POINT_BLER, abs <= 1e-12);
        assert_float_eq!(blers[2], 0.1, abs <= 1e-12);
        let blers = results.blers_for(4).unwrap();
        assert_float_eq!(blers[0], FAILED_POINT_BLER, abs <= 1e-12);
        assert_float_eq!(blers[1], FAILED_POINT_BLER, abs <= 1e-12);
        assert_float_eq!(blers[2], 0.01, abs <= 1e-12);
    }

    #[test]
    fn test_single_code_size_with_timeout() {
        let grid = GridSpec {
            first_snr_db: -1.0,
            snr_step_db: 1.0,
            num_snr: 2,
            code_sizes: vec![4],
            iterations: 10,
        };
        let mut channel = ScriptedChannel::new(vec![ok(0.2), Err(InvokeError::Timeout(60))]);
        let results = run_sweep(&grid, &mut channel).unwrap();
        let blers = results.blers_for(4).unwrap();
        assert_float_eq!(blers[0], 0.2, abs <= 1e-12);
        assert_float_eq!(blers[1], 1.0, abs <= 1e-12);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_requests_follow_grid_order() {
        let grid = grid_for_test();
        let mut channel = ScriptedChannel::new((0 .. 6).map(|_| ok(0.5)).collect());
        run_sweep(&grid, &mut channel).unwrap();
        let sent: Vec<(u32, f64)> = channel
            .requests
            .iter()
            .map(|request| (request.num_of_pucch_f2_bits, request.snr_db))
            .collect();
        assert_eq!(sent, grid.points().collect::<Vec<_>>());
        for request in &channel.requests {
            assert_eq!(request.mode, "channel simulation");
            assert_eq!(request.iterations, grid.iterations);
        }
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_entries_match_snr_positions() {
        // Each response encodes the index of the call that produced it, so a misaligned table
        // would surface as a wrong value at some SNR position.
        let grid = grid_for_test();
        let mut channel =
            ScriptedChannel::new((0 .. 6).map(|index| ok(0.01 * f64::from(index))).collect());
        let results = run_sweep(&grid, &mut channel).unwrap();
        for (row, &code_size) in grid.code_sizes.iter().enumerate() {
            let blers = results.blers_for(code_size).unwrap();
            for (col, &bler) in blers.iter().enumerate() {
                let index = row * results.snr_values.len() + col;
                assert_float_eq!(bler, 0.01 * index as f64, abs <= 1e-12);
            }
        }
    }

    #[test]
    fn test_determinism() {
        let grid = grid_for_test();
        let outcomes = || {
            vec![
                ok(0.9),
                ok(0.5),
                Err(InvokeError::Timeout(60)),
                ok(0.2),
                ok(0.1),
                ok(0.05),
            ]
        };
        let first = run_sweep(&grid, &mut ScriptedChannel::new(outcomes())).unwrap();
        let second = run_sweep(&grid, &mut ScriptedChannel::new(outcomes())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_grid_makes_no_calls() {
        let mut grid = grid_for_test();
        grid.num_snr = 0;
        let mut channel = ScriptedChannel::new(Vec::new());
        assert!(run_sweep(&grid, &mut channel).is_err());
        assert!(channel.requests.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let grid = grid_for_test();
        let mut channel = ScriptedChannel::new(vec![
            ok(0.9),
            ok(0.5),
            ok(0.25),
            ok(0.125),
            Err(InvokeError::Timeout(60)),
            ok(0.03125),
        ]);
        let results = run_sweep(&grid, &mut channel).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bler_results.json");
        results.to_json_file(&path).unwrap();
        let reread = SweepResults::from_json_file(&path).unwrap();
        assert_eq!(reread, results);
    }

    #[test]
    fn test_exported_schema() {
        let grid = GridSpec {
            first_snr_db: -1.0,
            snr_step_db: 1.0,
            num_snr: 2,
            code_sizes: vec![4],
            iterations: 10,
        };
        let mut channel = ScriptedChannel::new(vec![ok(0.2), ok(0.1)]);
        let results = run_sweep(&grid, &mut channel).unwrap();
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["snr_values"], serde_json::json!([-1.0, 0.0]));
        assert_eq!(value["code_sizes"], serde_json::json!([4]));
        assert_eq!(value["results"]["4"], serde_json::json!([0.2, 0.1]));
        assert_eq!(value["iterations"], 10);
    }
}
