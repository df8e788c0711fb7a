//! One-shot request/response exchange with the external channel simulator
//!
//! The simulator is a separate program that takes the path to a JSON request artifact as its sole
//! command-line argument, runs one channel simulation, and writes a JSON response artifact named
//! `result.json` into its working directory. Exit status zero signals success; any diagnostic
//! text goes to its standard error stream.
//!
//! [`ProcessSimulator`] implements this protocol with exactly one attempt per request and a
//! bounded wait. The request artifact is removed on every exit path, and any response artifact
//! left over from an earlier call is removed before the process is spawned, so a failed call can
//! never be satisfied by a stale response.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Simulation mode string expected by the external program
const SIMULATION_MODE: &str = "channel simulation";

/// Request artifact file name inside the working directory
const REQUEST_FILENAME: &str = "temp_input.json";

/// Response artifact file name inside the working directory
const RESPONSE_FILENAME: &str = "result.json";

/// Interval at which a running simulator process is polled for completion
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Request artifact consumed by the external simulator
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct SimRequest {
    /// Simulation mode
    pub mode: String,
    /// Number of PUCCH format 2 payload bits
    pub num_of_pucch_f2_bits: u32,
    /// SNR (dB) at the channel output
    pub snr_db: f64,
    /// Number of simulation iterations
    pub iterations: u32,
}

impl SimRequest {
    /// Returns the channel-simulation request for one grid point.
    #[must_use]
    pub fn new(code_size: u32, snr_db: f64, iterations: u32) -> Self {
        Self {
            mode: SIMULATION_MODE.to_string(),
            num_of_pucch_f2_bits: code_size,
            snr_db,
            iterations,
        }
    }
}

/// Response artifact produced by the external simulator
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimResponse {
    /// Estimated block error rate, in `[0, 1]`
    pub bler: f64,
}

/// Enumeration of per-request failure causes
#[derive(thiserror::Error, Debug)]
pub enum InvokeError {
    /// I/O failure writing the request artifact or running the process
    #[error("{0}")]
    Io(#[from] io::Error),
    /// Simulator exited with a non-zero status
    #[error("simulator error: {0}")]
    Simulator(String),
    /// Simulator did not finish within the allowed time
    #[error("no response within {0} s")]
    Timeout(u64),
    /// Response artifact missing or malformed
    #[error("protocol violation: {0}")]
    Protocol(String),
}

/// Request/response channel to a channel simulator
///
/// A channel performs exactly one attempt per request; implementations never retry.
pub trait SimulatorChannel {
    /// Performs one request/response exchange.
    ///
    /// # Errors
    ///
    /// Returns an [`InvokeError`] identifying the failure cause; the caller decides whether the
    /// failure is fatal.
    fn send(&mut self, request: &SimRequest) -> Result<SimResponse, InvokeError>;
}

/// Channel to a simulator executable, exchanging JSON artifacts on disk
///
/// The request and response artifact locations are fixed for the lifetime of the channel, which
/// is why requests must stay strictly sequential; a concurrent variant would have to allocate a
/// unique pair of locations per in-flight request.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ProcessSimulator {
    /// Path to the simulator executable
    executable: PathBuf,
    /// Working directory of the simulator process
    work_dir: PathBuf,
    /// Location of the transient request artifact
    request_path: PathBuf,
    /// Location of the response artifact written by the simulator
    response_path: PathBuf,
    /// Ceiling (seconds) on the duration of one simulator run
    timeout_s: u64,
}

impl ProcessSimulator {
    /// Returns a channel that runs `executable` in `work_dir` with the given timeout.
    #[must_use]
    pub fn new(executable: &Path, work_dir: &Path, timeout_s: u64) -> Self {
        Self {
            executable: executable.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            request_path: work_dir.join(REQUEST_FILENAME),
            response_path: work_dir.join(RESPONSE_FILENAME),
            timeout_s,
        }
    }

    /// Spawns the simulator on the current request artifact and interprets its outcome.
    fn exchange(&self) -> Result<SimResponse, InvokeError> {
        let mut child = Command::new(&self.executable)
            .arg(&self.request_path)
            .current_dir(&self.work_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        let stderr = drain_stderr(&mut child);
        let Some(status) = wait_with_deadline(&mut child, Duration::from_secs(self.timeout_s))?
        else {
            child.kill().ok();
            let _ = child.wait();
            return Err(InvokeError::Timeout(self.timeout_s));
        };
        if !status.success() {
            let detail = stderr.join().unwrap_or_default();
            return Err(InvokeError::Simulator(detail.trim().to_string()));
        }
        self.read_response()
    }

    /// Reads and validates the response artifact.
    fn read_response(&self) -> Result<SimResponse, InvokeError> {
        let raw = fs::read_to_string(&self.response_path)
            .map_err(|error| InvokeError::Protocol(format!("no response artifact: {error}")))?;
        let response: SimResponse = serde_json::from_str(&raw)
            .map_err(|error| InvokeError::Protocol(format!("malformed response: {error}")))?;
        if !(0.0 ..= 1.0).contains(&response.bler) {
            return Err(InvokeError::Protocol(format!(
                "BLER {} outside [0, 1]",
                response.bler
            )));
        }
        Ok(response)
    }
}

impl SimulatorChannel for ProcessSimulator {
    fn send(&mut self, request: &SimRequest) -> Result<SimResponse, InvokeError> {
        // A response left over from an earlier call must not satisfy this one.
        remove_if_present(&self.response_path)?;
        fs::write(
            &self.request_path,
            serde_json::to_string_pretty(request).map_err(io::Error::other)?,
        )?;
        let outcome = self.exchange();
        // The request artifact never outlives the call, whatever the outcome.
        let _ = fs::remove_file(&self.request_path);
        outcome
    }
}

/// Collects the child's standard error stream on a separate thread.
///
/// Draining concurrently keeps a chatty simulator from blocking on a full pipe.
fn drain_stderr(child: &mut Child) -> thread::JoinHandle<String> {
    let mut pipe = child.stderr.take();
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(pipe) = pipe.as_mut() {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    })
}

/// Polls the child until it exits or the deadline passes.
///
/// Returns `None` on deadline expiry, with the child still running.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Removes a file, treating an already-missing file as success.
fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
