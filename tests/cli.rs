//! End-to-end checks of the sweep binary

use std::fs;
use std::process::Command;

use pucch_bler::SweepResults;

#[test]
fn test_missing_executable_is_fatal_before_any_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_pucch-bler"))
        .current_dir(dir.path())
        .args(["-e", "./no_such_simulator", "-s", "2", "-c", "4", "-t", "5"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    // The sweep never started: no artifact of any kind was produced.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn test_sweep_writes_aligned_results() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let sim = dir.path().join("sim.sh");
    fs::write(&sim, "#!/bin/sh\nprintf '{\"bler\": 0.25}' > result.json\n").unwrap();
    fs::set_permissions(&sim, fs::Permissions::from_mode(0o755)).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_pucch-bler"))
        .current_dir(dir.path())
        .args([
            "-e", "./sim.sh", "-r", "-1.0", "-p", "1.0", "-s", "2", "-c", "4", "8", "-i", "10",
            "-t", "10",
        ])
        .output()
        .unwrap();
    // A chart-rendering failure (e.g. no fonts on the host) is reported but not fatal, so the
    // exit status stays zero as long as the results artifact was written.
    assert_eq!(output.status.code(), Some(0));

    let results = SweepResults::from_json_file(&dir.path().join("bler_results.json")).unwrap();
    assert_eq!(results.snr_values, [-1.0, 0.0]);
    assert_eq!(results.code_sizes, [4, 8]);
    assert_eq!(results.iterations, 10);
    for &code_size in &results.code_sizes {
        assert_eq!(results.blers_for(code_size).unwrap(), &[0.25, 0.25][..]);
    }
    // The transient request artifact does not outlive the sweep.
    assert!(!dir.path().join("temp_input.json").exists());
}
