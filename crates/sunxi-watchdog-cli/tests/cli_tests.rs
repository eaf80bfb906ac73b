//! Integration tests for the watchdog binaries.
//!
//! None of these reach the hardware. Runs that get past start-up map a
//! zeroed temporary file in place of `/dev/mem` and read the register words
//! back from it afterwards.

use assert_cmd::Command;
use predicates::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const MISSING_MEM: &str = "/nonexistent/sunxi-watchdog-mem";

fn feeder() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("watchdog-feeder")?;
    cmd.env_remove("SUNXI_WDT_MEM_DEVICE")
        .env_remove("SUNXI_WDT_BASE")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

fn supervisor() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("watchdog-supervisor")?;
    cmd.env_remove("SUNXI_WDT_MEM_DEVICE")
        .env_remove("SUNXI_WDT_BASE")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

mod feeder_usage {
    use super::*;

    #[test]
    fn test_missing_timeout_prints_usage() -> TestResult {
        feeder()?
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Usage: watchdog-feeder"))
            .stdout(predicate::str::contains("-1"));
        Ok(())
    }

    #[test]
    fn test_non_numeric_timeout_prints_usage() -> TestResult {
        feeder()?
            .arg("soon")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Usage: watchdog-feeder"));
        Ok(())
    }

    #[test]
    fn test_negative_timeout_prints_usage() -> TestResult {
        feeder()?
            .arg("-5")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("upper limit"));
        Ok(())
    }

    #[test]
    fn test_help_succeeds() -> TestResult {
        feeder()?
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("INITIAL_TIMEOUT_SECONDS"));
        Ok(())
    }
}

mod device_access {
    use super::*;

    #[test]
    fn test_feeder_reports_missing_device() -> TestResult {
        feeder()?
            .args(["--mem-device", MISSING_MEM, "10"])
            .write_stdin("5\n")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("cannot access the watchdog"));
        Ok(())
    }

    #[test]
    fn test_supervisor_reports_missing_device() -> TestResult {
        supervisor()?
            .args(["--mem-device", MISSING_MEM, "true"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains(MISSING_MEM));
        Ok(())
    }

    #[test]
    fn test_misaligned_base_address_is_rejected() -> TestResult {
        supervisor()?
            .args(["--mem-device", MISSING_MEM, "--base-address", "0x01c20004"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid register window"));
        Ok(())
    }

    #[test]
    fn test_env_overrides_mem_device() -> TestResult {
        supervisor()?
            .env("SUNXI_WDT_MEM_DEVICE", MISSING_MEM)
            .assert()
            .code(1)
            .stderr(predicate::str::contains(MISSING_MEM));
        Ok(())
    }
}

#[test]
fn test_supervisor_help_succeeds() -> TestResult {
    supervisor()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PROGRAM"));
    Ok(())
}

mod register_effects {
    use super::*;
    use assert_cmd::cargo::CommandCargoExt;
    use std::path::Path;
    use std::process::Stdio;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::NamedTempFile;

    const CONTROL: usize = 0xc90;
    const MODE: usize = 0xc94;
    const ARMED: u32 = 0x2b;
    const DEADLINE: Duration = Duration::from_secs(10);

    fn register_file() -> Result<NamedTempFile, Box<dyn std::error::Error>> {
        let file = NamedTempFile::new()?;
        file.as_file().set_len(4096)?;
        Ok(file)
    }

    fn register(path: &Path, offset: usize) -> Result<u32, Box<dyn std::error::Error>> {
        let bytes = std::fs::read(path)?;
        let word = bytes
            .get(offset..offset + 4)
            .ok_or("register outside the window")?;
        Ok(u32::from_ne_bytes(word.try_into()?))
    }

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let started = Instant::now();
        while started.elapsed() < DEADLINE {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn test_feeder_disarms_and_exits_on_sentinel() -> TestResult {
        let mem = register_file()?;
        feeder()?
            .arg("--mem-device")
            .arg(mem.path())
            .args(["--base-address", "0", "5"])
            .write_stdin("-1\n")
            .timeout(DEADLINE)
            .assert()
            .success()
            .stderr(predicate::str::contains("Activating the watchdog"))
            .stderr(predicate::str::contains("Deactivating the watchdog"));
        assert_eq!(register(mem.path(), MODE)?, 0);
        Ok(())
    }

    #[test]
    fn test_feeder_keeps_kicking_after_refresh() -> TestResult {
        let mem = register_file()?;
        feeder()?
            .arg("--mem-device")
            .arg(mem.path())
            .args(["--base-address", "0", "5"])
            .write_stdin("5\n")
            .timeout(Duration::from_millis(2500))
            .assert()
            .interrupted();
        assert_eq!(register(mem.path(), CONTROL)?, 0x14af);
        assert_eq!(register(mem.path(), MODE)?, ARMED);
        Ok(())
    }

    #[test]
    fn test_supervisor_disarms_after_clean_exit() -> TestResult {
        let mem = register_file()?;
        supervisor()?
            .arg("--mem-device")
            .arg(mem.path())
            .args(["--base-address", "0", "true"])
            .timeout(DEADLINE)
            .assert()
            .success();
        assert_eq!(register(mem.path(), MODE)?, 0);
        Ok(())
    }

    #[test]
    fn test_supervisor_leaves_watchdog_armed_after_failure() -> TestResult {
        let mem = register_file()?;
        supervisor()?
            .arg("--mem-device")
            .arg(mem.path())
            .args(["--base-address", "0", "sh", "-c", "exit 3"])
            .timeout(Duration::from_secs(3))
            .assert()
            .interrupted();
        assert_eq!(register(mem.path(), MODE)?, ARMED);
        Ok(())
    }

    #[test]
    fn test_sigterm_disarms_unsupervised_run() -> TestResult {
        let mem = register_file()?;
        let mut child = std::process::Command::cargo_bin("watchdog-supervisor")?
            .env_remove("SUNXI_WDT_MEM_DEVICE")
            .env_remove("SUNXI_WDT_BASE")
            .arg("--mem-device")
            .arg(mem.path())
            .args(["--base-address", "0"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let armed = wait_for(|| register(mem.path(), MODE).is_ok_and(|mode| mode == ARMED));
        if !armed {
            child.kill()?;
            return Err("supervisor never armed the watchdog".into());
        }

        let sent = std::process::Command::new("kill")
            .args(["-TERM", &child.id().to_string()])
            .status()?;
        assert!(sent.success());

        let mut status = None;
        let exited = wait_for(|| {
            status = child.try_wait().ok().flatten();
            status.is_some()
        });
        if !exited {
            child.kill()?;
            return Err("supervisor ignored SIGTERM".into());
        }

        assert_eq!(status.and_then(|status| status.code()), Some(0));
        assert_eq!(register(mem.path(), MODE)?, 0);
        Ok(())
    }
}
