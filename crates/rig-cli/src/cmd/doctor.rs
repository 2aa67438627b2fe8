use std::process::Command;

use anyhow::Result;
use serde::Serialize;

use crate::output::{self, OutputMode};

#[derive(Debug, Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorOut {
    pub ok: bool,
    pub checks: Vec<Check>,
}

pub fn run(mode: OutputMode) -> Result<()> {
    let checks = vec![versioned_check("cmake", &["--version"]), versioned_check("ctest", &["--version"])];

    let ok = checks.iter().all(|c| c.ok);
    output::print(mode, &DoctorOut { ok, checks })?;
    Ok(())
}

/// Run `cmd --version` and report whether it succeeded, carrying the first
/// line of output (the version string) as the check's detail.
fn versioned_check(cmd: &str, args: &[&str]) -> Check {
    match Command::new(cmd).args(args).output() {
        Ok(output) if output.status.success() => {
            let detail = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("")
                .to_string();
            Check { name: cmd.to_string(), ok: true, detail }
        }
        Ok(output) => Check {
            name: cmd.to_string(),
            ok: false,
            detail: format!("exited with {}", output.status),
        },
        Err(e) => Check {
            name: cmd.to_string(),
            ok: false,
            detail: format!("not found on PATH: {e}"),
        },
    }
}
