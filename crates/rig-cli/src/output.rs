//! JSON/human dual-mode printer.
//!
//! The mode is threaded explicitly as an `OutputMode` value rather than a
//! global: the diagnostic/report path and the error path both need to know
//! which mode is active, and a value passed down from `main` says so
//! without a shared mutable static.

use std::io::{self, Write};

use serde::Serialize;
use termcolor::{ColorChoice, StandardStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_flag(json: bool) -> Self {
        if json { OutputMode::Json } else { OutputMode::Human }
    }
}

pub fn print<T: Serialize>(_mode: OutputMode, value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    println!("{s}");
    Ok(())
}

/// Emit an error as the single JSON diagnostic §7 requires, on stderr.
pub fn print_error<E: Serialize>(mode: OutputMode, err: &E) {
    let rendered = match mode {
        OutputMode::Json => serde_json::to_string(err),
        OutputMode::Human => serde_json::to_string_pretty(err),
    };
    if let Ok(s) = rendered {
        let _ = writeln!(io::stderr(), "{s}");
    }
}

pub fn stdout() -> StandardStream {
    StandardStream::stdout(ColorChoice::Auto)
}
