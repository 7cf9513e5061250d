//! Output sink: direct write or an external pager.

use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::config::EnvSettings;

/// Rows assumed when the terminal height is unknown.
pub const DEFAULT_ROWS: u16 = 24;

const DEFAULT_PAGER: &str = "less";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Direct,
    Paged,
}

/// Facts about standard output, captured once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalInfo {
    pub is_terminal: bool,
    pub columns: Option<u16>,
    pub rows: Option<u16>,
}

impl TerminalInfo {
    pub fn detect() -> Self {
        let is_terminal = io::stdout().is_terminal();
        let size = if is_terminal {
            crossterm::terminal::size().ok()
        } else {
            None
        };
        Self {
            is_terminal,
            columns: size.map(|(cols, _)| cols).filter(|c| *c > 0),
            rows: size.map(|(_, rows)| rows).filter(|r| *r > 0),
        }
    }
}

/// Decide how output of `line_count` lines is shown.
///
/// Pages only on an interactive terminal with paging enabled, and only when
/// the output fills more than 90% of the terminal height.
pub fn select_output_mode(line_count: usize, terminal: &TerminalInfo, paging: bool) -> OutputMode {
    if !terminal.is_terminal || !paging {
        return OutputMode::Direct;
    }
    let rows = usize::from(terminal.rows.unwrap_or(DEFAULT_ROWS));
    if line_count.saturating_mul(10) > rows * 9 {
        OutputMode::Paged
    } else {
        OutputMode::Direct
    }
}

/// Pager program and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PagerCommand {
    /// `MDMD_PAGER`, then `PAGER`, then `less`.
    pub fn resolve(env: &EnvSettings) -> Self {
        env.pager
            .as_deref()
            .and_then(Self::parse)
            .unwrap_or_else(|| Self {
                program: DEFAULT_PAGER.to_string(),
                args: Vec::new(),
            })
    }

    /// Split a command line on whitespace. `None` when it is blank.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(ToString::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn is_less(&self) -> bool {
        Path::new(&self.program)
            .file_stem()
            .is_some_and(|stem| stem == DEFAULT_PAGER)
    }
}

/// Write `text` in the chosen mode and return the exit status to report.
///
/// A pager that cannot be found falls back to writing to `direct`. A reader
/// that goes away early (closed pipe) is not an error.
///
/// # Errors
///
/// Returns an error if the pager fails to start for a reason other than
/// not being installed, or if writing fails.
pub fn write_output(
    text: &str,
    mode: OutputMode,
    pager: &PagerCommand,
    env: &EnvSettings,
    direct: &mut impl Write,
) -> Result<i32> {
    if mode == OutputMode::Direct {
        write_direct(direct, text).context("Failed to write output")?;
        return Ok(0);
    }

    let _scope = crate::perf::scope("pager.run");
    let mut command = Command::new(&pager.program);
    command.args(&pager.args).stdin(Stdio::piped());
    if pager.is_less() && !env.less_set {
        command.env("LESS", "-R");
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(pager = %pager.program, "pager not found, writing directly");
            write_direct(direct, text).context("Failed to write output")?;
            return Ok(0);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to start pager {}", pager.program));
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(text.as_bytes()) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {}
            Err(err) => return Err(err).context("Failed to write to pager"),
        }
    }

    let status = child.wait().context("Failed to wait for pager")?;
    Ok(status.code().unwrap_or(1))
}

fn write_direct(out: &mut impl Write, text: &str) -> io::Result<()> {
    match out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
