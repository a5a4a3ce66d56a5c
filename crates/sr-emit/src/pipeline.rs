//! Generation runs: pick the emitters, stage their output, commit it.

use crate::call::generate_call;
use crate::context::GenContext;
use crate::listen::generate_listen;
use crate::signal::generate_signal;
use crate::slot::generate_slot;
use sr_core::Result;
use sr_core::generated::{CommitReport, Staging};
use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKind {
    Call,
    Slot,
    Signal,
    Listen,
    All,
}

impl GenKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Slot => "slot",
            Self::Signal => "signal",
            Self::Listen => "listen",
            Self::All => "all",
        }
    }
}

impl fmt::Display for GenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "call" => Ok(Self::Call),
            "slot" => Ok(Self::Slot),
            "signal" => Ok(Self::Signal),
            "listen" => Ok(Self::Listen),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown generator '{other}', expected call, slot, signal, listen or all"
            )),
        }
    }
}

/// Stage the output of one generator, or of all of them for
/// [`GenKind::All`]. Nothing is written.
pub fn generate(ctx: &GenContext, kind: GenKind) -> Result<Staging> {
    let mut staging = Staging::new();
    match kind {
        GenKind::Call => generate_call(ctx, &mut staging)?,
        GenKind::Slot => generate_slot(ctx, &mut staging)?,
        GenKind::Signal => generate_signal(ctx, &mut staging)?,
        GenKind::Listen => generate_listen(ctx, &mut staging)?,
        GenKind::All => {
            generate_slot(ctx, &mut staging)?;
            generate_signal(ctx, &mut staging)?;
            generate_call(ctx, &mut staging)?;
            generate_listen(ctx, &mut staging)?;
        }
    }
    tracing::debug!(kind = %kind, files = staging.len(), "staged generation");
    Ok(staging)
}

/// Generate and commit, then format written files if configured.
pub fn run(ctx: &GenContext, kind: GenKind) -> Result<CommitReport> {
    let staging = generate(ctx, kind)?;
    commit(ctx, staging)
}

/// Commit staged output and run the configured formatter over it.
pub fn commit(ctx: &GenContext, staging: Staging) -> Result<CommitReport> {
    let report = staging.commit()?;
    if ctx.config.format.gofmt {
        gofmt(&report.written);
    }
    Ok(report)
}

/// `gofmt -w` over `files`. Failures are logged and never fail the run.
fn gofmt(files: &[PathBuf]) {
    if files.is_empty() {
        return;
    }
    let mut cmd = Command::new("gofmt");
    cmd.arg("-w").args(files);
    match cmd.output() {
        Ok(output) if output.status.success() => {
            tracing::debug!(files = files.len(), "formatted with gofmt");
        }
        Ok(output) => tracing::warn!(
            code = ?output.status.code(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "gofmt failed, generated files left unformatted"
        ),
        Err(e) => tracing::warn!(error = %e, "cannot run gofmt, generated files left unformatted"),
    }
}
