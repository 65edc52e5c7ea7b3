use std::io::Write;

use anyhow::Result;
use tracing::warn;

use super::prompt::Prompter;

/// The user declined to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canceled;

impl std::fmt::Display for Canceled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("canceled by user")
    }
}

impl std::error::Error for Canceled {}

/// Runs `op` until it succeeds or the user declines to retry.
///
/// Each attempt re-runs the whole operation. Declining returns the last error wrapped in
/// [`Canceled`].
pub fn with_retry<T>(
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
    label: &str,
    mut op: impl FnMut(&mut dyn Write) -> Result<T>,
) -> Result<T> {
    let mut attempt = 1u32;
    loop {
        let err = match op(&mut *out) {
            Ok(v) => return Ok(v),
            Err(err) => err,
        };
        warn!(label, attempt, error = %format!("{:#}", err), "remote operation failed");
        writeln!(out, "An error occurred while trying to {}: {:#}", label, err)?;
        if !prompter.confirm("Retry?")? {
            writeln!(out, "Canceled.")?;
            return Err(err.context(Canceled));
        }
        attempt += 1;
    }
}

#[cfg(test)]
#[path = "../tests/import/retry_tests.rs"]
mod tests;
