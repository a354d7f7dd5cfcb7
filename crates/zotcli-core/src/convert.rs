//! Markup conversion backed by the pandoc executable.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{Result, ZotError};
use crate::translate::MarkupConverter;

/// `MarkupConverter` that shells out to pandoc.
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
}

impl PandocConverter {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("pandoc"),
        }
    }

    /// Use a specific pandoc binary instead of the one on PATH.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PandocConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupConverter for PandocConverter {
    fn convert(&self, text: &str, from: &str, to: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .arg("--from")
            .arg(from)
            .arg("--to")
            .arg(to)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ZotError::conversion(
                    to,
                    format!("failed to launch {}: {}", self.program.display(), e),
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| ZotError::conversion(to, format!("failed to write input: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ZotError::conversion(to, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ZotError::conversion(
                to,
                format!("pandoc exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
