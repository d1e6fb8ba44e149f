//! Running external programs.
//!
//! Failures carry the program's stderr so the caller's error says why.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Builder for a captured, non-interactive command.
pub struct Cmd {
    program: String,
    args: Vec<String>,
    error_prefix: Option<String>,
}

impl Cmd {
    pub fn new(program: impl AsRef<str>) -> Self {
        Self {
            program: program.as_ref().to_string(),
            args: Vec::new(),
            error_prefix: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_string()));
        self
    }

    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Prefix for the error returned on a non-zero exit.
    pub fn error_msg(mut self, msg: impl AsRef<str>) -> Self {
        self.error_prefix = Some(msg.as_ref().to_string());
        self
    }

    /// Run to completion and return stdout.
    pub fn run(self) -> Result<String> {
        tracing::debug!(program = %self.program, args = ?self.args, "running command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("Failed to execute '{}'. Is it installed?", self.program))?;

        if !output.status.success() {
            let prefix = self
                .error_prefix
                .unwrap_or_else(|| format!("'{}' failed", self.program));
            let status = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "killed by signal".to_string(),
            };
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                bail!("{} ({})", prefix, status);
            }
            bail!("{} ({}):\n{}", prefix, status, stderr);
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
