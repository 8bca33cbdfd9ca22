//! Notebook execution via a shell command template.
//!
//! The template is parsed once with `shell-words`; `{url}` and `{name}`
//! tokens are substituted per notebook, and the url is appended when no
//! `{url}` token is present. The child process sees `REHEARSE_DATA` pointing
//! at the data directory so executed notebooks can locate fetched datasets.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{ensure, Context, Result};

use rehearse_core::NotebookName;
use rehearse_runner::{ExecutionError, NotebookExecutor};

/// Default command template: execute the notebook in place.
pub const DEFAULT_EXEC_TEMPLATE: &str =
    "jupyter nbconvert --to notebook --execute --inplace {url}";

/// How many trailing stderr lines to keep in an execution error.
const STDERR_TAIL_LINES: usize = 8;

/// Concrete [`NotebookExecutor`] that shells out per notebook.
#[derive(Debug)]
pub struct CommandExecutor {
    template: Vec<String>,
    data_dir: PathBuf,
}

impl CommandExecutor {
    /// Parse a command template into an executor.
    pub fn from_template(template: &str, data_dir: PathBuf) -> Result<Self> {
        let argv = shell_words::split(template)
            .with_context(|| format!("invalid exec command template: {template}"))?;
        ensure!(!argv.is_empty(), "exec command template is empty");
        Ok(Self {
            template: argv,
            data_dir,
        })
    }

    fn argv_for(&self, name: &NotebookName, url: &str) -> Vec<String> {
        let mut argv: Vec<String> = self
            .template
            .iter()
            .map(|word| word.replace("{url}", url).replace("{name}", &name.0))
            .collect();
        if !self.template.iter().any(|word| word.contains("{url}")) {
            argv.push(url.to_string());
        }
        argv
    }
}

impl NotebookExecutor for CommandExecutor {
    fn execute(&self, name: &NotebookName, url: &str) -> Result<(), ExecutionError> {
        let argv = self.argv_for(name, url);
        let command_line = shell_words::join(&argv);
        tracing::debug!(notebook = %name, command = %command_line, "spawning executor");

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .env("REHEARSE_DATA", &self.data_dir)
            .output()
            .map_err(|source| ExecutionError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExecutionError::Exit {
                command: command_line,
                status: output.status,
                stderr_tail: stderr_tail(&output.stderr),
            });
        }
        Ok(())
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
