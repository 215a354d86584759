//! Launching an external editor at a file position

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

const PATH_PLACEHOLDER: &str = "{path}";
const LINE_PLACEHOLDER: &str = "{line}";

/// A tokenized editor command template such as `cursor -g {path}:{line}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    program: String,
    args: Vec<String>,
}

impl EditorCommand {
    pub fn parse(template: &str) -> Result<Self> {
        let mut words = shell_words::split(template)
            .with_context(|| format!("Invalid editor command: {}", template))?;
        if words.is_empty() {
            bail!("Editor command is empty");
        }
        let program = words.remove(0);

        // Without a placeholder the position goes last
        if !words.iter().any(|w| w.contains(PATH_PLACEHOLDER)) {
            words.push(format!("{}:{}", PATH_PLACEHOLDER, LINE_PLACEHOLDER));
        }

        Ok(Self {
            program,
            args: words,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders substituted
    pub fn args_for(&self, path: &Path, line: u32) -> Vec<String> {
        let path = path.to_string_lossy();
        let line = line.max(1).to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(PATH_PLACEHOLDER, &path)
                    .replace(LINE_PLACEHOLDER, &line)
            })
            .collect()
    }

    /// Start the editor without waiting for it to exit
    pub fn spawn(&self, path: &Path, line: u32) -> Result<()> {
        let args = self.args_for(path, line);
        debug!(program = %self.program, ?args, "launching editor");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.program))?;

        // Reap the child so it does not linger as a zombie
        std::thread::spawn(move || {
            if let Err(err) = child.wait() {
                warn!(error = %err, "editor process wait failed");
            }
        });
        Ok(())
    }
}
