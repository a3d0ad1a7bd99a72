// ABOUTME: A fully built agent command line plus how its reply is captured.
// ABOUTME: File-backed output owns its temp file, which is deleted when the invocation is dropped.

use crate::directive::SessionDirective;
use crate::env::Env;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;

/// Everything an adapter needs to build one invocation.
#[derive(Debug, Clone, Copy)]
pub struct InvocationContext<'a> {
    pub prompt: &'a str,
    pub workspace: Option<&'a Path>,
    pub timeout: Duration,
    pub directive: &'a SessionDirective,
    pub env: &'a Env,
}

/// Temporary file the agent writes its final message into.
#[derive(Debug)]
pub struct OutputFile {
    path: TempPath,
}

impl OutputFile {
    pub fn create() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("openab-reply-")
            .suffix(".txt")
            .tempfile()
            .context("Failed to create agent output file")?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug)]
pub enum OutputStrategy {
    /// Read the reply from the child's stdout, optionally interleaved with stderr
    Piped { merge_stderr: bool },
    /// Discard both streams and read the reply from a file after exit
    File(OutputFile),
}

#[derive(Debug)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Added on top of the inherited environment
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub output: OutputStrategy,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            output: OutputStrategy::Piped {
                merge_stderr: false,
            },
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, dir: Option<&Path>) -> Self {
        self.cwd = dir.map(Path::to_path_buf);
        self
    }

    pub fn output(mut self, output: OutputStrategy) -> Self {
        self.output = output;
        self
    }

    /// Program followed by its arguments, for logging and assertions
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Value following the first occurrence of `flag`
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn output_file(&self) -> Option<&Path> {
        match &self.output {
            OutputStrategy::File(file) => Some(file.path()),
            OutputStrategy::Piped { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_removed_on_drop() {
        let file = OutputFile::create().unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn test_argv_and_lookups() {
        let inv = Invocation::new("/bin/agent")
            .args(["--model", "m1"])
            .arg("prompt")
            .env("K", "v1")
            .env("K", "v2");
        assert_eq!(inv.argv(), vec!["/bin/agent", "--model", "m1", "prompt"]);
        assert_eq!(inv.arg_value("--model"), Some("m1"));
        assert_eq!(inv.arg_value("--missing"), None);
        assert_eq!(inv.env_value("K"), Some("v2"));
        assert!(inv.output_file().is_none());
    }
}
