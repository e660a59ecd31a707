//! Invokes the external parsing engine as a child process.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use super::{ParseEngine, ParseRequest};
use crate::config::AppConfig;

/// Runs `<program> <args>... [--ignore <pattern>]... -- <path>...`.
#[derive(Debug, Clone)]
pub struct CommandParseEngine {
    program: String,
    args: Vec<String>,
}

impl CommandParseEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.engine_program.clone(), config.engine_args.clone())
    }

    /// The full argument list for one request.
    pub fn command_args(&self, request: &ParseRequest) -> Vec<String> {
        let mut args = self.args.clone();
        for pattern in &request.ignore_patterns {
            args.push("--ignore".to_string());
            args.push(pattern.clone());
        }
        args.push("--".to_string());
        args.extend(request.paths.iter().cloned());
        args
    }
}

#[async_trait]
impl ParseEngine for CommandParseEngine {
    async fn submit_parse(&self, request: &ParseRequest) -> Result<()> {
        tracing::debug!("Running `{}` for {} paths", self.program, request.paths.len());

        let output = Command::new(&self.program)
            .args(self.command_args(request))
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to start `{}`", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ParseRequest {
        ParseRequest {
            paths: vec!["/p/a.rs".into(), "/p/--weird.rs".into()],
            ignore_patterns: vec![".git".into(), "target".into()],
        }
    }

    #[test]
    fn test_command_args_put_paths_after_separator() {
        let engine = CommandParseEngine::new("engine", vec!["parse".into()]);
        assert_eq!(
            engine.command_args(&request()),
            vec![
                "parse", "--ignore", ".git", "--ignore", "target", "--", "/p/a.rs",
                "/p/--weird.rs"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let engine = CommandParseEngine::new("/definitely/not/a/parser-engine", vec![]);
        let err = engine.submit_parse(&request()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to start"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_decides_success() {
        let ok = CommandParseEngine::new("sh", vec!["-c".into(), "exit 0".into()]);
        ok.submit_parse(&request()).await.unwrap();

        let failing = CommandParseEngine::new(
            "sh",
            vec!["-c".into(), "echo engine broke >&2; exit 3".into()],
        );
        let err = failing.submit_parse(&request()).await.unwrap_err();
        assert!(err.to_string().contains("engine broke"));
    }
}
