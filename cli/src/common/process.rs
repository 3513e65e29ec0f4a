//! # stackctl Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//!
//! ## Overview
//!
//! Thin async wrappers around `tokio::process::Command` for the external
//! tools stackctl drives (`docker`, `systemctl`, `restic`, `df`, `ss`).
//! No call sets a timeout and none is cancellable from inside the tool.
//!
//! ## Architecture
//!
//! - **`run_capture`**: Runs to completion and returns stdout and stderr
//!   combined. A non-zero exit becomes `StackError::ExternalCommand` carrying
//!   that combined output.
//! - **`run_streamed`**: Inherits the terminal's stdio so the operator sees
//!   progress live (`docker compose up`, `restic backup`). Extra environment
//!   variables can be passed to the child only.
//! - **`pipe_stdout_into`**: Copies a child's stdout into any `Write` sink
//!   chunk by chunk while stderr is collected on a separate task, so neither
//!   pipe can fill up and stall the child. If the sink fails the child is
//!   killed and reaped before the error is returned.
//!
//! ## Examples
//!
//! ```rust
//! let out = process::run_capture("docker", &["compose".into(), "version".into()]).await?;
//! process::run_streamed("systemctl", &["daemon-reload".into()], &[]).await?;
//! ```
//!
use crate::core::error::{Result, StackError};
use anyhow::{anyhow, Context};
use std::io::Write;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

fn display(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

fn exit_code(status: &ExitStatus) -> String {
    status.code().map_or("?".to_string(), |c| c.to_string())
}

/// Runs `program` and returns its combined stdout and stderr.
pub async fn run_capture(program: &str, args: &[String]) -> Result<String> {
    let shown = display(program, args);
    debug!("Capturing: {}", shown);
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to execute '{}'. Is it installed and in PATH?", program))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        debug!("'{}' exited with {}", shown, exit_code(&output.status));
        return Err(anyhow!(StackError::ExternalCommand {
            cmd: shown,
            status: exit_code(&output.status),
            output: combined,
        }));
    }
    Ok(combined)
}

/// Runs `program` with inherited stdio and the given extra environment.
pub async fn run_streamed(program: &str, args: &[String], envs: &[(String, String)]) -> Result<()> {
    let shown = display(program, args);
    info!("Executing: {}", shown);
    let status = Command::new(program)
        .args(args)
        .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to execute '{}'. Is it installed and in PATH?", program))?;

    if !status.success() {
        error!("'{}' failed with exit code {}", shown, exit_code(&status));
        return Err(anyhow!(StackError::ExternalCommand {
            cmd: shown,
            status: exit_code(&status),
            output: "Command failed. See terminal output above for details.".to_string(),
        }));
    }
    Ok(())
}

/// Streams the child's stdout into `sink`. Returns the number of bytes copied.
///
/// On a non-zero exit the collected stderr becomes the error output.
pub async fn pipe_stdout_into<W: Write>(program: &str, args: &[String], sink: &mut W) -> Result<u64> {
    let shown = display(program, args);
    info!("Streaming output of: {}", shown);
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute '{}'. Is it installed and in PATH?", program))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout of '{}' was not captured", shown))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr of '{}' was not captured", shown))?;
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf).await;
        buf
    });

    let copied: Result<u64> = async {
        let mut copied = 0u64;
        let mut chunk = vec![0u8; 64 * 1024];
        loop {
            let n = stdout
                .read(&mut chunk)
                .await
                .with_context(|| format!("Failed reading output of '{}'", shown))?;
            if n == 0 {
                break;
            }
            sink.write_all(&chunk[..n])
                .context("Failed writing command output")?;
            copied += n as u64;
        }
        Ok(copied)
    }
    .await;
    let copied = match copied {
        Ok(n) => n,
        Err(e) => {
            // Kill and reap the child so it does not outlive the failed copy.
            if let Err(kill_err) = child.kill().await {
                warn!("Could not stop '{}': {}", shown, kill_err);
            }
            let _ = stderr_task.await;
            return Err(e);
        }
    };

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed waiting for '{}'", shown))?;
    let stderr_bytes = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(anyhow!(StackError::ExternalCommand {
            cmd: shown,
            status: exit_code(&status),
            output: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        }));
    }
    debug!("Copied {} bytes from '{}'", copied, shown);
    Ok(copied)
}
