//! Boundary to external programs.
//!
//! One invocation, one blocking call, combined output. A non-zero exit is
//! logged and the output is still returned to the caller: the dashboard
//! displays whatever the program printed rather than treating the failure as
//! fatal.

use std::time::Instant;

/// Abstracts how an external program is run so the execution and navigation
/// layers can be exercised in tests without spawning processes.
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` and returns its combined output text.
    fn run(&self, program: &str, args: &[String]) -> String;
}

/// The real runner: spawns the program and captures stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> String {
        let started = Instant::now();
        let output = std::process::Command::new(program).args(args).output();
        match output {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                if !output.status.success() {
                    tracing::warn!(program, status = %output.status, "external program exited non-zero: {}", text.trim());
                }
                tracing::debug!(program, elapsed_ms = started.elapsed().as_millis() as u64, "external program finished");
                text
            }
            Err(err) => {
                tracing::error!(program, error = %err, "failed to spawn external program");
                String::new()
            }
        }
    }
}

impl<F> CommandRunner for F
where
    F: Fn(&str, &[String]) -> String + Send + Sync,
{
    fn run(&self, program: &str, args: &[String]) -> String {
        self(program, args)
    }
}
