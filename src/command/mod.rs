//! External Command Execution
//!
//! Runs command pipelines (`git … | …`) with an explicit working directory
//! instead of relying on the process-wide current directory. Every run
//! reports its wall-clock duration so callers can account for the time spent
//! in external processes through an [`ExecTime`] accumulator.

pub mod error;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Serialize;
use tokio::process::{Child, Command};

pub use error::{CommandError, CommandResult};

/// A single program invocation, one stage of a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// A `git` invocation with the given arguments
    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git").args(args)
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
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Render a pipeline the way a shell would show it
pub fn pipeline_display(stages: &[CommandSpec]) -> String {
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Captured stdout of the last pipeline stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub elapsed: Duration,
}

impl CommandOutput {
    /// Output with trailing newlines removed
    pub fn text(&self) -> &str {
        self.stdout.trim_end_matches('\n')
    }

    /// Output lines, interior blank lines preserved
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text().lines()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// A value produced by external commands together with the time they took
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timed<T> {
    pub value: T,
    pub exec: ExecTime,
}

impl<T> Timed<T> {
    pub fn new(value: T, exec: ExecTime) -> Self {
        Self { value, exec }
    }
}

/// Accumulated time spent in external commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExecTime {
    pub commands: u64,
    pub elapsed: Duration,
}

impl ExecTime {
    /// Time of a single command
    pub fn single(elapsed: Duration) -> Self {
        Self {
            commands: 1,
            elapsed,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.commands += 1;
        self.elapsed += elapsed;
    }

    pub fn absorb(&mut self, other: ExecTime) {
        self.commands += other.commands;
        self.elapsed += other.elapsed;
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

impl std::ops::Add for ExecTime {
    type Output = ExecTime;

    fn add(mut self, rhs: ExecTime) -> ExecTime {
        self.absorb(rhs);
        self
    }
}

/// Runs command pipelines inside one repository directory
///
/// Cloning is cheap; clones share the root path and can be moved into
/// parallel tasks.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    root: Arc<PathBuf>,
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
            timeout: None,
        }
    }

    /// Kill pipelines that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|limit| !limit.is_zero());
        self
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a single command
    pub async fn run(&self, spec: &CommandSpec) -> CommandResult<CommandOutput> {
        self.run_pipeline(std::slice::from_ref(spec)).await
    }

    /// Run the stages connected stdout to stdin and capture the last stdout
    pub async fn run_pipeline(&self, stages: &[CommandSpec]) -> CommandResult<CommandOutput> {
        if stages.is_empty() {
            return Err(CommandError::EmptyPipeline);
        }
        let display = pipeline_display(stages);
        let start = Instant::now();

        let mut children = self.spawn_stages(stages)?;
        let last = children.pop().ok_or(CommandError::EmptyPipeline)?;

        let wait = async {
            let output = last.wait_with_output().await.map_err(|source| CommandError::Io {
                command: display.clone(),
                source,
            })?;
            for mut upstream in children {
                upstream.wait().await.map_err(|source| CommandError::Io {
                    command: display.clone(),
                    source,
                })?;
            }
            Ok::<_, CommandError>(output)
        };

        // Dropping the wait future drops the children, which kills them
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| CommandError::Timeout {
                    command: display.clone(),
                    limit,
                })??,
            None => wait.await?,
        };
        let elapsed = start.elapsed();
        debug!("[{:.5}] >> {}", elapsed.as_secs_f64(), display);

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: display,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            elapsed,
        })
    }

    /// Run a pipeline, treating any failure as empty output
    ///
    /// The failure is logged as a warning; the elapsed time is still reported.
    pub async fn run_or_empty(&self, stages: &[CommandSpec]) -> CommandOutput {
        let start = Instant::now();
        match self.run_pipeline(stages).await {
            Ok(output) => output,
            Err(e) => {
                warn!("No data from external command: {}", e);
                CommandOutput {
                    stdout: String::new(),
                    elapsed: start.elapsed(),
                }
            }
        }
    }

    fn spawn_stages(&self, stages: &[CommandSpec]) -> CommandResult<Vec<Child>> {
        let mut children = Vec::with_capacity(stages.len());
        let mut upstream: Option<Stdio> = None;

        for (index, stage) in stages.iter().enumerate() {
            let is_last = index + 1 == stages.len();
            let mut command = Command::new(&stage.program);
            command
                .args(&stage.args)
                .current_dir(self.root.as_path())
                .stdin(upstream.take().unwrap_or_else(Stdio::null))
                .stdout(Stdio::piped())
                .stderr(if is_last { Stdio::piped() } else { Stdio::null() })
                .kill_on_drop(true);

            let mut child = command.spawn().map_err(|source| CommandError::Spawn {
                command: stage.to_string(),
                source,
            })?;

            if !is_last {
                let stdout = child.stdout.take().ok_or_else(|| CommandError::Pipe {
                    command: stage.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout not captured"),
                })?;
                let stdio: Stdio = stdout.try_into().map_err(|source| CommandError::Pipe {
                    command: stage.to_string(),
                    source,
                })?;
                upstream = Some(stdio);
            }
            children.push(child);
        }

        Ok(children)
    }
}
