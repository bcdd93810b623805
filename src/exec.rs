//! External command execution
//!
//! Every call to the disk service, the mount utilities and the image tool
//! goes through a [`CommandExecutor`], so error formatting and logging stay
//! uniform and tests can swap in a recording fake.

use crate::config::schema::ExecConfig;
use crate::error::{PdCacheError, PdCacheResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, trace};

/// Max number of output lines kept in command errors.
const ERROR_TAIL_LINES: usize = 50;

/// Runs external programs
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args` and return its combined stdout and stderr.
    ///
    /// A non-zero exit is an error carrying the command line, the exit code
    /// and the captured output.
    async fn run(&self, program: &str, args: &[String]) -> PdCacheResult<String>;
}

/// Render a command line for logs and errors
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Keep the last `ERROR_TAIL_LINES` lines of command output.
pub(crate) fn error_tail(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Executor that spawns real processes
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &ExecConfig) -> Self {
        Self::new(config.timeout())
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn run(&self, program: &str, args: &[String]) -> PdCacheResult<String> {
        let command = command_line(program, args);
        debug!("Executing: {}", command);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PdCacheError::command_failed(command.clone(), e))?;

        let finished = async {
            let lines = stream_child_output(&mut child).await;
            let status = child.wait().await;
            (lines, status)
        };

        let (lines, status) = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, finished).await.map_err(|_| {
                PdCacheError::CommandTimeout {
                    command: command.clone(),
                    secs: limit.as_secs(),
                }
            })?,
            None => finished.await,
        };

        let status = status.map_err(|e| PdCacheError::command_failed(command.clone(), e))?;

        if status.success() {
            Ok(lines.join("\n"))
        } else {
            Err(PdCacheError::CommandExit {
                command,
                code: status.code(),
                output: error_tail(&lines),
            })
        }
    }
}

/// Read stdout and stderr of a child until both close.
///
/// Lines are returned in the order they arrived, so the two streams end up
/// interleaved the way a terminal would show them. Bytes that are not valid
/// UTF-8 are replaced rather than ending the read, so the child never blocks
/// on a full pipe.
async fn stream_child_output(child: &mut Child) -> Vec<String> {
    let mut all_output = Vec::new();

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return all_output;
    };

    let mut stdout = Some(BufReader::new(stdout));
    let mut stderr = Some(BufReader::new(stderr));
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_chunk(&mut stdout, &mut stdout_buf), if stdout.is_some() => {
                if !take_line(read, &mut stdout_buf, "|", &mut all_output) {
                    stdout = None;
                }
            }
            read = read_chunk(&mut stderr, &mut stderr_buf), if stderr.is_some() => {
                if !take_line(read, &mut stderr_buf, "!", &mut all_output) {
                    stderr = None;
                }
            }
        }
    }

    all_output
}

/// Read up to the next newline; partial reads stay in `buf` across cancellation.
async fn read_chunk<R>(reader: &mut Option<R>, buf: &mut Vec<u8>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    match reader {
        Some(reader) => reader.read_until(b'\n', buf).await,
        None => Ok(0),
    }
}

/// Move the buffered line into `output`. Returns false once the stream has ended.
fn take_line(
    read: std::io::Result<usize>,
    buf: &mut Vec<u8>,
    marker: &str,
    output: &mut Vec<String>,
) -> bool {
    let open = matches!(read, Ok(n) if n > 0);
    if let Err(e) = read {
        debug!("Stopped reading command output: {}", e);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if open {
        // No newline yet; wait for the rest of the line.
        return true;
    }

    if open || !buf.is_empty() {
        let line = String::from_utf8_lossy(buf).into_owned();
        trace!("{} {}", marker, line);
        output.push(line);
    }
    buf.clear();
    open
}
