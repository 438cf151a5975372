use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{Result, RunError};

/// Everything the test command printed, buffered until it exited.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl CapturedOutput {
    /// stdout followed by stderr, the text the result parser sees.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }
}

pub fn parse_test_cmd(cmd: &str) -> (String, Vec<String>) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    if parts.len() > 1 {
        (parts[0].to_string(), parts[1..].iter().map(|s| s.to_string()).collect())
    } else {
        (cmd.trim().to_string(), vec![])
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut p| {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = p.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Wait for a pipe to hit EOF. `None` when `deadline` passes first, which
/// happens when a descendant of the test command still holds the pipe open.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> Option<String> {
    let Some(rx) = rx else {
        return Some(String::new());
    };
    let buf = match deadline {
        Some(deadline) => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(buf) => buf,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Vec::new(),
        },
        None => rx.recv().unwrap_or_default(),
    };
    Some(String::from_utf8_lossy(&buf).into_owned())
}

/// Kill the test command and everything it started.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        // The child leads its own process group, see `run_test_command`.
        let pgid = child.id() as libc::pid_t;
        unsafe { libc::kill(-pgid, libc::SIGKILL) };
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Run the test command in `working_dir` and capture its output.
///
/// A non-zero exit is not an error here: failing tests are an expected
/// outcome and are judged from the output text. Only a failure to launch or
/// an expired `timeout` is reported as `Err`.
pub fn run_test_command(
    test_cmd: &str,
    working_dir: &Path,
    timeout: Option<Duration>,
) -> Result<CapturedOutput> {
    let (program, args) = parse_test_cmd(test_cmd);
    if program.is_empty() {
        return Err(RunError::EmptyCommand);
    }

    let mut cmd = Command::new(&program);
    cmd.args(&args)
        .current_dir(working_dir)
        .env("CI", "true")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let start = Instant::now();
    let deadline = timeout.map(|limit| start + limit);
    let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
        command: test_cmd.to_string(),
        source,
    })?;
    debug!(command = %test_cmd, pid = child.id(), "spawned test command");

    // Both pipes drain concurrently; a full pipe blocks the child.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if let (Some(limit), Some(deadline)) = (timeout, deadline) {
                    if Instant::now() > deadline {
                        warn!(command = %test_cmd, ?limit, "test command timed out, killing it");
                        kill_tree(&mut child);
                        return Err(RunError::Timeout {
                            command: test_cmd.to_string(),
                            after: limit,
                        });
                    }
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(source) => {
                kill_tree(&mut child);
                return Err(RunError::Spawn {
                    command: test_cmd.to_string(),
                    source,
                });
            }
        }
    };

    let (Some(stdout), Some(stderr)) = (collect(stdout, deadline), collect(stderr, deadline)) else {
        warn!(command = %test_cmd, "test output still open at the deadline, killing descendants");
        kill_tree(&mut child);
        return Err(RunError::Timeout {
            command: test_cmd.to_string(),
            after: timeout.unwrap_or_default(),
        });
    };

    let output = CapturedOutput {
        stdout,
        stderr,
        exit_code: status.code(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    debug!(
        command = %test_cmd,
        exit_code = ?output.exit_code,
        duration_ms = output.duration_ms,
        "test command finished"
    );
    Ok(output)
}
