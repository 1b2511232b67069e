//! Running external programs under a hard wall-clock deadline.

use std::io::Read;
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::warn;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timeout expired: '{program}' did not finish within {after:?}")]
    Timeout { program: String, after: Duration },

    #[error("'{program}' failed: {diagnostic}")]
    Failed {
        program: String,
        code: Option<i32>,
        diagnostic: String,
    },

    #[error("Failed waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::Timeout { .. })
    }

    /// Exit code of a program that ran to completion and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `command` to completion, killing it once `timeout` has elapsed.
///
/// stdin is closed; stdout and stderr are captured. A non-zero exit becomes
/// [`ProcessError::Failed`] carrying the program's own diagnostic text.
///
/// The deadline covers the whole run, including collecting output. On Unix
/// the command gets its own process group and a timeout kills the group, so
/// helpers it started (e.g. `soffice.bin` behind the `libreoffice` wrapper)
/// do not outlive it. A timeout too large to represent as an [`Instant`]
/// means no deadline.
pub fn run_with_deadline(
    mut command: Command,
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let program = command.get_program().to_string_lossy().into_owned();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;
    let deadline = Instant::now().checked_add(timeout);

    let (sender, receiver) = bounded(2);
    if let Some(pipe) = child.stdout.take() {
        spawn_reader(Stream::Stdout, pipe, sender.clone());
    }
    if let Some(pipe) = child.stderr.take() {
        spawn_reader(Stream::Stderr, pipe, sender.clone());
    }
    drop(sender);

    let status: ExitStatus = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                let now = Instant::now();
                let pause = match deadline {
                    Some(deadline) if now >= deadline => {
                        kill_tree(&mut child);
                        return Err(ProcessError::Timeout {
                            program,
                            after: timeout,
                        });
                    }
                    Some(deadline) => POLL_INTERVAL.min(deadline - now),
                    None => POLL_INTERVAL,
                };
                thread::sleep(pause);
            }
            Err(source) => {
                kill_tree(&mut child);
                return Err(ProcessError::Wait { program, source });
            }
        }
    };

    // The child has exited, but anything it left in the background may still
    // hold the pipes open.
    let mut output = CommandOutput::default();
    loop {
        let next = match deadline {
            Some(deadline) => receiver.recv_deadline(deadline),
            None => receiver
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };
        match next {
            Ok((Stream::Stdout, text)) => output.stdout = text,
            Ok((Stream::Stderr, text)) => output.stderr = text,
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                kill_group(&child);
                return Err(ProcessError::Timeout {
                    program,
                    after: timeout,
                });
            }
        }
    }

    if status.success() {
        Ok(output)
    } else {
        Err(ProcessError::Failed {
            program,
            code: status.code(),
            diagnostic: format_diagnostic(&output, status.code()),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

// Reader threads that outlive a timeout exit on their own once the killed
// group releases the pipe; their send then fails silently.
fn spawn_reader<R: Read + Send + 'static>(
    stream: Stream,
    mut pipe: R,
    sender: Sender<(Stream, String)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = sender.send((stream, String::from_utf8_lossy(&buf).into_owned()));
    });
}

/// Kills the child's whole process group, then the child itself, and reaps
/// it so no zombie is left behind.
fn kill_tree(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    // The child was spawned as leader of its own group, so its pid is the
    // group id.
    let Ok(raw) = i32::try_from(child.id()) else {
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => warn!("Failed to kill process group {}: {}", raw, err),
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

/// Formats a failure with both stdout and stderr for better debugging.
fn format_diagnostic(output: &CommandOutput, code: Option<i32>) -> String {
    let stderr = output.stderr.trim();
    let stdout = output.stdout.trim();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => match code {
            Some(code) => format!("exited with code {}", code),
            None => "terminated by signal".to_string(),
        },
        (true, false) => stdout.to_string(),
        (false, true) => stderr.to_string(),
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}
