//! Bounded subprocess invocation
//!
//! `nvidia-smi` and `lspci` are the only blocking operations in a refresh.
//! Both go through [`CommandRunner`] so every call carries a timeout and tests
//! can substitute canned output.

use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[cfg(any(test, feature = "testing"))]
use std::collections::HashMap;
#[cfg(any(test, feature = "testing"))]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

/// How often a running child is polled for completion
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with code {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error while waiting for {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves and runs external tools
pub trait CommandRunner: Send + Sync {
    /// Whether `program` can be found on the search path (existence only)
    fn resolve(&self, program: &str) -> bool;

    /// Run `program` and return its stdout, killing it after `timeout`
    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String, CommandError>;
}

/// Runs real processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn resolve(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String, CommandError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CommandError::NotFound(program.to_string())
                } else {
                    CommandError::Spawn {
                        program: program.to_string(),
                        source: e,
                    }
                }
            })?;

        let deadline = Instant::now() + timeout;

        // Drain pipes on helper threads so a chatty child cannot block on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        log::debug!("{} killed after {:?}", program, timeout);
                        return Err(CommandError::Timeout {
                            program: program.to_string(),
                            timeout,
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    return Err(CommandError::Io {
                        program: program.to_string(),
                        source: e,
                    });
                }
            }
        };

        // A backgrounded grandchild can keep the pipes open after the child exits
        let Some(stdout) = collect(stdout, deadline) else {
            log::debug!("{} left its stdout open past {:?}", program, timeout);
            return Err(CommandError::Timeout {
                program: program.to_string(),
                timeout,
            });
        };
        if !status.success() {
            let stderr = collect(stderr, deadline).unwrap_or_default();
            return Err(CommandError::Failed {
                program: program.to_string(),
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = channel::bounded(1);
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Pipe contents, or `None` if the pipe is still open at `deadline`
fn collect(pipe: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<Vec<u8>> {
    let Some(rx) = pipe else {
        return Some(Vec::new());
    };
    match rx.recv_deadline(deadline) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// Canned reply for [`ScriptedRunner`]
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Output(String),
    Exit(i32),
    Timeout,
}

/// Runner that replays canned outputs instead of spawning processes.
///
/// Responses are keyed either by the full command line (`"lspci -s 0000:03:00.0"`)
/// or by the bare program name; the full command line wins. Unknown commands
/// behave like a missing binary. Every call is counted.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    on_path: Vec<String>,
    responses: HashMap<String, ScriptedResponse>,
    resolves: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` resolvable on the simulated search path
    pub fn with_program(mut self, program: &str) -> Self {
        self.on_path.push(program.to_string());
        self
    }

    pub fn with_output(mut self, command: &str, output: &str) -> Self {
        self.responses
            .insert(command.to_string(), ScriptedResponse::Output(output.to_string()));
        self
    }

    pub fn with_response(mut self, command: &str, response: ScriptedResponse) -> Self {
        self.responses.insert(command.to_string(), response);
        self
    }

    pub fn resolve_count(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    pub fn run_count(&self) -> usize {
        self.calls().len()
    }

    /// Command lines passed to `run`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(any(test, feature = "testing"))]
impl CommandRunner for ScriptedRunner {
    fn resolve(&self, program: &str) -> bool {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.on_path.iter().any(|p| p == program)
    }

    fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<String, CommandError> {
        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command_line.clone());

        let response = self
            .responses
            .get(&command_line)
            .or_else(|| self.responses.get(program));

        match response {
            Some(ScriptedResponse::Output(output)) => Ok(output.clone()),
            Some(ScriptedResponse::Exit(code)) => Err(CommandError::Failed {
                program: program.to_string(),
                code: Some(*code),
                stderr: String::new(),
            }),
            Some(ScriptedResponse::Timeout) => Err(CommandError::Timeout {
                program: program.to_string(),
                timeout,
            }),
            None => Err(CommandError::NotFound(program.to_string())),
        }
    }
}
