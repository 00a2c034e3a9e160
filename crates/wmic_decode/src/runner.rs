//! Upstream process invocation.

use crate::error::QueryError;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs one upstream query and returns its complete standard output.
pub trait QueryRunner {
    fn run(&self, args: &[String], timeout: Duration) -> Result<String, QueryError>;
}

/// Runs the upstream binary as a child process.
#[derive(Debug, Clone)]
pub struct WmicProcess {
    binary: PathBuf,
}

impl WmicProcess {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

type DrainHandle = JoinHandle<io::Result<Vec<u8>>>;

fn spawn_drain<R: Read + Send + 'static>(mut source: R) -> DrainHandle {
    thread::spawn(move || {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

/// Collect a drained pipe. A failed read is an error, never truncated text.
fn join_drain(handle: Option<DrainHandle>) -> Result<String, QueryError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "pipe reader thread panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn kill_quietly(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!("Failed to kill timed out upstream process: {}", err);
    }
    let _ = child.wait();
}

impl QueryRunner for WmicProcess {
    fn run(&self, args: &[String], timeout: Duration) -> Result<String, QueryError> {
        debug!(binary = %self.binary.display(), ?args, ?timeout, "Running upstream query");

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| QueryError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        let stdout = child.stdout.take().map(spawn_drain);
        let stderr = child.stderr.take().map(spawn_drain);

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                kill_quietly(&mut child);
                return Err(QueryError::Timeout(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = join_drain(stdout)?;
        let stderr = join_drain(stderr)?;

        if !status.success() {
            return Err(QueryError::Exit {
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stderr.is_empty() {
            return Err(QueryError::Stderr(stderr.trim().to_string()));
        }
        Ok(stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_captures_stdout() {
        let out = WmicProcess::new("sh")
            .run(&sh("printf 'Name=A\\n'"), Duration::from_secs(10))
            .unwrap();
        assert_eq!(out, "Name=A\n");
    }

    #[test]
    fn test_stderr_is_fatal() {
        let err = WmicProcess::new("sh")
            .run(&sh("echo 'Invalid class' >&2"), Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, QueryError::Stderr(ref msg) if msg == "Invalid class"));
    }

    #[test]
    fn test_nonzero_exit_is_fatal() {
        let err = WmicProcess::new("sh")
            .run(&sh("exit 3"), Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, QueryError::Exit { .. }));
    }

    #[test]
    fn test_timeout_kills_child() {
        let err = WmicProcess::new("sh")
            .run(&sh("sleep 5"), Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, QueryError::Timeout(_)));
    }

    #[test]
    fn test_pipe_read_failure_is_an_error() {
        struct FailingPipe;

        impl Read for FailingPipe {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
            }
        }

        let err = join_drain(Some(spawn_drain(FailingPipe))).unwrap_err();
        assert!(matches!(err, QueryError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(join_drain(None).unwrap(), "");
    }

    #[test]
    fn test_missing_binary() {
        let err = WmicProcess::new("/nonexistent/wmic-binary")
            .run(&[], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, QueryError::Spawn { .. }));
    }
}
