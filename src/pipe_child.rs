//! Pipe-coordinated child runner (§4.2).
//!
//! Spawns a user-supplied compressor/decompressor command with two anonymous
//! pipes, drives a non-blocking transfer loop between an arbitrary input
//! source and output sink, and reaps the child. SIGPIPE is neutralized
//! process-wide at startup (mirroring the teacher's `io/prefs.rs` atomic-global
//! pattern) so a broken pipe surfaces as an ordinary `EPIPE` `io::Error`
//! rather than killing the process.

use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use nix::fcntl::{fcntl, FcntlArg, OFlag};

use crate::config::PIPE_TRANSFER_CHUNK_SIZE;
use crate::error::{ArchiverError, Result};

/// Set once, process-wide, the first time any child is spawned.
static SIGPIPE_IGNORED: AtomicBool = AtomicBool::new(false);

/// Checked at the top of every transfer-loop iteration and by the writer's
/// per-entry loop (§5 "Cancellation").
pub static CANCELLED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_: libc::c_int) {
    CANCELLED.store(true, Ordering::SeqCst);
}

/// Installs the process-wide SIGPIPE-ignore and SIGINT-to-flag handlers.
/// Idempotent; safe to call once from `main` before any archive operation.
pub fn install_signal_handlers() {
    if !SIGPIPE_IGNORED.swap(true, Ordering::SeqCst) {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_IGN);
            libc::signal(libc::SIGINT, handle_sigint as libc::sighandler_t);
        }
    }
}

pub fn is_cancelled() -> bool {
    CANCELLED.load(Ordering::Relaxed)
}

/// Which direction this child runner is being used for; determines which
/// error-taxonomy variant a child failure is reported as (§4.2, §7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildDirection {
    Compress,
    Decompress,
}

impl ChildDirection {
    fn error(self, msg: String) -> ArchiverError {
        match self {
            ChildDirection::Compress => ArchiverError::CompressionError(msg),
            ChildDirection::Decompress => ArchiverError::DecompressionError(msg),
        }
    }
}

/// A spawned compressor/decompressor child with piped stdin/stdout.
pub struct ChildRunner {
    child: Child,
    direction: ChildDirection,
}

fn set_nonblocking(fd: i32) -> Result<()> {
    let flags = fcntl(fd, FcntlArg::F_GETFL)
        .map_err(|e| ArchiverError::InternalError(format!("fcntl(F_GETFL) failed: {e}")))?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(fd, FcntlArg::F_SETFL(flags))
        .map_err(|e| ArchiverError::InternalError(format!("fcntl(F_SETFL) failed: {e}")))?;
    Ok(())
}

impl ChildRunner {
    /// Spawns `command`, tokenized by ASCII whitespace with no shell
    /// involved, wiring two anonymous pipes and inheriting stderr so the
    /// child's own diagnostics reach the user's terminal.
    pub fn spawn(command: &str, direction: ChildDirection) -> Result<Self> {
        install_signal_handlers();
        let mut parts = command.split_ascii_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ArchiverError::InternalError("empty compressor/decompressor command".to_string()))?;
        let args: Vec<&str> = parts.collect();

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| direction.error(format!("failed to spawn `{command}`: {e}")))?;

        set_nonblocking(child.stdin.as_ref().unwrap().as_raw_fd())?;
        set_nonblocking(child.stdout.as_ref().unwrap().as_raw_fd())?;

        Ok(Self { child, direction })
    }

    /// Drives the transfer loop until `input` reaches EOF and the child's
    /// stdout reaches EOF, then reaps the child. A non-zero exit status is
    /// reported via `self.direction`'s error variant; already-written output
    /// bytes are not rewound (§4.2 failure semantics).
    pub fn transfer(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> Result<()> {
        let mut stdin: Option<ChildStdin> = self.child.stdin.take();
        let mut stdout: ChildStdout = self.child.stdout.take().expect("stdout piped");

        let mut read_buf = [0u8; PIPE_TRANSFER_CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::new();
        let mut pending_off = 0usize;
        let mut input_eof = false;
        let mut output_eof = false;

        loop {
            if is_cancelled() {
                return Err(ArchiverError::SigInt);
            }

            let mut made_progress = false;

            if !input_eof && pending_off >= pending.len() {
                let n = input.read(&mut read_buf).map_err(ArchiverError::from)?;
                if n == 0 {
                    input_eof = true;
                } else {
                    pending.clear();
                    pending.extend_from_slice(&read_buf[..n]);
                    pending_off = 0;
                    made_progress = true;
                }
            }

            if pending_off < pending.len() {
                if let Some(stdin_handle) = stdin.as_mut() {
                    match stdin_handle.write(&pending[pending_off..]) {
                        Ok(written) => {
                            pending_off += written;
                            made_progress = true;
                        }
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                            return Err(self.direction.error(format!("broken pipe writing to child: {e}")));
                        }
                        Err(e) => return Err(self.direction.error(e.to_string())),
                    }
                }
            }

            if input_eof && pending_off >= pending.len() && stdin.is_some() {
                // Drop the write end to signal EOF to the child.
                stdin = None;
            }

            if !output_eof {
                let mut out_buf = [0u8; PIPE_TRANSFER_CHUNK_SIZE];
                match stdout.read(&mut out_buf) {
                    Ok(0) => {
                        output_eof = true;
                        made_progress = true;
                    }
                    Ok(n) => {
                        output.write_all(&out_buf[..n]).map_err(ArchiverError::FailedToWrite)?;
                        made_progress = true;
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => return Err(self.direction.error(e.to_string())),
                }
            }

            if input_eof && pending_off >= pending.len() && output_eof {
                break;
            }

            if !made_progress {
                std::thread::yield_now();
            }
        }

        let status = self
            .child
            .wait()
            .map_err(|e| ArchiverError::InternalError(format!("waitpid failed: {e}")))?;
        if !status.success() {
            return Err(self
                .direction
                .error(format!("child exited with status {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn identity_passthrough_via_cat() {
        let mut runner = ChildRunner::spawn("cat", ChildDirection::Compress).unwrap();
        let mut input = Cursor::new(b"hello world".to_vec());
        let mut output = Vec::new();
        runner.transfer(&mut input, &mut output).unwrap();
        assert_eq!(output, b"hello world");
    }

    #[test]
    fn empty_input_round_trips_to_empty_output() {
        let mut runner = ChildRunner::spawn("cat", ChildDirection::Compress).unwrap();
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        runner.transfer(&mut input, &mut output).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn nonzero_exit_is_reported_as_direction_error() {
        let mut runner = ChildRunner::spawn("false", ChildDirection::Decompress).unwrap();
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();
        let err = runner.transfer(&mut input, &mut output).unwrap_err();
        assert!(matches!(err, ArchiverError::DecompressionError(_)));
    }

    #[test]
    fn large_input_exceeding_pipe_buffer_round_trips() {
        let mut runner = ChildRunner::spawn("cat", ChildDirection::Compress).unwrap();
        let data = vec![0xABu8; 4 * 1024 * 1024];
        let mut input = Cursor::new(data.clone());
        let mut output = Vec::new();
        runner.transfer(&mut input, &mut output).unwrap();
        assert_eq!(output, data);
    }
}
