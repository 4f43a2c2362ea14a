// src/exec/supervisor.rs

//! Per-process supervisor task.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::ExecOptions;
use crate::exec::backend::ProcessEvent;
use crate::exec::decode::Utf8ChunkDecoder;
use crate::types::OutputStream;

/// Largest chunk read from a pipe in one go.
const READ_CHUNK: usize = 8 * 1024;

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Natural(i32),
    Terminated,
}

/// Own a child process until it is gone, forwarding its output.
///
/// - stdout and stderr are pumped by two reader tasks into `events_tx`, each
///   preserving its own producer order.
/// - Either the process exits on its own, or a termination request arrives
///   on `kill_rx` and the process group is stopped (SIGTERM, then SIGKILL
///   after the grace period).
/// - `ProcessEvent::Exited` is sent last, after the readers are done (bounded
///   by the drain timeout on natural exit).
pub(crate) async fn supervise(
    mut child: Child,
    mut kill_rx: mpsc::Receiver<()>,
    events_tx: mpsc::Sender<ProcessEvent>,
    options: ExecOptions,
) {
    let pid = child.id();

    let mut readers: Vec<JoinHandle<()>> = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(pump(stdout, OutputStream::Stdout, events_tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(pump(stderr, OutputStream::Stderr, events_tx.clone())));
    }

    // A closed kill channel just disables that branch; only an explicit
    // request stops the process.
    let exit = tokio::select! {
        status_res = child.wait() => match status_res {
            Ok(status) => {
                let code = status.code().unwrap_or(-1);
                info!(pid = ?pid, exit_code = code, success = status.success(), "process exited");
                Exit::Natural(code)
            }
            Err(e) => {
                error!(pid = ?pid, error = %e, "waiting for process failed");
                Exit::Natural(-1)
            }
        },

        Some(()) = kill_rx.recv() => {
            info!(pid = ?pid, "termination requested; stopping process");
            terminate(&mut child, options.grace_period).await;
            Exit::Terminated
        }
    };

    let event = match exit {
        Exit::Natural(code) => {
            drain_readers(&mut readers, options.drain_timeout).await;
            ProcessEvent::Exited {
                code,
                terminated: false,
            }
        }
        Exit::Terminated => {
            for reader in &readers {
                reader.abort();
            }
            ProcessEvent::Exited {
                code: -1,
                terminated: true,
            }
        }
    };

    if events_tx.send(event).await.is_err() {
        debug!(pid = ?pid, "exit event dropped; router already gone");
    }
}

/// Read raw chunks from one pipe until EOF.
async fn pump<R>(mut reader: R, stream: OutputStream, tx: mpsc::Sender<ProcessEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    let mut decoder = Utf8ChunkDecoder::new();

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(?stream, error = %e, "pipe read failed; closing stream");
                break;
            }
        };

        let data = decoder.decode(&buf[..n]);
        if data.is_empty() {
            continue;
        }
        if tx.send(ProcessEvent::Output { stream, data }).await.is_err() {
            return;
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        let _ = tx.send(ProcessEvent::Output { stream, data: tail }).await;
    }
}

/// Wait for both readers to hit EOF; abandon them after `limit`.
///
/// Grandchildren that inherited the pipes can keep them open long after the
/// direct child exited.
async fn drain_readers(readers: &mut [JoinHandle<()>], limit: Duration) {
    let drained = timeout(limit, async {
        for reader in readers.iter_mut() {
            let _ = reader.await;
        }
    })
    .await;

    if drained.is_err() {
        warn!(?limit, "output streams still open after exit; dropping the rest");
        for reader in readers.iter() {
            reader.abort();
        }
    }
}

/// Stop the child's process group: SIGTERM, grace period, then SIGKILL.
async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        signal_group(pid, libc::SIGTERM);
        match timeout(grace, child.wait()).await {
            Ok(_) => {
                // The leader is gone; anything left in its group ignored SIGTERM.
                signal_group(pid, libc::SIGKILL);
                return;
            }
            Err(_) => {
                warn!(pid, ?grace, "process ignored SIGTERM; killing");
                signal_group(pid, libc::SIGKILL);
            }
        }
    }

    #[cfg(not(unix))]
    let _ = grace;

    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill child process on cancellation");
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions; a negative pid
    // addresses the process group created for this child at spawn time.
    let rc = unsafe { libc::kill(-pgid, signal) };
    if rc != 0 {
        debug!(
            pid,
            signal,
            error = %std::io::Error::last_os_error(),
            "signalling process group failed"
        );
    }
}
