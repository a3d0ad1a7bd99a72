// ABOUTME: Runs one agent invocation as a subprocess with a hard timeout.
// ABOUTME: The child and its process group are killed and reaped on timeout, and output files are always removed.

use crate::invocation::{Invocation, OutputStrategy};
use anyhow::{Context, Result};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long to wait for a killed child to be reaped
const KILL_GRACE: Duration = Duration::from_secs(5);

/// How long to keep draining pipes after the child exited (grandchildren may hold them open)
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Cap on stderr kept for logging when it is not part of the reply
const STDERR_LOG_LIMIT: usize = 4096;

#[cfg(unix)]
type SharedReader = tokio::net::unix::pipe::Receiver;
#[cfg(not(unix))]
type SharedReader = std::convert::Infallible;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Process exited; output is decoded lossily and trimmed.
    /// A non-zero exit code is reported but not treated as failure.
    Completed {
        output: String,
        exit_code: Option<i32>,
    },
    /// Timeout elapsed; the process has been killed and reaped
    TimedOut,
}

/// Spawn `invocation`, wait at most `timeout`, and collect its output.
///
/// Returns `Err` only when the process cannot be launched or waited on.
/// Dropping the returned future kills the child and everything in its process group.
pub async fn run(invocation: Invocation, timeout: Duration) -> Result<RunOutcome> {
    let Invocation {
        program,
        args,
        env,
        cwd,
        output,
    } = invocation;

    let mut command = Command::new(&program);
    command
        .args(&args)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);
    if let Some(dir) = &cwd {
        command.current_dir(dir);
    }

    let mut shared_reader = None;
    match &output {
        OutputStrategy::Piped { merge_stderr: true } => {
            shared_reader = shared_pipe(&mut command)?;
        }
        OutputStrategy::Piped { merge_stderr: false } => {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        OutputStrategy::File(_) => {
            command.stdout(Stdio::null()).stderr(Stdio::null());
        }
    }

    tracing::debug!(program = %program.display(), ?args, cwd = ?cwd, "Spawning agent CLI");

    let spawned = command.spawn();
    // Releases our copies of the write ends so readers see EOF once the child's side closes
    drop(command);
    let mut child =
        spawned.with_context(|| format!("Failed to spawn agent CLI: {}", program.display()))?;
    let pid = child.id();
    let mut group = GroupKill::new(pid);

    let capture = match &output {
        OutputStrategy::Piped { merge_stderr } => Some(Capture::start(
            &mut child,
            shared_reader,
            *merge_stderr,
        )?),
        OutputStrategy::File(_) => None,
    };

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => {
            group.disarm();
            status.context("Failed to wait for agent CLI")?
        }
        Err(_) => {
            tracing::warn!(
                ?pid,
                timeout_secs = timeout.as_secs_f64(),
                "Agent CLI timed out, killing"
            );
            group.kill();
            terminate(&mut child).await;
            if let Some(capture) = capture {
                capture.abort();
            }
            return Ok(RunOutcome::TimedOut);
        }
    };

    let raw = match (&output, capture) {
        (OutputStrategy::File(file), _) => match tokio::fs::read(file.path()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read agent output file {}", file.path().display())
                })
            }
        },
        (OutputStrategy::Piped { .. }, Some(capture)) => capture.finish().await,
        (OutputStrategy::Piped { .. }, None) => Vec::new(),
    };

    if !status.success() {
        tracing::warn!(?pid, exit_code = ?status.code(), "Agent CLI exited with failure status");
    }

    Ok(RunOutcome::Completed {
        output: String::from_utf8_lossy(&raw).trim().to_string(),
        exit_code: status.code(),
    })
}

/// Point stdout and stderr at one pipe so the reply keeps the order the child wrote in.
#[cfg(unix)]
fn shared_pipe(command: &mut Command) -> Result<Option<SharedReader>> {
    let (reader, writer) = std::io::pipe().context("Failed to create output pipe")?;
    let stderr = writer
        .try_clone()
        .context("Failed to duplicate output pipe")?;
    command.stdout(writer).stderr(stderr);
    let reader = SharedReader::from_owned_fd(reader.into())
        .context("Failed to register output pipe")?;
    Ok(Some(reader))
}

/// Without a shared pipe the two streams are interleaved in arrival order.
#[cfg(not(unix))]
fn shared_pipe(command: &mut Command) -> Result<Option<SharedReader>> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    Ok(None)
}

/// Bytes read so far, shared with the reader task so a cut-off read keeps what it got.
#[derive(Debug, Clone, Default)]
struct Sink {
    bytes: Arc<Mutex<Vec<u8>>>,
    limit: Option<usize>,
}

impl Sink {
    fn with_limit(limit: usize) -> Self {
        Self {
            bytes: Arc::default(),
            limit: Some(limit),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, chunk: &[u8]) {
        let mut bytes = self.lock();
        let room = match self.limit {
            Some(limit) => limit.saturating_sub(bytes.len()),
            None => chunk.len(),
        };
        bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.lock())
    }
}

fn spawn_reader<R>(mut reader: R, sink: Sink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => sink.append(&buf[..n]),
                Err(e) => {
                    tracing::debug!(error = %e, "Agent CLI output read failed");
                    break;
                }
            }
        }
    })
}

/// Reader tasks for a piped invocation.
struct Capture {
    readers: Vec<JoinHandle<()>>,
    reply: Sink,
    stderr_log: Option<Sink>,
}

impl Capture {
    fn start(
        child: &mut Child,
        shared: Option<SharedReader>,
        merge_stderr: bool,
    ) -> Result<Self> {
        let reply = Sink::default();

        #[cfg(unix)]
        if let Some(reader) = shared {
            return Ok(Self {
                readers: vec![spawn_reader(reader, reply.clone())],
                reply,
                stderr_log: None,
            });
        }
        #[cfg(not(unix))]
        let _ = shared;

        let stdout = child.stdout.take().context("Failed to capture stdout")?;
        let stderr = child.stderr.take().context("Failed to capture stderr")?;
        let stderr_log = (!merge_stderr).then(|| Sink::with_limit(STDERR_LOG_LIMIT));
        let stderr_sink = stderr_log.clone().unwrap_or_else(|| reply.clone());
        Ok(Self {
            readers: vec![
                spawn_reader(stdout, reply.clone()),
                spawn_reader(stderr, stderr_sink),
            ],
            reply,
            stderr_log,
        })
    }

    fn abort(&self) {
        for reader in &self.readers {
            reader.abort();
        }
    }

    /// Wait up to DRAIN_GRACE for the pipes to close, then return whatever was read.
    async fn finish(mut self) -> Vec<u8> {
        let deadline = Instant::now() + DRAIN_GRACE;
        for reader in &mut self.readers {
            match tokio::time::timeout_at(deadline, reader).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "Output reader task failed"),
                Err(_) => {
                    tracing::warn!(
                        "Agent CLI exited but its output pipe stayed open; keeping output read so far"
                    );
                    break;
                }
            }
        }
        self.abort();

        if let Some(log) = &self.stderr_log {
            let log = log.take();
            if !log.is_empty() {
                tracing::debug!(
                    stderr = %String::from_utf8_lossy(&log).trim(),
                    "Agent CLI stderr"
                );
            }
        }
        self.reply.take()
    }
}

/// Kills the child's whole process group unless disarmed after a normal exit.
struct GroupKill {
    pid: Option<u32>,
}

impl GroupKill {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(&mut self) {
        self.pid = None;
    }

    /// Signal the group while its leader is still unreaped, so the id cannot have been reused.
    fn kill(&mut self) {
        let Some(pid) = self.pid.take() else {
            return;
        };
        #[cfg(unix)]
        {
            let Ok(pgid) = libc::pid_t::try_from(pid) else {
                return;
            };
            // SAFETY: kill has no memory-safety preconditions; a negative pid targets the group
            let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
            if rc != 0 {
                tracing::debug!(
                    pgid,
                    error = %std::io::Error::last_os_error(),
                    "Process group kill failed, group may have already exited"
                );
            }
        }
        #[cfg(not(unix))]
        let _ = pid;
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "Kill failed, process may have already exited");
    }
    match tokio::time::timeout(KILL_GRACE, child.wait()).await {
        Ok(Ok(status)) => tracing::debug!(?status, "Killed agent CLI reaped"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Failed to reap killed agent CLI"),
        Err(_) => tracing::error!("Killed agent CLI did not exit within grace period"),
    }
}
