//! Runs the configured task script for a claimed task.

use std::{
    collections::BTreeMap,
    future::Future,
    path::{Path, PathBuf},
    process::Stdio,
    sync::{
        Arc, Mutex as StdMutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tack_core::{CoreError, TaskExecutor, TaskProcess, WorkerConfig, fs::TASK_FILE};
use tack_model::{ClaimedTask, ExitStatus};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader},
    process::Child,
    sync::Mutex,
    task::JoinHandle,
};
use tracing::{debug, trace, warn};

use crate::{
    error::ExecError,
    limits::{RlimitConfig, attach_rlimits},
    util::{cmd_argv, terminate_group},
};

pub const LOG_FILE: &str = "live_backing.log";

/// How task processes are started.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// argv of the task script. The claimed definition is in `$TACK_TASK_FILE`.
    pub task_script: Vec<String>,
    /// Extra environment, applied after the task variables.
    pub env: BTreeMap<String, String>,
    pub rlimits: RlimitConfig,
}

/// [`TaskExecutor`] backed by a local subprocess.
pub struct ProcExecutor {
    cfg: ExecConfig,
    work_dir: PathBuf,
    artifact_dir: PathBuf,
    task_log_dir: PathBuf,
}

impl ProcExecutor {
    pub fn new(cfg: ExecConfig, worker: &WorkerConfig) -> Self {
        Self {
            cfg,
            work_dir: worker.work_dir.clone(),
            artifact_dir: worker.artifact_dir.clone(),
            task_log_dir: worker.task_log_dir.clone(),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.task_log_dir.join(LOG_FILE)
    }

    async fn spawn_child(&self, task: &ClaimedTask) -> Result<ChildProcess, ExecError> {
        let mut cmd = cmd_argv(&self.cfg.task_script)?;
        cmd.current_dir(&self.work_dir)
            .env("TASK_ID", task.task_id.as_str())
            .env("RUN_ID", task.run_id.to_string())
            .env("TACK_WORK_DIR", &self.work_dir)
            .env("TACK_ARTIFACT_DIR", &self.artifact_dir)
            .env("TACK_TASK_FILE", self.work_dir.join(TASK_FILE))
            .envs(&self.cfg.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Only reached if the handle is dropped before the process was waited on.
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        attach_rlimits(&mut cmd, &self.cfg.rlimits);

        tokio::fs::create_dir_all(&self.task_log_dir).await?;
        let log = Arc::new(Mutex::new(open_log(&self.log_path()).await?));

        trace!(target: "tack.exec.proc", argv = ?self.cfg.task_script, task = %task.task_id, "spawn");
        let mut child = cmd.spawn().map_err(|e| ExecError::Spawn(e.to_string()))?;
        let pid = child.id();

        let mut pumps = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            pumps.push(pump(out, Arc::clone(&log)));
        }
        if let Some(err) = child.stderr.take() {
            pumps.push(pump(err, Arc::clone(&log)));
        }

        debug!(target: "tack.exec.proc", ?pid, task = %task.task_id, "task process started");
        Ok(ChildProcess {
            pid,
            child: Mutex::new(child),
            pumps: Mutex::new(pumps),
            reaped: StdMutex::new(false),
            stopped_for_shutdown: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl TaskExecutor for ProcExecutor {
    async fn spawn(&self, task: &ClaimedTask) -> Result<Arc<dyn TaskProcess>, CoreError> {
        let process = self.spawn_child(task).await?;
        Ok(Arc::new(process))
    }
}

/// A running task script.
pub struct ChildProcess {
    pid: Option<u32>,
    child: Mutex<Child>,
    pumps: Mutex<Vec<JoinHandle<()>>>,
    /// Set under this lock in the same poll that reaps the child, so a signal
    /// is never sent to a process group whose leader is gone.
    reaped: StdMutex<bool>,
    stopped_for_shutdown: AtomicBool,
}

#[async_trait]
impl TaskProcess for ChildProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn stop_for_shutdown(&self) {
        let reaped = self.reaped.lock().unwrap_or_else(PoisonError::into_inner);
        if *reaped {
            debug!(target: "tack.exec.proc", pid = ?self.pid, "task process already exited; not signalling");
            return;
        }
        let Some(pid) = self.pid else {
            return;
        };
        self.stopped_for_shutdown.store(true, Ordering::SeqCst);
        match terminate_group(pid) {
            Ok(()) => debug!(target: "tack.exec.proc", pid, "sent SIGTERM to task process group"),
            Err(e) => warn!(target: "tack.exec.proc", pid, error = %e, "failed to signal task process"),
        }
    }

    async fn wait(&self) -> Result<ExitStatus, CoreError> {
        let status = {
            let mut child = self.child.lock().await;
            let mut exit = std::pin::pin!(child.wait());
            std::future::poll_fn(|cx| {
                let mut reaped = self.reaped.lock().unwrap_or_else(PoisonError::into_inner);
                let poll = exit.as_mut().poll(cx);
                if poll.is_ready() {
                    *reaped = true;
                }
                poll
            })
            .await
            .map_err(ExecError::from)?
        };

        // Drain what the process wrote before it exited.
        for pump in self.pumps.lock().await.drain(..) {
            let _ = pump.await;
        }

        if self.stopped_for_shutdown.load(Ordering::SeqCst) {
            debug!(target: "tack.exec.proc", pid = ?self.pid, ?status, "task stopped for worker shutdown");
            return Ok(ExitStatus::WorkerShutdown);
        }
        let mapped = match status.code() {
            Some(code) => ExitStatus::from_exit_code(code),
            None => ExitStatus::Failure,
        };
        debug!(target: "tack.exec.proc", pid = ?self.pid, ?status, %mapped, "task process exited");
        Ok(mapped)
    }
}

async fn open_log(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path).await
}

fn pump<R>(reader: R, log: Arc<Mutex<File>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        let mut writable = true;
        // Keep reading until EOF even when the log is gone: a closed pipe would kill the task.
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(target: "tack.exec.proc", error = %e, "task output pipe failed");
                    break;
                }
            }
            trace!(target: "tack.exec.proc.out", line = %String::from_utf8_lossy(&line).trim_end());
            if !writable {
                continue;
            }
            let mut file = log.lock().await;
            let mut res = file.write_all(&line).await;
            if res.is_ok() && !line.ends_with(b"\n") {
                res = file.write_all(b"\n").await;
            }
            if let Err(e) = res {
                warn!(target: "tack.exec.proc", error = %e, "task log write failed; discarding further output");
                writable = false;
            }
        }
        let _ = log.lock().await.flush().await;
    })
}
