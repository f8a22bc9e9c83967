//! POSIX resource limits for task processes.
//!
//! Limits are installed from a `pre_exec` hook, so they are in force before the task
//! script's first instruction. Non-unix hosts log a warning and run unrestricted.
use serde::{Deserialize, Serialize};
use tokio::process::Command;
#[cfg(not(unix))]
use tracing::warn;

/// Optional caps applied to every task process. `None` keeps the inherited limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RlimitConfig {
    /// `RLIMIT_NOFILE`.
    pub max_open_files: Option<u64>,
    /// `RLIMIT_FSIZE`; the kernel sends `SIGXFSZ` when a file grows past it.
    pub max_file_size_bytes: Option<u64>,
    /// `RLIMIT_CPU`, in seconds of CPU time.
    pub max_cpu_seconds: Option<u64>,
    /// `RLIMIT_CORE = 0`.
    pub disable_core_dumps: bool,
}

impl RlimitConfig {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_open_files.is_none()
            && self.max_file_size_bytes.is_none()
            && self.max_cpu_seconds.is_none()
            && !self.disable_core_dumps
    }
}

pub fn attach_rlimits(cmd: &mut Command, config: &RlimitConfig) {
    if config.is_empty() {
        return;
    }

    #[cfg(unix)]
    {
        unix_impl::attach_rlimits(cmd, config);
    }

    #[cfg(not(unix))]
    {
        let _ = cmd;
        warn!(
            target: "tack_exec::limits",
            ?config,
            "rlimits requested on a non-unix host; ignoring"
        );
    }
}

#[cfg(unix)]
mod unix_impl {
    use std::io;

    use tokio::process::Command;

    use super::RlimitConfig;

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    type Resource = libc::__rlimit_resource_t;
    #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
    type Resource = libc::c_int;

    pub fn attach_rlimits(cmd: &mut Command, config: &RlimitConfig) {
        let limits: Vec<(Resource, u64)> = [
            (libc::RLIMIT_NOFILE, config.max_open_files),
            (libc::RLIMIT_FSIZE, config.max_file_size_bytes),
            (libc::RLIMIT_CPU, config.max_cpu_seconds),
            (libc::RLIMIT_CORE, config.disable_core_dumps.then_some(0)),
        ]
        .into_iter()
        .filter_map(|(resource, value)| value.map(|v| (resource, v)))
        .collect();

        // SAFETY: the hook only calls setrlimit(2), which is async-signal-safe,
        // and touches nothing but the moved-in vector.
        unsafe {
            cmd.pre_exec(move || {
                for (resource, value) in &limits {
                    apply_rlimit(*resource, *value)?;
                }
                Ok(())
            });
        }
    }

    fn apply_rlimit(resource: Resource, value: u64) -> io::Result<()> {
        let rlim = libc::rlimit {
            rlim_cur: value as libc::rlim_t,
            rlim_max: value as libc::rlim_t,
        };
        let rc = unsafe { libc::setrlimit(resource, &rlim) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
