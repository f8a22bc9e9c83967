use tokio::process::Command;

use crate::error::{ExecError, ExecResult};

/// Build a command from an argv vector.
pub fn cmd_argv(argv: &[String]) -> ExecResult<Command> {
    let (program, args) = argv.split_first().ok_or(ExecError::MissingProgram)?;
    if program.trim().is_empty() {
        return Err(ExecError::MissingProgram);
    }
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    Ok(cmd)
}

/// Send SIGTERM to the process group led by `pid`.
#[cfg(target_family = "unix")]
pub fn terminate_group(pid: u32) -> std::io::Result<()> {
    let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGTERM) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_family = "unix"))]
pub fn terminate_group(_pid: u32) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "graceful termination requires a unix host",
    ))
}
