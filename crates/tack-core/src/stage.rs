use std::fmt;

/// Position of an orchestrator iteration in the task lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Claiming,
    Preparing,
    Verifying,
    Executing,
    Generating,
    Uploading,
    Completing,
    Cleanup,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Claiming => "claiming",
            Stage::Preparing => "preparing",
            Stage::Verifying => "verifying",
            Stage::Executing => "executing",
            Stage::Generating => "generating",
            Stage::Uploading => "uploading",
            Stage::Completing => "completing",
            Stage::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
