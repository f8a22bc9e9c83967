use crate::ExitStatus;

/// How a finished run is reported to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Completed,
    Failed,
    /// Any tier other than success/failure; carries the reason string.
    Exception(&'static str),
}

impl Resolution {
    /// URL path segment of the resolution endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Resolution::Completed => "completed",
            Resolution::Failed => "failed",
            Resolution::Exception(_) => "exception",
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Resolution::Exception(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<ExitStatus> for Resolution {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Resolution::Completed,
            ExitStatus::Failure => Resolution::Failed,
            other => Resolution::Exception(other.as_str()),
        }
    }
}
