mod error;
pub use error::{ExecError, ExecResult};

mod util;

pub mod limits;
pub use limits::RlimitConfig;

#[cfg(feature = "proc")]
pub mod proc;
#[cfg(feature = "proc")]
pub use proc::{ChildProcess, ExecConfig, ProcExecutor};

mod verify;
pub use verify::CommandVerifier;

pub mod prelude {
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::{CommandVerifier, RlimitConfig};
    #[cfg(feature = "proc")]
    pub use crate::{ExecConfig, ProcExecutor};
}
