//! Interpreter: runs a [`Program`](crate::model::Program) on an
//! [`Input`](crate::model::Input) and records the visited blocks as a [`Trace`].

mod error;
mod eval;
mod ops;
mod trace;
mod value;

pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::{ExecConfig, Interpreter};
pub use ops::format_printf;
pub use trace::{Memory, Trace, TraceCursor, TraceEntry};
pub use value::Value;
