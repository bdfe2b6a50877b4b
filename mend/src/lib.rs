//! Mend Library
//!
//! Trace-based error localization and repair of student programs against a
//! reference solution.

pub mod align;
pub mod error;
pub mod interp;
pub mod localize;
pub mod model;
pub mod pipeline;
pub mod repair;

pub use error::{Error, Result};
