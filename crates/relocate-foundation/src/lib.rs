//! Foundation layer shared by the relocate workspace-move engine: error
//! types that are not specific to the move-file domain, and logging setup.

pub mod error;
pub mod logging;

pub use error::{FoundationError, FoundationResult};
