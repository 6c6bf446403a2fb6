pub mod actor;
pub mod handle;
pub mod writer;

pub use crate::core::*;

pub use actor::*;
pub use handle::*;
pub use writer::*;
