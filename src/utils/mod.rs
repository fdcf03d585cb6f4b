// Utility functions

pub mod format;
pub mod logger;
pub mod mask;

pub use format::*;
pub use logger::*;
pub use mask::*;
