//! Miscellaneous common structs used throughout the library.

mod args;
mod options;
mod peer;

pub use args::*;
pub use options::*;
pub use peer::*;
