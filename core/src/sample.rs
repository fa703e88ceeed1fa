//! Pre-decoded sample data and its playback.

mod buffer;
pub use buffer::*;

mod reader;
pub use reader::*;

mod loader;
pub use loader::*;
