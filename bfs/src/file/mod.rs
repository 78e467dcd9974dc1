// === Sub-modules ===
pub mod descriptor;
pub mod engine;

pub use descriptor::{Fd, OpenFile, OpenFileTable, SEEK_CUR, SEEK_END, SEEK_SET, Whence};
