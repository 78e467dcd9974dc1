#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

// Core Modules
pub mod core;
pub mod disk;
pub mod file;
pub mod filesystem;

// Reusable types and traits
pub use self::core::errors::*;
pub use self::core::traits::*;

// File API
pub use file::{Fd, SEEK_CUR, SEEK_END, SEEK_SET, Whence};
pub use filesystem::Bfs;
#[cfg(feature = "std")]
pub use filesystem::HostBfs;

/// Reference on-disk block store.
///
/// See [`disk::BfsDisk`], [`disk::BfsFormatter`] and [`disk::BfsMeta`].
pub mod prelude {
    pub use super::core::errors::*;
    pub use super::core::traits::*;
    pub use super::disk::prelude::*;
    pub use super::file::{Fd, SEEK_CUR, SEEK_END, SEEK_SET, Whence};
    pub use super::filesystem::Bfs;
    #[cfg(feature = "std")]
    pub use super::filesystem::HostBfs;
}
