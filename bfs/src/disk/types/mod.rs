pub mod dirent;
pub mod inode;
pub mod superblock;

pub use dirent::*;
pub use inode::*;
pub use superblock::*;
