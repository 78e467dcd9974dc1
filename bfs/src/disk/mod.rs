// === Sub-modules ===
pub mod allocator;
pub mod constant;
pub mod formatter;
pub mod meta;
pub mod store;
pub mod types;

// === Prelude ===
pub mod prelude {
    pub use super::allocator::BfsAllocator;
    pub use super::constant::*;
    pub use super::formatter::BfsFormatter;
    pub use super::meta::{BfsMeta, BfsParams};
    pub use super::store::{BfsDisk, BfsEntryInfo};
    pub use super::types::*;
}

pub use prelude::*;
