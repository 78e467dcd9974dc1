// === Sub-modules ===
pub mod errors;
pub mod store;
pub mod utils;

// === Core Traits ===
pub mod traits {
    pub use super::store::{BlockStore, Dbn, Fbn, Inum};
}

// === Error types ===
pub use errors::*;

// === Utilities ===
pub use utils::bitmap::BitmapOps;
pub use utils::time_utils::*;
