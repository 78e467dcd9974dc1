pub mod log;
pub mod string;

pub use self::log::*;
pub use self::string::*;
