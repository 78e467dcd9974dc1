pub mod bitmap;
pub mod time_utils;
