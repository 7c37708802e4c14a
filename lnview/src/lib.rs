#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod file_source;
pub mod util;
