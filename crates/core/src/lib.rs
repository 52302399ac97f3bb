pub mod config;
pub mod error;
pub mod sample;

pub use config::Config;
pub use error::*;
pub use sample::*;
