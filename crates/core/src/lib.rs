pub mod config;
pub mod error;

pub use config::{MapConfig, OrderKind};
pub use error::*;
