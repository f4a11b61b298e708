pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fs;
pub mod mapper;
pub mod util;

pub use config::Config;
pub use engine::{Backedup, Operation, Report};
pub use error::{BackedupError, Result};
