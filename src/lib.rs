pub mod backup;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod models;
pub mod packages;
pub mod process;
pub mod runner;

pub use error::{DevrunError, Result};
