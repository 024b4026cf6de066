pub mod config;
pub mod error;

pub use config::ComposerConfig;
pub use error::{ComposeError, Result};
