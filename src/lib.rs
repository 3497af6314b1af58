pub mod config;
pub mod error;
pub mod frontend;
pub mod logger;
pub mod runner;
pub mod terminal;

pub use config::Args;
pub use error::{Error, Result};
pub use frontend::{Frontend, HeadlessFrontend};
pub use runner::Runner;
pub use terminal::TerminalFrontend;
