pub mod audio;
pub mod config;
pub mod dns;
pub mod error;
pub mod llm;
pub mod stt;

pub use error::{AgentError, Result};
