//! CLI command implementations

pub mod config;
pub mod generate;
pub mod parse;
pub mod prompt;

pub use config::ConfigArgs;
pub use generate::GenerateArgs;
pub use parse::ParseArgs;
pub use prompt::PromptArgs;
