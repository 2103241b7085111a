pub mod changelog;
pub mod cli;
pub mod config;
pub mod error;
pub mod forge;
pub mod orchestrator;
pub mod output;
pub mod release;
pub mod version;

pub use config::ActionInputs;
pub use error::{ReleaseError, Result};
pub use orchestrator::{Orchestrator, RunSummary};
pub use output::{GithubOutput, OutputSink};
