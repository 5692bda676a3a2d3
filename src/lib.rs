pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig, PipelineSettings};

pub use core::engine::{EtlEngine, Mode};
pub use core::pipeline::MedallionPipeline;
pub use utils::error::{EtlError, Result};
