pub mod db;
pub mod dims;
pub mod engine;
pub mod export;
pub mod gold;
pub mod ingest;
pub mod pipeline;
pub mod silver;

pub use crate::domain::model::{RawPlanet, SilverBounds, StageSummary};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
