pub mod cache;
pub mod etl;
pub mod fetcher;
pub mod normalizer;
pub mod pipeline;
pub mod writer;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, Transport};
pub use crate::utils::error::Result;
