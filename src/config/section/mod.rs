//! Configuration section definitions.

mod build;
mod entries;
mod serve;
mod transforms;

pub use build::BuildConfig;
pub use entries::EntryConfig;
pub use serve::ServeConfig;
pub use transforms::{StageExclusion, TransformConfig};
