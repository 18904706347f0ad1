pub mod pipeline;

pub use pipeline::{ClassificationPipeline, ClassificationReport};
