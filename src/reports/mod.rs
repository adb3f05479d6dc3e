pub mod formatters;
pub mod serializer;

pub use formatters::{OutputFormat, TreeFormatter};
pub use serializer::TreeSerializer;
