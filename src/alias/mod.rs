pub mod source;
pub mod table;

pub use source::AliasSource;
pub use table::{AliasOptions, AliasTable};
