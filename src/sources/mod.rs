pub mod aliases;
pub mod designations;

pub use aliases::AliasFile;
pub use designations::DesignationTable;
