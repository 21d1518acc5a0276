//! Mathematical structs and functions.

pub use lut::LookupTable;
pub use root::bisect;

mod lut;
mod root;
