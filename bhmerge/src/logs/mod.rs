pub mod parse;
pub mod types;

pub use parse::*;
pub use types::*;
