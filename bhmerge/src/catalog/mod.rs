pub mod aggregate;
pub mod io;
pub mod types;

pub use aggregate::*;
pub use io::*;
pub use types::*;
