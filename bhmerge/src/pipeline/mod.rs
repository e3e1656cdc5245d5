pub mod driver;
pub mod persist;
pub mod report;

pub use driver::*;
pub use persist::*;
pub use report::*;
