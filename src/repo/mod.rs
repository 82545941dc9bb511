pub mod mapping;
pub mod processed;

pub use mapping::*;
pub use processed::*;
