// Core data models for threadlink
// These structs represent the domain entities

pub mod mapping;
pub mod decision;
pub mod verdict;
pub mod forum;

pub use mapping::*;
pub use decision::*;
pub use verdict::*;
pub use forum::*;
