// Core data models for casetrack
// These structs represent the domain entities

pub mod case;
pub mod stage;

pub use case::*;
pub use stage::*;
