// Core data models for hamster
// These structs represent the domain entities

pub mod fact;

pub use fact::*;
