//! Blueprint Composer - declarative blueprint composition with nested traits

pub mod blueprints;
pub mod core;
