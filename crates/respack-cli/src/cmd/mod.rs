//! Subcommand implementations

pub mod inspect;
pub mod load;
pub mod pack;
