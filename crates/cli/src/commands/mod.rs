//! CLI Commands

pub mod baseline;
pub mod compare;
pub mod failure;
pub mod repair;
pub mod run;
