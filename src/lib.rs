//! Planet Weather - concurrent weather simulation over a set of planets

pub mod controller;
pub mod core;
pub mod data;
pub mod location;
pub mod planet;
pub mod simulation;
