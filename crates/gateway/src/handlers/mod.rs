//! API handlers module

pub mod catalog;
pub mod health;
pub mod kids;
pub mod launch;
pub mod packages;
pub mod policies;
pub mod reports;
pub mod services;
pub mod usage;
