//! Parties: customers placing orders and agents fulfilling them.

pub mod party;

pub use party::{Agent, Customer};
