//! API route handlers

pub mod debug;
pub mod find;
pub mod health;
