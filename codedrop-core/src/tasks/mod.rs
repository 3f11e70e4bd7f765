// File: src/tasks/mod.rs

pub mod expiry;
