// src/lib.rs

pub mod cache;
pub mod db;
pub mod eventbus;
pub mod pool;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod test_utils;

pub use codedrop_common::error::Error;
pub use db::Database;
