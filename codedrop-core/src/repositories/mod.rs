// src/repositories/mod.rs

pub mod postgres;
