// File: src/cache/mod.rs

pub mod claim_cache;

pub use claim_cache::ClaimCache;
