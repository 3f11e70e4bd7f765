// src/repositories/postgres/mod.rs

pub mod claim_events;
pub mod claim_ledger;

pub use claim_events::PostgresClaimEventRepository;
pub use claim_ledger::PostgresClaimLedger;
