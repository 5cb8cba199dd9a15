//! bankdesk-core: customer record normalization, risk derivation and
//! administrator override merging for the banking back-office desk.
//!
//! Pipeline:
//!   raw rows (ingest) → CustomerRecord (normalize) → ViewModel (overrides)
//!
//! Everything downstream of ingestion is a pure transform. Persistence
//! (overrides, audit trail) lives behind traits so callers choose the store.

pub mod admin;
pub mod audit;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod finance;
pub mod generator;
pub mod ingest;
pub mod name_generator;
pub mod normalize;
pub mod overrides;
pub mod pipeline;
pub mod raw;
pub mod rng;
pub mod store;
pub mod types;
