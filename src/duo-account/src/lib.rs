//! Duo account: a dual-authorization transaction engine.
//!
//! Two primary owners (plus an optional, power-limited assistant) share custody of an account.
//! Calls, delegated calls and batches execute only once two distinct principals have authorized the
//! same action fingerprint, live or by offline signature. Allowances and permits provide bounded
//! fast paths; ownership slots rotate without breaking their ordering.
//!
//! The account is host-agnostic: block time, chain identity and outgoing calls go through
//! [`host::Host`]. [`sim::SimHost`] is an in-memory host for tests and tooling.

pub mod account;
pub mod allowance;
pub mod approvals;
pub mod config;
pub mod domain;
mod engine;
pub mod errors;
pub mod events;
pub mod host;
pub mod ownership;
pub mod permit;
pub mod signatures;
pub mod sim;
pub mod types;
pub mod utils;

pub use account::{DuoAccount, Execution};
pub use config::AccountConfig;
pub use errors::{AccountError, ConfigError};
pub use events::{AccountEvent, Slot};
pub use signatures::SignedBatch;
