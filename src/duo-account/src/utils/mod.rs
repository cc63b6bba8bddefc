//! Shared utilities for the account.

pub mod crypto;
