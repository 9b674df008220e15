// Redemption: code derivation, the one-time-use ledger, and its HTTP handlers.

pub mod codes;
pub mod handlers;
pub mod ledger;

pub use ledger::{LedgerError, RedemptionLedger};
