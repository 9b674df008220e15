//! Redemption codes.
//!
//! A code is a pure function of public catalog data: the upper-case hex SHA-256
//! digest of `store_id|benefit_type|description`, first eight characters, rendered
//! as `XXXX-XXXX`. The same benefit always carries the same code, across passes
//! and catalog reloads, so the ledger is keyed globally by code.

use sha2::{Digest, Sha256};

use crate::catalog::Benefit;

pub fn redemption_code(benefit: &Benefit) -> String {
    let source = format!(
        "{}|{}|{}",
        benefit.store_id, benefit.benefit_type, benefit.description
    );
    let digest = Sha256::digest(source.as_bytes());
    let hex: String = digest
        .iter()
        .take(4)
        .map(|byte| format!("{byte:02X}"))
        .collect();
    format!("{}-{}", &hex[..4], &hex[4..])
}

/// Codes are typed by hand at the counter; compare them trimmed and upper-cased.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}
