//! Cross-crate scenarios for the SIREN alert core
//!
//! This suite exercises the paths that cross crate boundaries:
//! - submission through assignment, fan-out and enrichment
//! - concurrent transitions resolving to exactly one winner
//! - the sqlite store behaving identically to the memory store
//! - medical data gating across the full read path

pub mod test_utils;

#[cfg(test)]
mod end_to_end_tests;

#[cfg(test)]
mod race_tests;

#[cfg(test)]
mod store_parity_tests;
