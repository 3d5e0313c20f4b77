//! Diagnostic ID constants.
//!
//! Generated from `spec/diagnostics.jsonc` at build time. Passes report
//! through these constants rather than string literals.

include!(concat!(env!("OUT_DIR"), "/generated_codes.rs"));
