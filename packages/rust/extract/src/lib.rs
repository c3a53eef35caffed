//! Deterministic salary text processing.
//!
//! This crate has no I/O. It provides:
//! - [`parse_number`]: locale-aware figure parsing (`1.234,56`, `45k`)
//! - [`extract_patterns`]: the ordered regex range matcher
//! - [`Validator`]: annualization, plausibility bounds and the literal-match gate

mod number;
mod patterns;
mod period;
mod validate;

pub use number::parse_number;
pub use patterns::{RangeMatch, extract_patterns, match_range};
pub use period::{detect_period, is_monthly_text, monthly_multiplier};
pub use validate::{Rejection, SalaryBounds, Validator, literal_match, normalize_range};
