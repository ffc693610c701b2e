//! Semantic check every structured result type must pass before it is handed
//! back to the caller.
//!
//! Decoding only proves the JSON has the right *shape*; `Validate` is where a
//! type states what a *meaningful* value looks like (a confidence inside
//! `0.0..=1.0`, a non-empty answer, …).
//!
//! ```rust
//! use dendrite_core::{error::ValidationError, validate::Validate};
//!
//! struct Invoice { total: f64 }
//!
//! impl Validate for Invoice {
//!     fn validate(&self) -> Result<(), ValidationError> {
//!         if self.total < 0.0 {
//!             return Err(ValidationError::field("total", "must not be negative"));
//!         }
//!         Ok(())
//!     }
//! }
//!
//! assert!(Invoice { total: -1.0 }.validate().is_err());
//! ```

use crate::error::ValidationError;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Shared helper for the many `confidence` fields in response types.
pub fn check_unit_interval(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::field(
            field,
            format!("must be between 0.0 and 1.0, got {value}"),
        ))
    }
}

/// Rejects empty or whitespace-only strings.
pub fn check_not_blank(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::field(field, "must not be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_bounds() {
        assert!(check_unit_interval("confidence", 0.0).is_ok());
        assert!(check_unit_interval("confidence", 1.0).is_ok());
        assert!(check_unit_interval("confidence", 1.01).is_err());
        assert!(check_unit_interval("confidence", f64::NAN).is_err());
    }

    #[test]
    fn blank_strings_are_rejected() {
        let err = check_not_blank("output", "  ").unwrap_err();
        assert_eq!(err.field.as_deref(), Some("output"));
        assert!(check_not_blank("output", "x").is_ok());
    }
}
