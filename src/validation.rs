// Validation utilities module
// Provides custom validation functions for domain-specific rules

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validates that a service price is not negative
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        Err(ValidationError::new("price_must_not_be_negative"))
    } else {
        Ok(())
    }
}

/// Validates that a free-after threshold is a positive cycle length
/// A threshold of N means N paid services before the free one
pub fn validate_threshold(threshold: i32) -> Result<(), ValidationError> {
    if threshold < 1 {
        Err(ValidationError::new("threshold_must_be_positive"))
    } else {
        Ok(())
    }
}

/// Validates that a points-awarded value is not negative
pub fn validate_points_awarded(points: i32) -> Result<(), ValidationError> {
    if points < 0 {
        Err(ValidationError::new("points_must_not_be_negative"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_price_accepts_zero_and_positive() {
        assert!(validate_price(&Decimal::ZERO).is_ok());
        assert!(validate_price(&dec!(450.00)).is_ok());
    }

    #[test]
    fn test_validate_price_rejects_negative() {
        assert!(validate_price(&dec!(-0.01)).is_err());
    }

    #[test]
    fn test_validate_threshold_bounds() {
        assert!(validate_threshold(1).is_ok());
        assert!(validate_threshold(4).is_ok());
        assert!(validate_threshold(0).is_err());
        assert!(validate_threshold(-3).is_err());
    }

    #[test]
    fn test_validate_points_awarded_bounds() {
        assert!(validate_points_awarded(0).is_ok());
        assert!(validate_points_awarded(8).is_ok());
        assert!(validate_points_awarded(-1).is_err());
    }
}
