//! Supported currency codes

pub const USD: &str = "USD";
pub const EUR: &str = "EUR";
pub const ARS: &str = "ARS";

/// All currencies an account may be opened in
pub const SUPPORTED: [&str; 3] = [USD, EUR, ARS];

/// Returns true if `code` is one of the supported ISO codes (exact, uppercase)
pub fn is_supported(code: &str) -> bool {
    SUPPORTED.contains(&code)
}

/// `validator` hook for request DTOs
pub fn validate_currency(code: &str) -> Result<(), validator::ValidationError> {
    if is_supported(code) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unsupported_currency"))
    }
}
