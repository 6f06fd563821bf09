//! Short code generation and format checks.
//!
//! Generated codes are 8 characters of URL-safe base64 (6 random bytes, no
//! padding), which fits the 10 character column and never collides with the
//! fixed routes (`health`, `api`).

use crate::domain::entities::MAX_CODE_LENGTH;
use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Random bytes per code before encoding.
const CODE_LENGTH_BYTES: usize = 6;

/// Length of a generated code.
pub const GENERATED_CODE_LENGTH: usize = CODE_LENGTH_BYTES * 4 / 3;

/// Generates a random short code using the operating system RNG.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
pub fn generate_code() -> Result<String, AppError> {
    let mut buffer = [0u8; CODE_LENGTH_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate short code",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

/// Returns true if `code` could have been issued by this service.
///
/// Used to reject malformed codes before they reach storage.
pub fn is_well_formed(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_length_and_alphabet() {
        let code = generate_code().unwrap();

        assert_eq!(code.len(), GENERATED_CODE_LENGTH);
        assert_eq!(code.len(), 8);
        assert!(!code.contains('='));
        assert!(is_well_formed(&code));
    }

    #[test]
    fn test_generate_code_produces_unique_codes() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code().unwrap()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_well_formed_codes() {
        assert!(is_well_formed("abc123"));
        assert!(is_well_formed("a-b_C9"));
        assert!(is_well_formed("1234567890"));
    }

    #[test]
    fn test_malformed_codes() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("12345678901"));
        assert!(!is_well_formed("has space"));
        assert!(!is_well_formed("dot.ted"));
        assert!(!is_well_formed("%2e%2e"));
    }
}
