//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum accepted length for a board identifier.
const BOARD_ID_MAX_LEN: usize = 64;

/// Validates that a board ID is a safe file stem: 1 to 64 characters drawn
/// from lowercase alphanumerics, `-`, and `_`.
pub fn validate_board_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > BOARD_ID_MAX_LEN {
        let mut err = ValidationError::new("board_id_length");
        err.message = Some(
            format!(
                "Board ID must be between 1 and {BOARD_ID_MAX_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("board_id_format");
        err.message = Some(
            "Board ID must contain only lowercase alphanumerics, `-`, and `_`".into(),
        );
        return Err(err);
    }

    Ok(())
}
