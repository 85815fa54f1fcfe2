//! Validation helpers for DTOs.

use validator::ValidationError;

/// Alphabet used for room codes. Excludes the confusable characters 0, O, 1
/// and I so codes survive being read aloud.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Validates that a room code is exactly six characters from the code
/// alphabet.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("QZ7MAP") // Ok
/// validate_room_code("qz7map") // Err - lowercase
/// validate_room_code("QZ7MA")  // Err - too short
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "room code must be exactly {} characters (got {})",
                ROOM_CODE_LENGTH,
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
        let mut err = ValidationError::new("room_code_format");
        err.message =
            Some("room code must contain only uppercase letters and digits 2-9".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_codes() {
        assert!(validate_room_code("QZ7MAP").is_ok());
        assert!(validate_room_code("ABCDEF").is_ok());
        assert!(validate_room_code("234567").is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(validate_room_code("QZ7MA").is_err());
        assert!(validate_room_code("QZ7MAPX").is_err());
        assert!(validate_room_code("").is_err());
    }

    #[test]
    fn rejects_excluded_characters() {
        assert!(validate_room_code("QZ0MAP").is_err()); // zero
        assert!(validate_room_code("QZOMAP").is_err()); // letter O
        assert!(validate_room_code("QZ1MAP").is_err()); // one
        assert!(validate_room_code("QZIMAP").is_err()); // letter I
        assert!(validate_room_code("qz7map").is_err()); // lowercase
    }
}
