//! Input validation helpers
//!
//! Centralized length limits and validation functions. Helpers return the
//! message only; each domain wraps it in its own `Validation` variant.

// ── Limits ──────────────────────────────────────────────────────────

/// Branch names
pub const MAX_NAME_LEN: usize = 200;

/// Transfer notes, reject reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Lines in one sale
pub const MAX_SALE_LINES: usize = 500;

/// Upper bound for a `limit` query parameter on the replay buffer
pub const MAX_RECENT_LIMIT: usize = shared::message::REPLAY_CAPACITY;

// ── Helpers ─────────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.chars().count() > max_len {
        return Err(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        ));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
) -> Result<(), String> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        ));
    }
    Ok(())
}

/// Validate a strictly positive quantity.
pub fn validate_positive(value: i64, field: &str) -> Result<(), String> {
    if value <= 0 {
        return Err(format!("{field} must be greater than 0, got {value}"));
    }
    Ok(())
}

/// Validate a non-negative quantity.
pub fn validate_non_negative(value: i64, field: &str) -> Result<(), String> {
    if value < 0 {
        return Err(format!("{field} must not be negative, got {value}"));
    }
    Ok(())
}
