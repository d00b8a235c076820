//! Request validation for the HTTP boundary

use crate::api::errors::ApiError;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Validate EVM-style address format
pub fn validate_address(field: &str, address: &str) -> Result<(), ApiError> {
    if address.is_empty() {
        return Err(ApiError::validation_error(field, "Address cannot be empty"));
    }

    if !address.starts_with("0x") {
        return Err(ApiError::validation_error(field, "Address must start with '0x'"));
    }

    if address.len() != 42 {
        return Err(ApiError::validation_error(
            field,
            "Address must be 42 characters long (including '0x')",
        ));
    }

    if !is_valid_hex(&address[2..]) {
        return Err(ApiError::validation_error(
            field,
            "Address contains invalid hex characters",
        ));
    }

    Ok(())
}

/// Resolve `limit`/`offset` query parameters. An offset past the end is
/// allowed and yields an empty page.
pub fn validate_pagination(
    limit: Option<usize>,
    offset: Option<usize>,
) -> Result<(usize, usize), ApiError> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = offset.unwrap_or(0);

    if limit == 0 {
        return Err(ApiError::validation_error("limit", "Limit must be greater than zero"));
    }

    if limit > MAX_PAGE_LIMIT {
        return Err(ApiError::validation_error(
            "limit",
            &format!("Limit cannot exceed {}", MAX_PAGE_LIMIT),
        ));
    }

    Ok((limit, offset))
}

fn is_valid_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}
