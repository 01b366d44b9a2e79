// Common DTOs for public API
//
// These types are shared across multiple API endpoints.

use roastery_core::Pagination;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ApiResult};

/// Response wrapper for list endpoints.
/// All list endpoints return responses wrapped in a `data` field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    /// Array of items returned by the list operation.
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// Offset/limit query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Number of items to skip. Defaults to 0.
    pub offset: Option<u32>,
    /// Maximum number of items to return. Omit for no limit.
    pub limit: Option<u32>,
}

impl PaginationQuery {
    pub fn into_pagination(self) -> ApiResult<Pagination> {
        to_pagination(self.offset, self.limit)
    }
}

pub(crate) fn to_pagination(offset: Option<u32>, limit: Option<u32>) -> ApiResult<Pagination> {
    if limit == Some(0) {
        return Err(ApiError::BadRequest("limit must be a positive number".to_string()));
    }
    Ok(Pagination::new(offset.unwrap_or(0), limit))
}

/// Reject empty or whitespace-only strings
pub(crate) fn require_non_blank(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Parse a record id from a path segment.
///
/// Non-numeric input is a bad request. Numeric input outside the id range
/// yields `None`: it is well-formed but cannot match any record.
pub(crate) fn parse_id(raw: &str) -> ApiResult<Option<i32>> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::BadRequest(format!("invalid id format: {raw}")));
    }
    Ok(raw.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), Some(42));
        assert_eq!(parse_id("-7").unwrap(), Some(-7));
        assert_eq!(parse_id("99999999999999999999").unwrap(), None);

        for raw in ["", "-", "abc", "12abc", "1.5", " 1", "+1"] {
            assert!(
                matches!(parse_id(raw), Err(ApiError::BadRequest(_))),
                "expected bad request for {raw:?}"
            );
        }
    }

    #[test]
    fn test_pagination_defaults_and_validation() {
        let page = PaginationQuery::default().into_pagination().unwrap();
        assert_eq!(page, Pagination::all());

        let page = PaginationQuery {
            offset: Some(5),
            limit: Some(10),
        }
        .into_pagination()
        .unwrap();
        assert_eq!(page, Pagination::new(5, Some(10)));

        let zero = PaginationQuery {
            offset: None,
            limit: Some(0),
        };
        assert!(matches!(zero.into_pagination(), Err(ApiError::BadRequest(_))));
    }
}
