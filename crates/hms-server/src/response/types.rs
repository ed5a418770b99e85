//! Standard API response envelope.

use super::pagination::PaginationMeta;
use serde::Serialize;

/// Success envelope: `{success: true, message?, data, pagination?}`.
///
/// Failures use [`crate::error::ApiError`]'s response instead.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always true here.
    pub success: bool,
    /// Optional human-readable note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response payload.
    pub data: T,
    /// Present on list responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            pagination: None,
        }
    }

    /// Attach a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach pagination metadata.
    pub fn with_pagination(mut self, pagination: PaginationMeta) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_omitted() {
        let json = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json.get("message").is_none());
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_message_and_pagination() {
        let json = serde_json::to_value(
            ApiResponse::success(())
                .with_message("Logged out")
                .with_pagination(PaginationMeta::new(1, 20, 0)),
        )
        .unwrap();
        assert_eq!(json["message"], "Logged out");
        assert_eq!(json["pagination"]["total"], 0);
    }
}
