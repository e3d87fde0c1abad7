//! Wire types for the HTTP API
//!
//! Every response carries a `status` field the frontend branches on:
//! `"success"` or `"error"`.

use serde::{Deserialize, Serialize};

/// Generic operation response (`setup-database`, `delete-database`, `update-database`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpResponse {
    /// "success" or "error"
    pub status: String,
    /// Human-readable outcome
    pub message: String,
}

impl OpResponse {
    /// Successful operation
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    /// Failed operation reported in-band (HTTP 200 with an error status)
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Response for `list-documents`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    /// "success" or "error"
    pub status: String,
    /// Document paths relative to the source directory
    pub documents: Vec<String>,
}

impl DocumentListResponse {
    /// Successful listing
    pub fn success(documents: Vec<String>) -> Self {
        Self {
            status: "success".to_string(),
            documents,
        }
    }
}

/// Request body for `ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The question to answer
    pub question: String,
}

/// Response for `ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// "success" or "error"
    pub status: String,
    /// Generated answer
    pub response: String,
}

impl AskResponse {
    /// Successful answer
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            response: response.into(),
        }
    }
}

/// Optional request body for `update-database`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDatabaseRequest {
    /// Replacement source directory
    #[serde(default)]
    pub source_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_response_serializes_status_and_message() {
        let json = serde_json::to_value(OpResponse::success("Database created successfully")).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Database created successfully");

        let json = serde_json::to_value(OpResponse::error("nope")).unwrap();
        assert_eq!(json["status"], "error");
    }

    #[test]
    fn document_list_serializes_documents_array() {
        let json =
            serde_json::to_value(DocumentListResponse::success(vec!["a.md".into(), "b/c.py".into()]))
                .unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["documents"][1], "b/c.py");
    }

    #[test]
    fn ask_response_uses_response_field() {
        let json = serde_json::to_value(AskResponse::success("hello")).unwrap();
        assert_eq!(json["response"], "hello");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn update_request_body_is_optional_everywhere() {
        let req: UpdateDatabaseRequest = serde_json::from_str("{}").unwrap();
        assert!(req.source_dir.is_none());

        let req: UpdateDatabaseRequest =
            serde_json::from_str(r#"{"source_dir": "/tmp/docs"}"#).unwrap();
        assert_eq!(req.source_dir.as_deref(), Some("/tmp/docs"));
    }
}
