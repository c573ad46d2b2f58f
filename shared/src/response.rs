//! API wire types
//!
//! Request and response bodies shared by the server and any client.
//!
//! Errors always come back as:
//! ```json
//! { "message": "post already exists" }
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{Draw, DrawStatus};

/// Error body for every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `POST /posts`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePostResponse {
    pub post_id: String,
}

/// `GET /draws/random`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DrawResponse {
    pub post_id: String,
    pub result: String,
    pub status: DrawStatus,
}

impl From<&Draw> for DrawResponse {
    fn from(draw: &Draw) -> Self {
        Self {
            post_id: draw.post_id().to_string(),
            result: draw.result().to_string(),
            status: draw.status(),
        }
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
    pub worker_mode: String,
}
