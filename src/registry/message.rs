//! Push messages delivered to display subscribers
//!
//! The wire format is consumed by display frontends; field names and the tag
//! layout are part of the contract and must not drift.

use serde::{Deserialize, Serialize};

/// Message pushed to a display over its long-lived connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DisplayMessage {
    Status {
        status: StatusKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        original_image: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Result {
        result_image: String,
        prompt: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Processing,
    Error,
}

impl DisplayMessage {
    /// Announce that a submission for this display has started processing
    pub fn processing(prompt: &str, original_image_b64: String) -> Self {
        Self::Status {
            status: StatusKind::Processing,
            prompt: Some(prompt.to_string()),
            original_image: Some(original_image_b64),
            message: None,
        }
    }

    /// Report a failed submission
    pub fn error(message: impl Into<String>) -> Self {
        Self::Status {
            status: StatusKind::Error,
            prompt: None,
            original_image: None,
            message: Some(message.into()),
        }
    }

    /// Deliver the finished result
    pub fn result(result_image_b64: String, prompt: &str) -> Self {
        Self::Result {
            result_image: result_image_b64,
            prompt: prompt.to_string(),
        }
    }
}
