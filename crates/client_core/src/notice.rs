//! User-facing outcome messages shown by a screen after an action.

use shared::error::{ApiException, ErrorCode, GENERIC_ERROR_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

/// A single dismissible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    kind: NoticeKind,
    category: Option<NoticeCategory>,
    message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            category: None,
            message: message.into(),
        }
    }

    /// Error notice classified from its text. Blank text becomes the
    /// generic message.
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        Self {
            kind: NoticeKind::Error,
            category: Some(classify(&message)),
            message,
        }
    }

    pub fn from_api(err: &ApiException) -> Self {
        let category = match err.code {
            ErrorCode::Unauthorized | ErrorCode::Forbidden => NoticeCategory::Auth,
            ErrorCode::Transport => NoticeCategory::Transport,
            ErrorCode::Validation | ErrorCode::Conflict => NoticeCategory::Validation,
            ErrorCode::NotFound | ErrorCode::Internal => NoticeCategory::Unknown,
        };
        let message = if err.message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            err.message.clone()
        };
        Self {
            kind: NoticeKind::Error,
            category: Some(category),
            message,
        }
    }

    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    pub fn category(&self) -> Option<NoticeCategory> {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == Some(NoticeCategory::Auth)
    }
}

fn classify(message: &str) -> NoticeCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("session expired")
        || lower.contains("invalid credential")
    {
        NoticeCategory::Auth
    } else if lower.contains("invalid") || lower.contains("missing") || lower.contains("required")
    {
        NoticeCategory::Validation
    } else if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("network")
        || lower.contains("unreachable")
    {
        NoticeCategory::Transport
    } else {
        NoticeCategory::Unknown
    }
}
