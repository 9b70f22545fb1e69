//! User-visible notices raised by list screens

use std::time::Instant;

use crate::error::ListError;

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub timestamp: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Warning,
    Error,
}

impl Toast {
    pub fn new(message: String, level: ToastLevel) -> Self {
        Self {
            message,
            level,
            timestamp: Instant::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message.into(), ToastLevel::Error)
    }

    /// Notice for a failed fetch of the current request
    pub fn fetch_failed(error: &ListError) -> Self {
        if error.is_transient() {
            Self::warning(format!("Failed to load results (try again): {error}"))
        } else {
            Self::error(format!("Failed to load results: {error}"))
        }
    }
}
