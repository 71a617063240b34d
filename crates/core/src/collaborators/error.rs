//! Error types reported by printing collaborators.

use serde::Serialize;
use thiserror::Error;

/// Errors a printer implementation can report for a single print operation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrinterError {
    /// Printer is offline or not connected.
    #[error("Printer unavailable: {reason}")]
    Unavailable { reason: String },

    /// Paper roll is empty.
    #[error("Printer is out of paper")]
    OutOfPaper,

    /// Printer reported a hardware fault.
    #[error("Printer hardware error: {detail}")]
    Hardware { detail: String },

    /// The print task panicked or was aborted.
    #[error("Print task aborted: {reason}")]
    Aborted { reason: String },
}

impl PrinterError {
    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a hardware error.
    pub fn hardware(detail: impl Into<String>) -> Self {
        Self::Hardware {
            detail: detail.into(),
        }
    }

    /// Whether offering the operator a retry makes sense.
    ///
    /// An operator can reload paper or reconnect the printer, but an aborted
    /// task points at a bug in the printer implementation.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Aborted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(PrinterError::OutOfPaper.to_string(), "Printer is out of paper");
        assert_eq!(
            PrinterError::unavailable("usb disconnected").to_string(),
            "Printer unavailable: usb disconnected"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(PrinterError::OutOfPaper.is_retryable());
        assert!(PrinterError::hardware("head too hot").is_retryable());
        assert!(!PrinterError::Aborted {
            reason: "panic".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(PrinterError::hardware("cutter stuck")).unwrap();
        assert_eq!(json["kind"], "hardware");
        assert_eq!(json["detail"], "cutter stuck");
    }
}
