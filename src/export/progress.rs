use crate::foundation::error::ReelError;
use serde::Serialize;
use std::time::SystemTime;

/// Export state machine: `preparing -> rendering -> encoding -> complete | error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportPhase {
    Preparing,
    Rendering,
    Encoding,
    Complete,
    Error,
}

/// Terminal failure category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportErrorKind {
    Validation,
    Render,
    Encoding,
    /// User-initiated; not a fault.
    Cancelled,
    AlreadyExporting,
}

impl std::fmt::Display for ExportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation",
            Self::Render => "render",
            Self::Encoding => "encoding",
            Self::Cancelled => "cancelled",
            Self::AlreadyExporting => "already_exporting",
        })
    }
}

/// Typed terminal error of an export, delivered through the job result and the last progress
/// event.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Serialize)]
#[error("export {kind} error: {message}")]
pub struct ExportError {
    pub kind: ExportErrorKind,
    pub message: String,
    /// Underlying error text, when there is one.
    pub cause: Option<String>,
    pub timestamp: SystemTime,
}

impl ExportError {
    pub fn new(kind: ExportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
            timestamp: SystemTime::now(),
        }
    }

    pub fn with_cause(mut self, cause: impl std::fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn already_exporting() -> Self {
        Self::new(
            ExportErrorKind::AlreadyExporting,
            "an export is already running on this engine",
        )
    }

    /// Classify `err` raised while in `phase`.
    pub fn from_reel(err: ReelError, phase: ExportPhase) -> Self {
        let (kind, message) = match &err {
            ReelError::Validation(m) => (ExportErrorKind::Validation, m.clone()),
            ReelError::Render(m) => (ExportErrorKind::Render, m.clone()),
            ReelError::Encoding(m) => (ExportErrorKind::Encoding, m.clone()),
            ReelError::Cancelled(m) => (ExportErrorKind::Cancelled, m.clone()),
            ReelError::Other(_) => {
                let kind = match phase {
                    ExportPhase::Rendering => ExportErrorKind::Render,
                    ExportPhase::Encoding => ExportErrorKind::Encoding,
                    _ => ExportErrorKind::Validation,
                };
                (kind, format!("{phase:?} failed"))
            }
        };
        let cause = match &err {
            ReelError::Other(e) => Some(format!("{e:#}")),
            _ => None,
        };
        Self {
            kind,
            message,
            cause,
            timestamp: SystemTime::now(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == ExportErrorKind::Cancelled
    }
}

/// Progress event pushed to the export callback.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportProgress {
    pub phase: ExportPhase,
    /// Progress within the current phase, in `[0, 1]`.
    pub progress: f64,
    pub current_frame: Option<u64>,
    pub total_frames: Option<u64>,
    pub message: Option<String>,
    pub error: Option<ExportError>,
}

impl ExportProgress {
    pub fn new(phase: ExportPhase, progress: f64) -> Self {
        Self {
            phase,
            progress: progress.clamp(0.0, 1.0),
            current_frame: None,
            total_frames: None,
            message: None,
            error: None,
        }
    }

    pub fn failed(error: ExportError) -> Self {
        Self {
            message: Some(error.message.clone()),
            error: Some(error),
            ..Self::new(ExportPhase::Error, 1.0)
        }
    }
}
