// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Error Types
 * Error taxonomy for inventory acquisition and parsing
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use thiserror::Error;

/// Errors surfaced to callers of the library.
///
/// Connectivity and protocol-level failures during detection never reach this
/// type: the fetch layer collapses them to absent results so that a single
/// unreachable probe can not abort a batch. Only structurally invalid input
/// and remote-shell transport failures propagate.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Top-level malformed input (inventory JSON, command output)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unparseable target or host descriptor
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Remote-shell command transport failure
    #[error("remote shell error: {0}")]
    Shell(String),

    /// HTTP client could not be constructed
    #[error("http client error: {0}")]
    Http(String),

    /// Local file I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// True for errors caused by caller-supplied input rather than the
    /// environment; the CLI maps these to a distinct exit code.
    pub fn is_input_error(&self) -> bool {
        matches!(self, ScanError::InvalidInput(_) | ScanError::InvalidTarget(_))
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
