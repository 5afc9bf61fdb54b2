//! Error types for the integration crate.

use std::fmt;

/// Errors from connector operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// Connection to service failed.
    ConnectionFailed { reason: String },
    /// The service answered with a non-success status.
    UnexpectedStatus { status: u16 },
    /// Protocol error, such as a body missing expected fields.
    ProtocolError { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// The connector could not be set up.
    InvalidConfig { reason: String },
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { reason } => {
                write!(f, "connection failed: {reason}")
            }
            Self::UnexpectedStatus { status } => {
                write!(f, "service responded with status {status}")
            }
            Self::ProtocolError { reason } => {
                write!(f, "protocol error: {reason}")
            }
            Self::Timeout => write!(f, "operation timed out"),
            Self::InvalidConfig { reason } => {
                write!(f, "invalid connector configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for ConnectorError {}
