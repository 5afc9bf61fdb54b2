//! Strongly-typed identifiers.
//!
//! Every id wraps a ULID, so ids sort by creation time and print with a short
//! type prefix (`msg_01H...`).

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Generates a ULID-backed id newtype that displays as `<prefix>_<ulid>`.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a fresh id.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Identifies one conversation transcript (one process run).
    TranscriptId,
    "tx"
);

define_id!(
    /// Identifies a message appended to a transcript.
    MessageId,
    "msg"
);

define_id!(
    /// Identifies a single request made to the model service.
    InvocationId,
    "inv"
);
