//! MessageId - logical identity of an outbound message
//!
//! The retry queue coalesces on this id: a newer message with the same id
//! supersedes the parked one instead of queueing behind it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::message::message_type;

/// Logical identity key for outbound messages.
///
/// Backed by `Arc<str>`: ids are stamped once at dispatch time and cloned on
/// every retry-queue operation, so a clone only bumps a reference count.
#[derive(Clone)]
pub struct MessageId(Arc<str>);

impl MessageId {
    /// Stamp the id for a message of the given type.
    ///
    /// Types whose repeats supersede each other (realtime frames, their
    /// fallback copies, profile syncs, the end signal) coalesce to the bare
    /// type tag so the retry queue keeps only the latest. Everything else,
    /// notably workout completions, gets a sequence-unique id; `next_seq`
    /// is only invoked on that path.
    pub fn for_type(message_type: &str, next_seq: impl FnOnce() -> u64) -> Self {
        match message_type {
            message_type::REALTIME_DATA
            | message_type::REALTIME_DATA_FALLBACK
            | message_type::USER_PROFILE_SYNC
            | message_type::WORKOUT_END_SIGNAL => Self::from(message_type),
            _ => Self::from(format!("{message_type}-{}", next_seq())),
        }
    }

    /// The underlying string form.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for MessageId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({:?})", self.0)
    }
}

impl PartialEq for MessageId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for MessageId {}

// On the wire the id is a plain string
impl Serialize for MessageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}
