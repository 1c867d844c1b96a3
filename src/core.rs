use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Descriptive course information carried along with a node, such as the
/// description, units or the term it is offered in. Opaque to the engine.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Identifier of a course (its course number), unique within a flow.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(String);

impl CourseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CourseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CourseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&CourseId> for CourseId {
    fn from(value: &CourseId) -> Self {
        value.clone()
    }
}

impl AsRef<str> for CourseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CourseId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CourseId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CourseId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CourseId({})", self.0)
    }
}

/// Whether a course is completed, currently takeable, or blocked.
///
/// The serialized names match the node types stored in saved flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EligibilityState {
    /// Marked as completed by the user. Never derived.
    #[serde(rename = "courseTaken")]
    Taken,
    /// Every prerequisite visible in the flow is taken.
    #[serde(rename = "courseCanTake")]
    CanTake,
    /// Some prerequisite visible in the flow is not taken yet.
    #[serde(rename = "courseCannotTake")]
    #[default]
    CannotTake,
}

impl EligibilityState {
    pub fn is_taken(self) -> bool {
        self == EligibilityState::Taken
    }
}

impl fmt::Display for EligibilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EligibilityState::Taken => write!(f, "taken"),
            EligibilityState::CanTake => write!(f, "can take"),
            EligibilityState::CannotTake => write!(f, "cannot take"),
        }
    }
}

/// Top-left corner of a node on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A 32-byte BLAKE3 hash used to fingerprint encoded flow snapshots, so that
/// recording the same graph twice in a row can be detected cheaply.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Hash32([u8; 32]);

impl<T> From<T> for Hash32
where
    T: Into<[u8; 32]>,
{
    fn from(value: T) -> Self {
        Hash32(value.into())
    }
}

impl Hash32 {
    pub(crate) fn hash(buffer: impl AsRef<[u8]>) -> Self {
        blake3::Hasher::new()
            .update(buffer.as_ref())
            .finalize()
            .into()
    }

    pub(crate) fn to_hex(self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut acc = String::with_capacity(64);

        for byte in self.0 {
            acc.push(HEX[(byte >> 4) as usize] as char);
            acc.push(HEX[(byte & 0xF) as usize] as char);
        }

        acc
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serde_names() {
        let json = serde_json::to_string(&EligibilityState::CanTake).unwrap();
        assert_eq!(json, r#""courseCanTake""#);

        let state: EligibilityState = serde_json::from_str(r#""courseTaken""#).unwrap();
        assert_eq!(state, EligibilityState::Taken);
    }

    #[test]
    fn test_provisional_state() {
        assert_eq!(EligibilityState::default(), EligibilityState::CannotTake);
    }

    #[test]
    fn test_course_id_borrow() {
        let mut map = std::collections::HashMap::new();
        map.insert(CourseId::from("CS101"), 1);
        assert_eq!(map.get("CS101"), Some(&1));
        assert_eq!(CourseId::from("CS101"), "CS101");
    }

    #[test]
    fn test_hash_hex() {
        let a = Hash32::hash(b"flow");
        let b = Hash32::hash(b"flow");
        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), 64);
        assert_ne!(a, Hash32::hash(b"other"));
    }
}
