//! Strongly typed identifiers
//!
//! Both wrap a MongoDB ObjectId so a record id can never be passed where an
//! owner is expected.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::BookshelfError;

/// Identifier of a registered principal (the owner of records)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(ObjectId);

/// Identifier of a book record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(ObjectId);

macro_rules! object_id_newtype {
    ($name:ident) => {
        impl $name {
            pub fn new() -> Self {
                Self(ObjectId::new())
            }

            pub fn as_object_id(&self) -> ObjectId {
                self.0
            }

            pub fn to_hex(&self) -> String {
                self.0.to_hex()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<ObjectId> for $name {
            fn from(oid: ObjectId) -> Self {
                Self(oid)
            }
        }

        impl FromStr for $name {
            type Err = BookshelfError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                ObjectId::parse_str(s)
                    .map(Self)
                    .map_err(|_| BookshelfError::InvalidId(s.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.to_hex())
            }
        }
    };
}

object_id_newtype!(PrincipalId);
object_id_newtype!(RecordId);

/// Serde adapter rendering ids as 24-char hex strings in JSON.
///
/// Document types keep the native ObjectId encoding; API views use
/// `#[serde(with = "hex")]`.
pub mod hex {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T: Display, S: Serializer>(id: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_id() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_hex().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_reject_bad_format() {
        let err = "not-an-id".parse::<RecordId>().unwrap_err();
        assert!(matches!(err, BookshelfError::InvalidId(_)));

        assert!("12345".parse::<PrincipalId>().is_err());
        assert!("zzzzzzzzzzzzzzzzzzzzzzzz".parse::<PrincipalId>().is_err());
    }

    #[test]
    fn test_hex_adapter_in_json() {
        #[derive(Serialize, Deserialize)]
        struct View {
            #[serde(with = "hex")]
            id: RecordId,
        }

        let id = RecordId::new();
        let json = serde_json::to_value(View { id }).unwrap();
        assert_eq!(json["id"], id.to_hex());

        let back: View = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, id);

        let bad = serde_json::from_value::<View>(serde_json::json!({ "id": "nope" }));
        assert!(bad.is_err());
    }
}
