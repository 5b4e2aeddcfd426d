//! Identifier newtypes
//!
//! Persistence backends hand out opaque string ids. Wrapping them keeps a
//! container id from ever being passed where an entry id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw id string
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifies a gear list (the parent of containers)
    ListId
);
string_id!(
    /// Identifies a container (category) within a list
    ContainerId
);
string_id!(
    /// Identifies an entry (item) within a container
    EntryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = EntryId::new("64f0c2");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"64f0c2\"");

        let back: EntryId = serde_json::from_str("\"64f0c2\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_display_raw_value() {
        assert_eq!(ContainerId::from("shelter").to_string(), "shelter");
    }
}
