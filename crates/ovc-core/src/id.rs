//! Strongly-typed identifiers for OVC resources.
//!
//! The controller hands out opaque string identifiers. Wrapping each kind in its
//! own type prevents passing a datastore id where a policy id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate strongly-typed identifier wrapper types.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Converts into the inner string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }

            /// Returns true when the controller sent no identifier.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(wrapper: $name) -> Self {
                wrapper.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

id_type!(VmId, "Virtual machine identifier");
id_type!(BackupId, "Backup identifier");
id_type!(DatastoreId, "Datastore identifier");
id_type!(HostId, "Host identifier");
id_type!(ClusterId, "OmniStack cluster identifier");
id_type!(PolicyId, "Backup policy identifier");
id_type!(PersistentVolumeId, "Persistent volume identifier");
id_type!(TaskId, "Asynchronous task identifier");
