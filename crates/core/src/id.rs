// SPDX-License-Identifier: MIT

//! Typed string identifier newtypes.
//!
//! Unlike a generated-id system, scheduler identifiers are *structural*:
//! a platform name, an install target, a timer key — all derived
//! deterministically from workflow configuration or task identity rather
//! than randomly generated. [`define_scoped_id!`] generates the common
//! `Display`/`From`/`Borrow<str>` boilerplate for such a newtype.

/// Define a newtype wrapper around `String` with the usual string-ish traits.
///
/// ```ignore
/// define_scoped_id! {
///     /// Doc comment for the id type.
///     pub struct PlatformName;
/// }
/// ```
#[macro_export]
macro_rules! define_scoped_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
