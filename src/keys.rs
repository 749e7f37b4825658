use serde::{Deserialize, Serialize};
use std::fmt;

const SEPARATOR: char = '_';

/// Derives a slug key from a display name: lowercase, every run of
/// characters outside `[a-z0-9]` collapsed to one `_`, no leading or
/// trailing `_`.
pub fn derive_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !key.is_empty() {
                key.push(SEPARATOR);
            }
            pending_separator = false;
            key.push(ch);
        } else {
            pending_separator = true;
        }
    }

    key
}

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_key!(
    /// Key of a main category, e.g. `helppi`.
    MainKey
);

string_key!(
    /// Key of a subcategory, unique within its main category.
    SubKey
);

string_key!(
    /// `mainKey_subKey`: indexes one leaf category in the statistics maps.
    CategoryStatKey
);

impl MainKey {
    pub fn from_name(name: &str) -> Self {
        Self(derive_key(name))
    }
}

impl SubKey {
    pub fn from_name(name: &str) -> Self {
        Self(derive_key(name))
    }
}

impl CategoryStatKey {
    pub fn compose(main: &MainKey, sub: &SubKey) -> Self {
        Self(format!("{}{}{}", main.as_str(), SEPARATOR, sub.as_str()))
    }
}
