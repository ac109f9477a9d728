//! Type identities as written in annotations

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named type with its generic argument names and optionality.
///
/// Two identities are equal iff all three parts match, which is what
/// unifies registrations and references across files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeIdentity {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "g", default, skip_serializing_if = "Vec::is_empty")]
    pub generics: Vec<String>,
    #[serde(rename = "o", default, skip_serializing_if = "is_false")]
    pub is_optional: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TypeIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generics: Vec::new(),
            is_optional: false,
        }
    }

    pub fn with_generics<I, S>(mut self, generics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generics = generics.into_iter().map(Into::into).collect();
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// The same identity without the trailing `?`
    pub fn non_optional(&self) -> Self {
        Self {
            is_optional: false,
            ..self.clone()
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.generics.is_empty() {
            write!(f, "<{}>", self.generics.join(", "))?;
        }
        if self.is_optional {
            f.write_str("?")?;
        }
        Ok(())
    }
}
