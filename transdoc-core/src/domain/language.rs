//! Language reference data

use serde::{Deserialize, Serialize};

/// A language the backend can translate from or into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-1 code (e.g., "en")
    pub code: String,

    /// Human readable name (e.g., "English")
    pub name: String,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}
