//! User domain model

use serde::{Deserialize, Serialize};

/// The signed-in identity the dashboard acts on behalf of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier issued by the identity provider
    pub id: String,

    /// Email address used to sign in
    pub email: String,

    /// Display name
    pub name: String,
}
