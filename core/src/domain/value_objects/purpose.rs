//! Business context a passcode is issued for

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::DomainError;

/// Purpose of a verification code
///
/// Scopes storage keys and is bound into the passcode hash, so a code sent
/// for `login` never verifies a `delete_account` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Login,
    Register,
    DeleteAccount,
}

impl Purpose {
    /// Wire and storage-key representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Login => "login",
            Purpose::Register => "register",
            Purpose::DeleteAccount => "delete_account",
        }
    }
}

impl FromStr for Purpose {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Purpose::Login),
            "register" => Ok(Purpose::Register),
            "delete_account" => Ok(Purpose::DeleteAccount),
            _ => Err(DomainError::Validation {
                message: format!("Unknown purpose: {}", s),
            }),
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
