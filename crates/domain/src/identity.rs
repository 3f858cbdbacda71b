use crate::error::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestIdentity {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl GuestIdentity {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Nickname is required.".into()));
        }
        if !valid_email(&self.email) {
            return Err(Error::Validation("A valid email address is required.".into()));
        }
        Ok(())
    }
}

pub fn valid_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, host)) => !local.is_empty() && !host.is_empty() && !host.starts_with('.'),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub provider: String,
    pub name: String,
}
