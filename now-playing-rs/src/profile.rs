use std::{io, path::PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_THEME: &str = "dark";
const DEFAULT_AUTH_MESSAGE: &str = "Une erreur est survenue";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub favorite_radios: Vec<String>,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_notifications")]
    pub notifications: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            favorite_radios: Vec::new(),
            theme: default_theme(),
            notifications: default_notifications(),
        }
    }
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_notifications() -> bool {
    true
}

/// Identity-provider failure, carrying the provider's error code.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("no stored profile")]
    NotConfigured,
    #[error("profile store unavailable ({code}): {source}")]
    Unavailable {
        code: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("stored profile is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ProfileError {
    pub fn code(&self) -> &'static str {
        match self {
            ProfileError::NotConfigured => "auth/user-not-found",
            ProfileError::Unavailable { code, .. } => code,
            ProfileError::Malformed(_) => "auth/invalid-profile",
        }
    }

    pub fn user_message(&self) -> &'static str {
        auth_error_message(self.code())
    }
}

impl From<io::Error> for ProfileError {
    fn from(source: io::Error) -> Self {
        let code = match source.kind() {
            io::ErrorKind::NotFound => "auth/user-not-found",
            io::ErrorKind::PermissionDenied => "auth/operation-not-allowed",
            _ => "auth/network-request-failed",
        };
        ProfileError::Unavailable { code, source }
    }
}

/// French user-facing message for an identity-provider error code.
pub fn auth_error_message(code: &str) -> &'static str {
    match code {
        "auth/email-already-in-use" => "Cet email est déjà utilisé",
        "auth/invalid-email" => "Email invalide",
        "auth/operation-not-allowed" => "Opération non autorisée",
        "auth/weak-password" => "Mot de passe trop faible (min. 6 caractères)",
        "auth/user-disabled" => "Ce compte a été désactivé",
        "auth/user-not-found" => "Aucun compte avec cet email",
        "auth/wrong-password" => "Mot de passe incorrect",
        "auth/popup-closed-by-user" | "auth/cancelled-popup-request" => "Connexion annulée",
        "auth/network-request-failed" => "Erreur de connexion réseau",
        _ => DEFAULT_AUTH_MESSAGE,
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self) -> Result<UserProfile, ProfileError>;
}

/// Reads the profile document from disk; `None` means no profile is stored.
pub struct FileProfileStore {
    path: Option<PathBuf>,
}

impl FileProfileStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn load(&self) -> Result<UserProfile, ProfileError> {
        let path = self.path.as_ref().ok_or(ProfileError::NotConfigured)?;
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}
