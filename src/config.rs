//! Runtime configuration read from `CARDIOGUARD_*` environment variables.

use std::path::PathBuf;

use ed25519_dalek::VerifyingKey;

use crate::adapters::forest::manifest::decode_verifying_key;
use crate::adapters::{ForestLoader, SignaturePolicy};
use crate::ports::LoadError;

pub const MODEL_PATH_VAR: &str = "CARDIOGUARD_MODEL_PATH";
pub const REQUIRE_SIGNED_VAR: &str = "CARDIOGUARD_REQUIRE_SIGNED_MODEL";
pub const PUBKEY_VAR: &str = "CARDIOGUARD_MODEL_PUBKEY_B64";
pub const PUBKEY_FILE_VAR: &str = "CARDIOGUARD_MODEL_PUBKEY_B64_FILE";
pub const LOG_MODE_VAR: &str = "CARDIOGUARD_LOG_MODE";
pub const LOG_FILE_VAR: &str = "CARDIOGUARD_LOG_FILE";

const DEFAULT_MODEL_PATH: &str = "models";
const DEFAULT_LOG_FILE: &str = "cardioguard.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model_path: PathBuf,
    pub require_signed_model: bool,
    /// Base64 verifying key, inline or read from the key file
    pub model_pubkey_b64: Option<String>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            require_signed_model: false,
            model_pubkey_b64: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    /// Returns `std::io::Error` if the verifying key file is configured but
    /// unreadable.
    pub fn from_env() -> std::io::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// # Errors
    /// Same as [`Settings::from_env`].
    pub fn from_lookup<F>(lookup: F) -> std::io::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model_pubkey_b64 = match lookup(PUBKEY_VAR).filter(|v| !v.trim().is_empty()) {
            Some(inline) => Some(inline),
            None => match lookup(PUBKEY_FILE_VAR) {
                Some(path) => Some(std::fs::read_to_string(path)?.trim().to_string()),
                None => None,
            },
        };

        Ok(Self {
            model_path: lookup(MODEL_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            require_signed_model: lookup(REQUIRE_SIGNED_VAR)
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            model_pubkey_b64,
            log_mode: lookup(LOG_MODE_VAR)
                .map(|v| LogMode::parse(&v))
                .unwrap_or_default(),
            log_file: lookup(LOG_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        })
    }

    #[must_use]
    pub fn signature_policy(&self) -> SignaturePolicy {
        if self.require_signed_model {
            SignaturePolicy::Required
        } else {
            SignaturePolicy::IfPresent
        }
    }

    /// Decoded verifying key, if one is configured.
    ///
    /// # Errors
    /// Returns `LoadError::Integrity` for a malformed key.
    pub fn verifying_key(&self) -> Result<Option<VerifyingKey>, LoadError> {
        self.model_pubkey_b64
            .as_deref()
            .map(decode_verifying_key)
            .transpose()
    }

    /// Build the forest loader these settings describe.
    ///
    /// # Errors
    /// Returns `LoadError::Integrity` for a malformed verifying key.
    pub fn forest_loader(&self) -> Result<ForestLoader, LoadError> {
        let mut loader =
            ForestLoader::new(self.model_path.clone()).with_policy(self.signature_policy());
        if let Some(key) = self.verifying_key()? {
            loader = loader.with_verifying_key(key);
        }
        Ok(loader)
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}
