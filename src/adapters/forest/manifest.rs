//! Model manifest: SHA-256 digests of artifact files, optionally signed.
//!
//! `manifest.json` binds file names to digests. `model.sig` is a raw 64-byte
//! Ed25519 signature over the exact manifest bytes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ports::LoadError;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SIGNATURE_FILE: &str = "model.sig";

const MANIFEST_VERSION: u32 = 1;

/// Whether a model without a valid signature may be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignaturePolicy {
    /// Verify whatever is present; unsigned models are accepted.
    #[default]
    IfPresent,
    /// Manifest, signature and verifying key are all mandatory.
    Required,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Relative file name -> lowercase hex SHA-256
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    /// Build a manifest over the given files inside `dir`.
    ///
    /// # Errors
    /// Returns `LoadError::Io` if a file cannot be read.
    pub fn for_files(dir: &Path, names: &[&str]) -> Result<Self, LoadError> {
        let mut files = BTreeMap::new();
        for name in names {
            let bytes = fs::read(dir.join(name))
                .map_err(|e| LoadError::Io(format!("{name}: {e}")))?;
            files.insert((*name).to_string(), sha256_hex(&bytes));
        }
        Ok(Self {
            version: MANIFEST_VERSION,
            files,
        })
    }

    /// Canonical bytes written to disk and signed.
    ///
    /// # Errors
    /// Returns `LoadError::Corrupt` if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LoadError> {
        serde_json::to_vec_pretty(self).map_err(|e| LoadError::Corrupt(e.to_string()))
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub manifest: Option<ModelManifest>,
    pub signed: bool,
}

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `LoadError::Integrity` for malformed keys.
pub fn decode_verifying_key(b64: &str) -> Result<VerifyingKey, LoadError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| LoadError::Integrity("verifying key is not valid base64".into()))?;
    let raw: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| LoadError::Integrity("verifying key must be 32 bytes".into()))?;
    VerifyingKey::from_bytes(&raw)
        .map_err(|_| LoadError::Integrity("verifying key is not a valid Ed25519 point".into()))
}

/// Verify the manifest in `dir` and check that it binds `model_file`.
///
/// # Errors
/// Returns `LoadError::Integrity` on any failed check, or when the policy
/// requires a signature that is missing.
pub fn verify_model_dir(
    dir: &Path,
    model_file: &str,
    policy: SignaturePolicy,
    key: Option<&VerifyingKey>,
) -> Result<Verification, LoadError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let sig_path = dir.join(SIGNATURE_FILE);

    if !manifest_path.exists() {
        if policy == SignaturePolicy::Required {
            return Err(LoadError::Integrity(format!(
                "signed manifest required but {MANIFEST_FILE} is missing"
            )));
        }
        tracing::warn!("No {MANIFEST_FILE} next to model; loading unverified artifact");
        return Ok(Verification {
            manifest: None,
            signed: false,
        });
    }

    let manifest_bytes =
        fs::read(&manifest_path).map_err(|e| LoadError::Io(format!("{MANIFEST_FILE}: {e}")))?;

    let signed = match (sig_path.exists(), key) {
        (true, Some(key)) => {
            verify_signature(&manifest_bytes, &sig_path, key)?;
            true
        }
        (true, None) if policy == SignaturePolicy::IfPresent => {
            tracing::warn!("{SIGNATURE_FILE} present but no verifying key configured; skipping");
            false
        }
        (false, _) if policy == SignaturePolicy::IfPresent => false,
        (true, None) => {
            return Err(LoadError::Integrity(
                "signature required but no verifying key is configured".into(),
            ))
        }
        (false, _) => {
            return Err(LoadError::Integrity(format!(
                "signature required but {SIGNATURE_FILE} is missing"
            )))
        }
    };

    let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)
        .map_err(|e| LoadError::Integrity(format!("invalid {MANIFEST_FILE}: {e}")))?;

    if manifest.version != MANIFEST_VERSION {
        return Err(LoadError::Integrity(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }
    if !manifest.files.contains_key(model_file) {
        return Err(LoadError::Integrity(format!(
            "{MANIFEST_FILE} does not bind {model_file}"
        )));
    }

    for (name, expected) in &manifest.files {
        let bytes = fs::read(dir.join(name)).map_err(|e| {
            LoadError::Integrity(format!("manifest references unreadable file {name}: {e}"))
        })?;
        if !sha256_hex(&bytes).eq_ignore_ascii_case(expected) {
            return Err(LoadError::Integrity(format!("digest mismatch for {name}")));
        }
    }

    tracing::info!(
        "Model manifest verified ({} file(s), signed={})",
        manifest.files.len(),
        signed
    );

    Ok(Verification {
        manifest: Some(manifest),
        signed,
    })
}

fn verify_signature(
    manifest_bytes: &[u8],
    sig_path: &Path,
    key: &VerifyingKey,
) -> Result<(), LoadError> {
    let sig_bytes =
        fs::read(sig_path).map_err(|e| LoadError::Io(format!("{SIGNATURE_FILE}: {e}")))?;
    let raw: [u8; 64] = sig_bytes
        .as_slice()
        .try_into()
        .map_err(|_| LoadError::Integrity("signature must be 64 bytes".into()))?;
    key.verify(manifest_bytes, &Signature::from_bytes(&raw))
        .map_err(|_| LoadError::Integrity("manifest signature does not verify".into()))
}
