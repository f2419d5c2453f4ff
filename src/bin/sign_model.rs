//! Model signing utility for CardioGuard classifier artifacts.
//!
//! Writes `manifest.json` with the SHA-256 of every model JSON file in the
//! directory and `model.sig`, an Ed25519 signature over the manifest bytes.
//!
//! # Usage
//!
//! ```bash
//! CARDIOGUARD_SIGNING_KEY_B64_FILE=keys/model.seed cargo run --bin sign_model -- models
//! ```
//!
//! The seed is read from `CARDIOGUARD_SIGNING_KEY_B64_FILE`. Debug builds
//! also accept it inline in `CARDIOGUARD_SIGNING_KEY_B64`.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use cardioguard::adapters::forest::manifest::{ModelManifest, MANIFEST_FILE, SIGNATURE_FILE};

const KEY_FILE_ENV: &str = "CARDIOGUARD_SIGNING_KEY_B64_FILE";
const KEY_ENV: &str = "CARDIOGUARD_SIGNING_KEY_B64";

const USAGE: &str = "Usage: sign_model <model_dir>";

#[derive(Zeroize, ZeroizeOnDrop)]
struct Seed([u8; 32]);

fn read_signing_seed_b64() -> Result<Zeroizing<String>> {
    let secret = if let Ok(path) = env::var(KEY_FILE_ENV) {
        let content = fs::read_to_string(path.trim())
            .with_context(|| format!("Failed reading signing key file {path}"))?;
        content.trim_end_matches(['\n', '\r']).to_string()
    } else if cfg!(debug_assertions) {
        env::var(KEY_ENV)
            .map_err(|_| anyhow!("Missing signing key. Set {KEY_FILE_ENV} (or {KEY_ENV} in debug builds)."))?
    } else {
        bail!("Missing signing key. Set {KEY_FILE_ENV}.");
    };

    if secret.trim().is_empty() {
        bail!("Empty signing key");
    }
    Ok(Zeroizing::new(secret))
}

fn read_signing_seed() -> Result<Seed> {
    let b64 = read_signing_seed_b64()?;
    let raw = Zeroizing::new(
        general_purpose::STANDARD
            .decode(b64.trim())
            .context("Invalid base64 in signing key")?,
    );
    let seed: [u8; 32] = raw.as_slice().try_into().map_err(|_| {
        anyhow!(
            "Signing key seed must be 32 bytes after base64 decode (got {})",
            raw.len()
        )
    })?;
    Ok(Seed(seed))
}

fn model_files(dir: &std::path::Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {dir:?}"))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type()?.is_file() && name.ends_with(".json") && name != MANIFEST_FILE {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let model_dir = match (args.next(), args.next()) {
        (Some(arg), None) if arg != "-h" && arg != "--help" => PathBuf::from(arg),
        _ => bail!(USAGE),
    };

    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .map(std::path::Path::to_path_buf)
            .ok_or_else(|| anyhow!("Model path has no parent directory"))?
    } else {
        model_dir
    };

    let names = model_files(&model_dir)?;
    if names.is_empty() {
        bail!("No model JSON found in {model_dir:?}");
    }
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();

    let seed = read_signing_seed()?;
    let signing_key = SigningKey::from_bytes(&seed.0);
    drop(seed);

    let manifest = ModelManifest::for_files(&model_dir, &refs)?;
    let manifest_bytes = manifest.to_bytes()?;

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, &manifest_bytes)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    let sig: Signature = signing_key.sign(&manifest_bytes);
    let sig_path = model_dir.join(SIGNATURE_FILE);
    fs::write(&sig_path, sig.to_bytes()).with_context(|| format!("Failed to write {sig_path:?}"))?;

    println!("Signed {} file(s): {}", names.len(), names.join(", "));
    println!("Wrote manifest: {manifest_path:?}");
    println!("Wrote signature: {sig_path:?}");
    println!(
        "CARDIOGUARD_MODEL_PUBKEY_B64={}",
        general_purpose::STANDARD.encode(signing_key.verifying_key().as_bytes())
    );

    Ok(())
}
