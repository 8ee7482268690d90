// File helpers for keys and proofs, plus the verifying-key export used to
// embed a key into an on-chain verifier.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::keys::{ProvingKey, VerifyingKey};
use crate::proof::ContingentProof;

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

pub fn save_proving_key(pk: &ProvingKey, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = pk.to_bytes()?;
    write_file(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "saved proving key");
    Ok(())
}

pub fn save_verifying_key(vk: &VerifyingKey, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = vk.to_bytes()?;
    write_file(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "saved verifying key");
    Ok(())
}

pub fn load_proving_key(path: impl AsRef<Path>) -> Result<ProvingKey> {
    ProvingKey::from_bytes(&fs::read(path)?)
}

pub fn load_verifying_key(path: impl AsRef<Path>) -> Result<VerifyingKey> {
    VerifyingKey::from_bytes(&fs::read(path)?)
}

/// Writes the proof in its JSON text form.
pub fn save_proof(proof: &ContingentProof, path: impl AsRef<Path>) -> Result<()> {
    write_file(path.as_ref(), proof.to_json()?.as_bytes())
}

pub fn load_proof(path: impl AsRef<Path>) -> Result<ContingentProof> {
    ContingentProof::from_json(&fs::read_to_string(path)?)
}

/// Export verifying key to a byte array source file for on-chain embedding
pub fn export_verifying_key_to_rs(vk: &VerifyingKey, path: impl AsRef<Path>) -> Result<()> {
    let vk_bytes = vk.to_bytes()?;

    let mut out = String::new();
    out.push_str("// Auto-generated verifying key byte array\n");
    out.push_str(&format!(
        "pub const VERIFYING_KEY_NUM_BLOCKS: usize = {};\n",
        vk.config().num_blocks()
    ));
    out.push_str("pub const VERIFYING_KEY_BYTES: &[u8] = &[\n");
    for chunk in vk_bytes.chunks(16) {
        out.push_str("    ");
        for byte in chunk {
            out.push_str(&format!("0x{:02x}, ", byte));
        }
        out.push('\n');
    }
    out.push_str("];\n");

    write_file(path.as_ref(), out.as_bytes())
}
