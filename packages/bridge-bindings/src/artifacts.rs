//! Compiled contract artifacts
//!
//! The bindings carry ABIs but no bytecode; deployment reads the creation code
//! from the compiler output instead. Both Foundry (`out/<Name>.sol/<Name>.json`,
//! `bytecode.object`) and Hardhat (`<Name>.json`, `bytecode` string) layouts
//! are understood.

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::abi::ContractKind;
use crate::error::BindingError;

/// ABI and bytecode of one compiled contract
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub abi: JsonAbi,
    /// Creation bytecode (constructor + runtime)
    pub bytecode: Bytes,
    pub deployed_bytecode: Option<Bytes>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    Object { object: String },
}

impl RawBytecode {
    fn as_str(&self) -> &str {
        match self {
            RawBytecode::Hex(s) => s,
            RawBytecode::Object { object } => object,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    abi: JsonAbi,
    #[serde(default)]
    bytecode: Option<RawBytecode>,
    #[serde(default)]
    deployed_bytecode: Option<RawBytecode>,
}

fn decode_bytecode(name: &str, raw: &str) -> Result<Bytes> {
    let stripped = raw.trim().trim_start_matches("0x");
    if stripped.is_empty() {
        return Err(BindingError::EmptyBytecode(name.to_string()).into());
    }
    if stripped.contains("__") {
        return Err(BindingError::UnlinkedBytecode(name.to_string()).into());
    }
    let bytes = hex::decode(stripped)
        .wrap_err_with(|| format!("Invalid bytecode hex in artifact {}", name))?;
    Ok(Bytes::from(bytes))
}

impl Artifact {
    /// Parse an artifact from its JSON text
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_str(json)
            .wrap_err_with(|| format!("Malformed artifact JSON for {}", name))?;

        let bytecode = match &raw.bytecode {
            Some(code) => decode_bytecode(name, code.as_str())?,
            None => return Err(BindingError::EmptyBytecode(name.to_string()).into()),
        };

        // Runtime code is informational only; an empty one is not an error
        let deployed_bytecode = raw
            .deployed_bytecode
            .as_ref()
            .and_then(|code| decode_bytecode(name, code.as_str()).ok());

        Ok(Self {
            name: name.to_string(),
            abi: raw.abi,
            bytecode,
            deployed_bytecode,
        })
    }

    /// Load an artifact file; the contract name is taken from the file stem
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| eyre!("Invalid artifact path: {}", path.display()))?
            .to_string();

        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read artifact {}", path.display()))?;

        debug!(path = %path.display(), contract = %name, "Loaded artifact");
        Self::from_json(&name, &json)
    }

    /// Find the artifact for `kind` under a compiler output directory
    pub fn locate(dir: impl AsRef<Path>, kind: ContractKind) -> Result<PathBuf> {
        let dir = dir.as_ref();
        let name = kind.name();

        let candidates = [
            dir.join(format!("{name}.sol")).join(format!("{name}.json")),
            dir.join(format!("{name}.json")),
        ];

        candidates
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| eyre!("No artifact for {} under {}", name, dir.display()))
    }

    /// Locate and load in one step
    pub fn load_for(dir: impl AsRef<Path>, kind: ContractKind) -> Result<Self> {
        let path = Self::locate(dir, kind)?;
        Self::load(path)
    }
}
