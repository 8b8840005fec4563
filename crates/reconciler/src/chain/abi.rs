//! FactHound ABI artifact loading.
//!
//! The engine's calls are compiled in through `sol!` bindings; the artifact configured at
//! `contract.abi_path` is loaded once at startup to check that the deployed contract
//! version declares those view functions with the same inputs and outputs, so results
//! decode into the right fields.

use alloy::json_abi::{Function, JsonAbi};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use super::rpc::bound_functions;

/// View functions the reconciliation engine calls.
pub const REQUIRED_VIEW_FUNCTIONS: [&str; 3] = ["owner", "getQuestion", "getAnswererAddress"];

/// A parsed contract ABI.
#[derive(Debug, Clone)]
pub struct ContractAbi {
    abi: JsonAbi,
}

impl ContractAbi {
    /// Load an ABI from a compiler artifact (`{"abi": [...]}`) or a bare ABI array.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read ABI file: {}", path.display()))?;

        Self::from_json_str(&contents)
            .with_context(|| format!("Failed to parse ABI file: {}", path.display()))
    }

    /// Parse an ABI from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).context("Invalid ABI JSON")?;

        let abi_value = match value {
            Value::Object(mut artifact) => artifact
                .remove("abi")
                .context("Artifact has no \"abi\" field")?,
            array @ Value::Array(_) => array,
            _ => anyhow::bail!("ABI must be an artifact object or an array"),
        };

        let abi: JsonAbi = serde_json::from_value(abi_value).context("Malformed ABI entries")?;

        Ok(Self { abi })
    }

    /// Whether the ABI declares a function with this name.
    pub fn has_function(&self, name: &str) -> bool {
        self.abi.functions.contains_key(name)
    }

    /// Fail unless every function in [`REQUIRED_VIEW_FUNCTIONS`] is declared with the
    /// signature, outputs included, that the compiled bindings decode.
    pub fn verify(&self) -> Result<()> {
        let bound = bound_functions();
        let mut problems = Vec::new();

        for name in REQUIRED_VIEW_FUNCTIONS {
            let expected = bound
                .get(name)
                .and_then(|overloads| overloads.first())
                .map(Function::signature_with_outputs)
                .with_context(|| format!("Bindings do not declare {}", name))?;

            match self.abi.functions.get(name) {
                None => problems.push(format!("{} is missing", name)),
                Some(declared)
                    if !declared
                        .iter()
                        .any(|f| f.signature_with_outputs() == expected) =>
                {
                    let found: Vec<String> = declared
                        .iter()
                        .map(Function::signature_with_outputs)
                        .collect();
                    problems.push(format!(
                        "{} is declared as {}, expected {}",
                        name,
                        found.join(" or "),
                        expected
                    ));
                }
                Some(_) => {}
            }
        }

        if !problems.is_empty() {
            anyhow::bail!(
                "ABI does not match the compiled FactHound bindings: {}",
                problems.join("; ")
            );
        }

        Ok(())
    }
}
