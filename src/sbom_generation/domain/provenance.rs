//! In-toto provenance statements (SLSA v0.2 style predicates).
//!
//! Only the fields the correlator needs are typed; everything else is kept
//! verbatim in `extra` maps so a loaded statement serializes back without loss.

use super::checksum::is_lower_hex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Algorithm name to hex digest, as written in the statement
pub type DigestSet = BTreeMap<String, String>;

/// Unknown fields preserved across a load/serialize cycle
pub type ExtraFields = BTreeMap<String, Value>;

/// Why a statement could not be accepted
#[derive(Debug, Error, PartialEq)]
pub enum StatementError {
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub statement_type: Option<String>,
    #[serde(rename = "predicateType", default, skip_serializing_if = "Option::is_none")]
    pub predicate_type: Option<String>,
    pub subject: Vec<Subject>,
    pub predicate: Predicate,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// One artifact the statement is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    #[serde(default)]
    pub digest: DigestSet,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub builder: Builder,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Builder {
    pub id: String,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A build input, identified by URI and digest(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub uri: String,
    #[serde(default)]
    pub digest: DigestSet,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Material {
    pub fn new(uri: impl Into<String>, digest: DigestSet) -> Self {
        Self {
            uri: uri.into(),
            digest,
            extra: ExtraFields::new(),
        }
    }
}

impl Subject {
    pub fn new(name: impl Into<String>, digest: DigestSet) -> Self {
        Self {
            name: name.into(),
            digest,
            extra: ExtraFields::new(),
        }
    }
}

impl Statement {
    /// Parses and validates a statement from JSON text
    pub fn from_json(json: &str) -> Result<Self, StatementError> {
        let statement: Statement =
            serde_json::from_str(json).map_err(|e| StatementError::Parse(e.to_string()))?;
        statement.validate()?;
        Ok(statement)
    }

    /// Serializes the statement, including preserved unknown fields
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Checks the semantic rules serde cannot express
    pub fn validate(&self) -> Result<(), StatementError> {
        if self.subject.is_empty() {
            return Err(StatementError::Validation(
                "statement has no subject".to_string(),
            ));
        }

        for (index, subject) in self.subject.iter().enumerate() {
            validate_digest_values(&subject.digest)
                .map_err(|e| StatementError::Validation(format!("subject[{}] ({}): {}", index, subject.name, e)))?;
        }

        for (index, material) in self.predicate.materials.iter().enumerate() {
            if material.digest.is_empty() {
                return Err(StatementError::Validation(format!(
                    "material[{}] ({}) has no digest",
                    index, material.uri
                )));
            }
            validate_digest_values(&material.digest)
                .map_err(|e| StatementError::Validation(format!("material[{}] ({}): {}", index, material.uri, e)))?;
        }

        Ok(())
    }

    pub fn builder_id(&self) -> &str {
        &self.predicate.builder.id
    }

    pub fn materials(&self) -> &[Material] {
        &self.predicate.materials
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subject
    }
}

fn validate_digest_values(digests: &DigestSet) -> Result<(), String> {
    for (algorithm, value) in digests {
        if !is_lower_hex(value) {
            return Err(format!(
                "digest '{}' must be lower-case hex, got '{}'",
                algorithm, value
            ));
        }
    }
    Ok(())
}
