//! Error types shared across the planner

use std::path::PathBuf;

use thiserror::Error;

use crate::port::Port;

/// Failures while turning a data dump into a catalog. Any of these aborts
/// catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed record '{record}': {reason}")]
    MalformedRecord { record: String, reason: String },

    #[error("dump {file} is not valid JSON")]
    Json {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("dump {file} has unexpected shape: {detail}")]
    Shape { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub(crate) fn malformed(record: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.to_string(),
            reason: reason.into(),
        }
    }
}

/// Rejected factory edits. The factory passed in is never modified.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactoryError {
    #[error("unknown building: {0}")]
    UnknownBuilding(String),

    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),

    #[error("connection must run from an output port to an input port ({from} -> {to})")]
    InvalidDirection { from: Port, to: Port },

    #[error("cannot connect {source_item} to {target_item}")]
    ItemMismatch {
        source_item: String,
        target_item: String,
    },

    #[error("building count must be finite and positive, got {0}")]
    InvalidCount(f64),

    #[error("building {} has no {:?} port for {}", .0.building, .0.direction, .0.item)]
    UnknownPort(Port),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed port id: {0:?}")]
pub struct MalformedPortId(pub String);
