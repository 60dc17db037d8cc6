// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use blobstore::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_arrow::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored column cannot be made to fit the expected schema
    #[error("Schema mismatch in column {field}: {reason}")]
    SchemaMismatch { field: String, reason: String },

    /// A provider description could not be mapped to its record
    #[error("Cannot project {asset_type} description: {reason}")]
    Projection {
        asset_type: &'static str,
        reason: String,
    },

    /// The resource listing for an asset type failed as a whole
    #[error("Listing {asset_type} failed: {message}")]
    Source {
        asset_type: &'static str,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    pub(crate) fn projection(asset_type: &'static str, reason: impl Into<String>) -> Self {
        CatalogError::Projection {
            asset_type,
            reason: reason.into(),
        }
    }
}
