//! Configuration constants and settings.

use crate::error::{MeasureError, Result};
use serde::{Deserialize, Serialize};

/// Centimeters per meter, used to turn cm averages into square meters.
pub const CM_PER_M: f64 = 100.0;

/// Number of sample positions per dimension (left/center/right, top/middle/bottom).
pub const SAMPLES_PER_DIMENSION: usize = 3;

/// Default Baserow API host.
pub const DEFAULT_API_URL: &str = "https://api.baserow.io";

/// Request timeout for the row store, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Baserow list page size (the API maximum).
pub const LIST_PAGE_SIZE: u32 = 200;

/// Environment variable names.
pub const ENV_API_URL: &str = "BASEROW_API_URL";
pub const ENV_TOKEN: &str = "BASEROW_TOKEN";
pub const ENV_TABLE_ID: &str = "BASEROW_TABLE_ID";

/// How missing samples enter the width/height average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AveragingPolicy {
    /// Absent samples count as zero and the divisor is always 3.
    /// Matches the rows already stored by earlier versions of the form.
    #[default]
    ZeroFill,
    /// Average only over the samples that are present.
    PresentOnly,
}

impl AveragingPolicy {
    /// Parse from a CLI/config string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "zero-fill" | "zerofill" => Some(AveragingPolicy::ZeroFill),
            "present-only" | "presentonly" => Some(AveragingPolicy::PresentOnly),
            _ => None,
        }
    }
}

impl std::fmt::Display for AveragingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AveragingPolicy::ZeroFill => write!(f, "zero-fill"),
            AveragingPolicy::PresentOnly => write!(f, "present-only"),
        }
    }
}

/// How customer names are matched when grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingPolicy {
    /// Exact, case-sensitive string match.
    #[default]
    Exact,
    /// Trimmed and case-folded match.
    Normalized,
}

impl GroupingPolicy {
    /// Compute the group key for a customer name.
    pub fn key(&self, name: &str) -> String {
        match self {
            GroupingPolicy::Exact => name.to_string(),
            GroupingPolicy::Normalized => name.trim().to_lowercase(),
        }
    }
}

/// Settings for the in-memory measurement index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexConfig {
    pub averaging: AveragingPolicy,
    pub grouping: GroupingPolicy,
}

/// Connection settings for the Baserow row store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// API host, without trailing slash.
    pub api_url: String,
    /// Database token sent as `Authorization: Token ...`.
    pub token: String,
    /// Table holding the measurement rows.
    pub table_id: u64,
}

impl StoreConfig {
    /// Create a new store configuration.
    pub fn new(api_url: impl Into<String>, token: impl Into<String>, table_id: u64) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
            table_id,
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(ENV_API_URL)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let token = lookup(ENV_TOKEN)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| MeasureError::MissingSetting {
                name: ENV_TOKEN.to_string(),
            })?;

        let raw_table = lookup(ENV_TABLE_ID).ok_or_else(|| MeasureError::MissingSetting {
            name: ENV_TABLE_ID.to_string(),
        })?;
        let table_id = parse_table_id(&raw_table)?;

        Ok(Self::new(api_url, token, table_id))
    }

    /// Rows endpoint for this table, with trailing slash.
    pub fn rows_url(&self) -> String {
        format!(
            "{}/api/database/rows/table/{}/",
            self.api_url, self.table_id
        )
    }
}

/// Parse a table id setting.
pub fn parse_table_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| MeasureError::InvalidSetting {
            name: ENV_TABLE_ID.to_string(),
            value: raw.to_string(),
        })
}
