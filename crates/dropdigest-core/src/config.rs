//! Drop processing and backend configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// What to do when a drop arrives while another one is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlapPolicy {
    /// Wait for the running drop to finish, then process.
    #[default]
    Serialize,
    /// Fail the new drop immediately.
    Reject,
}

/// Configuration for drop processing.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct DropConfig {
    /// Maximum number of files read and hashed at once (1 = strictly sequential).
    #[builder(default = "1")]
    #[serde(default = "default_max_concurrent_reads")]
    pub max_concurrent_reads: usize,

    /// Policy for overlapping drops.
    #[builder(default)]
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,

    /// Buffer size of the report event channel.
    #[builder(default = "100")]
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
}

fn default_max_concurrent_reads() -> usize {
    1
}

fn default_channel_size() -> usize {
    100
}

impl DropConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_reads == Some(0) {
            return Err("max_concurrent_reads must be at least 1".to_string());
        }
        if self.channel_size == Some(0) {
            return Err("channel_size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl DropConfig {
    /// Create a new drop config builder.
    pub fn builder() -> DropConfigBuilder {
        DropConfigBuilder::default()
    }
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reads: 1,
            overlap_policy: OverlapPolicy::Serialize,
            channel_size: 100,
        }
    }
}

/// Configuration for the local filesystem backend.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct FsConfig {
    /// Number of entries returned per directory batch.
    #[builder(default = "100")]
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,
}

fn default_batch_size() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl FsConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.batch_size == Some(0) {
            return Err("batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}

impl FsConfig {
    /// Create a new filesystem config builder.
    pub fn builder() -> FsConfigBuilder {
        FsConfigBuilder::default()
    }

    /// Check if hidden entries should be skipped.
    pub fn should_skip_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            follow_symlinks: false,
            include_hidden: true,
        }
    }
}
