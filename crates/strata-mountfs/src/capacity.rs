//! Per-mountpath filesystem usage and watermark classification.
//!
//! Placement and eviction decisions need to know how full each disk
//! is. Usage is read with a single statvfs call per mountpath and
//! classified against high/low watermarks.

use std::path::Path;

use nix::sys::statvfs::statvfs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::error::{MountfsError, MountfsResult};
use crate::quantity::{parse_quantity, ParsedQuantity, QuantityError};
use crate::registry::MountedFs;

/// Filesystem usage of one mountpath at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountpathCapacity {
    /// The mountpath this row describes.
    pub path: String,
    /// Total filesystem size in bytes.
    pub total_bytes: u64,
    /// Bytes in use.
    pub used_bytes: u64,
    /// Bytes available to unprivileged writers.
    pub avail_bytes: u64,
}

impl MountpathCapacity {
    /// Usage as a percentage, saturating at 100. A zero-sized
    /// filesystem counts as full.
    pub fn used_pct(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let pct = self.used_bytes.saturating_mul(100) / self.total_bytes;
        pct.min(100) as u8
    }
}

/// Read the current usage of the filesystem containing `path`.
pub fn read_capacity(path: &str) -> MountfsResult<MountpathCapacity> {
    let stat = statvfs(Path::new(path)).map_err(|errno| MountfsError::ProbeFailed {
        path: path.to_string(),
        errno,
    })?;

    let frsize = stat.fragment_size() as u64;
    let total_bytes = stat.blocks() as u64 * frsize;
    let free_bytes = stat.blocks_free() as u64 * frsize;
    let avail_bytes = stat.blocks_available() as u64 * frsize;

    Ok(MountpathCapacity {
        path: path.to_string(),
        total_bytes,
        used_bytes: total_bytes.saturating_sub(free_bytes),
        avail_bytes,
    })
}

/// Usage classification against a [`WatermarkConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CapacityLevel {
    /// Below the low watermark.
    #[default]
    Normal,
    /// Between the low and high watermarks.
    Elevated,
    /// At or above the high watermark.
    High,
    /// The filesystem is full.
    Full,
}

/// High/low usage watermarks, in percent of filesystem capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Usage at or above this is classified [`CapacityLevel::High`].
    /// Default: 90.
    pub high_wm_pct: u8,
    /// Usage at or above this (but below high) is
    /// [`CapacityLevel::Elevated`]. Default: 75.
    pub low_wm_pct: u8,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            high_wm_pct: 90,
            low_wm_pct: 75,
        }
    }
}

/// Errors from constructing a [`WatermarkConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatermarkError {
    /// The quantity string did not parse.
    #[error(transparent)]
    Quantity(#[from] QuantityError),

    /// Watermarks must be percentages, not byte counts.
    #[error("watermark must be a percentage, got {0}")]
    NotAPercent(ParsedQuantity),

    /// The high watermark must be strictly above the low one.
    #[error("high watermark {high}% must be above low watermark {low}%")]
    Inverted {
        /// The supplied high watermark.
        high: u8,
        /// The supplied low watermark.
        low: u8,
    },
}

impl WatermarkConfig {
    /// Build a configuration from operator quantity strings, e.g.
    /// `("90%", "75%")`.
    pub fn from_quantities(high: &str, low: &str) -> Result<Self, WatermarkError> {
        let high = match parse_quantity(high)? {
            ParsedQuantity::Percent(pct) => pct as u8,
            other => return Err(WatermarkError::NotAPercent(other)),
        };
        let low = match parse_quantity(low)? {
            ParsedQuantity::Percent(pct) => pct as u8,
            other => return Err(WatermarkError::NotAPercent(other)),
        };
        if high <= low {
            return Err(WatermarkError::Inverted { high, low });
        }
        Ok(Self {
            high_wm_pct: high,
            low_wm_pct: low,
        })
    }

    /// Classify a usage percentage.
    pub fn level(&self, used_pct: u8) -> CapacityLevel {
        if used_pct >= 100 {
            CapacityLevel::Full
        } else if used_pct >= self.high_wm_pct {
            CapacityLevel::High
        } else if used_pct >= self.low_wm_pct {
            CapacityLevel::Elevated
        } else {
            CapacityLevel::Normal
        }
    }
}

impl MountedFs {
    /// Read usage rows for the currently available mountpaths.
    ///
    /// Works off the published snapshot; the registry lock is never
    /// taken. A mountpath whose filesystem fails to answer is skipped
    /// with a warning.
    pub fn capacities(&self) -> Vec<MountpathCapacity> {
        let snapshot = self.get();
        let mut rows = Vec::with_capacity(snapshot.available.len());
        for path in snapshot.available.keys() {
            match read_capacity(path) {
                Ok(row) => rows.push(row),
                Err(err) => warn!("Skipping capacity for {}: {}", path, err),
            }
        }
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        rows
    }
}
