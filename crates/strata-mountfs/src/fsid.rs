//! Filesystem identity probing.
//!
//! Two mountpaths must never resolve to the same underlying filesystem,
//! otherwise the target would double-write one block device under two
//! names. The probe maps a directory path to the stable identifier of
//! the filesystem containing it, using a single stat call.

use std::fmt;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::stat::{stat, SFlag};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identifier of a mounted filesystem.
///
/// Two paths compare equal iff they reside on the same mounted
/// filesystem. The inner value is the device identifier reported by the
/// OS and carries no other meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FsId(u64);

impl FsId {
    /// Returns the raw device identifier, for diagnostics only.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fsid({:#x})", self.0)
    }
}

/// Why a probe failed to produce a filesystem identity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// The path does not exist.
    #[error("path does not exist")]
    NotFound,

    /// The path exists but is not a directory.
    #[error("path is not a directory")]
    NotADirectory,

    /// The stat call failed for another reason.
    #[error("stat failed: {0}")]
    Stat(Errno),
}

/// Resolve a directory path to the identity of its containing filesystem.
///
/// Performs exactly one stat call. Stateless and reentrant; safe to call
/// from any thread without coordination.
pub fn probe(path: &Path) -> Result<FsId, ProbeError> {
    let st = stat(path).map_err(|errno| match errno {
        Errno::ENOENT => ProbeError::NotFound,
        Errno::ENOTDIR => ProbeError::NotADirectory,
        other => ProbeError::Stat(other),
    })?;

    if st.st_mode & SFlag::S_IFMT.bits() != SFlag::S_IFDIR.bits() {
        return Err(ProbeError::NotADirectory);
    }

    Ok(FsId(st.st_dev as u64))
}
