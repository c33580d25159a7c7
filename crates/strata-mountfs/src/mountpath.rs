//! Mountpath records and path hygiene.
//!
//! A mountpath is an absolute directory the target stores object data
//! under, typically one per physical disk. Each mountpath roots two
//! bucket-type subtrees, `local/` and `cloud/`, which is why those two
//! names are forbidden anywhere inside a mountpath itself.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MountfsError, MountfsResult};
use crate::fsid::FsId;
use crate::iostat::{IostatCell, RollingPair};

/// Subtree name under which local-bucket objects live.
pub const BUCKET_TYPE_LOCAL: &str = "local";
/// Subtree name under which cloud-bucket objects live.
pub const BUCKET_TYPE_CLOUD: &str = "cloud";

/// Path segments that may not appear anywhere in a mountpath.
const RESERVED_SEGMENTS: [&str; 2] = [BUCKET_TYPE_LOCAL, BUCKET_TYPE_CLOUD];

/// One registered filesystem root.
///
/// All attributes are fixed at construction; once a record is published
/// in a snapshot it is never mutated. Enable/disable re-link the same
/// record between the two sides of the registry. The only writable
/// state is the embedded telemetry cell, which carries its own lock.
#[derive(Debug)]
pub struct Mountpath {
    path: String,
    fsid: FsId,
    iostats: IostatCell,
}

impl Mountpath {
    pub(crate) fn new(path: String, fsid: FsId) -> Arc<Self> {
        Arc::new(Self {
            path,
            fsid,
            iostats: IostatCell::new(),
        })
    }

    /// The cleaned absolute path of this filesystem root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Identity of the filesystem containing this root.
    pub fn fsid(&self) -> FsId {
        self.fsid
    }

    /// The telemetry cell owned by this record.
    pub fn iostats(&self) -> &IostatCell {
        &self.iostats
    }

    /// Returns the latest `(utilization, queue-length)` windows.
    pub fn get_iostats(&self) -> (RollingPair, RollingPair) {
        self.iostats.get()
    }

    /// Root of the local-bucket subtree for `bucket` on this mountpath.
    pub fn make_path_local(&self, bucket: &str) -> PathBuf {
        Path::new(&self.path).join(BUCKET_TYPE_LOCAL).join(bucket)
    }

    /// Root of the cloud-bucket subtree for `bucket` on this mountpath.
    pub fn make_path_cloud(&self, bucket: &str) -> PathBuf {
        Path::new(&self.path).join(BUCKET_TYPE_CLOUD).join(bucket)
    }

    /// Serializable management view of this record.
    pub fn info(&self) -> MountpathInfo {
        MountpathInfo {
            path: self.path.clone(),
            fsid: self.fsid.as_raw(),
        }
    }
}

impl PartialEq for Mountpath {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Mountpath {}

/// Snapshot of a mountpath's identity for management surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountpathInfo {
    /// Cleaned absolute path.
    pub path: String,
    /// Raw filesystem identifier.
    pub fsid: u64,
}

/// Canonicalize a mountpath string: absolute, no trailing separator, no
/// `.`/`..` segments.
///
/// The cleaning is purely lexical; symlinks are not resolved and the
/// filesystem is never touched. Relative paths are resolved against the
/// current working directory.
pub fn clean_path(path: &str) -> MountfsResult<String> {
    if path.is_empty() {
        return Err(MountfsError::InvalidMountpath {
            path: path.to_string(),
            reason: "empty path".to_string(),
        });
    }

    let absolute = if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        let cwd = std::env::current_dir().map_err(|e| MountfsError::InvalidMountpath {
            path: path.to_string(),
            reason: format!("cannot resolve relative path: {}", e),
        })?;
        cwd.join(path)
    };

    let mut cleaned = PathBuf::from("/");
    for component in absolute.components() {
        match component {
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            Component::Normal(segment) => cleaned.push(segment),
        }
    }

    Ok(cleaned.to_string_lossy().into_owned())
}

/// Reject cleaned paths that collide with bucket-type subtree names.
///
/// Any path with a `local` or `cloud` segment is forbidden, wherever
/// the segment appears. Runs before any filesystem I/O.
pub fn validate_mountpath(cleaned: &str) -> MountfsResult<()> {
    for component in Path::new(cleaned).components() {
        if let Component::Normal(segment) = component {
            let segment = segment.to_string_lossy();
            if RESERVED_SEGMENTS.contains(&segment.as_ref()) {
                return Err(MountfsError::InvalidMountpath {
                    path: cleaned.to_string(),
                    reason: format!("reserved path segment {:?}", segment.as_ref()),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsid;

    fn record(path: &str) -> Arc<Mountpath> {
        let fsid = fsid::probe(Path::new("/tmp")).unwrap();
        Mountpath::new(path.to_string(), fsid)
    }

    #[test]
    fn test_clean_path_strips_trailing_separator() {
        assert_eq!(clean_path("/tmp/").unwrap(), "/tmp");
        assert_eq!(clean_path("/tmp").unwrap(), "/tmp");
    }

    #[test]
    fn test_clean_path_removes_dot_segments() {
        assert_eq!(clean_path("/tmp/.").unwrap(), "/tmp");
        assert_eq!(clean_path("/tmp/./a/./b").unwrap(), "/tmp/a/b");
    }

    #[test]
    fn test_clean_path_resolves_parent_segments() {
        assert_eq!(clean_path("/tmp/a/../b").unwrap(), "/tmp/b");
        assert_eq!(clean_path("/tmp/..").unwrap(), "/");
        assert_eq!(clean_path("/../../tmp").unwrap(), "/tmp");
    }

    #[test]
    fn test_clean_path_makes_relative_paths_absolute() {
        let cleaned = clean_path("some/relative/dir").unwrap();
        assert!(cleaned.starts_with('/'));
        assert!(cleaned.ends_with("some/relative/dir"));
    }

    #[test]
    fn test_clean_path_rejects_empty_input() {
        assert!(matches!(
            clean_path(""),
            Err(MountfsError::InvalidMountpath { .. })
        ));
    }

    #[test]
    fn test_clean_path_is_idempotent() {
        for raw in ["/tmp/", "/tmp/./x/..", "/a/b/c", "/"] {
            let once = clean_path(raw).unwrap();
            let twice = clean_path(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_validate_rejects_reserved_segments_anywhere() {
        let invalid = [
            "/local",
            "/cloud",
            "/tmp/local/abcd",
            "/tmp/cloud/abcd",
            "/tmp/abcd/local",
            "/tmp/abcd/cloud",
        ];
        for path in invalid {
            assert!(
                validate_mountpath(path).is_err(),
                "expected {:?} to be rejected",
                path
            );
        }
    }

    #[test]
    fn test_validate_accepts_near_miss_segments() {
        for path in ["/tmp/clouder", "/tmp/locals", "/tmp/locals/err"] {
            assert!(validate_mountpath(path).is_ok());
        }
    }

    #[test]
    fn test_bucket_subtree_paths() {
        let mp = record("/data/disk0");
        assert_eq!(
            mp.make_path_local("photos"),
            PathBuf::from("/data/disk0/local/photos")
        );
        assert_eq!(
            mp.make_path_cloud("photos"),
            PathBuf::from("/data/disk0/cloud/photos")
        );
    }

    #[test]
    fn test_equality_keys_on_path() {
        let a = record("/data/disk0");
        let b = record("/data/disk0");
        let c = record("/data/disk1");
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn test_info_view_carries_path_and_fsid() {
        let mp = record("/data/disk0");
        let info = mp.info();
        assert_eq!(info.path, "/data/disk0");
        assert_eq!(info.fsid, mp.fsid().as_raw());
    }
}
