//! Error types for the mountpath registry.

use thiserror::Error;

/// Result type alias for mountpath operations.
pub type MountfsResult<T> = Result<T, MountfsError>;

/// Error variants for mountpath registry operations.
///
/// Every mutator returns exactly one of these kinds on failure and
/// leaves the published snapshot untouched.
#[derive(Debug, Error)]
pub enum MountfsError {
    /// The path is lexically forbidden as a mountpath.
    #[error("invalid mountpath {path:?}: {reason}")]
    InvalidMountpath {
        /// The offending path as supplied by the caller.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// The path does not exist on the local filesystem.
    #[error("mountpath {path:?} does not exist")]
    PathNotFound {
        /// The cleaned path that was probed.
        path: String,
    },

    /// The path exists but is not a directory.
    #[error("mountpath {path:?} is not a directory")]
    NotADirectory {
        /// The cleaned path that was probed.
        path: String,
    },

    /// The path is already registered, available or disabled.
    #[error("mountpath {path:?} is already registered")]
    AlreadyRegistered {
        /// The cleaned path.
        path: String,
    },

    /// Another available mountpath covers the same filesystem.
    #[error("mountpath {path:?} shares a filesystem with registered mountpath {existing:?}")]
    DuplicateFsid {
        /// The cleaned path that was rejected.
        path: String,
        /// The available mountpath that already covers the filesystem.
        existing: String,
    },

    /// Remove was called on a path in neither side of the registry.
    #[error("mountpath {path:?} is not registered")]
    NotRegistered {
        /// The cleaned path.
        path: String,
    },

    /// The OS failed to report a filesystem identity for the path.
    #[error("failed to stat mountpath {path:?}: {errno}")]
    ProbeFailed {
        /// The cleaned path that was probed.
        path: String,
        /// The errno returned by the stat call.
        errno: nix::errno::Errno,
    },
}
