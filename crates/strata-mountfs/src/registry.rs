//! The mountpath registry.
//!
//! Every storage target keeps one [`MountedFs`] describing the local
//! filesystem roots it serves objects from. The registry publishes the
//! set of available and disabled mountpaths as an immutable snapshot
//! behind an atomic pointer: readers and the telemetry feed never take
//! the registry lock, and administrative mutators serialize behind a
//! single mutex, rebuild the snapshot, and swap it in wholesale.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::error::{MountfsError, MountfsResult};
use crate::fsid::{self, ProbeError};
use crate::metrics::MutationCounters;
use crate::mountpath::{clean_path, validate_mountpath, Mountpath};

/// Immutable view of the registry at one point in time.
///
/// The two maps are disjoint by path. While the fsid uniqueness check
/// is on, no two records in `available` share a filesystem. Published
/// snapshots are never mutated; holding one pins its records alive
/// regardless of later mutations.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Mountpaths currently serving I/O, keyed by cleaned path.
    pub available: HashMap<String, Arc<Mountpath>>,
    /// Mountpaths retained but excluded from I/O, keyed by cleaned path.
    pub disabled: HashMap<String, Arc<Mountpath>>,
}

/// Registry of the target's local filesystem roots.
///
/// Mutators follow lock → validate → clone-modify → publish → unlock.
/// The filesystem probe in [`MountedFs::add`] runs before the lock is
/// taken, so a hung disk blocks only the caller, never the registry.
#[derive(Debug)]
pub struct MountedFs {
    snapshot: ArcSwap<Snapshot>,
    mutate: Mutex<()>,
    check_fsid: AtomicBool,
    counters: MutationCounters,
}

impl MountedFs {
    /// Create an empty registry with the fsid uniqueness check enabled.
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            mutate: Mutex::new(()),
            check_fsid: AtomicBool::new(true),
            counters: MutationCounters::default(),
        }
    }

    /// Register a new mountpath and place it in the available set.
    ///
    /// The path is cleaned and made absolute, checked against the
    /// reserved bucket-subtree names before any filesystem I/O, then
    /// stat'ed once for existence, directory-ness, and filesystem
    /// identity. Registration fails if the path is already present on
    /// either side, or (while the check is on) if another available
    /// mountpath covers the same filesystem.
    pub fn add(&self, path: &str) -> MountfsResult<()> {
        let result = self.add_inner(path);
        if result.is_err() {
            self.counters.record_rejected();
        }
        result
    }

    fn add_inner(&self, path: &str) -> MountfsResult<()> {
        let cleaned = clean_path(path)?;
        validate_mountpath(&cleaned)?;

        let fsid = match fsid::probe(Path::new(&cleaned)) {
            Ok(fsid) => fsid,
            Err(ProbeError::NotFound) => {
                return Err(MountfsError::PathNotFound { path: cleaned })
            }
            Err(ProbeError::NotADirectory) => {
                return Err(MountfsError::NotADirectory { path: cleaned })
            }
            Err(ProbeError::Stat(errno)) => {
                return Err(MountfsError::ProbeFailed {
                    path: cleaned,
                    errno,
                })
            }
        };

        let _guard = self.mutate.lock().unwrap();
        let current = self.snapshot.load_full();

        if current.available.contains_key(&cleaned) || current.disabled.contains_key(&cleaned) {
            return Err(MountfsError::AlreadyRegistered { path: cleaned });
        }

        if self.check_fsid.load(Ordering::Relaxed) {
            if let Some(existing) = current.available.values().find(|mp| mp.fsid() == fsid) {
                return Err(MountfsError::DuplicateFsid {
                    path: cleaned,
                    existing: existing.path().to_string(),
                });
            }
        }

        let record = Mountpath::new(cleaned.clone(), fsid);
        let mut available = current.available.clone();
        available.insert(cleaned.clone(), record);

        self.snapshot.store(Arc::new(Snapshot {
            available,
            disabled: current.disabled.clone(),
        }));
        self.counters.record_add();
        info!("Added mountpath {} ({})", cleaned, fsid);
        Ok(())
    }

    /// Unregister a mountpath from whichever side currently holds it.
    ///
    /// The record and its telemetry cell are dropped once the last
    /// snapshot referencing them is released.
    pub fn remove(&self, path: &str) -> MountfsResult<()> {
        let result = self.remove_inner(path);
        if result.is_err() {
            self.counters.record_rejected();
        }
        result
    }

    fn remove_inner(&self, path: &str) -> MountfsResult<()> {
        let cleaned = clean_path(path)?;

        let _guard = self.mutate.lock().unwrap();
        let current = self.snapshot.load_full();

        let next = if current.available.contains_key(&cleaned) {
            let mut available = current.available.clone();
            available.remove(&cleaned);
            Snapshot {
                available,
                disabled: current.disabled.clone(),
            }
        } else if current.disabled.contains_key(&cleaned) {
            let mut disabled = current.disabled.clone();
            disabled.remove(&cleaned);
            Snapshot {
                available: current.available.clone(),
                disabled,
            }
        } else {
            return Err(MountfsError::NotRegistered { path: cleaned });
        };

        self.snapshot.store(Arc::new(next));
        self.counters.record_remove();
        info!("Removed mountpath {}", cleaned);
        Ok(())
    }

    /// Move a disabled mountpath back into the available set.
    ///
    /// Returns `(enabled, exists)`: `(true, true)` if the record moved,
    /// `(false, true)` if it was already available, `(false, false)` if
    /// the path is unknown. The record is re-linked, not rebuilt, and
    /// fsid uniqueness is not re-checked on this transition.
    pub fn enable(&self, path: &str) -> (bool, bool) {
        let cleaned = match clean_path(path) {
            Ok(cleaned) => cleaned,
            Err(_) => return (false, false),
        };

        let _guard = self.mutate.lock().unwrap();
        let current = self.snapshot.load_full();

        if current.available.contains_key(&cleaned) {
            return (false, true);
        }
        let record = match current.disabled.get(&cleaned) {
            Some(record) => Arc::clone(record),
            None => return (false, false),
        };

        let mut available = current.available.clone();
        let mut disabled = current.disabled.clone();
        disabled.remove(&cleaned);
        available.insert(cleaned.clone(), record);

        self.snapshot.store(Arc::new(Snapshot {
            available,
            disabled,
        }));
        self.counters.record_enable();
        debug!("Enabled mountpath {}", cleaned);
        (true, true)
    }

    /// Move an available mountpath into the disabled set.
    ///
    /// Returns `(disabled, exists)`, symmetric to [`MountedFs::enable`].
    /// Disabled mountpaths stop serving I/O and are excluded from the
    /// fsid uniqueness rule, but keep their record and telemetry cell.
    pub fn disable(&self, path: &str) -> (bool, bool) {
        let cleaned = match clean_path(path) {
            Ok(cleaned) => cleaned,
            Err(_) => return (false, false),
        };

        let _guard = self.mutate.lock().unwrap();
        let current = self.snapshot.load_full();

        if current.disabled.contains_key(&cleaned) {
            return (false, true);
        }
        let record = match current.available.get(&cleaned) {
            Some(record) => Arc::clone(record),
            None => return (false, false),
        };

        let mut available = current.available.clone();
        let mut disabled = current.disabled.clone();
        available.remove(&cleaned);
        disabled.insert(cleaned.clone(), record);

        self.snapshot.store(Arc::new(Snapshot {
            available,
            disabled,
        }));
        self.counters.record_disable();
        debug!("Disabled mountpath {}", cleaned);
        (true, true)
    }

    /// Returns the currently published snapshot.
    ///
    /// Lock-free: a single atomic load. The snapshot is immutable; a
    /// caller iterating it is unaffected by concurrent mutators.
    pub fn get(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Returns `(available, disabled)` mountpath counts.
    pub fn mountpath_count(&self) -> (usize, usize) {
        let snapshot = self.snapshot.load();
        (snapshot.available.len(), snapshot.disabled.len())
    }

    /// Feed one round of telemetry samples into the available records.
    ///
    /// Looks up records through the current snapshot without taking the
    /// registry lock. A path is updated only when present in both input
    /// maps and in the available set; everything else is silently
    /// skipped, so a cell never shifts one metric without the other.
    pub fn set_iostats(
        &self,
        util_by_path: &HashMap<String, f64>,
        queue_by_path: &HashMap<String, f64>,
    ) {
        let snapshot = self.snapshot.load();
        for (path, util) in util_by_path {
            let queue = match queue_by_path.get(path) {
                Some(queue) => *queue,
                None => continue,
            };
            if let Some(record) = snapshot.available.get(path) {
                record.iostats().set(*util, queue);
            }
        }
    }

    /// Turn off fsid uniqueness enforcement for subsequent adds.
    ///
    /// Meant for single-disk and test deployments where several
    /// mountpaths deliberately share one filesystem.
    pub fn disable_fsid_check(&self) {
        self.check_fsid.store(false, Ordering::Relaxed);
        debug!("Filesystem identity uniqueness check disabled");
    }

    pub(crate) fn counters(&self) -> &MutationCounters {
        &self.counters
    }
}

impl Default for MountedFs {
    fn default() -> Self {
        Self::new()
    }
}
