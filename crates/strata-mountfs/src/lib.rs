#![warn(missing_docs)]

//! Strata mountpath registry: local filesystem roots and per-disk I/O telemetry.
//!
//! Every storage target in a strata cluster serves objects from a set
//! of mountpaths, typically one per physical disk. This crate keeps
//! that set: registration with filesystem-identity deduplication,
//! runtime enable/disable without tearing down the server, copy-on-write
//! snapshots published atomically to lock-free readers, and a rolling
//! two-sample utilization/queue-length window per mountpath that
//! schedulers poll without coordinating with the telemetry feed.

pub mod capacity;
pub mod error;
pub mod fsid;
pub mod iostat;
pub mod metrics;
pub mod mountpath;
pub mod quantity;
pub mod registry;

pub use capacity::{
    read_capacity, CapacityLevel, MountpathCapacity, WatermarkConfig, WatermarkError,
};
pub use error::{MountfsError, MountfsResult};
pub use fsid::{FsId, ProbeError};
pub use iostat::{IostatCell, RollingPair};
pub use metrics::{CountersSnapshot, Metric, MetricType, MetricValue, MutationCounters};
pub use mountpath::{
    clean_path, validate_mountpath, Mountpath, MountpathInfo, BUCKET_TYPE_CLOUD, BUCKET_TYPE_LOCAL,
};
pub use quantity::{parse_quantity, to_size_iec, ParsedQuantity, QuantityError};
pub use registry::{MountedFs, Snapshot};
