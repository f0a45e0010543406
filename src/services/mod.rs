//! Services module - descriptor scanning, file classification and package assembly.
//!
//! The services hold all of the packaging logic and have no dependency on the
//! CLI layer, so every step can be driven and tested on its own.
//!
//! # Components
//!
//! - [`DescriptorScanner`]: walks the input tree and parses `vehicles.meta` / `carcols.meta`
//! - [`resolve`]: folds descriptors into the entity set and the entity → mod map
//! - [`find_files`]: ordered, case-insensitive name rules plus an extension filter
//! - [`DescriptorPatcher`]: fills an empty `<audioNameHash />` inside one record block
//! - [`Packager`]: builds the vehicle and audio trees for each entity and calls the [`Archiver`]
//! - [`GtaUtilArchiver`]: runs `gtautil createarchive` as a subprocess
//!
//! # Pipeline
//!
//! 1. Scan the input tree once; nothing is classified before the scan completes
//! 2. Resolve entities and associations (pure fold over the scan)
//! 3. For each entity, sequentially: classify, patch, copy, archive, clean up
//!
//! ```ignore
//! use vehpack::services::{DescriptorScanner, GtaUtilArchiver, Packager, resolve};
//!
//! let scan = DescriptorScanner::new().scan(&options.input_dir);
//! let associations = resolve(&scan);
//! let packager = Packager::new(options, GtaUtilArchiver::new("utils/gtautil", timeout));
//! let reports = packager.run(&scan, &associations).await;
//! ```

pub mod archiver;
pub mod association;
pub mod classifier;
pub mod packager;
pub mod patcher;
pub mod scanner;

pub use archiver::{ArchiveOutput, ArchiveRequest, Archiver, ArchiverError, GtaUtilArchiver};
pub use association::{Associations, audio_hashes_for, collect_entity_names, resolve};
pub use classifier::{AssetCategory, NamePattern, find_files};
pub use packager::{
    EntityPlan, PackageKind, PackageReport, PackageStatus, Packager, PackagerOptions, plan_entity,
};
pub use patcher::{DescriptorPatcher, Patched};
pub use scanner::{DescriptorParser, DescriptorScanner, ScanResult};
