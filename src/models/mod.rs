//! Data models for vehpack.
//!
//! - [`VehicleDescriptor`] / [`PaintDescriptor`]: parsed `vehicles.meta` and `carcols.meta` files
//! - [`VehicleRecord`] / [`AudioHash`]: one vehicle entry and the three states of its audio hash
//! - [`ContentManifest`] / [`SetupManifest`]: typed `content.xml` and `setup2.xml` models
//! - [`UserConfig`]: settings loaded from `VehPack Config.yaml`

pub mod config;
pub mod descriptor;
pub mod manifest;

pub use config::{PackSettings, UserConfig};
pub use descriptor::{
    AudioHash, CARCOLS_META, EntityName, PaintDescriptor, VEHICLES_META, VehicleDescriptor,
    VehicleRecord,
};
pub use manifest::{AudioFileNames, ContentManifest, ManifestKeys, SetupManifest};
