//! Folds parsed descriptors into the global entity set and the entity → mod map.
//!
//! Association is by directory only: a `carcols.meta` contributes to the
//! entities of the `vehicles.meta` sitting next to it, and to nothing else.

use crate::models::{CARCOLS_META, EntityName, VehicleDescriptor};
use crate::services::scanner::ScanResult;
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;

static NO_MODS: BTreeSet<String> = BTreeSet::new();

/// Result of the resolution pass. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Associations {
    /// Every entity named by a vehicle record, in discovery order.
    pub entity_names: IndexSet<EntityName>,

    /// Mod identifiers per entity, from sibling paint descriptors.
    pub mods: IndexMap<EntityName, BTreeSet<String>>,
}

impl Associations {
    /// Mods associated with `entity`; empty when it has no sibling paint descriptor.
    pub fn mods_for(&self, entity: &str) -> &BTreeSet<String> {
        self.mods.get(entity).unwrap_or(&NO_MODS)
    }
}

/// Collect every entity name of every vehicle descriptor.
pub fn collect_entity_names<'a, I>(vehicles: I) -> IndexSet<EntityName>
where
    I: IntoIterator<Item = &'a VehicleDescriptor>,
{
    vehicles
        .into_iter()
        .flat_map(|d| d.records.iter())
        .map(|r| r.model_name.clone())
        .collect()
}

/// Build the entity set and the association map from one scan.
pub fn resolve(scan: &ScanResult) -> Associations {
    let mut mods: IndexMap<EntityName, BTreeSet<String>> = IndexMap::new();

    for descriptor in scan.vehicles.values() {
        let sibling = descriptor.directory().join(CARCOLS_META);
        let Some(paint) = scan.paints.get(&sibling) else {
            continue;
        };

        for record in &descriptor.records {
            mods.entry(record.model_name.clone())
                .or_default()
                .extend(paint.mod_identifiers.iter().cloned());
        }
    }

    let associations = Associations {
        entity_names: collect_entity_names(scan.vehicles.values()),
        mods,
    };

    tracing::info!(
        "Resolved {} entities, {} with associated mods",
        associations.entity_names.len(),
        associations.mods.len()
    );

    associations
}

/// Explicit audio hashes recorded for `entity`, in discovery order, deduplicated.
pub fn audio_hashes_for(scan: &ScanResult, entity: &str) -> IndexSet<String> {
    scan.vehicles
        .values()
        .flat_map(|d| d.records.iter())
        .filter(|r| r.model_name == entity)
        .filter_map(|r| r.audio_hash.value())
        .map(str::to_string)
        .collect()
}

/// Vehicle descriptors that contain a record for `entity`.
pub fn descriptors_for<'a>(
    scan: &'a ScanResult,
    entity: &'a str,
) -> impl Iterator<Item = &'a VehicleDescriptor> + 'a {
    scan.vehicles
        .values()
        .filter(move |d| d.record_for(entity).is_some())
}
