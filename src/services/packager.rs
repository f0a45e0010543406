//! Per-entity package assembly.
//!
//! For every entity the packager builds two trees under the output directory
//! and hands each to the [`Archiver`]:
//!
//! ```text
//! <output>/<Name>/<name>_vehicle_dlc_temp/
//!     content.xml, setup2.xml
//!     data/                         vehicles.meta (patched) + sibling .meta files
//!     <platform>/data/lang/
//!     <platform>/vehicles.rpf/      model files
//!     <platform>/vehiclemods/<name>_mods.rpf/   mod files
//!
//! <output>/<name>_audio/<name>_audio_dlc_temp/
//!     content.xml, setup2.xml
//!     <platform>/audio/             .rel / .dat / .nametable
//!     <platform>/audio/sfx/dlc_<name>/   .awc / .oac
//! ```
//!
//! Entities are processed one at a time. Failures stay local to the package
//! they happen in; the loop always moves on to the next package.

use crate::metrics::RunMetrics;
use crate::models::{
    AudioFileNames, ContentManifest, ManifestKeys, PackSettings, SetupManifest, VEHICLES_META,
};
use crate::services::archiver::{ArchiveRequest, Archiver};
use crate::services::association::{Associations, audio_hashes_for, descriptors_for};
use crate::services::classifier::{
    AUDIO_ARCHIVE_EXTENSIONS, AUDIO_CONFIG_EXTENSIONS, AssetCategory, META_EXTENSIONS,
    MODEL_EXTENSIONS, NamePattern, audio_archive_patterns, audio_config_patterns,
    category_patterns, discover_audio_data, find_files, has_audio_evidence, mod_patterns,
    model_patterns,
};
use crate::services::patcher::DescriptorPatcher;
use crate::services::scanner::ScanResult;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::fs;

/// Locations and switches for one packaging run.
#[derive(Debug, Clone)]
pub struct PackagerOptions {
    pub input_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub platform_dir: String,
    pub keep_temp: bool,
}

impl From<&PackSettings> for PackagerOptions {
    fn from(settings: &PackSettings) -> Self {
        Self {
            input_dir: Utf8PathBuf::from(&settings.input_dir),
            output_dir: Utf8PathBuf::from(&settings.output_dir),
            platform_dir: settings.platform_dir.clone(),
            keep_temp: settings.keep_temp,
        }
    }
}

/// The two halves built for every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Vehicle,
    Audio,
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageKind::Vehicle => write!(f, "vehicle"),
            PackageKind::Audio => write!(f, "audio"),
        }
    }
}

/// How one package ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageStatus {
    /// Archive created.
    Built,
    /// The tree was assembled but the archiver failed; the tree is kept.
    ArchiverFailed(String),
    /// Writing the tree failed before the archiver ran.
    AssemblyFailed(String),
}

#[derive(Debug, Clone)]
pub struct PackageReport {
    pub entity: String,
    pub kind: PackageKind,
    pub package_dir: Utf8PathBuf,
    pub status: PackageStatus,
    pub files_copied: usize,
    pub descriptor_patched: bool,
}

impl PackageReport {
    pub fn is_built(&self) -> bool {
        self.status == PackageStatus::Built
    }
}

/// What happened to one requested copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    /// Destination already existed; counts as success.
    AlreadyPresent,
    /// The source was already placed in this package.
    Duplicate,
}

/// Source files already placed in the package being assembled.
#[derive(Debug, Default)]
struct CopyLedger {
    sources: HashSet<Utf8PathBuf>,
    copied: usize,
}

impl CopyLedger {
    fn mark(&mut self, source: &Utf8Path) -> bool {
        self.sources.insert(source.to_path_buf())
    }
}

/// Dry-run view of one entity: associations and classified files per category.
#[derive(Debug, Clone)]
pub struct EntityPlan {
    pub entity: String,
    pub mods: BTreeSet<String>,
    pub audio_hashes: Vec<String>,
    pub needs_audio_patch: bool,
    pub categories: Vec<(AssetCategory, BTreeSet<Utf8PathBuf>)>,
}

/// Classify everything one entity would package, without writing anything.
pub fn plan_entity(
    input_dir: &Utf8Path,
    scan: &ScanResult,
    associations: &Associations,
    entity: &str,
) -> EntityPlan {
    let mods = associations.mods_for(entity).clone();
    let audio_hashes: Vec<String> = audio_hashes_for(scan, entity).into_iter().collect();
    let needs_audio_patch = descriptors_for(scan, entity)
        .filter_map(|d| d.record_for(entity))
        .any(|r| r.audio_hash.is_empty_tag())
        && has_audio_evidence(input_dir, entity);

    let classify = |category: AssetCategory| {
        let patterns = category_patterns(category, entity, &mods, &audio_hashes);
        find_files(input_dir, &patterns, category.extensions())
    };

    let mod_files = classify(AssetCategory::Mod);
    let mut models = classify(AssetCategory::Model);
    models.retain(|file| !mod_files.contains(file));

    let categories = vec![
        (AssetCategory::Model, models),
        (AssetCategory::Mod, mod_files),
        (AssetCategory::AudioArchive, classify(AssetCategory::AudioArchive)),
        (AssetCategory::AudioConfig, classify(AssetCategory::AudioConfig)),
    ];

    EntityPlan {
        entity: entity.to_string(),
        mods,
        audio_hashes,
        needs_audio_patch,
        categories,
    }
}

/// Builds the vehicle and audio packages of every entity.
pub struct Packager<A: Archiver> {
    options: PackagerOptions,
    archiver: A,
    patcher: DescriptorPatcher,
    metrics: RunMetrics,
}

impl<A: Archiver> Packager<A> {
    pub fn new(options: PackagerOptions, archiver: A) -> Self {
        Self {
            options,
            archiver,
            patcher: DescriptorPatcher::new(),
            metrics: RunMetrics::new(),
        }
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn archiver(&self) -> &A {
        &self.archiver
    }

    /// Package every entity, in discovery order.
    pub async fn run(&self, scan: &ScanResult, associations: &Associations) -> Vec<PackageReport> {
        if let Err(e) = fs::create_dir_all(&self.options.output_dir) {
            tracing::error!("Failed to create output directory {}: {}", self.options.output_dir, e);
        }

        let mut reports = Vec::with_capacity(associations.entity_names.len() * 2);
        for entity in &associations.entity_names {
            self.metrics.record_entity();
            let (vehicle, audio) = self.package_entity(scan, associations, entity).await;
            reports.push(vehicle);
            reports.push(audio);
        }

        reports
    }

    /// Build both packages of one entity.
    pub async fn package_entity(
        &self,
        scan: &ScanResult,
        associations: &Associations,
        entity: &str,
    ) -> (PackageReport, PackageReport) {
        let mut hashes = audio_hashes_for(scan, entity);
        if hashes.len() > 1 {
            tracing::warn!(
                "'{}' has {} different audio hashes across descriptors ({}); all are used for matching",
                entity,
                hashes.len(),
                hashes.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }

        tracing::info!("--- Creating vehicle package for {} ---", entity);
        let (vehicle, promoted) = self.package_vehicle(scan, associations, entity).await;

        // a promoted hash takes part in audio matching like an explicit one
        if let Some(hash) = promoted {
            hashes.insert(hash);
        }

        tracing::info!("--- Creating audio package for {} ---", entity);
        let hashes: Vec<String> = hashes.into_iter().collect();
        let audio = self.package_audio(entity, &hashes).await;

        (vehicle, audio)
    }

    async fn package_vehicle(
        &self,
        scan: &ScanResult,
        associations: &Associations,
        entity: &str,
    ) -> (PackageReport, Option<String>) {
        let keys = ManifestKeys::new(entity);
        let package_dir = self.options.output_dir.join(entity);
        let temp_dir = package_dir.join(format!("{}_vehicle_dlc_temp", keys.name));

        let mut ledger = CopyLedger::default();
        let mut promoted = None;
        let status = match self.assemble_vehicle(
            scan,
            associations,
            entity,
            &keys,
            &temp_dir,
            &mut ledger,
            &mut promoted,
        ) {
            Ok(()) => self.archive(PackageKind::Vehicle, entity, &temp_dir, &package_dir).await,
            Err(e) => self.assembly_failed(PackageKind::Vehicle, entity, &e),
        };

        let report = PackageReport {
            entity: entity.to_string(),
            kind: PackageKind::Vehicle,
            package_dir,
            status,
            files_copied: ledger.copied,
            descriptor_patched: promoted.is_some(),
        };
        (report, promoted)
    }

    /// Write the vehicle tree.
    ///
    /// `promoted` receives the filled-in audio hash as soon as a patched
    /// descriptor is written, so it survives a later assembly failure.
    #[allow(clippy::too_many_arguments)]
    fn assemble_vehicle(
        &self,
        scan: &ScanResult,
        associations: &Associations,
        entity: &str,
        keys: &ManifestKeys,
        temp_dir: &Utf8Path,
        ledger: &mut CopyLedger,
        promoted: &mut Option<String>,
    ) -> Result<()> {
        let platform = temp_dir.join(&self.options.platform_dir);
        let data_dir = temp_dir.join("data");
        let vehicles_rpf = platform.join("vehicles.rpf");
        let mods_rpf = platform.join("vehiclemods").join(keys.mods_rpf_name());

        prepare_temp_dir(temp_dir)?;
        for dir in [&data_dir, &platform.join("data").join("lang"), &vehicles_rpf, &mods_rpf] {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir))?;
        }

        write_file(&temp_dir.join("content.xml"), &ContentManifest::vehicle(keys).render())?;
        write_file(&temp_dir.join("setup2.xml"), &SetupManifest::vehicle(keys).render())?;
        tracing::info!("Generated vehicle content.xml and setup2.xml for {}", entity);

        let destination = data_dir.join(VEHICLES_META);
        let mut audio_evidence: Option<bool> = None;

        for descriptor in descriptors_for(scan, entity) {
            if ledger.mark(&descriptor.path) {
                if destination.exists() {
                    tracing::warn!(
                        "{} already written for {}, skipping {}",
                        destination,
                        entity,
                        descriptor.path
                    );
                    self.metrics.record_copy_conflict();
                } else {
                    let needs_patch = descriptor
                        .record_for(entity)
                        .is_some_and(|r| r.audio_hash.is_empty_tag())
                        && *audio_evidence
                            .get_or_insert_with(|| has_audio_evidence(&self.options.input_dir, entity));

                    let patched = needs_patch
                        .then(|| self.patcher.patch_audio_hash(&descriptor.raw_text, entity))
                        .filter(|p| p.changed);

                    match patched {
                        Some(patched) => {
                            write_file(&destination, &patched.text)?;
                            tracing::info!(
                                "Filled empty audioNameHash for '{}' in {} (audio files found)",
                                entity,
                                descriptor.path
                            );
                            self.metrics.record_descriptor_patched();
                            *promoted = Some(keys.name.clone());
                        }
                        None => write_file(&destination, &descriptor.raw_text)?,
                    }
                    ledger.copied += 1;
                    self.metrics.record_file_copied();
                }
            }

            let siblings = find_files(
                descriptor.directory(),
                &[NamePattern::contains(".meta")],
                META_EXTENSIONS,
            );
            self.copy_all(&siblings, &data_dir, ledger);
        }
        tracing::info!("Copied .meta files to {}", data_dir);

        // a file matching a declared mod goes to the mods archive, never to vehicles.rpf
        let mods = associations.mods_for(entity);
        let mod_files = if mods.is_empty() {
            tracing::info!("No specific mod files found for {}", entity);
            BTreeSet::new()
        } else {
            find_files(&self.options.input_dir, &mod_patterns(mods), MODEL_EXTENSIONS)
        };

        let mut models = find_files(&self.options.input_dir, &model_patterns(entity), MODEL_EXTENSIONS);
        models.retain(|file| !mod_files.contains(file));
        if models.is_empty() {
            tracing::info!("No model files found for {}", entity);
        }

        let copied = self.copy_all(&models, &vehicles_rpf, ledger);
        tracing::info!("Copied {} model files to {}", copied, vehicles_rpf);

        if !mod_files.is_empty() {
            let copied = self.copy_all(&mod_files, &mods_rpf, ledger);
            tracing::info!("Copied {} mod files to {}", copied, mods_rpf);
        }

        Ok(())
    }

    async fn package_audio(&self, entity: &str, hashes: &[String]) -> PackageReport {
        let keys = ManifestKeys::new(entity);
        let package_dir = self.options.output_dir.join(format!("{}_audio", keys.name));
        let temp_dir = package_dir.join(format!("{}_audio_dlc_temp", keys.name));

        let mut ledger = CopyLedger::default();
        let status = match self.assemble_audio(entity, hashes, &keys, &temp_dir, &mut ledger) {
            Ok(()) => self.archive(PackageKind::Audio, entity, &temp_dir, &package_dir).await,
            Err(e) => self.assembly_failed(PackageKind::Audio, entity, &e),
        };

        PackageReport {
            entity: entity.to_string(),
            kind: PackageKind::Audio,
            package_dir,
            status,
            files_copied: ledger.copied,
            descriptor_patched: false,
        }
    }

    fn assemble_audio(
        &self,
        entity: &str,
        hashes: &[String],
        keys: &ManifestKeys,
        temp_dir: &Utf8Path,
        ledger: &mut CopyLedger,
    ) -> Result<()> {
        let audio_dir = temp_dir.join(&self.options.platform_dir).join("audio");
        let sfx_dir = audio_dir.join("sfx").join(keys.sfx_pack_name());

        prepare_temp_dir(temp_dir)?;
        fs::create_dir_all(&sfx_dir)
            .with_context(|| format!("Failed to create directory: {}", sfx_dir))?;

        let (game_dat, sounds_dat) = discover_audio_data(&self.options.input_dir, entity, hashes);
        let files = AudioFileNames {
            game_dat: game_dat.unwrap_or_else(|| keys.default_game_dat()),
            sounds_dat: sounds_dat.unwrap_or_else(|| keys.default_sounds_dat()),
            sfx_pack: keys.sfx_pack_name(),
        };

        write_file(&temp_dir.join("content.xml"), &ContentManifest::audio(keys, &files).render())?;
        write_file(&temp_dir.join("setup2.xml"), &SetupManifest::audio(keys).render())?;
        tracing::info!("Generated audio content.xml and setup2.xml for {}", entity);

        let archives = find_files(
            &self.options.input_dir,
            &audio_archive_patterns(entity, hashes),
            AUDIO_ARCHIVE_EXTENSIONS,
        );
        let copied = self.copy_all(&archives, &sfx_dir, ledger);
        tracing::info!("Copied {} audio archives to {}", copied, sfx_dir);

        let configs = find_files(
            &self.options.input_dir,
            &audio_config_patterns(entity, hashes),
            AUDIO_CONFIG_EXTENSIONS,
        );
        let copied = self.copy_all(&configs, &audio_dir, ledger);
        tracing::info!("Copied {} audio config files to {}", copied, audio_dir);

        Ok(())
    }

    /// Copy every file into `dest_dir`. A failed copy is logged and counted;
    /// the rest still go in. Returns how many files were newly copied.
    fn copy_all(
        &self,
        files: &BTreeSet<Utf8PathBuf>,
        dest_dir: &Utf8Path,
        ledger: &mut CopyLedger,
    ) -> usize {
        let mut copied = 0;
        for file in files {
            match self.copy_into(file, dest_dir, ledger) {
                Ok(CopyOutcome::Copied) => copied += 1,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Skipping {}: {:#}", file, e);
                    self.metrics.record_copy_failure();
                }
            }
        }
        copied
    }

    /// Copy `source` into `dest_dir`, once per package.
    fn copy_into(
        &self,
        source: &Utf8Path,
        dest_dir: &Utf8Path,
        ledger: &mut CopyLedger,
    ) -> Result<CopyOutcome> {
        if !ledger.mark(source) {
            return Ok(CopyOutcome::Duplicate);
        }

        let file_name = source
            .file_name()
            .with_context(|| format!("Source has no file name: {}", source))?;
        let destination = dest_dir.join(file_name);

        if destination.exists() {
            tracing::debug!("{} already present, keeping existing copy", destination);
            self.metrics.record_copy_conflict();
            return Ok(CopyOutcome::AlreadyPresent);
        }

        fs::copy(source, &destination)
            .with_context(|| format!("Failed to copy {} to {}", source, dest_dir))?;
        ledger.copied += 1;
        self.metrics.record_file_copied();
        Ok(CopyOutcome::Copied)
    }

    /// Run the archiver over `temp_dir` and clean it up on success.
    async fn archive(
        &self,
        kind: PackageKind,
        entity: &str,
        temp_dir: &Utf8Path,
        package_dir: &Utf8Path,
    ) -> PackageStatus {
        let request = ArchiveRequest::new(temp_dir, package_dir);

        match self.archiver.create_archive(&request).await {
            Ok(output) => {
                if !output.stdout.is_empty() {
                    tracing::info!("Archiver stdout: {}", output.stdout);
                }
                if !output.stderr.is_empty() {
                    tracing::warn!("Archiver stderr: {}", output.stderr);
                }
                self.metrics.record_archive_time(output.duration);
                self.metrics.record_package_built();
                tracing::info!("Created {} archive for {} in {}", kind, entity, package_dir);

                if self.options.keep_temp {
                    tracing::info!("Keeping temporary {} folder: {}", kind, temp_dir);
                } else if let Err(e) = fs::remove_dir_all(temp_dir) {
                    tracing::error!("Failed to clean up temporary folder {}: {}", temp_dir, e);
                } else {
                    tracing::info!("Cleaned up temporary {} folder: {}", kind, temp_dir);
                }

                PackageStatus::Built
            }
            Err(e) => {
                tracing::error!("Error creating {} archive for {}: {}", kind, entity, e);
                tracing::warn!("Assembled tree left in place: {}", temp_dir);
                self.metrics.record_package_failed();
                PackageStatus::ArchiverFailed(e.to_string())
            }
        }
    }

    fn assembly_failed(&self, kind: PackageKind, entity: &str, error: &anyhow::Error) -> PackageStatus {
        tracing::error!("Failed to assemble {} package for {}: {:#}", kind, entity, error);
        self.metrics.record_package_failed();
        PackageStatus::AssemblyFailed(format!("{error:#}"))
    }
}

/// Start from an empty temporary tree so stale files never reach an archive.
fn prepare_temp_dir(temp_dir: &Utf8Path) -> Result<()> {
    if temp_dir.exists() {
        tracing::debug!("Removing stale temporary folder: {}", temp_dir);
        fs::remove_dir_all(temp_dir)
            .with_context(|| format!("Failed to remove stale folder: {}", temp_dir))?;
    }
    fs::create_dir_all(temp_dir)
        .with_context(|| format!("Failed to create directory: {}", temp_dir))
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::archiver::{ArchiveOutput, ArchiverError};
    use crate::services::association::resolve;
    use crate::services::scanner::DescriptorScanner;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records requests and writes a placeholder archive.
    #[derive(Default)]
    struct RecordingArchiver {
        requests: RefCell<Vec<ArchiveRequest>>,
        fail: bool,
    }

    impl Archiver for RecordingArchiver {
        async fn create_archive(&self, request: &ArchiveRequest) -> Result<ArchiveOutput, ArchiverError> {
            self.requests.borrow_mut().push(request.clone());
            if self.fail {
                return Err(ArchiverError::Failed {
                    code: 2,
                    stderr: "boom".into(),
                });
            }
            fs::write(request.output_dir.join("dlc.rpf"), b"RPF7")?;
            Ok(ArchiveOutput::default())
        }
    }

    fn workspace(files: &[(&str, &str)]) -> (TempDir, PackagerOptions) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let input = root.join("input");
        for (rel, contents) in files {
            let path = input.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        let options = PackagerOptions {
            input_dir: input,
            output_dir: root.join("output"),
            platform_dir: "x64".into(),
            keep_temp: false,
        };
        (temp, options)
    }

    const ABC_META: &str = "<InitDatas>\n  <Item>\n    <modelName>ABC</modelName>\n    <audioNameHash />\n  </Item>\n</InitDatas>\n";

    #[test]
    fn test_copy_into_reports_duplicates_and_conflicts() {
        let (_temp, options) = workspace(&[("a/abc.yft", "x")]);
        let packager = Packager::new(options.clone(), RecordingArchiver::default());
        let dest = options.output_dir.join("dest");
        fs::create_dir_all(&dest).unwrap();
        let source = options.input_dir.join("a/abc.yft");

        let mut ledger = CopyLedger::default();
        assert_eq!(packager.copy_into(&source, &dest, &mut ledger).unwrap(), CopyOutcome::Copied);
        assert_eq!(packager.copy_into(&source, &dest, &mut ledger).unwrap(), CopyOutcome::Duplicate);

        let mut fresh = CopyLedger::default();
        assert_eq!(
            packager.copy_into(&source, &dest, &mut fresh).unwrap(),
            CopyOutcome::AlreadyPresent
        );
        assert_eq!(ledger.copied, 1);
    }

    #[test]
    fn test_keep_temp_leaves_tree() {
        let (_temp, mut options) = workspace(&[("abc/vehicles.meta", ABC_META)]);
        options.keep_temp = true;
        let scan = DescriptorScanner::new().scan(&options.input_dir);
        let associations = resolve(&scan);

        let packager = Packager::new(options.clone(), RecordingArchiver::default());
        let reports = tokio_test::block_on(packager.run(&scan, &associations));

        assert!(reports.iter().all(PackageReport::is_built));
        assert!(options.output_dir.join("ABC/abc_vehicle_dlc_temp/content.xml").exists());
        assert!(options.output_dir.join("abc_audio/abc_audio_dlc_temp/setup2.xml").exists());
    }

    #[test]
    fn test_plan_entity_reports_categories() {
        let (_temp, options) = workspace(&[
            ("abc/vehicles.meta", ABC_META),
            ("abc/carcols.meta", "<modelName>abc_wing</modelName>"),
            ("abc/abc.yft", ""),
            ("abc/abc_wing.yft", ""),
            ("abc/abc.awc", ""),
        ]);
        let scan = DescriptorScanner::new().scan(&options.input_dir);
        let associations = resolve(&scan);

        let plan = plan_entity(&options.input_dir, &scan, &associations, "ABC");
        assert!(plan.needs_audio_patch);
        assert!(plan.mods.contains("abc_wing"));

        let count = |category| {
            plan.categories
                .iter()
                .find(|(c, _)| *c == category)
                .map(|(_, files)| files.len())
                .unwrap()
        };
        // abc_wing.yft fits the bare-name rule but is a declared mod
        assert_eq!(count(AssetCategory::Model), 1);
        assert_eq!(count(AssetCategory::Mod), 1);
        assert_eq!(count(AssetCategory::AudioArchive), 1);
        assert_eq!(count(AssetCategory::AudioConfig), 0);
    }
}
