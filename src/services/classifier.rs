//! Name-pattern classification of loose asset files.
//!
//! [`find_files`] walks a tree, filters by extension, and keeps every file
//! whose name matches one of an ordered list of [`NamePattern`]s. The fixed
//! per-category policies live in [`AssetCategory`] and the `*_patterns`
//! builders below.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::fmt;
use walkdir::WalkDir;

/// Model and texture files.
pub const MODEL_EXTENSIONS: &[&str] = &["yft", "ytd", "ydd", "ybn"];

/// Audio archives destined for the sfx wave pack.
pub const AUDIO_ARCHIVE_EXTENSIONS: &[&str] = &["awc", "oac"];

/// Audio configuration files.
pub const AUDIO_CONFIG_EXTENSIONS: &[&str] = &["rel", "dat54", "dat151", "dat", "nametable"];

/// Audio data files named in the audio content manifest.
pub const AUDIO_DATA_EXTENSIONS: &[&str] = &["dat"];

/// Descriptor files copied alongside `vehicles.meta`.
pub const META_EXTENSIONS: &[&str] = &["meta"];

/// Suffixes that move a model file out of the bare-name rule.
const MODEL_VARIANT_SUFFIXES: &[&str] = &["_hi", "+hi", "_interior"];

/// A case-insensitive file name rule. Stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    /// Name contains the text anywhere.
    Contains(String),

    /// Name starts with the text.
    Prefix(String),

    /// Name starts with `stem`, the next character is not ASCII alphanumeric
    /// (or the name ends), and the remainder does not start with any of
    /// `rejected` suffixes.
    Stem { stem: String, rejected: Vec<String> },
}

impl NamePattern {
    pub fn contains(text: &str) -> Self {
        Self::Contains(text.to_lowercase())
    }

    pub fn prefix(text: &str) -> Self {
        Self::Prefix(text.to_lowercase())
    }

    pub fn stem(stem: &str) -> Self {
        Self::stem_rejecting(stem, &[])
    }

    pub fn stem_rejecting(stem: &str, rejected: &[&str]) -> Self {
        Self::Stem {
            stem: stem.to_lowercase(),
            rejected: rejected.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Test a file name (not a path).
    pub fn matches(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        match self {
            NamePattern::Contains(text) => name.contains(text.as_str()),
            NamePattern::Prefix(text) => name.starts_with(text.as_str()),
            NamePattern::Stem { stem, rejected } => {
                let Some(rest) = name.strip_prefix(stem.as_str()) else {
                    return false;
                };
                let at_boundary = rest
                    .chars()
                    .next()
                    .is_none_or(|c| !c.is_ascii_alphanumeric());
                at_boundary && !rejected.iter().any(|r| rest.starts_with(r.as_str()))
            }
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::Contains(text) => write!(f, "*{text}*"),
            NamePattern::Prefix(text) => write!(f, "{text}*"),
            NamePattern::Stem { stem, rejected } if rejected.is_empty() => write!(f, "{stem}<b>*"),
            NamePattern::Stem { stem, rejected } => {
                write!(f, "{stem}<b>* !({})", rejected.join("|"))
            }
        }
    }
}

/// True when `path` has one of `extensions` (case-folded). An empty list allows everything.
pub fn has_allowed_extension(path: &Utf8Path, extensions: &[&str]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .map(|ext| extensions.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
        .unwrap_or(false)
}

/// Index of the first pattern matching `file_name`.
pub fn first_match(patterns: &[NamePattern], file_name: &str) -> Option<usize> {
    patterns.iter().position(|p| p.matches(file_name))
}

/// Recursively collect the files under `root` selected by `patterns`.
///
/// Unreadable directories are skipped. An empty result is a normal outcome.
pub fn find_files(
    root: &Utf8Path,
    patterns: &[NamePattern],
    extensions: &[&str],
) -> BTreeSet<Utf8PathBuf> {
    let mut results = BTreeSet::new();
    if patterns.is_empty() {
        return results;
    }

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            continue;
        };
        if !has_allowed_extension(path, extensions) {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if first_match(patterns, file_name).is_some() {
            results.insert(path.to_path_buf());
        }
    }

    results
}

/// Asset buckets of the two packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Model,
    Mod,
    AudioArchive,
    AudioConfig,
}

impl AssetCategory {
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            AssetCategory::Model | AssetCategory::Mod => MODEL_EXTENSIONS,
            AssetCategory::AudioArchive => AUDIO_ARCHIVE_EXTENSIONS,
            AssetCategory::AudioConfig => AUDIO_CONFIG_EXTENSIONS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetCategory::Model => "model",
            AssetCategory::Mod => "mod",
            AssetCategory::AudioArchive => "audio archive",
            AssetCategory::AudioConfig => "audio config",
        }
    }
}

/// Bare name (excluding hi/interior variants), both hi spellings, and the shared interior.
pub fn model_patterns(entity: &str) -> Vec<NamePattern> {
    vec![
        NamePattern::stem_rejecting(entity, MODEL_VARIANT_SUFFIXES),
        NamePattern::prefix(&format!("{entity}_hi")),
        NamePattern::prefix(&format!("{entity}+hi")),
        NamePattern::prefix(&format!("vehicles_{entity}_interior")),
    ]
}

/// One prefix per associated mod identifier.
pub fn mod_patterns<'a, I>(mods: I) -> Vec<NamePattern>
where
    I: IntoIterator<Item = &'a String>,
{
    mods.into_iter().map(|m| NamePattern::prefix(m)).collect()
}

/// Audio hash prefixes first, then the bare entity name.
pub fn audio_archive_patterns<'a, I>(entity: &str, hashes: I) -> Vec<NamePattern>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut patterns: Vec<NamePattern> = hashes.into_iter().map(|h| NamePattern::prefix(h)).collect();
    patterns.push(NamePattern::stem(entity));
    patterns
}

/// Entity data/relationship files, then per-hash relationship files.
pub fn audio_config_patterns<'a, I>(entity: &str, hashes: I) -> Vec<NamePattern>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut patterns = vec![
        NamePattern::prefix(&format!("{entity}_game.dat")),
        NamePattern::prefix(&format!("{entity}_sounds.dat")),
        NamePattern::prefix(&format!("{entity}.rel")),
        NamePattern::prefix(&format!("{entity}.nametable")),
    ];
    for hash in hashes {
        patterns.push(NamePattern::prefix(&format!("{hash}.rel")));
        patterns.push(NamePattern::prefix(&format!("{hash}.nametable")));
    }
    patterns
}

/// Patterns for one category.
pub fn category_patterns(
    category: AssetCategory,
    entity: &str,
    mods: &BTreeSet<String>,
    hashes: &[String],
) -> Vec<NamePattern> {
    match category {
        AssetCategory::Model => model_patterns(entity),
        AssetCategory::Mod => mod_patterns(mods),
        AssetCategory::AudioArchive => audio_archive_patterns(entity, hashes),
        AssetCategory::AudioConfig => audio_config_patterns(entity, hashes),
    }
}

/// Whether any audio archive or audio config file carries the entity's bare name.
pub fn has_audio_evidence(root: &Utf8Path, entity: &str) -> bool {
    let patterns = [NamePattern::stem(entity)];
    !find_files(root, &patterns, AUDIO_ARCHIVE_EXTENSIONS).is_empty()
        || !find_files(root, &patterns, AUDIO_CONFIG_EXTENSIONS).is_empty()
}

/// Game and sounds data file names for the audio manifest.
///
/// Stems are tried in order (audio hashes, then the entity name); the first
/// stem with a matching file wins for each kind.
pub fn discover_audio_data(
    root: &Utf8Path,
    entity: &str,
    hashes: &[String],
) -> (Option<String>, Option<String>) {
    let stems: Vec<&str> = hashes
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(entity))
        .collect();

    let mut patterns = Vec::with_capacity(stems.len() * 2);
    for stem in &stems {
        patterns.push(NamePattern::prefix(&format!("{stem}_game.dat")));
        patterns.push(NamePattern::prefix(&format!("{stem}_sounds.dat")));
    }

    let found: Vec<String> = find_files(root, &patterns, AUDIO_DATA_EXTENSIONS)
        .into_iter()
        .filter_map(|p| p.file_name().map(str::to_string))
        .collect();

    let pick = |suffix: &str| {
        stems.iter().find_map(|stem| {
            let wanted = NamePattern::prefix(&format!("{stem}{suffix}"));
            found.iter().find(|name| wanted.matches(name)).cloned()
        })
    };

    (pick("_game.dat"), pick("_sounds.dat"))
}
