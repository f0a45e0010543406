use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;

/// File name of the vehicle descriptor (matched exactly, case-sensitive).
pub const VEHICLES_META: &str = "vehicles.meta";

/// File name of the paint-configuration descriptor (matched exactly, case-sensitive).
pub const CARCOLS_META: &str = "carcols.meta";

/// Canonical model identifier joining descriptors and asset files.
pub type EntityName = String;

/// State of the `<audioNameHash>` tag inside one vehicle record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AudioHash {
    /// No tag in the record.
    #[default]
    Absent,
    /// Tag present without a value (`<audioNameHash />`); to be resolved.
    Empty,
    /// Tag with an explicit value.
    Value(String),
}

impl AudioHash {
    pub fn is_empty_tag(&self) -> bool {
        matches!(self, AudioHash::Empty)
    }

    /// The explicit value, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            AudioHash::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// One `<Item>` entry recovered from a `vehicles.meta` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRecord {
    pub model_name: EntityName,
    pub audio_hash: AudioHash,
}

/// A parsed `vehicles.meta` file.
///
/// The raw text is kept so the packager can write a (possibly patched) copy
/// into the output tree. The source file is never rewritten.
#[derive(Debug, Clone)]
pub struct VehicleDescriptor {
    pub path: Utf8PathBuf,
    pub raw_text: String,
    pub records: Vec<VehicleRecord>,
}

impl VehicleDescriptor {
    /// First record for the given entity, if this descriptor names it.
    pub fn record_for(&self, entity: &str) -> Option<&VehicleRecord> {
        self.records.iter().find(|r| r.model_name == entity)
    }

    pub fn directory(&self) -> &Utf8Path {
        self.path.parent().unwrap_or_else(|| Utf8Path::new(""))
    }
}

/// A parsed `carcols.meta` file: the mod identifiers it mentions.
#[derive(Debug, Clone)]
pub struct PaintDescriptor {
    pub path: Utf8PathBuf,
    pub mod_identifiers: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_hash_accessors() {
        assert!(AudioHash::Empty.is_empty_tag());
        assert!(!AudioHash::Absent.is_empty_tag());
        assert_eq!(AudioHash::Value("adder".into()).value(), Some("adder"));
        assert_eq!(AudioHash::Empty.value(), None);
    }

    #[test]
    fn test_record_for_is_case_sensitive() {
        let descriptor = VehicleDescriptor {
            path: Utf8PathBuf::from("mods/abc/vehicles.meta"),
            raw_text: String::new(),
            records: vec![VehicleRecord {
                model_name: "ABC".into(),
                audio_hash: AudioHash::Absent,
            }],
        };

        assert!(descriptor.record_for("ABC").is_some());
        assert!(descriptor.record_for("abc").is_none());
        assert_eq!(descriptor.directory(), Utf8Path::new("mods/abc"));
    }
}
