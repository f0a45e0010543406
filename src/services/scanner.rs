//! Descriptor discovery and parsing.
//!
//! Record blocks are located with a bounded marker scan ([`ItemBlocks`]) rather
//! than a whole-document pattern: each `<Item>` is paired with the nearest
//! following `</Item>` and scanning resumes after it. The small tag regexes in
//! [`DescriptorParser`] only ever run over one block.

use crate::models::{
    AudioHash, CARCOLS_META, PaintDescriptor, VEHICLES_META, VehicleDescriptor, VehicleRecord,
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::ops::Range;
use walkdir::WalkDir;

const ITEM_OPEN: &str = "<Item>";
const ITEM_CLOSE: &str = "</Item>";

/// Case-insensitive (ASCII) substring search starting at byte offset `from`.
///
/// The needle must be ASCII, so any returned offset is a char boundary.
pub fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from > hay.len() || hay.len() - from < needle.len() {
        return None;
    }

    (from..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Iterator over the byte ranges of `<Item>…</Item>` blocks in a descriptor.
///
/// An opening marker with no closing marker after it ends the iteration.
pub struct ItemBlocks<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> ItemBlocks<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }
}

impl Iterator for ItemBlocks<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = find_ignore_ascii_case(self.text, ITEM_OPEN, self.cursor)?;
        let close = find_ignore_ascii_case(self.text, ITEM_CLOSE, start + ITEM_OPEN.len())?;
        let end = close + ITEM_CLOSE.len();
        self.cursor = end;
        Some(start..end)
    }
}

/// Extracts the fixed set of fields vehpack needs from descriptor text.
pub struct DescriptorParser {
    /// `<modelName>value</modelName>`
    model_name_pattern: Regex,

    /// `<audioNameHash>value</audioNameHash>`
    audio_hash_pattern: Regex,

    /// `<audioNameHash />` or `<audioNameHash></audioNameHash>`
    empty_audio_hash_pattern: Regex,
}

impl DescriptorParser {
    pub fn new() -> Self {
        Self {
            model_name_pattern: Regex::new(r"(?i)<modelName>(.*?)</modelName>")
                .expect("Invalid modelName regex"),
            audio_hash_pattern: Regex::new(r"(?i)<audioNameHash>(.*?)</audioNameHash>")
                .expect("Invalid audioNameHash regex"),
            empty_audio_hash_pattern: Regex::new(
                r"(?i)<audioNameHash\s*/>|<audioNameHash>\s*</audioNameHash>",
            )
            .expect("Invalid empty audioNameHash regex"),
        }
    }

    /// The trimmed, non-empty `<modelName>` of one block.
    pub fn block_model_name<'t>(&self, block: &'t str) -> Option<&'t str> {
        let captures = self.model_name_pattern.captures(block)?;
        let name = captures.get(1)?.as_str().trim();
        (!name.is_empty()).then_some(name)
    }

    /// Byte range of the first empty audio-hash tag inside `block`.
    pub fn empty_audio_hash_tag(&self, block: &str) -> Option<Range<usize>> {
        self.empty_audio_hash_pattern.find(block).map(|m| m.range())
    }

    pub fn block_audio_hash(&self, block: &str) -> AudioHash {
        if let Some(captures) = self.audio_hash_pattern.captures(block) {
            let value = captures.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if value.is_empty() {
                AudioHash::Empty
            } else {
                AudioHash::Value(value.to_string())
            }
        } else if self.empty_audio_hash_pattern.is_match(block) {
            AudioHash::Empty
        } else {
            AudioHash::Absent
        }
    }

    /// Parse every record block of a `vehicles.meta` text.
    ///
    /// Blocks without a `<modelName>` are dropped; they do not affect siblings.
    pub fn parse_vehicles(&self, text: &str) -> Vec<VehicleRecord> {
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for range in ItemBlocks::new(text) {
            let block = &text[range];
            match self.block_model_name(block) {
                Some(name) => records.push(VehicleRecord {
                    model_name: name.to_string(),
                    audio_hash: self.block_audio_hash(block),
                }),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!("Dropped {} item blocks without modelName", dropped);
        }

        records
    }

    /// Collect every `<modelName>` value of a `carcols.meta` text.
    pub fn parse_paint(&self, text: &str) -> BTreeSet<String> {
        self.model_name_pattern
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for DescriptorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Every descriptor found under one input root, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub vehicles: IndexMap<Utf8PathBuf, VehicleDescriptor>,
    pub paints: IndexMap<Utf8PathBuf, PaintDescriptor>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.paints.is_empty()
    }
}

/// Walks an input tree and parses the descriptors it contains.
#[derive(Default)]
pub struct DescriptorScanner {
    parser: DescriptorParser,
}

impl DescriptorScanner {
    pub fn new() -> Self {
        Self {
            parser: DescriptorParser::new(),
        }
    }

    /// Scan `root` recursively.
    ///
    /// Unreadable directories and files are skipped; the result is whatever
    /// could be read.
    pub fn scan(&self, root: &Utf8Path) -> ScanResult {
        let mut result = ScanResult::default();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry during scan: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let is_vehicles = file_name == VEHICLES_META;
            if !is_vehicles && file_name != CARCOLS_META {
                continue;
            }

            let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
                tracing::debug!("Skipping non UTF-8 descriptor path");
                continue;
            };
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Skipping unreadable descriptor {}: {}", path, e);
                    continue;
                }
            };

            if is_vehicles {
                let records = self.parser.parse_vehicles(&text);
                tracing::debug!("Parsed {} vehicle records from {}", records.len(), path);
                result.vehicles.insert(
                    path.clone(),
                    VehicleDescriptor {
                        path,
                        raw_text: text,
                        records,
                    },
                );
            } else {
                let mod_identifiers = self.parser.parse_paint(&text);
                tracing::debug!("Parsed {} mod identifiers from {}", mod_identifiers.len(), path);
                result.paints.insert(
                    path.clone(),
                    PaintDescriptor {
                        path,
                        mod_identifiers,
                    },
                );
            }
        }

        tracing::info!(
            "Scanned {}: {} vehicles.meta, {} carcols.meta",
            root,
            result.vehicles.len(),
            result.paints.len()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TWO_RECORDS: &str = r#"<CVehicleModelInfo__InitDataList>
  <InitDatas>
    <Item>
      <modelName>ABC</modelName>
      <txdName>abc</txdName>
      <audioNameHash />
    </Item>
    <Item>
      <modelName>def</modelName>
      <audioNameHash>ADDER</audioNameHash>
    </Item>
  </InitDatas>
  <txdRelationships>
    <Item>
      <parent>vehshare</parent>
      <child>abc</child>
    </Item>
  </txdRelationships>
</CVehicleModelInfo__InitDataList>"#;

    #[test]
    fn test_find_ignore_ascii_case() {
        assert_eq!(find_ignore_ascii_case("a<ITEM>b", "<item>", 0), Some(1));
        assert_eq!(find_ignore_ascii_case("a<ITEM>b", "<item>", 2), None);
        assert_eq!(find_ignore_ascii_case("ab", "abc", 0), None);
        assert_eq!(find_ignore_ascii_case("ab", "b", 5), None);
    }

    #[test]
    fn test_item_blocks_pair_nearest_close() {
        let text = "<Item>a</Item> x <item>b</ITEM> <Item>unterminated";
        let blocks: Vec<&str> = ItemBlocks::new(text).map(|r| &text[r]).collect();
        assert_eq!(blocks, vec!["<Item>a</Item>", "<item>b</ITEM>"]);
    }

    #[test]
    fn test_parse_vehicles() {
        let parser = DescriptorParser::new();
        let records = parser.parse_vehicles(TWO_RECORDS);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].model_name, "ABC");
        assert_eq!(records[0].audio_hash, AudioHash::Empty);
        assert_eq!(records[1].model_name, "def");
        assert_eq!(records[1].audio_hash, AudioHash::Value("ADDER".into()));
    }

    #[test]
    fn test_audio_hash_states() {
        let parser = DescriptorParser::new();
        assert_eq!(parser.block_audio_hash("<Item></Item>"), AudioHash::Absent);
        assert_eq!(
            parser.block_audio_hash("<audioNameHash/>"),
            AudioHash::Empty
        );
        assert_eq!(
            parser.block_audio_hash("<audioNameHash>  </audioNameHash>"),
            AudioHash::Empty
        );
        assert_eq!(
            parser.block_audio_hash("<AUDIONAMEHASH>x</AUDIONAMEHASH>"),
            AudioHash::Value("x".into())
        );
    }

    #[test]
    fn test_block_without_model_name_is_dropped() {
        let parser = DescriptorParser::new();
        let text = "<Item><modelName></modelName></Item><Item><modelName>ok</modelName></Item>";
        let records = parser.parse_vehicles(text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model_name, "ok");
    }

    #[test]
    fn test_parse_paint_is_not_block_scoped() {
        let parser = DescriptorParser::new();
        let text = "<Kits><Item><modelName>abc_spoiler</modelName></Item></Kits>\
                    <modelName>abc_bumper</modelName><modelName></modelName>";
        let mods = parser.parse_paint(text);
        assert_eq!(mods.len(), 2);
        assert!(mods.contains("abc_spoiler"));
        assert!(mods.contains("abc_bumper"));
    }

    fn block(name: Option<&str>) -> String {
        match name {
            Some(name) => format!("  <Item>\n    <modelName>{name}</modelName>\n  </Item>\n"),
            None => "  <Item>\n    <txdName>shared</txdName>\n  </Item>\n".to_string(),
        }
    }

    proptest! {
        #[test]
        fn prop_record_count_matches_named_blocks(
            names in proptest::collection::vec(proptest::option::of("[a-z][a-z0-9_]{0,10}"), 0..12)
        ) {
            let text: String = names.iter().map(|n| block(n.as_deref())).collect();
            let records = DescriptorParser::new().parse_vehicles(&text);

            let expected: Vec<&str> = names.iter().flatten().map(String::as_str).collect();
            let got: Vec<&str> = records.iter().map(|r| r.model_name.as_str()).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
