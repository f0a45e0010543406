//! Scoped promotion of an empty `<audioNameHash />` tag.

use crate::services::scanner::{DescriptorParser, ItemBlocks};

/// Result of one patch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    pub text: String,
    pub changed: bool,
}

/// Rewrites the audio hash of one record block inside a vehicle descriptor.
#[derive(Default)]
pub struct DescriptorPatcher {
    parser: DescriptorParser,
}

impl DescriptorPatcher {
    pub fn new() -> Self {
        Self {
            parser: DescriptorParser::new(),
        }
    }

    /// Replace the empty audio-hash tag of `entity`'s record with its lowercased name.
    ///
    /// Only the first block whose `<modelName>` equals `entity` is considered,
    /// and only the first empty tag inside it. When that block has no empty
    /// tag (or no block names the entity) the text is returned unchanged.
    pub fn patch_audio_hash(&self, text: &str, entity: &str) -> Patched {
        let unchanged = || Patched {
            text: text.to_string(),
            changed: false,
        };

        let Some(block) = ItemBlocks::new(text)
            .find(|range| self.parser.block_model_name(&text[range.clone()]) == Some(entity))
        else {
            tracing::debug!("No record block for '{}' found to patch", entity);
            return unchanged();
        };

        let Some(tag) = self.parser.empty_audio_hash_tag(&text[block.clone()]) else {
            return unchanged();
        };

        let start = block.start + tag.start;
        let end = block.start + tag.end;
        let replacement = format!("<audioNameHash>{}</audioNameHash>", entity.to_lowercase());

        let mut patched = String::with_capacity(text.len() + replacement.len());
        patched.push_str(&text[..start]);
        patched.push_str(&replacement);
        patched.push_str(&text[end..]);

        Patched {
            text: patched,
            changed: true,
        }
    }
}
