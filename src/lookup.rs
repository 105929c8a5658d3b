use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Value chosen in a dropdown when the lookup produced nothing usable.
pub const ERROR_SENTINEL: &str = "error";

const SPRITE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

/// A `(label, value)` dropdown entry.
pub type ChoiceOption = (String, String);

pub trait CharacterRoster {
    /// `(display name, id)` pairs.
    fn characters(&self) -> Result<Vec<ChoiceOption>>;
}

pub trait SpriteManifest {
    fn sprites(&self, character_id: &str) -> Result<Vec<String>>;
}

/// Snapshot of lookup data used while building dynamic block definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupData {
    pub characters: Vec<ChoiceOption>,
    pub sprites: BTreeMap<String, Vec<String>>,
}

impl LookupData {
    /// Collects from both providers. A failing provider leaves its part empty,
    /// which later surfaces as the error sentinel.
    pub fn collect(roster: &dyn CharacterRoster, manifest: &dyn SpriteManifest) -> Self {
        let characters = match roster.characters() {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!("character roster unavailable: {:#}", err);
                Vec::new()
            }
        };
        let mut sprites = BTreeMap::new();
        for (_, id) in &characters {
            match manifest.sprites(id) {
                Ok(list) => {
                    sprites.insert(id.clone(), list);
                }
                Err(err) => tracing::warn!("sprite manifest for '{}' unavailable: {:#}", id, err),
            }
        }
        Self {
            characters,
            sprites,
        }
    }

    pub fn character_options(&self) -> Vec<ChoiceOption> {
        with_sentinel(self.characters.clone(), "Error: No characters found")
    }

    pub fn sprite_options(&self, character_id: &str) -> Vec<ChoiceOption> {
        let options = self
            .sprites
            .get(character_id)
            .map(|list| {
                list.iter()
                    .map(|file| (sprite_label(file), file.clone()))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        with_sentinel(options, "Error: No sprites found")
    }
}

fn with_sentinel(options: Vec<ChoiceOption>, label: &str) -> Vec<ChoiceOption> {
    if options.is_empty() {
        vec![(label.to_string(), ERROR_SENTINEL.to_string())]
    } else {
        options
    }
}

fn sprite_label(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file)
        .to_string()
}

/// Library record stored as `characters/<id>/data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thoughts: String,
    #[serde(default = "default_outfit")]
    pub outfit: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub custom_data: BTreeMap<String, serde_json::Value>,
}

fn default_outfit() -> String {
    "default".to_string()
}

/// On-disk character library.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn characters_dir(&self) -> PathBuf {
        self.root.join("characters")
    }

    /// Every readable character record, sorted by display name.
    pub fn load_characters(&self) -> Result<Vec<Character>> {
        let dir = self.characters_dir();
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read character library '{}'.", dir.display()))?;
        let mut out = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let data_file = path.join("data.json");
            if !data_file.is_file() {
                continue;
            }
            let raw = fs::read_to_string(&data_file)
                .with_context(|| format!("Failed to read '{}'.", data_file.display()))?;
            match serde_json::from_str::<Character>(&raw) {
                Ok(character) => out.push(character),
                Err(err) => {
                    tracing::warn!("skipping malformed '{}': {}", data_file.display(), err)
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }
}

impl CharacterRoster for Library {
    fn characters(&self) -> Result<Vec<ChoiceOption>> {
        Ok(self
            .load_characters()?
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect())
    }
}

impl SpriteManifest for Library {
    fn sprites(&self, character_id: &str) -> Result<Vec<String>> {
        let dir = self.characters_dir().join(character_id);
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read sprites in '{}'.", dir.display()))?;
        let mut out = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_sprite = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| SPRITE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !is_sprite {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                out.push(name.to_string());
            }
        }
        out.sort();
        Ok(out)
    }
}
