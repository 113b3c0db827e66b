// Language registry
// Maps canonical language identifiers to backend execution profile ids

use crate::error::{ExecError, Result};
use anyhow::{bail, Context};
use codepad_common::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// One entry of `languages.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub name: String,
    pub backend_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguagesFile {
    pub languages: Vec<LanguageEntry>,
}

impl LanguagesFile {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize languages")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Insert or replace the entry for `language`
    pub fn upsert(&mut self, language: Language, backend_id: u32, version: Option<String>) {
        let entry = LanguageEntry {
            name: language.to_string(),
            backend_id,
            version,
        };
        match self
            .languages
            .iter_mut()
            .find(|e| Language::parse(&e.name) == Some(language))
        {
            Some(existing) => *existing = entry,
            None => self.languages.push(entry),
        }
    }
}

impl From<&LanguageTable> for LanguagesFile {
    fn from(table: &LanguageTable) -> Self {
        Self {
            languages: table
                .entries()
                .map(|(language, backend_id)| LanguageEntry {
                    name: language.to_string(),
                    backend_id,
                    version: None,
                })
                .collect(),
        }
    }
}

/// Immutable language -> backend profile table, built once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTable {
    profiles: BTreeMap<Language, u32>,
}

impl Default for LanguageTable {
    /// Judge0 CE profile ids
    fn default() -> Self {
        let profiles = BTreeMap::from([
            (Language::C, 50),
            (Language::Cpp, 54),
            (Language::Java, 62),
            (Language::Python, 71),
        ]);
        Self { profiles }
    }
}

impl LanguageTable {
    pub fn from_file(file: &LanguagesFile) -> anyhow::Result<Self> {
        let mut profiles = BTreeMap::new();

        for entry in &file.languages {
            let language = match Language::parse(&entry.name) {
                Some(lang) => lang,
                None => bail!("Unknown language '{}' in languages config", entry.name),
            };
            if profiles.insert(language, entry.backend_id).is_some() {
                bail!("Language '{}' configured more than once", language);
            }
        }

        if profiles.is_empty() {
            bail!("No languages configured");
        }

        Ok(Self { profiles })
    }

    /// Load from a `languages.json` file; a missing file means the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = LanguagesFile::load(path)?;
        Self::from_file(&file).with_context(|| format!("Invalid language table in {}", path.display()))
    }

    pub fn get(&self, language: Language) -> Option<u32> {
        self.profiles.get(&language).copied()
    }

    /// Configured entries in canonical order
    pub fn entries(&self) -> impl Iterator<Item = (Language, u32)> + '_ {
        self.profiles.iter().map(|(lang, id)| (*lang, *id))
    }
}

/// Stateless lookup over a shared `LanguageTable`
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    table: Arc<LanguageTable>,
}

impl LanguageRegistry {
    pub fn new(table: LanguageTable) -> Self {
        Self { table: Arc::new(table) }
    }

    /// Translate a caller-supplied language identifier into a backend profile id
    pub fn resolve(&self, language_id: &str) -> Result<u32> {
        Language::parse(language_id)
            .and_then(|lang| self.table.get(lang))
            .ok_or_else(|| ExecError::UnsupportedLanguage(language_id.to_string()))
    }

    pub fn is_enabled(&self, language: Language) -> bool {
        self.table.get(language).is_some()
    }

    pub fn languages(&self) -> Vec<(Language, u32)> {
        self.table.entries().collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new(LanguageTable::default())
    }
}
