//! Catalog documents: the JSON mapping used for the startup catalog, `U`
//! updates and `R` dumps.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{CatalogError, CatalogResult},
    models::{Item, ItemRecord},
};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Mapping(BTreeMap<String, ItemRecord>),
    List(Vec<ItemRecord>),
}

/// A parsed, validated set of items keyed by record order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDocument {
    items: Vec<Item>,
}

impl CatalogDocument {
    /// Wrap already-validated items.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Parse a JSON mapping of name → record (or a list of records).
    ///
    /// Records without a `name` take their mapping key.
    pub fn from_json_str(input: &str) -> CatalogResult<Self> {
        let raw: RawDocument =
            serde_json::from_str(input).map_err(|err| CatalogError::document(err.to_string()))?;
        let records = match raw {
            RawDocument::Mapping(map) => map
                .into_iter()
                .map(|(key, mut record)| {
                    if record.name.trim().is_empty() {
                        record.name = key;
                    }
                    record
                })
                .collect::<Vec<_>>(),
            RawDocument::List(records) => records,
        };

        let items = records
            .into_iter()
            .map(Item::try_from)
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok(Self { items })
    }

    /// Load a document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let document = Self::from_json_str(&contents)
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;
        info!(path = %path.display(), items = document.len(), "Catalog document loaded");
        Ok(document)
    }

    /// Render as a single-line JSON mapping in name order.
    pub fn to_json_string(&self) -> Result<String> {
        let mapping: BTreeMap<&str, &Item> = self
            .items
            .iter()
            .map(|item| (item.name(), item))
            .collect();
        serde_json::to_string(&mapping).context("failed to serialize catalog document")
    }

    /// Items in document order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Consume the document, yielding its items.
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the document holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Supplies the document merged by the admin `U` command.
pub trait UpdateSource: Send + Sync {
    /// Produce the document to merge.
    fn load(&self) -> Result<CatalogDocument>;
}

/// Reads the update document from a file on every request.
#[derive(Debug, Clone)]
pub struct FileUpdateSource {
    path: PathBuf,
}

impl FileUpdateSource {
    /// Read updates from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File read on every `U` command.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UpdateSource for FileUpdateSource {
    fn load(&self) -> Result<CatalogDocument> {
        CatalogDocument::load(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;
    use tempfile::tempdir;

    const STARTER: &str = r#"{
        "Sword": {"name": "Sword", "description": "A long blade.", "price": 100, "quantity": 2, "damage": 20},
        "Boots": {"description": "Covers the shins.", "price": 100, "quantity": 5, "kind": "armor", "defense": 25},
        "Ginseng": {"name": "Ginseng", "description": "A root.", "price": 50, "quantity": 25, "healthAmount": 15}
    }"#;

    #[test]
    fn parses_mapping_and_fills_missing_names() -> Result<()> {
        let document = CatalogDocument::from_json_str(STARTER)?;
        assert_eq!(document.len(), 3);
        let boots = document
            .items()
            .iter()
            .find(|item| item.name() == "Boots")
            .expect("boots parsed");
        assert_eq!(boots.kind(), ItemKind::Armor { defense: 25 });
        let sword = document
            .items()
            .iter()
            .find(|item| item.name() == "Sword")
            .expect("sword parsed");
        assert_eq!(sword.kind(), ItemKind::Weapon { damage: 20 });
        let ginseng = document
            .items()
            .iter()
            .find(|item| item.name() == "Ginseng")
            .expect("ginseng parsed");
        assert_eq!(ginseng.kind(), ItemKind::Health { health_amount: 15 });
        Ok(())
    }

    #[test]
    fn parses_record_list() -> Result<()> {
        let document = CatalogDocument::from_json_str(
            r#"[{"name": "Potion", "price": 5, "quantity": 5}, {"name": "Axe", "price": 150, "quantity": 1}]"#,
        )?;
        let names: Vec<_> = document.items().iter().map(Item::name).collect();
        assert_eq!(names, vec!["Potion", "Axe"]);
        Ok(())
    }

    #[test]
    fn rejects_negative_records() {
        let result = CatalogDocument::from_json_str(r#"{"Potion": {"price": 5, "quantity": -1}}"#);
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[test]
    fn rejects_malformed_json() {
        let result = CatalogDocument::from_json_str("not json");
        assert!(matches!(result, Err(CatalogError::Document(_))));
    }

    #[test]
    fn dump_is_name_ordered_and_reloadable() -> Result<()> {
        let document = CatalogDocument::from_json_str(STARTER)?;
        let dumped = document.to_json_string()?;
        assert!(!dumped.contains('\n'));
        let boots = dumped.find("\"Boots\"").expect("boots key");
        let ginseng = dumped.find("\"Ginseng\"").expect("ginseng key");
        let sword = dumped.find("\"Sword\"").expect("sword key");
        assert!(boots < ginseng && ginseng < sword);

        let reloaded = CatalogDocument::from_json_str(&dumped)?;
        let mut original = document.into_items();
        original.sort_by(|a, b| a.name().cmp(b.name()));
        assert_eq!(reloaded.into_items(), original);
        Ok(())
    }

    #[test]
    fn file_source_reads_on_every_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("inventory.json");
        fs::write(&path, r#"{"Potion": {"price": 5, "quantity": 5}}"#)?;

        let source = FileUpdateSource::new(&path);
        assert_eq!(source.load()?.len(), 1);

        fs::write(&path, r#"{"Potion": {"quantity": 1}, "Axe": {"quantity": 1}}"#)?;
        assert_eq!(source.load()?.len(), 2);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let source = FileUpdateSource::new(dir.path().join("missing.json"));
        assert!(source.load().is_err());
    }
}
