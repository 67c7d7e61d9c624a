//! Converter inventory - the converters available in one directory.
//!
//! Built once at startup and read-only afterwards. Nothing here is global:
//! callers own the inventory and lend it to the dispatcher, so independent
//! inventories can live side by side.

use crate::converter_name::{self, ConverterId};
use crate::errors::{ConvertError, Result};
use crate::mime_type::MimeType;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ConverterInventory {
    dir: PathBuf,
    entries: BTreeSet<String>,
}

impl ConverterInventory {
    /// Lists `dir` once. An unreadable directory is fatal: without converters
    /// there is nothing useful left to do.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let unavailable = |source| ConvertError::InventoryUnavailable {
            dir: dir.clone(),
            source,
        };

        let mut entries = BTreeSet::new();
        for entry in fs::read_dir(&dir).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;
            match entry.file_name().into_string() {
                Ok(name) => {
                    entries.insert(name);
                }
                Err(raw) => {
                    debug!(entry = ?raw, "Skipping converter entry with non-UTF-8 name");
                }
            }
        }

        info!(dir = ?dir, converters = entries.len(), "Converter inventory loaded");
        Ok(Self { dir, entries })
    }

    /// Builds an inventory from known names without reading the directory.
    pub fn from_names<I, S>(dir: impl Into<PathBuf>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dir: dir.into(),
            entries: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn exists(&self, id: &ConverterId) -> bool {
        self.entries.contains(id.as_str())
    }

    /// Location of the executable for `id`.
    pub fn path_for(&self, id: &ConverterId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    /// Raw entries, malformed ones included.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }

    /// Type pairs of the converters whose raw name matches `pattern`
    /// (unanchored search). Entries that do not decode are skipped.
    pub fn matching<'a>(
        &'a self,
        pattern: &'a Regex,
    ) -> impl Iterator<Item = (MimeType, MimeType)> + 'a {
        self.entries
            .iter()
            .filter(move |name| pattern.is_match(name))
            .filter_map(|name| match converter_name::decode(name) {
                Ok(pair) => Some(pair),
                Err(e) => {
                    debug!(entry = %name, error = %e, "Ignoring malformed converter entry");
                    None
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn populated_dir(names: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for name in names {
            File::create(temp_dir.path().join(name)).unwrap();
        }
        temp_dir
    }

    fn rendered(inventory: &ConverterInventory, pattern: &str) -> Vec<String> {
        let re = Regex::new(pattern).unwrap();
        inventory
            .matching(&re)
            .map(|(src, dest)| converter_name::render_pair(&src, &dest))
            .collect()
    }

    #[test]
    fn test_load_lists_directory() {
        let temp_dir = populated_dir(&["text_plain→text_html", "image_png→image_jpeg"]);
        let inventory = ConverterInventory::load(temp_dir.path()).unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.dir(), temp_dir.path());
        assert!(inventory.exists(&converter_name::encode(
            &"text/plain".into(),
            &"text/html".into()
        )));
        assert!(!inventory.exists(&converter_name::encode(
            &"text/html".into(),
            &"text/plain".into()
        )));
    }

    #[test]
    fn test_load_missing_directory_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("no-such-dir");

        match ConverterInventory::load(&missing) {
            Err(ConvertError::InventoryUnavailable { dir, .. }) => assert_eq!(dir, missing),
            other => panic!("expected InventoryUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_matching_skips_malformed_entries() {
        let temp_dir = populated_dir(&["text_plain→text_html", "README", "notes.txt"]);
        let inventory = ConverterInventory::load(temp_dir.path()).unwrap();

        assert_eq!(inventory.len(), 3);
        assert_eq!(rendered(&inventory, ".*"), vec!["text/plain→text/html"]);
    }

    #[test]
    fn test_matching_filters_on_raw_identifier() {
        let inventory = ConverterInventory::from_names(
            "/nowhere",
            [
                "text_plain→text_html",
                "text_x-markdown→text_html",
                "image_png→image_jpeg",
                "text_html-broken",
            ],
        );

        // The pattern sees the escaped form, not the rendered one.
        assert_eq!(
            rendered(&inventory, "→text_html$"),
            vec!["text/plain→text/html", "text/x-markdown→text/html"]
        );
        assert!(rendered(&inventory, "→text/html").is_empty());
        assert_eq!(rendered(&inventory, "png"), vec!["image/png→image/jpeg"]);
        assert!(rendered(&inventory, "html-broken").is_empty());
    }

    #[test]
    fn test_independent_inventories() {
        let a = ConverterInventory::from_names("/a", ["a_b→c_d"]);
        let b = ConverterInventory::from_names("/b", ["c_d→a_b"]);
        let id = converter_name::encode(&"a/b".into(), &"c/d".into());

        assert!(a.exists(&id));
        assert!(!b.exists(&id));
        assert_eq!(a.path_for(&id), PathBuf::from("/a").join("a_b→c_d"));
    }

    #[test]
    fn test_empty_inventory() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = ConverterInventory::load(temp_dir.path()).unwrap();
        assert!(inventory.is_empty());
        assert_eq!(inventory.iter().count(), 0);
    }
}
