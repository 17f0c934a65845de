//! Layered configuration store.
//!
//! Layers are ordered lowest to highest precedence. Reads see the merged
//! (effective) view, where the highest layer defining a `(section, option)`
//! wins. Writes only ever touch one designated writable layer, so removing
//! a key there can re-expose a value from a lower layer.
//!
//! There is no `[DEFAULT]` fallback section: the name is reserved and
//! rejected wherever it appears.

mod error;
mod layer;
mod persist;

pub use error::{DuplicateReason, StoreError};
pub use layer::{Layer, LayerSource};

use std::path::Path;

use iniguard_schema::{InvalidConfigError, Schema, Violation, RESERVED_SECTION};
use serde::Serialize;

use layer::{check_storable, fold};

/// Load-time options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Keep section and option names as written instead of lowercasing them.
    pub case_sensitive: bool,

    /// Index of the writable layer. Defaults to the last (highest) one.
    pub writable: Option<usize>,
}

/// One entry of the effective view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub section: String,
    pub option: String,
    pub value: String,
    /// Index of the layer the value comes from.
    pub layer: usize,
}

impl ConfigEntry {
    /// `section.option`
    pub fn name(&self) -> String {
        format!("{}.{}", self.section, self.option)
    }
}

/// In-memory, layered view of one or more INI files.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    layers: Vec<Layer>,
    writable: usize,
    case_sensitive: bool,
}

impl ConfigStore {
    /// Load `paths` in order, lowest precedence first.
    ///
    /// Missing files become empty layers. Malformed files, reserved or
    /// repeated section names, and read failures other than "not found" are
    /// errors.
    pub fn load<P: AsRef<Path>>(paths: &[P], options: StoreOptions) -> Result<Self, StoreError> {
        if paths.is_empty() {
            return Err(StoreError::NoLayers);
        }
        let writable = options.writable.unwrap_or(paths.len() - 1);
        if writable >= paths.len() {
            return Err(StoreError::WritableOutOfRange {
                index: writable,
                layers: paths.len(),
            });
        }

        let layers = paths
            .iter()
            .map(|p| Layer::load(p.as_ref(), options.case_sensitive))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(layers = layers.len(), writable, "loaded config store");
        Ok(Self {
            layers,
            writable,
            case_sensitive: options.case_sensitive,
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn writable_index(&self) -> usize {
        self.writable
    }

    pub fn writable_layer(&self) -> &Layer {
        &self.layers[self.writable]
    }

    pub fn writable_path(&self) -> &Path {
        self.writable_layer().path()
    }

    /// Effective value: the one from the highest layer that defines it.
    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.get_with_layer(section, option).map(|(value, _)| value)
    }

    /// Effective value together with the index of the layer it comes from.
    pub fn get_with_layer(&self, section: &str, option: &str) -> Option<(&str, usize)> {
        let section = fold(section, self.case_sensitive);
        let option = fold(option, self.case_sensitive);
        self.layers
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, layer)| layer.get(&section, &option).map(|v| (v, idx)))
    }

    /// Whether any layer defines `section`.
    pub fn has_section(&self, section: &str) -> bool {
        let section = fold(section, self.case_sensitive);
        self.layers.iter().any(|l| l.has_section(&section))
    }

    /// Set a value in the writable layer, creating the section if needed.
    ///
    /// Names and values that would not read back unchanged from the saved
    /// file are refused with [`StoreError::ConfigFormat`]. No schema check
    /// happens here; see [`ConfigStore::save`].
    pub fn set(&mut self, section: &str, option: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_section_allowed(section)?;
        let section = fold(section, self.case_sensitive);
        let option = fold(option, self.case_sensitive);
        check_storable(&section, &option, value).map_err(|reason| StoreError::ConfigFormat {
            path: self.writable_path().to_path_buf(),
            reason,
        })?;
        self.layers[self.writable].set(&section, &option, value);
        Ok(())
    }

    /// Remove an option from the writable layer only.
    ///
    /// Returns whether the option was present. Lower layers are untouched,
    /// so [`ConfigStore::get`] may still return a value afterwards. A
    /// section left empty is dropped from the writable layer.
    pub fn unset(&mut self, section: &str, option: &str) -> Result<bool, StoreError> {
        let folded = fold(section, self.case_sensitive);
        let option = fold(option, self.case_sensitive);
        self.layers[self.writable]
            .remove(&folded, &option)
            .ok_or_else(|| StoreError::NoSection {
                section: section.to_string(),
            })
    }

    /// Clear the writable layer entirely.
    pub fn unset_all(&mut self) {
        self.layers[self.writable].clear();
    }

    /// Snapshot of the effective view.
    ///
    /// Sections appear in first-seen order walking layers lowest first,
    /// options likewise; each value comes from the highest layer defining
    /// it. Later mutations of the store do not affect a snapshot already
    /// taken.
    pub fn list_entries(&self) -> impl Iterator<Item = ConfigEntry> {
        let mut sections: Vec<(&str, Vec<ConfigEntry>)> = Vec::new();

        for (idx, layer) in self.layers.iter().enumerate() {
            for section in &layer.sections {
                let pos = match sections.iter().position(|(name, _)| *name == section.name) {
                    Some(pos) => pos,
                    None => {
                        sections.push((section.name.as_str(), Vec::new()));
                        sections.len() - 1
                    }
                };
                let entries = &mut sections[pos].1;
                for (option, value) in &section.options {
                    match entries.iter_mut().find(|e| e.option == *option) {
                        Some(entry) => {
                            entry.value = value.clone();
                            entry.layer = idx;
                        }
                        None => entries.push(ConfigEntry {
                            section: section.name.clone(),
                            option: option.clone(),
                            value: value.clone(),
                            layer: idx,
                        }),
                    }
                }
            }
        }

        sections
            .into_iter()
            .flat_map(|(_, entries)| entries)
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Fail-fast validation of the effective view.
    pub fn validate_effective(&self, schema: &Schema) -> Result<(), InvalidConfigError> {
        let entries: Vec<ConfigEntry> = self.list_entries().collect();
        schema.validate(
            entries
                .iter()
                .map(|e| (e.section.as_str(), e.option.as_str(), e.value.as_str())),
        )
    }

    /// Collect-all validation of the effective view.
    pub fn check_effective(&self, schema: &Schema) -> Vec<Violation> {
        let entries: Vec<ConfigEntry> = self.list_entries().collect();
        schema.check(
            entries
                .iter()
                .map(|e| (e.section.as_str(), e.option.as_str(), e.value.as_str())),
        )
    }

    /// Validate the whole writable layer and atomically write it back.
    ///
    /// On a violation nothing is written; the in-memory store keeps its
    /// mutations and the file on disk is left byte-for-byte unchanged.
    pub fn save(&mut self, schema: &Schema) -> Result<(), StoreError> {
        let layer = &self.layers[self.writable];
        schema.validate(layer.entries())?;
        layer.ensure_round_trips()?;

        let contents = layer.to_document().render();
        let path = layer.path().to_path_buf();
        persist::write_atomic(&path, &contents).map_err(|e| StoreError::io(&path, e))?;

        self.layers[self.writable].mark_written(&contents);
        tracing::info!(
            path = %path.display(),
            entries = self.layers[self.writable].entries().count(),
            "saved config"
        );
        Ok(())
    }

    /// Name as it will be stored: lowercased unless case-sensitive.
    pub fn normalize_name(&self, name: &str) -> String {
        fold(name, self.case_sensitive)
    }

    /// Refuse the reserved `DEFAULT` section, whatever the case setting.
    pub fn ensure_section_allowed(&self, section: &str) -> Result<(), StoreError> {
        if section == RESERVED_SECTION {
            return Err(StoreError::DuplicateSection {
                section: section.to_string(),
                path: self.writable_path().to_path_buf(),
                reason: DuplicateReason::Reserved,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = "[^foo$]\n^bar$ = ^[1-9]\\d{2}$\n^baz$ = .*\n[^other$]\n^x$ = .*\n";

    fn schema() -> Schema {
        SCHEMA.parse().unwrap()
    }

    fn write(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_load_requires_layers() {
        let paths: Vec<std::path::PathBuf> = Vec::new();
        let err = ConfigStore::load(&paths, StoreOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::NoLayers));
    }

    #[test]
    fn test_writable_index_out_of_range() {
        let options = StoreOptions {
            writable: Some(2),
            ..Default::default()
        };
        let err = ConfigStore::load(&["a", "b"], options).unwrap_err();
        assert!(matches!(
            err,
            StoreError::WritableOutOfRange { index: 2, layers: 2 }
        ));
    }

    #[test]
    fn test_missing_files_are_empty_layers() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::load(
            &[dir.path().join("a"), dir.path().join("b")],
            StoreOptions::default(),
        )
        .unwrap();
        assert_eq!(store.layers().len(), 2);
        assert_eq!(store.writable_index(), 1);
        assert_eq!(store.list_entries().count(), 0);
    }

    #[test]
    fn test_higher_layer_wins() {
        let dir = TempDir::new().unwrap();
        let low = write(&dir, "low", "[foo]\nbar = 100\nbaz = low\n");
        let high = write(&dir, "high", "[foo]\nbar = 200\n");

        let store = ConfigStore::load(&[low, high], StoreOptions::default()).unwrap();
        assert_eq!(store.get_with_layer("foo", "bar"), Some(("200", 1)));
        assert_eq!(store.get_with_layer("foo", "baz"), Some(("low", 0)));
        assert_eq!(store.get("foo", "missing"), None);
    }

    #[test]
    fn test_unset_reexposes_lower_layer() {
        let dir = TempDir::new().unwrap();
        let low = write(&dir, "low", "[foo]\nbar = 100\n");
        let high = write(&dir, "high", "[foo]\nbar = 200\n");

        let mut store = ConfigStore::load(&[low, high], StoreOptions::default()).unwrap();
        assert!(store.unset("foo", "bar").unwrap());
        assert_eq!(store.get("foo", "bar"), Some("100"));
        // The emptied section is gone from the writable layer only.
        assert!(!store.writable_layer().has_section("foo"));
        assert!(store.has_section("foo"));
    }

    #[test]
    fn test_unset_missing_section_in_writable_layer() {
        let dir = TempDir::new().unwrap();
        let low = write(&dir, "low", "[foo]\nbar = 100\n");
        let high = dir.path().join("high");

        let mut store = ConfigStore::load(&[low, high], StoreOptions::default()).unwrap();
        let err = store.unset("foo", "bar").unwrap_err();
        assert!(matches!(err, StoreError::NoSection { .. }));
        assert_eq!(err.to_string(), "No section: 'foo'");
    }

    #[test]
    fn test_unset_absent_option_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config", "[foo]\nbar = 100\n");
        let mut store = ConfigStore::load(&[path], StoreOptions::default()).unwrap();
        assert!(!store.unset("foo", "baz").unwrap());
        assert_eq!(store.get("foo", "bar"), Some("100"));
    }

    #[test]
    fn test_unset_all_clears_writable_layer_only() {
        let dir = TempDir::new().unwrap();
        let low = write(&dir, "low", "[foo]\nbar = 100\n");
        let high = write(&dir, "high", "[foo]\nbaz = x\n[other]\nx = 1\n");

        let mut store = ConfigStore::load(&[low, high], StoreOptions::default()).unwrap();
        store.unset_all();
        assert!(store.writable_layer().is_empty());
        let entries: Vec<String> = store.list_entries().map(|e| e.name()).collect();
        assert_eq!(entries, vec!["foo.bar"]);
    }

    #[test]
    fn test_set_folds_names_but_not_values() {
        let dir = TempDir::new().unwrap();
        let mut store =
            ConfigStore::load(&[dir.path().join("c")], StoreOptions::default()).unwrap();
        store.set("Foo", "BAR", "MiXeD").unwrap();
        assert_eq!(store.get("foo", "bar"), Some("MiXeD"));
        assert_eq!(store.get("FOO", "Bar"), Some("MiXeD"));
    }

    #[test]
    fn test_case_sensitive_store() {
        let dir = TempDir::new().unwrap();
        let options = StoreOptions {
            case_sensitive: true,
            ..Default::default()
        };
        let mut store = ConfigStore::load(&[dir.path().join("c")], options).unwrap();
        store.set("Foo", "Bar", "1").unwrap();
        assert_eq!(store.get("Foo", "Bar"), Some("1"));
        assert_eq!(store.get("foo", "bar"), None);
    }

    #[test]
    fn test_set_reserved_section_rejected_in_both_modes() {
        let dir = TempDir::new().unwrap();
        for case_sensitive in [false, true] {
            let options = StoreOptions {
                case_sensitive,
                ..Default::default()
            };
            let mut store = ConfigStore::load(&[dir.path().join("c")], options).unwrap();
            let err = store.set("DEFAULT", "x", "1").unwrap_err();
            assert!(matches!(
                err,
                StoreError::DuplicateSection {
                    reason: DuplicateReason::Reserved,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_reserved_section_in_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "c", "[DEFAULT]\nx = 1\n");
        let err = ConfigStore::load(&[path], StoreOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSection { .. }));
    }

    #[test]
    fn test_list_entries_order_and_provenance() {
        let dir = TempDir::new().unwrap();
        let low = write(&dir, "low", "[foo]\nbar = 100\nbaz = a\n[other]\nx = 1\n");
        let high = write(&dir, "high", "[new]\nk = v\n[foo]\nbar = 200\nqux = q\n");

        let store = ConfigStore::load(&[low, high], StoreOptions::default()).unwrap();
        let entries: Vec<(String, String, usize)> = store
            .list_entries()
            .map(|e| (e.name(), e.value, e.layer))
            .collect();
        assert_eq!(
            entries,
            vec![
                ("foo.bar".to_string(), "200".to_string(), 1),
                ("foo.baz".to_string(), "a".to_string(), 0),
                ("foo.qux".to_string(), "q".to_string(), 1),
                ("other.x".to_string(), "1".to_string(), 0),
                ("new.k".to_string(), "v".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_list_entries_is_a_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut store =
            ConfigStore::load(&[dir.path().join("c")], StoreOptions::default()).unwrap();
        store.set("foo", "bar", "1").unwrap();

        let snapshot = store.list_entries();
        store.set("foo", "baz", "2").unwrap();
        assert_eq!(snapshot.count(), 1);
        assert_eq!(store.list_entries().count(), 2);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config");
        let schema = schema();

        let mut store = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();
        store.set("foo", "bar", "103").unwrap();
        store.set("foo", "baz", "hello world").unwrap();
        store.set("other", "x", "").unwrap();
        store.save(&schema).unwrap();
        assert!(store.writable_layer().source().exists);

        let reloaded = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();
        let before: Vec<ConfigEntry> = store.list_entries().collect();
        let after: Vec<ConfigEntry> = reloaded.list_entries().collect();
        assert_eq!(before, after);
        assert_eq!(
            store.writable_layer().source().digest,
            reloaded.writable_layer().source().digest
        );
    }

    #[test]
    fn test_set_rejects_values_that_do_not_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config", "[foo]\nbaz = keep\n");
        let original = fs::read(&path).unwrap();

        let mut store = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();
        for value in ["  padded ", "padded ", "a\nb", "a\r\nb", "a\rb"] {
            let err = store.set("foo", "baz", value).unwrap_err();
            assert!(
                matches!(err, StoreError::ConfigFormat { .. }),
                "{value:?} should be refused, got {err:?}"
            );
        }
        assert_eq!(store.get("foo", "baz"), Some("keep"));

        let err = store.set("foo", "a=b", "1").unwrap_err();
        assert!(matches!(err, StoreError::ConfigFormat { .. }));
        let err = store.set("foo", "#hidden", "1").unwrap_err();
        assert!(matches!(err, StoreError::ConfigFormat { .. }));

        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_multiline_value_never_reaches_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        let schema: Schema = "[^foo$]\n^baz$ = [a-z\\n]*\n".parse().unwrap();
        assert!(schema.validate_entry("foo", "baz", "a\nb").is_ok());

        let mut store = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();
        assert!(store.set("foo", "baz", "a\nb").is_err());
        store.set("foo", "baz", "ab").unwrap();
        store.save(&schema).unwrap();

        let reloaded = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();
        assert_eq!(reloaded.get("foo", "baz"), Some("ab"));
    }

    #[test]
    fn test_saved_values_read_back_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        let schema: Schema = "[^foo$]\n^baz$ = .*\n".parse().unwrap();

        let mut store = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();
        for value in ["inner  spaces", "a = b: c", "#not-a-comment", ";x", ""] {
            store.set("foo", "baz", value).unwrap();
            store.save(&schema).unwrap();
            let reloaded = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();
            assert_eq!(reloaded.get("foo", "baz"), Some(value));
        }
    }

    #[test]
    fn test_failed_save_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config", "# hand written\n[foo]\nbar   =   103\n");
        let original = fs::read(&path).unwrap();

        let mut store = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();
        store.set("foo", "bar", "baz").unwrap();
        let err = store.save(&schema()).unwrap_err();

        assert!(matches!(err, StoreError::Invalid(InvalidConfigError::InvalidValue { .. })));
        assert_eq!(fs::read(&path).unwrap(), original);
        // The in-memory store keeps the rejected mutation.
        assert_eq!(store.get("foo", "bar"), Some("baz"));
    }

    #[test]
    fn test_save_validates_whole_writable_layer() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        let mut store = ConfigStore::load(&[&path], StoreOptions::default()).unwrap();

        store.set("unknown", "x", "1").unwrap();
        store.set("foo", "bar", "103").unwrap();
        let err = store.save(&schema()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Invalid(InvalidConfigError::InvalidSection { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_save_ignores_lower_layers() {
        let dir = TempDir::new().unwrap();
        // The lower layer is invalid for the schema but is never written.
        let low = write(&dir, "low", "[legacy]\nkey = v\n");
        let high = dir.path().join("high");

        let mut store = ConfigStore::load(&[low, high.clone()], StoreOptions::default()).unwrap();
        store.set("foo", "bar", "103").unwrap();
        store.save(&schema()).unwrap();
        assert_eq!(fs::read_to_string(&high).unwrap(), "[foo]\nbar = 103\n");

        assert!(store.validate_effective(&schema()).is_err());
        assert_eq!(store.check_effective(&schema()).len(), 1);
    }

    #[test]
    fn test_explicit_writable_layer() {
        let dir = TempDir::new().unwrap();
        let low = dir.path().join("low");
        let high = write(&dir, "high", "[foo]\nbar = 200\n");
        let options = StoreOptions {
            writable: Some(0),
            ..Default::default()
        };

        let mut store = ConfigStore::load(&[low.clone(), high], options).unwrap();
        store.set("foo", "bar", "100").unwrap();
        // The higher, read-only layer still wins on read.
        assert_eq!(store.get("foo", "bar"), Some("200"));
        store.save(&schema()).unwrap();
        assert_eq!(fs::read_to_string(&low).unwrap(), "[foo]\nbar = 100\n");
    }
}
