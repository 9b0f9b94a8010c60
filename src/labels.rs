use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::{fmt, fs, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Failed to read label file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid label file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Label key {0:?} is not a non-negative integer")]
    InvalidIndex(String),
    #[error("Label index {0} appears more than once")]
    DuplicateIndex(usize),
    #[error("Label index {index} is out of range for {count} classes")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("Label file contains no classes")]
    Empty,
}

/// Index to class-name lookup matching the classifier's output layer.
#[derive(Debug, Clone)]
pub struct LabelMap {
    class_names: Vec<String>,
}

impl LabelMap {
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let raw = fs::read_to_string(path)?;
        let entries: RawEntries = serde_json::from_str(&raw)?;
        let labels = Self::from_entries(entries.0)?;

        tracing::info!("Loaded {} class labels from {:?}", labels.len(), path);
        Ok(labels)
    }

    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut parsed: Vec<(usize, String)> = Vec::new();
        for (key, name) in entries {
            let key = key.as_ref();
            let index: usize = key
                .trim()
                .parse()
                .map_err(|_| LabelError::InvalidIndex(key.to_string()))?;
            parsed.push((index, name.into()));
        }

        if parsed.is_empty() {
            return Err(LabelError::Empty);
        }

        let count = parsed.len();
        let mut slots: Vec<Option<String>> = vec![None; count];
        for (index, name) in parsed {
            let slot = slots
                .get_mut(index)
                .ok_or(LabelError::IndexOutOfRange { index, count })?;
            if slot.is_some() {
                return Err(LabelError::DuplicateIndex(index));
            }
            *slot = Some(name);
        }

        // n distinct indices below n fill every slot.
        let class_names = slots.into_iter().flatten().collect();

        Ok(Self { class_names })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.class_names.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.class_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_names.is_empty()
    }
}

// Keeps every key/value pair in file order so repeated keys are not collapsed.
struct RawEntries(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping integer strings to class names")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_label_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("class_indices.json");
        fs::write(
            &path,
            r#"{"1": "Potato___healthy", "0": "Pepper__bell___Bacterial_spot", "2": "Tomato_Leaf_Mold"}"#,
        )
        .unwrap();

        let labels = LabelMap::load(&path).unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("Pepper__bell___Bacterial_spot"));
        assert_eq!(labels.get(1), Some("Potato___healthy"));
        assert_eq!(labels.get(2), Some("Tomato_Leaf_Mold"));
        assert_eq!(labels.get(3), None);
    }

    #[test]
    fn test_rejects_gaps() {
        let result = LabelMap::from_entries([("0", "a"), ("1", "b"), ("1", "c")]);
        assert!(matches!(result, Err(LabelError::DuplicateIndex(1))));

        let result = LabelMap::from_entries([("0", "a"), ("2", "b")]);
        assert!(matches!(
            result,
            Err(LabelError::IndexOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_rejects_huge_indices_without_allocating() {
        let result = LabelMap::from_entries([("18446744073709551615", "a")]);
        assert!(matches!(
            result,
            Err(LabelError::IndexOutOfRange {
                index: usize::MAX,
                count: 1
            })
        ));

        let result = LabelMap::from_entries([("0", "a"), ("100000000000", "b")]);
        assert!(matches!(
            result,
            Err(LabelError::IndexOutOfRange { count: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_repeated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("class_indices.json");
        fs::write(&path, r#"{"0": "a", "1": "b", "1": "c"}"#).unwrap();

        assert!(matches!(
            LabelMap::load(&path),
            Err(LabelError::DuplicateIndex(1))
        ));
    }

    #[test]
    fn test_rejects_non_integer_keys() {
        let result = LabelMap::from_entries([("zero", "a")]);
        assert!(matches!(result, Err(LabelError::InvalidIndex(_))));

        let result = LabelMap::from_entries([("-1", "a")]);
        assert!(matches!(result, Err(LabelError::InvalidIndex(_))));
    }

    #[test]
    fn test_rejects_empty_and_missing_files() {
        assert!(matches!(
            LabelMap::from_entries(Vec::<(String, String)>::new()),
            Err(LabelError::Empty)
        ));
        assert!(matches!(
            LabelMap::load(Path::new("/nonexistent/class_indices.json")),
            Err(LabelError::Io(_))
        ));
    }
}
