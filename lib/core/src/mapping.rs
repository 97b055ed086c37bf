//! Identity mapping between corpus rows, document names and source objects.

use ahash::AHashMap;

use crate::error::{Error, Result};

/// Source-object descriptors carried alongside a corpus, keyed by document
/// name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectMetadata {
    pub path: String,
    pub object_id: String,
    pub object_name: String,
    pub title: String,
    pub description: String,
    pub media_id: String,
}

/// Lookup table from document name to its object metadata. Duplicate names
/// keep the last record seen.
#[derive(Clone, Debug, Default)]
pub struct MetadataTable {
    records: AHashMap<String, ObjectMetadata>,
}

impl MetadataTable {
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = (String, ObjectMetadata)>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ObjectMetadata> {
        self.records.get(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolves names and object ids to corpus rows and back. Rows are scanned
/// in corpus order, so ambiguous lookups resolve to the lowest row.
pub struct CorpusMap<'a> {
    documents: &'a [String],
    metadata: &'a MetadataTable,
}

impl<'a> CorpusMap<'a> {
    #[must_use]
    pub fn new(documents: &'a [String], metadata: &'a MetadataTable) -> Self {
        Self {
            documents,
            metadata,
        }
    }

    /// Row of the first document carrying this name.
    #[must_use]
    pub fn row_for_name(&self, name: &str) -> Option<usize> {
        self.documents.iter().position(|doc| doc == name)
    }

    /// Row of the first document whose metadata records this object id.
    #[must_use]
    pub fn row_for_object_id(&self, object_id: &str) -> Option<usize> {
        self.documents.iter().position(|doc| {
            self.metadata
                .get(doc)
                .is_some_and(|meta| meta.object_id == object_id)
        })
    }

    /// Object id recorded for a row.
    pub fn object_id_for_row(&self, row: usize) -> Result<&str> {
        let name = self.documents.get(row).ok_or(Error::RowOutOfRange {
            row,
            rows: self.documents.len(),
        })?;
        let meta = self
            .metadata
            .get(name)
            .ok_or_else(|| Error::DocumentNotFound(name.clone()))?;
        Ok(&meta.object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<String>, MetadataTable) {
        let documents = vec!["vase".to_string(), "coin".to_string(), "vase".to_string()];
        let table = MetadataTable::from_records(vec![
            (
                "vase".to_string(),
                ObjectMetadata {
                    object_id: "obj-1".to_string(),
                    media_id: "m-1".to_string(),
                    ..ObjectMetadata::default()
                },
            ),
            (
                "coin".to_string(),
                ObjectMetadata {
                    object_id: "obj-2".to_string(),
                    media_id: "m-2".to_string(),
                    ..ObjectMetadata::default()
                },
            ),
        ]);
        (documents, table)
    }

    #[test]
    fn name_lookup_returns_first_row() {
        let (documents, table) = fixture();
        let map = CorpusMap::new(&documents, &table);
        assert_eq!(map.row_for_name("vase"), Some(0));
        assert_eq!(map.row_for_name("coin"), Some(1));
        assert_eq!(map.row_for_name("missing"), None);
    }

    #[test]
    fn object_id_lookup_scans_rows_in_order() {
        let (documents, table) = fixture();
        let map = CorpusMap::new(&documents, &table);
        assert_eq!(map.row_for_object_id("obj-1"), Some(0));
        assert_eq!(map.row_for_object_id("obj-2"), Some(1));
        assert_eq!(map.row_for_object_id("obj-9"), None);
    }

    #[test]
    fn row_to_object_id_reports_typed_failures() {
        let (mut documents, table) = fixture();
        documents.push("unlisted".to_string());
        let map = CorpusMap::new(&documents, &table);

        assert_eq!(map.object_id_for_row(1).unwrap(), "obj-2");
        assert!(matches!(
            map.object_id_for_row(99),
            Err(Error::RowOutOfRange { row: 99, rows: 4 })
        ));
        assert!(matches!(
            map.object_id_for_row(3),
            Err(Error::DocumentNotFound(_))
        ));
    }
}
