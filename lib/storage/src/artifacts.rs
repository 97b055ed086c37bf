//! Readers and writers for the on-disk artifact formats.
//!
//! Text artifacts go through an atomic rename so a crashed build never
//! leaves a half-written file behind. Binary models are bincode.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use crosstopic_core::{Error, MetadataTable, ObjectMetadata, Result, SparseVector, Vocabulary};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

const MATRIX_BANNER: &str = "%%MatrixMarket matrix coordinate real general";

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = AtomicFile::new(path, OverwriteBehavior::AllowOverwrite);
    match file.write(|f| f.write_all(bytes)) {
        Ok(()) => Ok(()),
        Err(atomicwrites::Error::Internal(e)) | Err(atomicwrites::Error::User(e)) => {
            Err(Error::Io(e))
        }
    }
}

fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        path: path.display().to_string(),
        line,
        message: message.into(),
    }
}

fn parse_field<T: FromStr>(
    fields: &mut std::str::SplitWhitespace<'_>,
    path: &Path,
    line: usize,
    what: &str,
) -> Result<T> {
    let raw = fields
        .next()
        .ok_or_else(|| parse_error(path, line, format!("missing {what}")))?;
    raw.parse()
        .map_err(|_| parse_error(path, line, format!("invalid {what}: '{raw}'")))
}

/// Writes the document-name list, one name per line; the line position is
/// the corpus row.
pub fn write_document_names(path: &Path, names: &[String]) -> Result<()> {
    let mut out = String::new();
    for name in names {
        out.push_str(name);
        out.push('\n');
    }
    write_atomic(path, out.as_bytes())
}

pub fn read_document_names(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Writes the vocabulary as `id<TAB>token<TAB>document-frequency` lines in
/// ascending id order.
pub fn write_vocabulary(path: &Path, vocabulary: &Vocabulary) -> Result<()> {
    let mut out = String::new();
    for (id, token, df) in vocabulary.entries() {
        out.push_str(&format!("{id}\t{token}\t{df}\n"));
    }
    write_atomic(path, out.as_bytes())
}

pub fn read_vocabulary(path: &Path) -> Result<Vocabulary> {
    let text = fs::read_to_string(path)?;
    let mut tokens = Vec::new();
    let mut dfs = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 3 {
            return Err(parse_error(
                path,
                line_no,
                format!("expected 3 tab-separated fields, found {}", fields.len()),
            ));
        }
        let id: u32 = fields[0]
            .parse()
            .map_err(|_| parse_error(path, line_no, format!("invalid token id: '{}'", fields[0])))?;
        if id as usize != tokens.len() {
            return Err(parse_error(
                path,
                line_no,
                format!("token id {id} out of order, expected {}", tokens.len()),
            ));
        }
        let df: u32 = fields[2].parse().map_err(|_| {
            parse_error(
                path,
                line_no,
                format!("invalid document frequency: '{}'", fields[2]),
            )
        })?;
        tokens.push(fields[1].to_string());
        dfs.push(df);
    }
    Vocabulary::from_parts(tokens, dfs)
}

/// Writes the corpus in MatrixMarket coordinate format with 1-based
/// `row col value` entries.
pub fn write_matrix(path: &Path, corpus: &[SparseVector], columns: usize) -> Result<()> {
    let nnz: usize = corpus.iter().map(SparseVector::len).sum();
    let mut out = String::new();
    out.push_str(MATRIX_BANNER);
    out.push('\n');
    out.push_str(&format!("{} {} {}\n", corpus.len(), columns, nnz));
    for (row, vector) in corpus.iter().enumerate() {
        for &(id, value) in vector.entries() {
            out.push_str(&format!("{} {} {}\n", row + 1, id as usize + 1, value));
        }
    }
    write_atomic(path, out.as_bytes())
}

/// Reads a MatrixMarket coordinate file back into sparse rows, returning
/// the rows and the declared column count.
pub fn read_matrix(path: &Path) -> Result<(Vec<SparseVector>, usize)> {
    let text = fs::read_to_string(path)?;
    let mut rows: Option<Vec<Vec<(u32, f64)>>> = None;
    let mut columns = 0usize;
    let mut declared = 0usize;
    let mut seen = 0usize;
    let mut saw_banner = false;
    let mut last_line = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let line = raw.trim();
        if !saw_banner {
            if !line.starts_with("%%MatrixMarket") {
                return Err(parse_error(path, line_no, "missing MatrixMarket banner"));
            }
            saw_banner = true;
            continue;
        }
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let mut fields = line.split_whitespace();
        match rows.as_mut() {
            None => {
                let r: usize = parse_field(&mut fields, path, line_no, "row count")?;
                let c: usize = parse_field(&mut fields, path, line_no, "column count")?;
                let n: usize = parse_field(&mut fields, path, line_no, "entry count")?;
                rows = Some(vec![Vec::new(); r]);
                columns = c;
                declared = n;
            }
            Some(matrix) => {
                let row: usize = parse_field(&mut fields, path, line_no, "entry row")?;
                let col: usize = parse_field(&mut fields, path, line_no, "entry column")?;
                let value: f64 = parse_field(&mut fields, path, line_no, "entry value")?;
                if row == 0 || row > matrix.len() {
                    return Err(parse_error(
                        path,
                        line_no,
                        format!("row {row} out of range for {} rows", matrix.len()),
                    ));
                }
                if col == 0 || col > columns {
                    return Err(parse_error(
                        path,
                        line_no,
                        format!("column {col} out of range for {columns} columns"),
                    ));
                }
                matrix[row - 1].push(((col - 1) as u32, value));
                seen += 1;
            }
        }
    }

    if !saw_banner {
        return Err(parse_error(path, 1, "missing MatrixMarket banner"));
    }
    let matrix = rows.ok_or_else(|| parse_error(path, last_line, "missing matrix dimensions"))?;
    if seen != declared {
        return Err(parse_error(
            path,
            last_line,
            format!("declared {declared} entries, found {seen}"),
        ));
    }
    let corpus = matrix.into_iter().map(SparseVector::from_entries).collect();
    Ok((corpus, columns))
}

/// Reads the object-metadata table: seven tab-separated columns per line,
/// keyed by the first (document name).
pub fn read_metadata_table(path: &Path) -> Result<MetadataTable> {
    let text = fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 7 {
            return Err(parse_error(
                path,
                idx + 1,
                format!("expected 7 tab-separated fields, found {}", fields.len()),
            ));
        }
        records.push((
            fields[0].to_string(),
            ObjectMetadata {
                path: fields[1].to_string(),
                object_id: fields[2].to_string(),
                object_name: fields[3].to_string(),
                title: fields[4].to_string(),
                description: fields[5].to_string(),
                media_id: fields[6].to_string(),
            },
        ));
    }
    Ok(MetadataTable::from_records(records))
}

/// Reads the augmentation table as (document name, annotation uri) rows.
/// An absent file is an empty table, so a first run needs no setup.
pub fn read_augmentation_table(path: &Path) -> Result<Vec<(String, String)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (name, uri) = line
            .split_once('\t')
            .ok_or_else(|| parse_error(path, idx + 1, "expected name<TAB>uri"))?;
        entries.push((name.to_string(), uri.to_string()));
    }
    Ok(entries)
}

/// Appends one augmentation row; interrupted runs resume from what is
/// already here.
pub fn append_augmentation_row(path: &Path, name: &str, uri: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{name}\t{uri}")?;
    Ok(())
}

pub fn save_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))?;
    write_atomic(path, &bytes)
}

pub fn load_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    bincode::deserialize(&bytes).map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn document_names_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("documents.docsid");
        let names = vec!["talk-1.txt".to_string(), "talk-2.txt".to_string()];
        write_document_names(&path, &names).unwrap();
        assert_eq!(read_document_names(&path).unwrap(), names);
    }

    #[test]
    fn vocabulary_round_trip_preserves_ids_and_frequencies() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocabulary.dict");
        let vocabulary = Vocabulary::build(&[
            vec!["engine".to_string(), "steam".to_string()],
            vec!["steam".to_string()],
        ]);
        write_vocabulary(&path, &vocabulary).unwrap();
        let loaded = read_vocabulary(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.id("engine"), Some(0));
        assert_eq!(loaded.id("steam"), Some(1));
        assert_eq!(loaded.df(1), Some(2));
    }

    #[test]
    fn vocabulary_ids_must_match_line_positions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vocabulary.dict");
        fs::write(&path, "0\tengine\t1\n5\tsteam\t2\n").unwrap();
        let err = read_vocabulary(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn matrix_round_trips_sparse_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.mm");
        let corpus = vec![
            SparseVector::from_entries(vec![(0, 0.5), (3, 1.25)]),
            SparseVector::new(),
            SparseVector::from_entries(vec![(2, 2.0)]),
        ];
        write_matrix(&path, &corpus, 4).unwrap();
        let (loaded, columns) = read_matrix(&path).unwrap();
        assert_eq!(columns, 4);
        assert_eq!(loaded, corpus);
    }

    #[test]
    fn malformed_matrix_entry_names_the_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.mm");
        fs::write(
            &path,
            "%%MatrixMarket matrix coordinate real general\n2 2 2\n1 1 0.5\n2 x 1.0\n",
        )
        .unwrap();
        let err = read_matrix(&path).unwrap_err();
        match err {
            Error::Parse { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("entry column"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn matrix_coordinates_must_stay_in_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.mm");
        fs::write(
            &path,
            "%%MatrixMarket matrix coordinate real general\n2 2 1\n3 1 0.5\n",
        )
        .unwrap();
        let err = read_matrix(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn matrix_entry_count_is_checked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.mm");
        fs::write(
            &path,
            "%%MatrixMarket matrix coordinate real general\n2 2 3\n1 1 0.5\n",
        )
        .unwrap();
        let err = read_matrix(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn metadata_table_is_keyed_by_document_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("objects.tsv");
        fs::write(
            &path,
            "obj-a.txt\t/data/a\tSMG-1\tEngine\tBeam engine\tA rotative beam engine\tm-10\n",
        )
        .unwrap();
        let table = read_metadata_table(&path).unwrap();
        let meta = table.get("obj-a.txt").unwrap();
        assert_eq!(meta.object_id, "SMG-1");
        assert_eq!(meta.media_id, "m-10");
    }

    #[test]
    fn metadata_rows_need_seven_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("objects.tsv");
        fs::write(&path, "obj-a.txt\tonly\tthree\n").unwrap();
        let err = read_metadata_table(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn augmentation_rows_accumulate_across_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("augmentation.tsv");
        assert!(read_augmentation_table(&path).unwrap().is_empty());
        append_augmentation_row(&path, "obj-a.txt", "http://dbpedia.org/resource/Steam").unwrap();
        append_augmentation_row(&path, "obj-b.txt", "http://dbpedia.org/resource/Brass").unwrap();
        let rows = read_augmentation_table(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "obj-a.txt");
        assert_eq!(rows[1].1, "http://dbpedia.org/resource/Brass");
    }
}
