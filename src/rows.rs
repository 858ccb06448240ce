//! Input rows: CSV reading and positional destructuring into typed tasks.
use std::fs::File;
use std::path::Path;

use thiserror::Error;

pub const RENAME_HEADER: [&str; 2] = ["destination_path", "newname"];
pub const SITEMAP_HEADER: [&str; 6] = [
    "id",
    "path",
    "site",
    "is_published",
    "has_sitemap_meta",
    "sitemap_value_current",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowShapeError {
    #[error("row {line} has {found} columns, expected {expected} (fix the row starting with {preview:?})")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
        preview: String,
    },
    #[error("row {line}: path {path:?} has no parent folder")]
    NoParentFolder { line: u64, path: String },
}

/// One raw input row with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: u64,
    pub fields: Vec<String>,
}

impl Row {
    pub fn new(line: u64, fields: &[&str]) -> Self {
        Self {
            line,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn is_header(&self, header: &[&str]) -> bool {
        self.fields.len() == header.len() && self.fields.iter().zip(header).all(|(a, b)| a == b)
    }

    /// Borrow exactly `N` columns, or report the mismatch.
    pub fn columns<const N: usize>(&self) -> Result<[&str; N], RowShapeError> {
        let found = self.fields.len();
        if found != N {
            return Err(RowShapeError::ColumnCount {
                line: self.line,
                expected: N,
                found,
                preview: self.fields.first().cloned().unwrap_or_default(),
            });
        }
        Ok(std::array::from_fn(|i| self.fields[i].as_str()))
    }
}

/// Reads every record of a CSV file without header handling; header rows are
/// recognized by the workflows themselves.
pub fn read_csv(path: &Path) -> Result<Vec<Row>, csv::Error> {
    let file = File::open(path)?;
    read_rows(file)
}

pub fn read_rows<R: std::io::Read>(reader: R) -> Result<Vec<Row>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        rows.push(Row {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }
    Ok(rows)
}

/// A rename request derived from one `destination_path,newname` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTask {
    pub source_path: String,
    pub parent_folder: String,
    /// New name with the source extension appended.
    pub new_name: String,
    pub destination_path: String,
}

impl RenameTask {
    pub fn from_row(row: &Row) -> Result<Self, RowShapeError> {
        let [source, base_name] = row.columns::<2>()?;
        Self::new(source, base_name).ok_or_else(|| RowShapeError::NoParentFolder {
            line: row.line,
            path: source.to_string(),
        })
    }

    /// `None` when `source_path` has no `/`.
    pub fn new(source_path: &str, base_name: &str) -> Option<Self> {
        let (parent, file_name) = source_path.rsplit_once('/')?;
        let extension = file_name.rfind('.').map(|i| &file_name[i..]).unwrap_or("");
        let new_name = format!("{base_name}{extension}");
        Some(Self {
            source_path: source_path.to_string(),
            parent_folder: parent.to_string(),
            destination_path: format!("{parent}/{new_name}"),
            new_name,
        })
    }
}

/// A sitemap request; only `id` drives remote calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapRow {
    pub id: String,
    pub path: String,
    pub site: String,
    pub is_published: String,
    pub has_sitemap_meta: String,
    pub sitemap_value_current: String,
}

impl SitemapRow {
    pub fn from_row(row: &Row) -> Result<Self, RowShapeError> {
        let [id, path, site, is_published, has_sitemap_meta, sitemap_value_current] =
            row.columns::<6>()?;
        Ok(Self {
            id: id.into(),
            path: path.into(),
            site: site.into(),
            is_published: is_published.into(),
            has_sitemap_meta: has_sitemap_meta.into(),
            sitemap_value_current: sitemap_value_current.into(),
        })
    }
}
