use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::PrepError;
use crate::labels::CanonicalRecord;

pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

const INDEX_HEADER: [&str; 3] = ["image", "label", "label_idx"];
const LABELED_HEADER: [&str; 3] = ["file", "label", "label_idx"];
const UNLABELED_HEADER: [&str; 1] = ["file"];

#[derive(Debug, Serialize)]
struct LabeledRow<'a> {
    file: String,
    label: &'a str,
    label_idx: usize,
}

#[derive(Debug, Serialize)]
struct UnlabeledRow {
    file: String,
}

/// A manifest file that was written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenManifest {
    pub path: PathBuf,
    /// Number of data rows, excluding the header
    pub rows: usize,
    /// Hex-encoded SHA-256 of the file contents
    pub sha256: String,
}

/// Builds image paths and writes CSV manifests for one image directory.
///
/// Every path is `{root}/{image_id}.{extension}`. Files are always rewritten
/// in full, so running twice with the same input yields identical bytes.
///
/// # Example
/// ```
/// use lesion_labels::ManifestBuilder;
///
/// let builder = ManifestBuilder::new("data/isic2018/train");
/// assert_eq!(builder.file_path("ISIC_0000001"), "data/isic2018/train/ISIC_0000001.jpg");
/// ```
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    root: String,
    extension: String,
}

impl ManifestBuilder {
    /// Creates a builder for images under `root` with the default `jpg` extension
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let root = match root.trim_end_matches('/') {
            "" if root.starts_with('/') => "/".to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            root,
            extension: DEFAULT_IMAGE_EXTENSION.to_string(),
        }
    }

    /// Sets the image file extension, with or without a leading dot
    pub fn with_extension(mut self, extension: &str) -> Result<Self, PrepError> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(PrepError::InvalidConfig("Image extension cannot be empty".into()));
        }
        self.extension = extension.to_string();
        Ok(self)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn file_path(&self, image_id: &str) -> String {
        match self.root.as_str() {
            "" => format!("{}.{}", image_id, self.extension),
            "/" => format!("/{}.{}", image_id, self.extension),
            root => format!("{}/{}.{}", root, image_id, self.extension),
        }
    }

    /// Writes `file,label,label_idx` rows for `records`, in the given order
    pub fn write_labeled<'a, I>(&self, path: &Path, records: I) -> Result<WrittenManifest, PrepError>
    where
        I: IntoIterator<Item = &'a CanonicalRecord>,
    {
        let rows = records.into_iter().map(|r| LabeledRow {
            file: self.file_path(&r.image_id),
            label: &r.label,
            label_idx: r.label_idx,
        });
        write_csv(path, &LABELED_HEADER, rows)
    }

    /// Writes a single `file` column for `records`, in the given order
    pub fn write_unlabeled<'a, I>(&self, path: &Path, records: I) -> Result<WrittenManifest, PrepError>
    where
        I: IntoIterator<Item = &'a CanonicalRecord>,
    {
        let rows = records.into_iter().map(|r| UnlabeledRow {
            file: self.file_path(&r.image_id),
        });
        write_csv(path, &UNLABELED_HEADER, rows)
    }
}

/// Writes `image,label,label_idx` rows; no image paths are involved
pub fn write_index<'a, I>(path: &Path, records: I) -> Result<WrittenManifest, PrepError>
where
    I: IntoIterator<Item = &'a CanonicalRecord>,
{
    write_csv(path, &INDEX_HEADER, records)
}

/// Serializes `rows` under `header` and replaces the file at `path`.
///
/// The header is written explicitly so that empty manifests are still valid CSV.
fn write_csv<T, I>(path: &Path, header: &[&str], rows: I) -> Result<WrittenManifest, PrepError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer
        .write_record(header)
        .map_err(|e| PrepError::csv(path, e))?;
    let mut count = 0;
    for row in rows {
        writer.serialize(row).map_err(|e| PrepError::csv(path, e))?;
        count += 1;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| PrepError::io(path, io::Error::new(e.error().kind(), e.error().to_string())))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PrepError::io(parent, e))?;
    }
    fs::write(path, &bytes).map_err(|e| PrepError::io(path, e))?;

    let sha256 = format!("{:x}", Sha256::digest(&bytes));
    info!("Wrote {} rows to {:?} (sha256 {})", count, path, sha256);
    Ok(WrittenManifest {
        path: path.to_path_buf(),
        rows: count,
        sha256,
    })
}
