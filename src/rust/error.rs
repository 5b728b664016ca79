use std::io;
use std::path::{Path, PathBuf};

/// Represents the different types of errors that can occur while preparing label metadata.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// A row's one-hot vector does not contain exactly one active category
    #[error("Schema violation for image '{image_id}': {reason}")]
    SchemaViolation { image_id: String, reason: String },
    /// A category has too few members to appear in both split subsets
    #[error("Category '{category}' has {count} member(s); at least 2 are required to stratify the split")]
    DegenerateStratum { category: String, count: usize },
    #[error("Required input file not found: {}", path.display())]
    MissingFile { path: PathBuf },
    #[error("Required column '{column}' missing from {}", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("Duplicate image id '{image_id}' in {}", path.display())]
    DuplicateImage { path: PathBuf, image_id: String },
    #[error("Malformed value '{value}' in column '{column}' for image '{image_id}' in {}", path.display())]
    MalformedValue {
        path: PathBuf,
        image_id: String,
        column: String,
        value: String,
    },
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Invalid label schema: {0}")]
    InvalidSchema(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PrepError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        PrepError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        PrepError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
