use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;

use crate::error::PrepError;
use crate::labels::{LabelSchema, Strictness};
use crate::manifest::DEFAULT_IMAGE_EXTENSION;
use crate::pipeline::DatasetSplit;

pub const DEFAULT_DATA_ROOT: &str = "data/isic2018";
pub const DEFAULT_UNLABELED_FRACTION: f64 = 0.90;
pub const DEFAULT_SEED: u64 = 42;

pub const ENV_DATA_ROOT: &str = "LESION_LABELS_DATA_ROOT";
pub const ENV_FRACTION: &str = "LESION_LABELS_FRACTION";
pub const ENV_SEED: &str = "LESION_LABELS_SEED";
pub const ENV_EXTENSION: &str = "LESION_LABELS_EXT";
pub const ENV_STRICT: &str = "LESION_LABELS_STRICT";

/// Settings for a full label-preparation run.
///
/// Defaults:
/// - `label_dir`: `data/isic2018/labels` (inputs are read from and outputs written to it)
/// - `train_image_dir` / `val_image_dir` / `test_image_dir`: `data/isic2018/{train,val,test}`
/// - `unlabeled_fraction`: `0.90` of every training category goes to the unlabeled subset
/// - `seed`: `42`
/// - `image_extension`: `jpg`
/// - `strictness`: `Strict`
/// - `schema`: MEL, NV, BCC, AKIEC, BKL, DF, VASC
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label_dir: PathBuf,
    pub train_image_dir: String,
    pub val_image_dir: String,
    pub test_image_dir: String,
    pub unlabeled_fraction: f64,
    pub seed: u64,
    pub image_extension: String,
    pub strictness: Strictness,
    pub schema: LabelSchema,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_data_root(DEFAULT_DATA_ROOT)
    }
}

impl PipelineConfig {
    /// Lays out all directories under a single dataset root
    pub fn with_data_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let image_dir = |name: &str| root.join(name).to_string_lossy().into_owned();
        Self {
            label_dir: root.join("labels"),
            train_image_dir: image_dir("train"),
            val_image_dir: image_dir("val"),
            test_image_dir: image_dir("test"),
            unlabeled_fraction: DEFAULT_UNLABELED_FRACTION,
            seed: DEFAULT_SEED,
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
            strictness: Strictness::default(),
            schema: LabelSchema::isic2018(),
        }
    }

    /// Builds the default configuration, then applies `LESION_LABELS_*` environment overrides
    pub fn from_env() -> Result<Self, PrepError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, PrepError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_DATA_ROOT) {
            Some(root) => {
                info!("Using data root from {}: {}", ENV_DATA_ROOT, root);
                Self::with_data_root(root)
            }
            None => Self::default(),
        };
        if let Some(value) = lookup(ENV_FRACTION) {
            config.unlabeled_fraction = parse_var(ENV_FRACTION, &value)?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            config.seed = parse_var(ENV_SEED, &value)?;
        }
        if let Some(value) = lookup(ENV_EXTENSION) {
            config.image_extension = value.trim().to_string();
        }
        if let Some(value) = lookup(ENV_STRICT) {
            config.strictness = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Strictness::Strict,
                "0" | "false" | "no" => Strictness::Warn,
                other => {
                    return Err(PrepError::InvalidConfig(format!(
                        "{} must be true or false, got '{}'",
                        ENV_STRICT, other
                    )))
                }
            };
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_label_dir(mut self, label_dir: impl Into<PathBuf>) -> Self {
        self.label_dir = label_dir.into();
        self
    }

    pub fn with_image_dir(mut self, split: DatasetSplit, dir: impl Into<String>) -> Self {
        match split {
            DatasetSplit::Train => self.train_image_dir = dir.into(),
            DatasetSplit::Val => self.val_image_dir = dir.into(),
            DatasetSplit::Test => self.test_image_dir = dir.into(),
        }
        self
    }

    pub fn with_unlabeled_fraction(mut self, fraction: f64) -> Self {
        self.unlabeled_fraction = fraction;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_schema(mut self, schema: LabelSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn image_dir(&self, split: DatasetSplit) -> &str {
        match split {
            DatasetSplit::Train => &self.train_image_dir,
            DatasetSplit::Val => &self.val_image_dir,
            DatasetSplit::Test => &self.test_image_dir,
        }
    }

    /// Checks value ranges that would otherwise fail midway through a run
    pub fn validate(&self) -> Result<(), PrepError> {
        if !(self.unlabeled_fraction > 0.0 && self.unlabeled_fraction < 1.0) {
            return Err(PrepError::InvalidConfig(format!(
                "unlabeled_fraction must be strictly between 0 and 1, got {}",
                self.unlabeled_fraction
            )));
        }
        if self.image_extension.trim_start_matches('.').is_empty() {
            return Err(PrepError::InvalidConfig("image_extension cannot be empty".into()));
        }
        if self.label_dir.as_os_str().is_empty() {
            return Err(PrepError::InvalidConfig("label_dir cannot be empty".into()));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, PrepError> {
    value.trim().parse().map_err(|_| {
        PrepError::InvalidConfig(format!("Could not parse {}='{}'", key, value))
    })
}
