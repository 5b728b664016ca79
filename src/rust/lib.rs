//! Label metadata preparation for skin lesion classification datasets.
//!
//! Converts one-hot ground-truth tables into `image,label,label_idx` index
//! files, splits the training set into a small stratified labeled subset and a
//! larger unlabeled subset, and writes image-path manifests for downstream
//! semi-supervised loaders.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use lesion_labels::{LabelCanonicalizer, LabelSchema, ManifestBuilder, OneHotTable, StratifiedSplitter};
//!
//! let schema = LabelSchema::isic2018();
//! let rows: Vec<(String, Vec<f32>)> = (0..10)
//!     .map(|i| {
//!         let mut one_hot = vec![0.0; schema.len()];
//!         one_hot[i % 2] = 1.0;
//!         (format!("ISIC_{:07}", i), one_hot)
//!     })
//!     .collect();
//! let table = OneHotTable::from_rows(&schema, rows)?;
//!
//! let records = LabelCanonicalizer::new(schema.clone()).canonicalize(&table)?;
//! let split = StratifiedSplitter::new(0.8, 42)?.split(&records, &schema)?;
//!
//! let builder = ManifestBuilder::new("data/isic2018/train");
//! for record in split.labeled_records(&records) {
//!     println!("{},{}", builder.file_path(&record.image_id), record.label_idx);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Full Run
//!
//! [`Pipeline`] reads `{train,val,test}_labels.csv` from the configured label
//! directory and writes `{split}_idx.csv`, `train_labeled_idx.csv`,
//! `train_labeled.csv` and `train_unlabeled.csv` next to them:
//!
//! ```no_run
//! # fn main() -> Result<(), lesion_labels::PrepError> {
//! use lesion_labels::{Pipeline, PipelineConfig};
//!
//! let report = Pipeline::new(PipelineConfig::default().with_seed(7))?.run()?;
//! println!("{} labeled training images", report.labeled.num_rows);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod labels;
pub mod manifest;
pub mod pipeline;
pub mod split;

pub use config::PipelineConfig;
pub use error::PrepError;
pub use labels::{
    CanonicalRecord, LabelCanonicalizer, LabelSchema, LabelSchemaBuilder, LabelSummary,
    OneHotTable, Strictness,
};
pub use manifest::{write_index, ManifestBuilder, WrittenManifest};
pub use pipeline::{DatasetSplit, Pipeline, PipelineReport};
pub use split::{SplitAssignment, StratifiedSplitter};

pub fn init_logger() {
    env_logger::init();
}
