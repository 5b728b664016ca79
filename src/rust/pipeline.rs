use std::fs;
use std::path::PathBuf;

use log::info;

use crate::config::PipelineConfig;
use crate::error::PrepError;
use crate::labels::{read_one_hot_csv, CanonicalRecord, LabelCanonicalizer, LabelSummary};
use crate::manifest::{write_index, ManifestBuilder, WrittenManifest};
use crate::split::{SplitAssignment, StratifiedSplitter};

pub const TRAIN_LABELED_INDEX_FILE: &str = "train_labeled_idx.csv";
pub const TRAIN_LABELED_MANIFEST_FILE: &str = "train_labeled.csv";
pub const TRAIN_UNLABELED_MANIFEST_FILE: &str = "train_unlabeled.csv";

/// The dataset partitions shipped with the ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetSplit {
    Train,
    Val,
    Test,
}

impl DatasetSplit {
    pub const ALL: [DatasetSplit; 3] = [DatasetSplit::Train, DatasetSplit::Val, DatasetSplit::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Val => "val",
            DatasetSplit::Test => "test",
        }
    }

    /// One-hot input file, e.g. `train_labels.csv`
    pub fn labels_file(&self) -> String {
        format!("{}_labels.csv", self.as_str())
    }

    /// Canonical index output file, e.g. `train_idx.csv`
    pub fn index_file(&self) -> String {
        format!("{}_idx.csv", self.as_str())
    }
}

/// What a pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub splits: Vec<(DatasetSplit, LabelSummary)>,
    pub labeled: LabelSummary,
    pub unlabeled: LabelSummary,
    pub manifests: Vec<WrittenManifest>,
}

/// Runs canonicalization for every dataset split and the labeled/unlabeled
/// split of the training set, writing all outputs into the label directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    canonicalizer: LabelCanonicalizer,
    splitter: StratifiedSplitter,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PrepError> {
        config.validate()?;
        let canonicalizer =
            LabelCanonicalizer::new(config.schema.clone()).with_strictness(config.strictness);
        let splitter = StratifiedSplitter::new(config.unlabeled_fraction, config.seed)?;
        Ok(Self {
            config,
            canonicalizer,
            splitter,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn label_path(&self, file_name: &str) -> PathBuf {
        self.config.label_dir.join(file_name)
    }

    fn manifest_builder(&self, split: DatasetSplit) -> Result<ManifestBuilder, PrepError> {
        ManifestBuilder::new(self.config.image_dir(split)).with_extension(&self.config.image_extension)
    }

    /// Reads `{split}_labels.csv` and canonicalizes it
    pub fn load_split(&self, split: DatasetSplit) -> Result<Vec<CanonicalRecord>, PrepError> {
        let path = self.label_path(&split.labels_file());
        info!("Loading {} labels from {:?}", split.as_str(), path);
        let table = read_one_hot_csv(&path, self.canonicalizer.schema())?;
        self.canonicalizer.canonicalize(&table)
    }

    /// Partitions the canonicalized training records into labeled and unlabeled subsets
    pub fn split_training(&self, train: &[CanonicalRecord]) -> Result<SplitAssignment, PrepError> {
        self.splitter.split(train, &self.config.schema)
    }

    /// Writes the labeled index, labeled manifest and unlabeled manifest for a training split
    pub fn write_training_split(
        &self,
        train: &[CanonicalRecord],
        assignment: &SplitAssignment,
    ) -> Result<Vec<WrittenManifest>, PrepError> {
        let labeled = assignment.labeled_records(train);
        let unlabeled = assignment.unlabeled_records(train);
        let builder = self.manifest_builder(DatasetSplit::Train)?;

        Ok(vec![
            write_index(&self.label_path(TRAIN_LABELED_INDEX_FILE), labeled.iter().copied())?,
            builder.write_labeled(
                &self.label_path(TRAIN_LABELED_MANIFEST_FILE),
                labeled.iter().copied(),
            )?,
            builder.write_unlabeled(
                &self.label_path(TRAIN_UNLABELED_MANIFEST_FILE),
                unlabeled.iter().copied(),
            )?,
        ])
    }

    /// Runs every stage. All inputs are read and the training split is computed
    /// before any file is written.
    pub fn run(&self) -> Result<PipelineReport, PrepError> {
        info!("=== Preparing labels in {:?} ===", self.config.label_dir);
        let schema = &self.config.schema;

        let mut loaded = Vec::with_capacity(DatasetSplit::ALL.len());
        for split in DatasetSplit::ALL {
            let records = self.load_split(split)?;
            let summary = LabelSummary::from_records(&records, schema);
            info!(
                "{}: {} rows, class counts {:?}",
                split.as_str(),
                summary.num_rows,
                summary.class_counts
            );
            loaded.push((split, records, summary));
        }

        let train = &loaded[0].1;
        let assignment = self.split_training(train)?;

        fs::create_dir_all(&self.config.label_dir)
            .map_err(|e| PrepError::io(&self.config.label_dir, e))?;

        let mut manifests = Vec::new();
        for (split, records, _) in &loaded {
            manifests.push(write_index(&self.label_path(&split.index_file()), records)?);
        }
        manifests.extend(self.write_training_split(train, &assignment)?);

        let labeled: Vec<CanonicalRecord> =
            assignment.labeled_records(train).into_iter().cloned().collect();
        let unlabeled: Vec<CanonicalRecord> =
            assignment.unlabeled_records(train).into_iter().cloned().collect();

        info!("=== Wrote {} files ===", manifests.len());
        Ok(PipelineReport {
            splits: loaded
                .into_iter()
                .map(|(split, _, summary)| (split, summary))
                .collect(),
            labeled: LabelSummary::from_records(&labeled, schema),
            unlabeled: LabelSummary::from_records(&unlabeled, schema),
            manifests,
        })
    }
}
