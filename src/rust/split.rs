use log::{debug, info};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::PrepError;
use crate::labels::{CanonicalRecord, LabelSchema};

/// Row indices of the two disjoint subsets produced by a stratified split.
///
/// Both lists are sorted ascending, i.e. in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAssignment {
    pub labeled: Vec<usize>,
    pub unlabeled: Vec<usize>,
}

impl SplitAssignment {
    /// Selects the records of the labeled subset.
    ///
    /// Indices past the end of `records` are skipped, so passing a different
    /// slice than the one that was split never panics.
    pub fn labeled_records<'a>(&self, records: &'a [CanonicalRecord]) -> Vec<&'a CanonicalRecord> {
        select(&self.labeled, records)
    }

    /// Selects the records of the unlabeled subset
    pub fn unlabeled_records<'a>(&self, records: &'a [CanonicalRecord]) -> Vec<&'a CanonicalRecord> {
        select(&self.unlabeled, records)
    }
}

fn select<'a>(indices: &[usize], records: &'a [CanonicalRecord]) -> Vec<&'a CanonicalRecord> {
    indices.iter().filter_map(|&i| records.get(i)).collect()
}

/// Splits canonicalized records into labeled and unlabeled subsets, per category.
///
/// Every category present is shuffled on its own ChaCha stream (seeded by
/// `seed`, stream number = label index) and `round(fraction * n)` of its rows,
/// clamped so both subsets receive at least one row, go to the unlabeled subset.
///
/// # Example
/// ```
/// use lesion_labels::{CanonicalRecord, LabelSchema, StratifiedSplitter};
///
/// let records: Vec<CanonicalRecord> = (0..20)
///     .map(|i| CanonicalRecord {
///         image_id: format!("ISIC_{:07}", i),
///         label: if i % 2 == 0 { "MEL" } else { "NV" }.to_string(),
///         label_idx: i % 2,
///     })
///     .collect();
///
/// let split = StratifiedSplitter::new(0.9, 42)?.split(&records, &LabelSchema::isic2018())?;
/// assert_eq!(split.labeled.len(), 2);
/// assert_eq!(split.unlabeled.len(), 18);
/// # Ok::<(), lesion_labels::PrepError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StratifiedSplitter {
    unlabeled_fraction: f64,
    seed: u64,
}

impl StratifiedSplitter {
    /// # Returns
    /// * `Err(PrepError::InvalidConfig)` unless `0 < unlabeled_fraction < 1`
    pub fn new(unlabeled_fraction: f64, seed: u64) -> Result<Self, PrepError> {
        if !(unlabeled_fraction > 0.0 && unlabeled_fraction < 1.0) {
            return Err(PrepError::InvalidConfig(format!(
                "Split fraction must be strictly between 0 and 1, got {}",
                unlabeled_fraction
            )));
        }
        Ok(Self {
            unlabeled_fraction,
            seed,
        })
    }

    pub fn unlabeled_fraction(&self) -> f64 {
        self.unlabeled_fraction
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn split(
        &self,
        records: &[CanonicalRecord],
        schema: &LabelSchema,
    ) -> Result<SplitAssignment, PrepError> {
        let mut strata: Vec<Vec<usize>> = vec![Vec::new(); schema.len()];
        for (row, record) in records.iter().enumerate() {
            let stratum = strata.get_mut(record.label_idx).ok_or_else(|| {
                PrepError::InvalidSchema(format!(
                    "Image '{}' has label index {} outside the schema",
                    record.image_id, record.label_idx
                ))
            })?;
            stratum.push(row);
        }

        // Check every stratum before shuffling anything.
        for (label_idx, rows) in strata.iter().enumerate() {
            if rows.len() == 1 {
                return Err(PrepError::DegenerateStratum {
                    category: schema.name_of(label_idx).unwrap_or_default().to_string(),
                    count: rows.len(),
                });
            }
        }

        let mut labeled = Vec::with_capacity(records.len());
        let mut unlabeled = Vec::with_capacity(records.len());
        for (label_idx, mut rows) in strata.into_iter().enumerate() {
            if rows.is_empty() {
                continue;
            }
            let take = self.unlabeled_count(rows.len());
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            rng.set_stream(label_idx as u64);
            rows.shuffle(&mut rng);

            debug!(
                "Stratum {} ({}): {} rows, {} unlabeled",
                label_idx,
                schema.name_of(label_idx).unwrap_or_default(),
                rows.len(),
                take
            );
            unlabeled.extend_from_slice(&rows[..take]);
            labeled.extend_from_slice(&rows[take..]);
        }

        labeled.sort_unstable();
        unlabeled.sort_unstable();
        info!(
            "Split {} rows into {} labeled and {} unlabeled (fraction {}, seed {})",
            records.len(),
            labeled.len(),
            unlabeled.len(),
            self.unlabeled_fraction,
            self.seed
        );
        Ok(SplitAssignment { labeled, unlabeled })
    }

    /// Unlabeled rows taken from a stratum of `n >= 2` rows
    fn unlabeled_count(&self, n: usize) -> usize {
        let target = (self.unlabeled_fraction * n as f64).round() as usize;
        target.clamp(1, n - 1)
    }
}
