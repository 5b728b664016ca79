mod canonicalizer;
pub mod schema;
pub mod table;

pub use canonicalizer::{class_counts, first_argmax, CanonicalRecord, LabelCanonicalizer, Strictness};
pub use schema::{LabelSchema, LabelSchemaBuilder, ISIC2018_CATEGORIES};
pub use table::{read_one_hot_csv, OneHotTable, IMAGE_COLUMN};

/// Per-split summary of canonicalized labels
#[derive(Debug, Clone)]
pub struct LabelSummary {
    /// Number of rows in the split
    pub num_rows: usize,
    /// Row count per category, indexed by label index
    pub class_counts: Vec<usize>,
}

impl LabelSummary {
    pub fn from_records(records: &[CanonicalRecord], schema: &LabelSchema) -> Self {
        Self {
            num_rows: records.len(),
            class_counts: class_counts(records, schema),
        }
    }
}
