use log::{info, warn};
use ndarray::ArrayView1;
use serde::Serialize;

use super::schema::LabelSchema;
use super::table::OneHotTable;
use crate::error::PrepError;

/// How rows that break the one-hot invariant are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Fail on the first row that is not exactly one-hot
    #[default]
    Strict,
    /// Log a warning naming the image and keep the first maximal position
    Warn,
}

/// A single image with its categorical label.
///
/// Serializes to the `image,label,label_idx` columns of the index files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    #[serde(rename = "image")]
    pub image_id: String,
    pub label: String,
    pub label_idx: usize,
}

/// Converts one-hot label rows into `(label, label_idx)` pairs using a fixed schema.
#[derive(Debug, Clone)]
pub struct LabelCanonicalizer {
    schema: LabelSchema,
    strictness: Strictness,
}

impl LabelCanonicalizer {
    pub fn new(schema: LabelSchema) -> Self {
        Self {
            schema,
            strictness: Strictness::default(),
        }
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn schema(&self) -> &LabelSchema {
        &self.schema
    }

    /// Canonicalizes every row of `table`, preserving row order
    pub fn canonicalize(&self, table: &OneHotTable) -> Result<Vec<CanonicalRecord>, PrepError> {
        if table.one_hot().ncols() != self.schema.len() {
            return Err(PrepError::InvalidSchema(format!(
                "Table has {} label columns, schema has {} categories",
                table.one_hot().ncols(),
                self.schema.len()
            )));
        }
        let records = table
            .rows()
            .map(|(image_id, row)| self.canonicalize_row(image_id, row))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Canonicalized {} rows", records.len());
        Ok(records)
    }

    /// Canonicalizes a single one-hot row
    ///
    /// The label index is the first position holding the row maximum. Rows
    /// that are not exactly one-hot are rejected under `Strictness::Strict`.
    pub fn canonicalize_row(
        &self,
        image_id: &str,
        row: ArrayView1<'_, f32>,
    ) -> Result<CanonicalRecord, PrepError> {
        if let Err(reason) = check_one_hot(row) {
            match self.strictness {
                Strictness::Strict => {
                    return Err(PrepError::SchemaViolation {
                        image_id: image_id.to_string(),
                        reason,
                    })
                }
                Strictness::Warn => warn!("Image '{}': {}; using first maximum", image_id, reason),
            }
        }

        let label_idx = first_argmax(row).ok_or_else(|| PrepError::SchemaViolation {
            image_id: image_id.to_string(),
            reason: "row has no comparable label values".to_string(),
        })?;
        let label = self
            .schema
            .name_of(label_idx)
            .ok_or_else(|| PrepError::InvalidSchema(format!("No category at index {}", label_idx)))?;

        Ok(CanonicalRecord {
            image_id: image_id.to_string(),
            label: label.to_string(),
            label_idx,
        })
    }
}

/// Returns the lowest index holding the maximum value.
/// NaN entries never win; `None` if no entry is comparable.
pub fn first_argmax(row: ArrayView1<'_, f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in row.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

fn check_one_hot(row: ArrayView1<'_, f32>) -> Result<(), String> {
    if let Some(v) = row.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(format!("value {} is not 0 or 1", v));
    }
    match row.iter().filter(|&&v| v == 1.0).count() {
        1 => Ok(()),
        0 => Err("no active category".to_string()),
        n => Err(format!("{} active categories", n)),
    }
}

/// Counts records per schema category, indexed by `label_idx`
pub fn class_counts(records: &[CanonicalRecord], schema: &LabelSchema) -> Vec<usize> {
    let mut counts = vec![0; schema.len()];
    for record in records {
        if let Some(count) = counts.get_mut(record.label_idx) {
            *count += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    fn canonicalizer() -> LabelCanonicalizer {
        LabelCanonicalizer::new(LabelSchema::isic2018())
    }

    #[test]
    fn test_single_active_category() {
        let row = arr1(&[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let record = canonicalizer().canonicalize_row("image001", row.view()).unwrap();
        assert_eq!(record.label, "NV");
        assert_eq!(record.label_idx, 1);
        assert_eq!(record.image_id, "image001");
    }

    #[test]
    fn test_every_position_maps_to_schema_name() {
        let schema = LabelSchema::isic2018();
        let c = canonicalizer();
        for idx in 0..schema.len() {
            let mut values = vec![0.0; schema.len()];
            values[idx] = 1.0;
            let record = c.canonicalize_row("img", arr1(values.as_slice()).view()).unwrap();
            assert_eq!(record.label_idx, idx);
            assert_eq!(Some(record.label.as_str()), schema.name_of(idx));
        }
    }

    #[test]
    fn test_strict_rejects_invalid_rows() {
        let c = canonicalizer();
        let zeros = arr1(&[0.0; 7]);
        let multi = arr1(&[1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let fractional = arr1(&[0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0]);
        for row in [zeros, multi, fractional] {
            match c.canonicalize_row("ISIC_bad", row.view()) {
                Err(PrepError::SchemaViolation { image_id, .. }) => assert_eq!(image_id, "ISIC_bad"),
                other => panic!("expected schema violation, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_warn_uses_first_maximum() {
        let c = canonicalizer().with_strictness(Strictness::Warn);
        let multi = arr1(&[0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(c.canonicalize_row("img", multi.view()).unwrap().label, "BCC");
        let zeros = arr1(&[0.0; 7]);
        assert_eq!(c.canonicalize_row("img", zeros.view()).unwrap().label_idx, 0);
    }

    #[test]
    fn test_first_argmax_ties_and_nan() {
        assert_eq!(first_argmax(arr1(&[0.2, 0.7, 0.7]).view()), Some(1));
        assert_eq!(first_argmax(arr1(&[f32::NAN, 0.0, 1.0]).view()), Some(2));
        assert_eq!(first_argmax(arr1::<f32>(&[]).view()), None);
    }

    #[test]
    fn test_class_counts() {
        let schema = LabelSchema::isic2018();
        let table = OneHotTable::from_rows(
            &schema,
            vec![
                ("a", vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ("b", vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                ("c", vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
            ],
        )
        .unwrap();
        let records = canonicalizer().canonicalize(&table).unwrap();
        assert_eq!(class_counts(&records, &schema), vec![0, 2, 0, 0, 0, 0, 1]);
    }
}
