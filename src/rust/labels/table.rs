use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::{Array2, ArrayView1};

use super::schema::LabelSchema;
use crate::error::PrepError;

/// Header of the image identifier column in the ground-truth files.
pub const IMAGE_COLUMN: &str = "image";

/// Image identifiers paired with a row-per-image one-hot matrix.
///
/// Column `j` of `one_hot` holds the indicator for `schema.name_of(j)`.
#[derive(Debug, Clone)]
pub struct OneHotTable {
    image_ids: Vec<String>,
    one_hot: Array2<f32>,
}

impl OneHotTable {
    /// Builds a table from in-memory rows
    ///
    /// # Returns
    /// * `Err(PrepError::InvalidSchema)` if a row's width differs from the schema length
    pub fn from_rows<S: Into<String>>(
        schema: &LabelSchema,
        rows: Vec<(S, Vec<f32>)>,
    ) -> Result<Self, PrepError> {
        let width = schema.len();
        let mut image_ids = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len() * width);
        for (image_id, row) in rows {
            let image_id = image_id.into();
            if row.len() != width {
                return Err(PrepError::InvalidSchema(format!(
                    "Row for image '{}' has {} values, schema has {} categories",
                    image_id,
                    row.len(),
                    width
                )));
            }
            image_ids.push(image_id);
            values.extend(row);
        }
        let one_hot = Array2::from_shape_vec((image_ids.len(), width), values)
            .map_err(|e| PrepError::InvalidSchema(e.to_string()))?;
        Ok(Self { image_ids, one_hot })
    }

    pub fn len(&self) -> usize {
        self.image_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_ids.is_empty()
    }

    pub fn image_ids(&self) -> &[String] {
        &self.image_ids
    }

    pub fn one_hot(&self) -> &Array2<f32> {
        &self.one_hot
    }

    /// Iterates `(image_id, one-hot row)` pairs in file order
    pub fn rows(&self) -> impl Iterator<Item = (&str, ArrayView1<'_, f32>)> {
        self.image_ids
            .iter()
            .map(String::as_str)
            .zip(self.one_hot.rows())
    }
}

/// Reads a one-hot ground-truth CSV file.
///
/// The file must have a header row containing `image` and one column per
/// schema category. Columns are located by name, so their order in the file
/// does not matter and any extra columns are ignored.
pub fn read_one_hot_csv(path: &Path, schema: &LabelSchema) -> Result<OneHotTable, PrepError> {
    if !path.is_file() {
        return Err(PrepError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|e| PrepError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = reader.headers().map_err(|e| PrepError::csv(path, e))?.clone();
    let column_of = |name: &str| -> Result<usize, PrepError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PrepError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let image_col = column_of(IMAGE_COLUMN)?;
    let label_cols = schema
        .iter()
        .map(column_of)
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Column layout for {:?}: image={}, labels={:?}", path, image_col, label_cols);

    let mut image_ids = Vec::new();
    let mut values = Vec::new();
    let mut seen = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| PrepError::csv(path, e))?;
        let image_id = record.get(image_col).unwrap_or_default().trim().to_string();
        if image_id.is_empty() {
            return Err(malformed(path, "", IMAGE_COLUMN, ""));
        }
        if !seen.insert(image_id.clone()) {
            return Err(PrepError::DuplicateImage {
                path: path.to_path_buf(),
                image_id,
            });
        }
        for (&col, category) in label_cols.iter().zip(schema.iter()) {
            let raw = record.get(col).unwrap_or_default().trim();
            let value = raw.parse::<f32>().map_err(|_| malformed(path, &image_id, category, raw))?;
            values.push(value);
        }
        image_ids.push(image_id);
    }

    let one_hot = Array2::from_shape_vec((image_ids.len(), schema.len()), values)
        .map_err(|e| PrepError::InvalidSchema(e.to_string()))?;
    info!("Read {} rows from {:?}", image_ids.len(), path);
    Ok(OneHotTable { image_ids, one_hot })
}

fn malformed(path: &Path, image_id: &str, column: &str, value: &str) -> PrepError {
    PrepError::MalformedValue {
        path: PathBuf::from(path),
        image_id: image_id.to_string(),
        column: column.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_float_encoded_ground_truth() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "train_labels.csv",
            "image,MEL,NV,BCC,AKIEC,BKL,DF,VASC\n\
             ISIC_0024306,0.0,1.0,0.0,0.0,0.0,0.0,0.0\n\
             ISIC_0024307,1.0,0.0,0.0,0.0,0.0,0.0,0.0\n",
        );
        let table = read_one_hot_csv(&path, &LabelSchema::isic2018()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.image_ids()[0], "ISIC_0024306");
        assert_eq!(table.one_hot()[[0, 1]], 1.0);
        assert_eq!(table.one_hot()[[1, 0]], 1.0);
    }

    #[test]
    fn test_columns_matched_by_name() {
        let dir = TempDir::new().unwrap();
        let schema = LabelSchema::new(["A", "B"]).unwrap();
        let path = write(&dir, "labels.csv", "B,extra,image,A\n1,x,img1,0\n");
        let table = read_one_hot_csv(&path, &schema).unwrap();
        let (id, row) = table.rows().next().unwrap();
        assert_eq!(id, "img1");
        assert_eq!(row.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "labels.csv", "image,MEL,NV\nimg1,1,0\n");
        let err = read_one_hot_csv(&path, &LabelSchema::isic2018()).unwrap_err();
        match err {
            PrepError::MissingColumn { column, .. } => assert_eq!(column, "BCC"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_one_hot_csv(&dir.path().join("nope.csv"), &LabelSchema::isic2018())
            .unwrap_err();
        assert!(matches!(err, PrepError::MissingFile { .. }));
    }

    #[test]
    fn test_duplicate_and_malformed_rows() {
        let dir = TempDir::new().unwrap();
        let schema = LabelSchema::new(["A", "B"]).unwrap();
        let dup = write(&dir, "dup.csv", "image,A,B\nimg1,1,0\nimg1,0,1\n");
        assert!(matches!(
            read_one_hot_csv(&dup, &schema),
            Err(PrepError::DuplicateImage { .. })
        ));
        let bad = write(&dir, "bad.csv", "image,A,B\nimg1,yes,0\n");
        assert!(matches!(
            read_one_hot_csv(&bad, &schema),
            Err(PrepError::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_from_rows_checks_width() {
        let schema = LabelSchema::new(["A", "B"]).unwrap();
        assert!(OneHotTable::from_rows(&schema, vec![("img1", vec![1.0])]).is_err());
        let table = OneHotTable::from_rows(&schema, vec![("img1", vec![1.0, 0.0])]).unwrap();
        assert_eq!(table.one_hot().dim(), (1, 2));
    }
}
