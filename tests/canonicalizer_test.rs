use lesion_labels::labels::read_one_hot_csv;
use lesion_labels::{LabelCanonicalizer, LabelSchema, OneHotTable, PrepError, Strictness};
use env_logger::{Builder, Env};
use std::fs;
use tempfile::TempDir;

// Initialize test logger
fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .try_init();
}

fn one_hot(schema: &LabelSchema, label: &str) -> Vec<f32> {
    let mut row = vec![0.0; schema.len()];
    row[schema.index_of(label).unwrap()] = 1.0;
    row
}

#[test]
fn test_nv_row_maps_to_index_one() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let schema = LabelSchema::isic2018();
    let table = OneHotTable::from_rows(
        &schema,
        vec![("image001", vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0])],
    )?;
    let records = LabelCanonicalizer::new(schema).canonicalize(&table)?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].image_id, "image001");
    assert_eq!(records[0].label, "NV");
    assert_eq!(records[0].label_idx, 1);
    Ok(())
}

#[test]
fn test_label_index_matches_active_position() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let schema = LabelSchema::isic2018();
    let labels = ["VASC", "MEL", "BKL", "NV", "AKIEC", "DF", "BCC", "NV"];
    let rows = labels
        .iter()
        .enumerate()
        .map(|(i, label)| (format!("ISIC_{:07}", i), one_hot(&schema, label)))
        .collect();
    let table = OneHotTable::from_rows(&schema, rows)?;
    let records = LabelCanonicalizer::new(schema.clone()).canonicalize(&table)?;

    for (record, expected) in records.iter().zip(labels) {
        assert_eq!(record.label, expected);
        assert_eq!(schema.name_of(record.label_idx), Some(expected));
    }
    // Row order is preserved
    assert_eq!(records[0].image_id, "ISIC_0000000");
    assert_eq!(records[7].image_id, "ISIC_0000007");
    Ok(())
}

#[test]
fn test_same_schema_gives_consistent_indices_across_files() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = TempDir::new()?;
    let schema = LabelSchema::isic2018();
    // Column order differs between the two files
    let train = dir.path().join("train_labels.csv");
    fs::write(&train, "image,MEL,NV,BCC,AKIEC,BKL,DF,VASC\nt1,0,0,0,0,0,1,0\n")?;
    let val = dir.path().join("val_labels.csv");
    fs::write(&val, "image,VASC,DF,BKL,AKIEC,BCC,NV,MEL\nv1,0,1,0,0,0,0,0\n")?;

    let canonicalizer = LabelCanonicalizer::new(schema.clone());
    let train_records = canonicalizer.canonicalize(&read_one_hot_csv(&train, &schema)?)?;
    let val_records = canonicalizer.canonicalize(&read_one_hot_csv(&val, &schema)?)?;
    assert_eq!(train_records[0].label, "DF");
    assert_eq!(val_records[0].label, "DF");
    assert_eq!(train_records[0].label_idx, val_records[0].label_idx);
    assert_eq!(train_records[0].label_idx, 5);
    Ok(())
}

#[test]
fn test_strict_mode_names_offending_image() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = TempDir::new()?;
    let schema = LabelSchema::isic2018();
    let path = dir.path().join("test_labels.csv");
    fs::write(
        &path,
        "image,MEL,NV,BCC,AKIEC,BKL,DF,VASC\n\
         ISIC_ok,1.0,0.0,0.0,0.0,0.0,0.0,0.0\n\
         ISIC_multi,1.0,1.0,0.0,0.0,0.0,0.0,0.0\n",
    )?;
    let table = read_one_hot_csv(&path, &schema)?;

    let err = LabelCanonicalizer::new(schema.clone())
        .canonicalize(&table)
        .unwrap_err();
    match &err {
        PrepError::SchemaViolation { image_id, .. } => assert_eq!(image_id, "ISIC_multi"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("ISIC_multi"));

    let records = LabelCanonicalizer::new(schema)
        .with_strictness(Strictness::Warn)
        .canonicalize(&table)?;
    assert_eq!(records[1].label, "MEL");
    assert_eq!(records[1].label_idx, 0);
    Ok(())
}

#[test]
fn test_custom_schema() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let schema = LabelSchema::builder()
        .add_category("benign")?
        .add_category("malignant")?
        .build()?;
    let table = OneHotTable::from_rows(&schema, vec![("a", vec![0.0, 1.0])])?;
    let records = LabelCanonicalizer::new(schema).canonicalize(&table)?;
    assert_eq!(records[0].label, "malignant");
    assert_eq!(records[0].label_idx, 1);
    Ok(())
}
