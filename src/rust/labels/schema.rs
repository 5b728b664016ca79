use std::sync::Arc;

use crate::error::PrepError;

/// Category columns of the ISIC 2018 Task 3 ground truth, in index order.
pub const ISIC2018_CATEGORIES: [&str; 7] = ["MEL", "NV", "BCC", "AKIEC", "BKL", "DF", "VASC"];

/// An ordered list of category names.
///
/// The integer index of a category is its position in the schema. The same
/// schema value must be used for every dataset split so that `label_idx`
/// means the same thing in train, validation and test outputs.
///
/// Cloning is cheap; the category list is shared behind an `Arc`.
///
/// # Example
/// ```
/// use lesion_labels::LabelSchema;
///
/// let schema = LabelSchema::isic2018();
/// assert_eq!(schema.index_of("NV"), Some(1));
/// assert_eq!(schema.name_of(6), Some("VASC"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSchema {
    categories: Arc<[String]>,
}

impl LabelSchema {
    /// Creates a new LabelSchemaBuilder for fluent construction
    pub fn builder() -> LabelSchemaBuilder {
        LabelSchemaBuilder::new()
    }

    /// Creates a schema from an ordered list of category names
    ///
    /// # Returns
    /// * `Err(PrepError::InvalidSchema)` if the list is empty, contains an empty
    ///   name, or repeats a name
    pub fn new<I, S>(categories: I) -> Result<Self, PrepError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        categories
            .into_iter()
            .try_fold(Self::builder(), |builder, name| builder.add_category(name))?
            .build()
    }

    /// The seven-category schema used by the ISIC 2018 lesion diagnosis task
    pub fn isic2018() -> Self {
        Self {
            categories: ISIC2018_CATEGORIES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Returns the index of `name`, or `None` if it is not part of the schema
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == name)
    }

    /// Returns the category name at `index`
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.categories.get(index).map(String::as_str)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }
}

impl Default for LabelSchema {
    fn default() -> Self {
        Self::isic2018()
    }
}

/// A builder for constructing a LabelSchema one category at a time.
#[derive(Default, Debug)]
pub struct LabelSchemaBuilder {
    categories: Vec<String>,
}

impl LabelSchemaBuilder {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    /// Appends a category; its index is the number of categories added before it
    ///
    /// # Returns
    /// * `Err(PrepError::InvalidSchema)` if the name is empty, has surrounding
    ///   whitespace, or was already added
    pub fn add_category(mut self, name: impl Into<String>) -> Result<Self, PrepError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PrepError::InvalidSchema("Category name cannot be empty".into()));
        }
        if name.trim() != name {
            return Err(PrepError::InvalidSchema(format!(
                "Category name '{}' has leading or trailing whitespace",
                name
            )));
        }
        if self.categories.contains(&name) {
            return Err(PrepError::InvalidSchema(format!(
                "Category '{}' is listed more than once",
                name
            )));
        }
        self.categories.push(name);
        Ok(self)
    }

    pub fn build(self) -> Result<LabelSchema, PrepError> {
        if self.categories.is_empty() {
            return Err(PrepError::InvalidSchema(
                "At least one category must be added".to_string(),
            ));
        }
        Ok(LabelSchema {
            categories: self.categories.into(),
        })
    }
}
