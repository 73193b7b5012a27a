use std::collections::HashSet;
use std::io::Read;

use serde::Deserialize;

/// Number of leading continuous slots: area, age, bedrooms.
pub const NUMERIC_SLOTS: usize = 3;

/// Number of trailing property-type slots.
pub const PROPERTY_TYPE_SLOTS: usize = 3;

/// Numeric slots, at least one locality, and the property-type group.
const MIN_COLUMNS: usize = NUMERIC_SLOTS + 1 + PROPERTY_TYPE_SLOTS;

/// Ordered feature column names shared by the encoder and the trained model.
///
/// Layout: `[area, age, bedrooms, locality.., property_type x3]`. Locality and
/// property-type views are slices of the same list, so order always matches
/// the model's coefficient order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureColumns {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ColumnsDocument {
    data_columns: Vec<String>,
}

impl FeatureColumns {
    pub fn new(names: Vec<String>) -> Result<Self, ColumnsError> {
        if names.len() < MIN_COLUMNS {
            return Err(ColumnsError::TooFew {
                found: names.len(),
                minimum: MIN_COLUMNS,
            });
        }

        let mut seen = HashSet::new();
        for name in &names[NUMERIC_SLOTS..] {
            // Queries are lowercased before lookup.
            if name.chars().any(char::is_uppercase) {
                return Err(ColumnsError::NotLowercase(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ColumnsError::Duplicate(name.clone()));
            }
        }

        Ok(Self { names })
    }

    /// Reads the `{"data_columns": [...]}` document written next to the model.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ColumnsError> {
        let document: ColumnsDocument = serde_json::from_reader(reader)?;
        Self::new(document.data_columns)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn localities(&self) -> &[String] {
        &self.names[NUMERIC_SLOTS..self.property_type_start()]
    }

    pub fn property_types(&self) -> &[String] {
        &self.names[self.property_type_start()..]
    }

    /// Slot holding the one-hot flag for `name`, if it names a category.
    ///
    /// The numeric slots are never returned, so a query for `"bedrooms"`
    /// cannot overwrite a continuous feature.
    pub fn category_slot(&self, name: &str) -> Option<usize> {
        self.names[NUMERIC_SLOTS..]
            .iter()
            .position(|column| column == name)
            .map(|offset| offset + NUMERIC_SLOTS)
    }

    fn property_type_start(&self) -> usize {
        self.names.len() - PROPERTY_TYPE_SLOTS
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ColumnsError {
    #[error("malformed column document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("column list has {found} entries, expected at least {minimum}")]
    TooFew { found: usize, minimum: usize },
    #[error("category column '{0}' appears more than once")]
    Duplicate(String),
    #[error("category column '{0}' must be lowercase")]
    NotLowercase(String),
}
