use serde::Deserialize;

use super::encoding::PriceQuery;

/// Body of `POST /predict_home_price`, accepted as JSON or form fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimateRequest {
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub area_in_sqft: Option<NumericField>,
    #[serde(default)]
    pub age_of_property: Option<NumericField>,
    #[serde(default)]
    pub bedrooms: Option<NumericField>,
}

/// Numbers arrive as JSON numbers or, from forms, as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    /// `None` for blank text so the field falls back to its default.
    fn value(&self, field: &'static str) -> Result<Option<f64>, ValidationError> {
        match self {
            NumericField::Number(value) => Ok(Some(*value)),
            NumericField::Text(raw) if raw.trim().is_empty() => Ok(None),
            NumericField::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| ValidationError::NotANumber {
                    field,
                    value: raw.clone(),
                }),
        }
    }
}

impl EstimateRequest {
    /// Records one text field from a multipart body. Unknown names are ignored.
    pub fn set_text_field(&mut self, name: &str, value: String) {
        match name {
            "locality" => self.locality = Some(value),
            "property_type" => self.property_type = Some(value),
            "area_in_sqft" => self.area_in_sqft = Some(NumericField::Text(value)),
            "age_of_property" => self.age_of_property = Some(NumericField::Text(value)),
            "bedrooms" => self.bedrooms = Some(NumericField::Text(value)),
            _ => {}
        }
    }

    pub fn into_query(self) -> Result<PriceQuery, ValidationError> {
        let locality = required(self.locality).ok_or(ValidationError::MissingCategory)?;
        let property_type = required(self.property_type).ok_or(ValidationError::MissingCategory)?;

        let area_sqft = measurement("area_in_sqft", self.area_in_sqft.as_ref())?;
        let age_years = count("age_of_property", self.age_of_property.as_ref())?;
        let bedrooms = count("bedrooms", self.bedrooms.as_ref())?;

        Ok(PriceQuery {
            locality,
            property_type,
            area_sqft,
            age_years,
            bedrooms,
        })
    }
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn measurement(field: &'static str, raw: Option<&NumericField>) -> Result<f64, ValidationError> {
    let value = match raw {
        Some(raw) => raw.value(field)?.unwrap_or(0.0),
        None => 0.0,
    };

    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::OutOfRange { field });
    }
    Ok(value)
}

fn count(field: &'static str, raw: Option<&NumericField>) -> Result<u32, ValidationError> {
    let value = measurement(field, raw)?;
    if value.fract() != 0.0 {
        return Err(ValidationError::NotAnInteger { field });
    }
    if value > f64::from(u32::MAX) {
        return Err(ValidationError::OutOfRange { field });
    }
    Ok(value as u32)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("locality and property_type are required")]
    MissingCategory,
    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be a whole number")]
    NotAnInteger { field: &'static str },
    #[error("{field} must be a finite, non-negative value")]
    OutOfRange { field: &'static str },
    #[error("{0}")]
    MalformedBody(String),
    #[error("unsupported content type '{0}'; send JSON, form or multipart fields")]
    UnsupportedContentType(String),
}
