use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::model::PriceModel;
use super::request::{EstimateRequest, NumericField};
use super::store::{ArtifactStore, EstimateError};

/// Input row, using the same field names as the HTTP estimate endpoint.
#[derive(Debug, Deserialize)]
struct BatchRow {
    #[serde(default)]
    locality: Option<String>,
    #[serde(default)]
    property_type: Option<String>,
    #[serde(default)]
    area_in_sqft: Option<String>,
    #[serde(default)]
    age_of_property: Option<String>,
    #[serde(default)]
    bedrooms: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScoredRow {
    locality: String,
    property_type: String,
    area_in_sqft: String,
    age_of_property: String,
    bedrooms: String,
    estimated_price: Option<f64>,
    error: Option<String>,
}

impl BatchRow {
    fn request(&self) -> EstimateRequest {
        let numeric = |raw: &Option<String>| raw.clone().map(NumericField::Text);
        EstimateRequest {
            locality: self.locality.clone(),
            property_type: self.property_type.clone(),
            area_in_sqft: numeric(&self.area_in_sqft),
            age_of_property: numeric(&self.age_of_property),
            bedrooms: numeric(&self.bedrooms),
        }
    }

    fn scored(self, estimated_price: Option<f64>, error: Option<String>) -> ScoredRow {
        ScoredRow {
            locality: self.locality.unwrap_or_default(),
            property_type: self.property_type.unwrap_or_default(),
            area_in_sqft: self.area_in_sqft.unwrap_or_default(),
            age_of_property: self.age_of_property.unwrap_or_default(),
            bedrooms: self.bedrooms.unwrap_or_default(),
            estimated_price,
            error,
        }
    }
}

/// Row counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub scored: usize,
    pub rejected: usize,
}

/// Scores every CSV row from `reader` and writes the rows plus an
/// `estimated_price` column to `writer`.
///
/// Rows that fail validation or inference are written with an `error` column
/// and counted as rejected. An unloaded store aborts the whole batch.
pub fn score_csv<M, R, W>(
    store: &ArtifactStore<M>,
    reader: R,
    writer: W,
) -> Result<BatchSummary, BatchError>
where
    M: PriceModel,
    R: Read,
    W: Write,
{
    if !store.is_loaded() {
        return Err(BatchError::Estimate(EstimateError::NotInitialized));
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut summary = BatchSummary::default();

    for (index, record) in csv_reader.deserialize::<BatchRow>().enumerate() {
        let row = record?;
        let outcome = row
            .request()
            .into_query()
            .map_err(|err| err.to_string())
            .and_then(|query| store.estimate_price(&query).map_err(|err| err.to_string()));

        let scored = match outcome {
            Ok(price) => {
                summary.scored += 1;
                row.scored(Some(price), None)
            }
            Err(message) => {
                warn!(row = index + 1, error = %message, "batch row rejected");
                summary.rejected += 1;
                row.scored(None, Some(message))
            }
        };
        csv_writer.serialize(scored)?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(summary)
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Estimate(EstimateError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::columns::FeatureColumns;
    use crate::pricing::model::LinearPriceModel;

    fn store() -> ArtifactStore<LinearPriceModel> {
        let columns = FeatureColumns::new(
            ["sqft", "age", "bhk", "kompally", "gachibowli", "apartment", "villa", "plot"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
        )
        .expect("valid columns");
        let model = LinearPriceModel::new(vec![0.05, -0.5, 4.0, 20.0, 35.0, 0.0, 30.0, 10.0], 1.0);
        ArtifactStore::from_parts(columns, model).expect("widths match")
    }

    #[test]
    fn scores_rows_and_flags_invalid_ones() {
        let input = "locality,property_type,area_in_sqft,age_of_property,bedrooms\n\
                     Kompally,Apartment,1000,2,2\n\
                     ,villa,1200,1,3\n\
                     gachibowli,villa,1500,0,3\n";
        let mut output = Vec::new();

        let summary = score_csv(&store(), input.as_bytes(), &mut output).expect("batch runs");

        assert_eq!(
            summary,
            BatchSummary {
                scored: 2,
                rejected: 1
            }
        );

        let text = String::from_utf8(output).expect("utf8 output");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "locality,property_type,area_in_sqft,age_of_property,bedrooms,estimated_price,error"
        );
        assert_eq!(lines[1], "Kompally,Apartment,1000,2,2,78.0,");
        assert!(lines[2].ends_with(",locality and property_type are required"));
        assert_eq!(lines[3], "gachibowli,villa,1500,0,3,153.0,");
    }

    #[test]
    fn unloaded_store_aborts() {
        let store = ArtifactStore::<LinearPriceModel>::uninitialized();
        let err = score_csv(&store, "locality\n".as_bytes(), Vec::new()).expect_err("no model");
        assert!(matches!(
            err,
            BatchError::Estimate(EstimateError::NotInitialized)
        ));
    }
}
