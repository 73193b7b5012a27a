//! Price estimation over a trained regression model.
//!
//! The column list and model are loaded once into an [`ArtifactStore`] and
//! shared read-only by every request. Queries are one-hot encoded against the
//! column list and scored with a single model call.

pub mod batch;
pub mod columns;
pub mod encoding;
pub mod model;
pub mod request;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use batch::{score_csv, BatchError, BatchSummary};
pub use columns::{ColumnsError, FeatureColumns};
pub use encoding::{encode, round_price, EncodedFeatures, PriceQuery};
pub use model::{LinearPriceModel, ModelError, PriceModel};
pub use request::{EstimateRequest, NumericField, ValidationError};
pub use router::{pricing_router, PricingContext};
pub use store::{ArtifactPaths, ArtifactStore, ArtifactSummary, EstimateError, LoadError};
