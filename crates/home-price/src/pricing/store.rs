use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use super::columns::{ColumnsError, FeatureColumns};
use super::encoding::{encode, round_price, PriceQuery};
use super::model::{LinearPriceModel, ModelError, PriceModel};

/// Filesystem locations of the two trained artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub columns: PathBuf,
    pub model: PathBuf,
}

/// Column list and model loaded together at startup.
#[derive(Debug)]
struct LoadedArtifacts<M> {
    columns: FeatureColumns,
    model: M,
    loaded_at: DateTime<Utc>,
}

#[derive(Debug)]
enum StoreState<M> {
    Uninitialized,
    Loaded(LoadedArtifacts<M>),
}

/// Read-only holder of the trained artifacts shared by every request.
///
/// A store that failed to load stays `Uninitialized`: listing accessors return
/// empty slices and estimates fail with [`EstimateError::NotInitialized`].
#[derive(Debug)]
pub struct ArtifactStore<M = LinearPriceModel> {
    state: StoreState<M>,
}

/// Counts reported by the readiness probe and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub columns: usize,
    pub localities: usize,
    pub property_types: usize,
    pub loaded_at: DateTime<Utc>,
}

impl<M: PriceModel> ArtifactStore<M> {
    pub fn uninitialized() -> Self {
        Self {
            state: StoreState::Uninitialized,
        }
    }

    /// Pairs an already-built column list with a model of matching width.
    pub fn from_parts(columns: FeatureColumns, model: M) -> Result<Self, LoadError> {
        if model.feature_count() != columns.len() {
            return Err(LoadError::WidthMismatch {
                columns: columns.len(),
                coefficients: model.feature_count(),
            });
        }

        Ok(Self {
            state: StoreState::Loaded(LoadedArtifacts {
                columns,
                model,
                loaded_at: Utc::now(),
            }),
        })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, StoreState::Loaded(_))
    }

    fn loaded(&self) -> Option<&LoadedArtifacts<M>> {
        match &self.state {
            StoreState::Loaded(artifacts) => Some(artifacts),
            StoreState::Uninitialized => None,
        }
    }

    pub fn columns(&self) -> Option<&FeatureColumns> {
        self.loaded().map(|artifacts| &artifacts.columns)
    }

    pub fn model(&self) -> Option<&M> {
        self.loaded().map(|artifacts| &artifacts.model)
    }

    pub fn get_locality_names(&self) -> &[String] {
        self.columns()
            .map(FeatureColumns::localities)
            .unwrap_or_default()
    }

    pub fn get_property_types(&self) -> &[String] {
        self.columns()
            .map(FeatureColumns::property_types)
            .unwrap_or_default()
    }

    pub fn summary(&self) -> Option<ArtifactSummary> {
        self.loaded().map(|artifacts| ArtifactSummary {
            columns: artifacts.columns.len(),
            localities: artifacts.columns.localities().len(),
            property_types: artifacts.columns.property_types().len(),
            loaded_at: artifacts.loaded_at,
        })
    }

    /// Encodes `query` and runs one inference, rounded to two decimals.
    pub fn estimate_price(&self, query: &PriceQuery) -> Result<f64, EstimateError> {
        let artifacts = self.loaded().ok_or(EstimateError::NotInitialized)?;
        let encoded = encode(&artifacts.columns, query);

        if encoded.locality_slot.is_none() {
            debug!(locality = %query.locality, "unknown locality, using baseline encoding");
        }
        if encoded.property_type_slot.is_none() {
            debug!(property_type = %query.property_type, "unknown property type, using baseline encoding");
        }

        let price = round_price(artifacts.model.predict(&encoded.vector)?);
        if !price.is_finite() {
            return Err(ModelError::NonFinite.into());
        }
        Ok(price)
    }
}

impl Default for ArtifactStore<LinearPriceModel> {
    fn default() -> Self {
        Self::uninitialized()
    }
}

impl ArtifactStore<LinearPriceModel> {
    /// Reads the column document and the linear model export from disk.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, LoadError> {
        let columns = FeatureColumns::from_reader(open(&paths.columns)?).map_err(|source| {
            LoadError::Columns {
                path: paths.columns.clone(),
                source,
            }
        })?;

        let model = LinearPriceModel::from_reader(open(&paths.model)?).map_err(|source| {
            LoadError::Model {
                path: paths.model.clone(),
                source,
            }
        })?;

        if let Some(names) = model.feature_names() {
            if names != columns.names() {
                return Err(LoadError::FeatureNames {
                    path: paths.model.clone(),
                });
            }
        }

        Self::from_parts(columns, model)
    }

    /// Loads the artifacts, or logs the failure and returns an empty store.
    ///
    /// The service keeps answering requests either way; queries against an
    /// empty store fail individually.
    pub fn load_or_degraded(paths: &ArtifactPaths) -> Self {
        info!(columns = %paths.columns.display(), model = %paths.model.display(), "loading saved artifacts");
        match Self::load(paths) {
            Ok(store) => {
                if let Some(summary) = store.summary() {
                    info!(
                        columns = summary.columns,
                        localities = summary.localities,
                        property_types = summary.property_types,
                        "artifacts loaded"
                    );
                }
                store
            }
            Err(err) => {
                error!(error = %err, "failed to load saved artifacts, serving degraded");
                Self::uninitialized()
            }
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read artifact {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid column list {}: {source}", path.display())]
    Columns { path: PathBuf, source: ColumnsError },
    #[error("invalid model export {}: {source}", path.display())]
    Model {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("model feature names in {} do not match the column list", path.display())]
    FeatureNames { path: PathBuf },
    #[error("column list has {columns} entries but the model has {coefficients} coefficients")]
    WidthMismatch { columns: usize, coefficients: usize },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EstimateError {
    #[error("price model is not loaded")]
    NotInitialized,
    #[error(transparent)]
    Model(#[from] ModelError),
}
