use crate::cli::ArtifactArgs;
use clap::Args;
use home_price::config::AppConfig;
use home_price::error::AppError;
use home_price::pricing::{
    score_csv, ArtifactPaths, ArtifactStore, EstimateRequest, NumericField,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// Locality name as listed by the catalog command (case-insensitive)
    #[arg(long)]
    pub(crate) locality: String,
    /// Property type, e.g. apartment or villa (case-insensitive)
    #[arg(long)]
    pub(crate) property_type: String,
    /// Built-up area in square feet
    #[arg(long, default_value_t = 0.0)]
    pub(crate) area: f64,
    /// Age of the property in years
    #[arg(long, default_value_t = 0)]
    pub(crate) age: u32,
    /// Number of bedrooms
    #[arg(long, default_value_t = 0)]
    pub(crate) bedrooms: u32,
    #[command(flatten)]
    pub(crate) artifacts: ArtifactArgs,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV with locality, property_type, area_in_sqft, age_of_property, bedrooms columns
    #[arg(long)]
    pub(crate) input: PathBuf,
    #[command(flatten)]
    pub(crate) artifacts: ArtifactArgs,
}

/// Resolves artifact locations from the environment, honoring `--artifacts-dir`.
pub(crate) fn artifact_paths(args: &ArtifactArgs) -> Result<ArtifactPaths, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = &args.artifacts_dir {
        config.artifacts.directory = dir.clone();
    }
    Ok(config.artifacts.paths())
}

pub(crate) fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let store = ArtifactStore::load(&artifact_paths(&args.artifacts)?)?;

    // Same validation path as the HTTP endpoint.
    let query = EstimateRequest {
        locality: Some(args.locality),
        property_type: Some(args.property_type),
        area_in_sqft: Some(NumericField::Number(args.area)),
        age_of_property: Some(NumericField::Number(f64::from(args.age))),
        bedrooms: Some(NumericField::Number(f64::from(args.bedrooms))),
    }
    .into_query()?;

    let price = store.estimate_price(&query)?;
    println!(
        "{} / {} / {} sqft / {} yrs / {} bed: {price:.2}",
        query.locality, query.property_type, query.area_sqft, query.age_years, query.bedrooms
    );
    Ok(())
}

pub(crate) fn run_catalog(args: ArtifactArgs) -> Result<(), AppError> {
    let store = ArtifactStore::load(&artifact_paths(&args)?)?;

    if let Some(summary) = store.summary() {
        println!(
            "Model artifacts: {} columns, loaded {}",
            summary.columns,
            summary.loaded_at.to_rfc3339()
        );
    }

    println!("\nLocalities ({})", store.get_locality_names().len());
    for locality in store.get_locality_names() {
        println!("  - {locality}");
    }

    println!("\nProperty types ({})", store.get_property_types().len());
    for property_type in store.get_property_types() {
        println!("  - {property_type}");
    }

    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let store = ArtifactStore::load(&artifact_paths(&args.artifacts)?)?;
    let reader = BufReader::new(File::open(&args.input)?);

    let summary = score_csv(&store, reader, io::stdout().lock())?;
    eprintln!(
        "Scored {} rows ({} rejected)",
        summary.scored, summary.rejected
    );
    Ok(())
}
