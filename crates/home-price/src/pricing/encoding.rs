use super::columns::FeatureColumns;

/// Validated inputs for a single price estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuery {
    pub locality: String,
    pub property_type: String,
    pub area_sqft: f64,
    pub age_years: u32,
    pub bedrooms: u32,
}

/// Model input built from a query, plus which category slots matched.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatures {
    pub vector: Vec<f64>,
    pub locality_slot: Option<usize>,
    pub property_type_slot: Option<usize>,
}

/// Builds the dense feature vector for `query`.
///
/// Category names are matched case-insensitively against the column list.
/// An unmatched category leaves every slot of its group at zero.
pub fn encode(columns: &FeatureColumns, query: &PriceQuery) -> EncodedFeatures {
    let locality_slot = columns.category_slot(&query.locality.to_lowercase());
    let property_type_slot = columns.category_slot(&query.property_type.to_lowercase());

    let mut vector = vec![0.0; columns.len()];
    vector[0] = query.area_sqft;
    vector[1] = f64::from(query.age_years);
    vector[2] = f64::from(query.bedrooms);

    for slot in [locality_slot, property_type_slot].into_iter().flatten() {
        vector[slot] = 1.0;
    }

    EncodedFeatures {
        vector,
        locality_slot,
        property_type_slot,
    }
}

/// Rounds a raw model output to two decimal places.
///
/// Values too large to scale by 100 are already far past cent precision and
/// are returned unchanged.
pub fn round_price(raw: f64) -> f64 {
    let cents = raw * 100.0;
    if cents.is_finite() {
        cents.round() / 100.0
    } else {
        raw
    }
}
