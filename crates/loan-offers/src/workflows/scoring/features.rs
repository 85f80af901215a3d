use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Upper bound on missing column names echoed back in a validation error.
pub const MAX_REPORTED_MISSING: usize = 10;

/// Numeric feature encoding of one applicant, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Single model input row with an explicit column order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedFeatureVector {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl OrderedFeatureVector {
    pub fn from_columns(columns: Vec<String>, values: Vec<f64>) -> Option<Self> {
        (columns.len() == values.len()).then_some(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{}", missing_message(.shown, .remaining))]
    MissingFeatures { shown: Vec<String>, remaining: usize },
}

fn missing_message(shown: &[String], remaining: &usize) -> String {
    let listed = shown
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ");
    if *remaining == 0 {
        format!("Missing features: [{listed}]")
    } else {
        format!("Missing features: [{listed}] (and {remaining} more)")
    }
}

/// Checks `features` against the training columns and lays them out in training order.
///
/// An empty `required` list disables validation: the row is passed through with the
/// submitted columns in name order and the model is left to reject anything it cannot use.
/// Columns not named in `required` are dropped from the row.
pub fn validate(
    features: &FeatureVector,
    required: &[String],
) -> Result<OrderedFeatureVector, ValidationError> {
    if required.is_empty() {
        let (columns, values): (Vec<String>, Vec<f64>) = features
            .iter()
            .map(|(name, value)| (name.to_string(), value))
            .unzip();
        return Ok(OrderedFeatureVector { columns, values });
    }

    let missing: Vec<&String> = required
        .iter()
        .filter(|name| !features.contains(name))
        .collect();
    if !missing.is_empty() {
        let shown: Vec<String> = missing
            .iter()
            .take(MAX_REPORTED_MISSING)
            .map(|name| (*name).clone())
            .collect();
        return Err(ValidationError::MissingFeatures {
            remaining: missing.len() - shown.len(),
            shown,
        });
    }

    let values = required
        .iter()
        .filter_map(|name| features.get(name))
        .collect();
    Ok(OrderedFeatureVector {
        columns: required.to_vec(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn reports_missing_required_column() {
        let features: FeatureVector = [("a", 1.0)].into_iter().collect();
        let err = validate(&features, &names(&["a", "b"])).expect_err("b is missing");
        assert_eq!(
            err,
            ValidationError::MissingFeatures {
                shown: names(&["b"]),
                remaining: 0,
            }
        );
        assert_eq!(err.to_string(), "Missing features: ['b']");
    }

    #[test]
    fn orders_row_by_required_columns() {
        let features: FeatureVector = [("b", 2.0), ("a", 1.0), ("extra", 9.0)]
            .into_iter()
            .collect();
        let row = validate(&features, &names(&["b", "a"])).expect("valid row");
        assert_eq!(row.columns(), names(&["b", "a"]).as_slice());
        assert_eq!(row.values(), &[2.0, 1.0]);
    }

    #[test]
    fn caps_listed_missing_names() {
        let required: Vec<String> = (0..13).map(|idx| format!("f{idx:02}")).collect();
        let err = validate(&FeatureVector::default(), &required).expect_err("all missing");
        let ValidationError::MissingFeatures { shown, remaining } = &err;
        assert_eq!(shown.len(), MAX_REPORTED_MISSING);
        assert_eq!(shown[0], "f00");
        assert_eq!(*remaining, 3);
        assert!(err.to_string().ends_with("(and 3 more)"));
    }

    #[test]
    fn empty_contract_passes_features_through() {
        let features: FeatureVector = [("z", 3.0), ("a", 1.0)].into_iter().collect();
        let row = validate(&features, &[]).expect("no contract");
        assert_eq!(row.columns(), names(&["a", "z"]).as_slice());
        assert_eq!(row.values(), &[1.0, 3.0]);
    }

    #[test]
    fn feature_vector_parses_from_json_object() {
        let parsed: FeatureVector =
            serde_json::from_str(r#"{"Income": 112.0, "CD Account_1": 1}"#).expect("parses");
        assert_eq!(parsed.get("Income"), Some(112.0));
        assert_eq!(parsed.get("CD Account_1"), Some(1.0));
        assert_eq!(parsed.iter().count(), 2);
    }
}
