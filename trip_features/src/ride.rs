//! Raw ride records and the fixed feature-row schema derived from them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One ride as it arrives from the HTTP caller or a dataset row.
///
/// Community areas may come in as JSON strings or numbers; monetary fields
/// may be numbers, numeric strings, or garbage. Anything non-numeric in
/// `fare`/`trip_total` coerces to missing at deserialization time rather
/// than rejecting the record, which matches how the rest of the pipeline
/// treats those columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRide {
    pub trip_start_timestamp: String,
    #[serde(default, deserialize_with = "de_area")]
    pub pickup_community_area: Option<String>,
    #[serde(default, deserialize_with = "de_area")]
    pub dropoff_community_area: Option<String>,
    #[serde(default, deserialize_with = "de_numeric")]
    pub fare: Option<f64>,
    #[serde(default, deserialize_with = "de_numeric")]
    pub trip_total: Option<f64>,
    pub trip_miles: f64,
}

/// Engineered features for one ride, in the exact column order the encoder
/// and the drift monitor both rely on: `PU_DO`, `trip_miles`, `is_weekend`,
/// `fare_per_mile`, `hour`, `day_of_week`.
///
/// An instance is always fully populated: construction goes through
/// [`crate::engine::engineer`], which drops any candidate with a missing,
/// NaN, or infinite field instead of repairing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "PU_DO")]
    pub pu_do: String,
    pub trip_miles: f64,
    pub is_weekend: bool,
    pub fare_per_mile: f64,
    pub hour: u32,
    pub day_of_week: u32,
}

impl FeatureRow {
    /// Named (feature, value) pairs in the form the vectorizer encodes:
    /// the categorical `PU_DO` as an indicator key `PU_DO=<value>`, numeric
    /// features under their own names, booleans as 0/1.
    pub fn encoding_pairs(&self) -> [(String, f64); 6] {
        [
            (format!("PU_DO={}", self.pu_do), 1.0),
            ("trip_miles".to_string(), self.trip_miles),
            ("is_weekend".to_string(), f64::from(u8::from(self.is_weekend))),
            ("fare_per_mile".to_string(), self.fare_per_mile),
            ("hour".to_string(), f64::from(self.hour)),
            ("day_of_week".to_string(), f64::from(self.day_of_week)),
        ]
    }

    /// Re-selects the six feature columns. Stable: projecting an engineered
    /// row yields an identical row.
    pub fn project(&self) -> FeatureRow {
        FeatureRow {
            pu_do: self.pu_do.clone(),
            trip_miles: self.trip_miles,
            is_weekend: self.is_weekend,
            fare_per_mile: self.fare_per_mile,
            hour: self.hour,
            day_of_week: self.day_of_week,
        }
    }
}

fn de_area<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => {
            // Area ids are integers in the source data; keep "8" over "8.0".
            Some(match n.as_i64() {
                Some(i) => i.to_string(),
                None => n.to_string(),
            })
        }
        _ => None,
    })
}

fn de_numeric<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_accept_strings_and_numbers() {
        let ride: RawRide = serde_json::from_str(
            r#"{"trip_start_timestamp": "2023-02-15 08:30:00",
                "pickup_community_area": 8,
                "dropoff_community_area": "32",
                "fare": 20.5, "trip_total": 25.0, "trip_miles": 5.0}"#,
        )
        .unwrap();
        assert_eq!(ride.pickup_community_area.as_deref(), Some("8"));
        assert_eq!(ride.dropoff_community_area.as_deref(), Some("32"));
    }

    #[test]
    fn non_numeric_fare_coerces_to_missing() {
        let ride: RawRide = serde_json::from_str(
            r#"{"trip_start_timestamp": "2023-02-15 08:30:00",
                "fare": "free", "trip_total": "25.0", "trip_miles": 5.0}"#,
        )
        .unwrap();
        assert_eq!(ride.fare, None);
        assert_eq!(ride.trip_total, Some(25.0));
        assert_eq!(ride.pickup_community_area, None);
    }

    #[test]
    fn missing_timestamp_is_a_deserialization_error() {
        let err = serde_json::from_str::<RawRide>(r#"{"trip_miles": 5.0}"#);
        assert!(err.is_err());
    }

    #[test]
    fn encoding_pairs_carry_the_indicator_key() {
        let row = FeatureRow {
            pu_do: "8_32".to_string(),
            trip_miles: 5.0,
            is_weekend: false,
            fare_per_mile: 4.1,
            hour: 8,
            day_of_week: 2,
        };
        let pairs = row.encoding_pairs();
        assert_eq!(pairs[0], ("PU_DO=8_32".to_string(), 1.0));
        assert_eq!(pairs[2], ("is_weekend".to_string(), 0.0));
        assert_eq!(pairs[4], ("hour".to_string(), 8.0));
    }
}
