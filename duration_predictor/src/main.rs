use axum::{extract::State, http::StatusCode, routing::post, Json};
use serde_json::json;
use std::sync::Arc;

use trip_features::{engineer, round2, FeatureRow, ModelBundle, RawRide};

// ---------- Response types ----------

#[derive(Debug, serde::Serialize)]
struct Out {
    duration: f64,
    model_id: String,
}

type ErrorReply = (StatusCode, Json<serde_json::Value>);

// ---------- Server state ----------

#[derive(Clone)]
struct AppState {
    bundle: Arc<ModelBundle>, // read-only after startup
}

fn bad_request(message: &str) -> ErrorReply {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

// ---------- Handler ----------

async fn predict(
    State(state): State<AppState>,
    Json(ride): Json<RawRide>,
) -> Result<Json<Out>, ErrorReply> {
    let row = match engineer(&ride) {
        Ok(Some(row)) => row,
        // Failed a validity gate: the caller gets the canonical message.
        Ok(None) => return Err(bad_request("Invalid input, check values.")),
        Err(err) => return Err(bad_request(&err.to_string())),
    };

    let x = state.bundle.vectorizer.transform(&row);

    // Debug signal so we can confirm the encoding is not all-zeros
    if std::env::var("LOG_FEATURES").ok().as_deref() == Some("1") {
        let nz = x.iter().filter(|v| **v != 0.0).count();
        let mean = if x.is_empty() {
            0.0
        } else {
            x.iter().sum::<f64>() / x.len() as f64
        };
        tracing::info!(
            "recv PU_DO={} width={} nonzero={} mean={:.3} hour={} dow={}",
            row.pu_do,
            x.len(),
            nz,
            mean,
            row.hour,
            row.day_of_week
        );
    }

    let raw = state.bundle.model.predict(&x).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(Out {
        duration: round2(raw),
        model_id: state.bundle.model_id.clone(),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;

    tracing_subscriber::fmt::init();

    let bundle_path = std::env::var("BUNDLE_PATH").context("BUNDLE_PATH not set")?;
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9696);

    // Eager load at process start: no lazy first-request race.
    let bundle = ModelBundle::load(std::path::Path::new(&bundle_path))
        .with_context(|| format!("failed to load bundle at {bundle_path}"))?;

    // Warmup prediction; fails fast on a corrupt encoder/model pair.
    let warmup = FeatureRow {
        pu_do: "NA_NA".to_string(),
        trip_miles: 1.0,
        is_weekend: false,
        fare_per_mile: 1.0,
        hour: 0,
        day_of_week: 0,
    };
    let _ = bundle.predict_duration(&warmup)?;
    tracing::info!(
        "loaded bundle {} (encoder width {})",
        bundle.model_id,
        bundle.vectorizer.width()
    );

    let state = AppState {
        bundle: Arc::new(bundle),
    };

    let app = axum::Router::new()
        .route("/predict", post(predict))
        .with_state(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_features::{train_bundle, ModelKind};

    fn state() -> AppState {
        let rows = vec![
            FeatureRow {
                pu_do: "8_32".to_string(),
                trip_miles: 5.0,
                is_weekend: false,
                fare_per_mile: 4.1,
                hour: 8,
                day_of_week: 2,
            },
            FeatureRow {
                pu_do: "6_8".to_string(),
                trip_miles: 2.0,
                is_weekend: true,
                fare_per_mile: 3.0,
                hour: 22,
                day_of_week: 5,
            },
        ];
        let bundle = train_bundle(&rows, &[18.0, 7.5], ModelKind::Linear, "unit-v1");
        AppState {
            bundle: Arc::new(bundle),
        }
    }

    fn ride(trip_miles: f64) -> RawRide {
        RawRide {
            trip_start_timestamp: "2023-02-15 08:30:00".to_string(),
            pickup_community_area: Some("8".to_string()),
            dropoff_community_area: Some("32".to_string()),
            fare: Some(20.5),
            trip_total: Some(25.0),
            trip_miles,
        }
    }

    #[tokio::test]
    async fn valid_ride_returns_duration_and_model_id() {
        let out = predict(State(state()), Json(ride(5.0))).await.unwrap();
        assert_eq!(out.0.model_id, "unit-v1");
        assert_eq!(out.0.duration, round2(out.0.duration));
    }

    #[tokio::test]
    async fn invalid_ride_returns_the_canonical_400() {
        let (status, body) = predict(State(state()), Json(ride(0.0))).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0["error"], "Invalid input, check values.");
    }

    #[tokio::test]
    async fn bad_timestamp_returns_400_with_the_parse_error() {
        let mut r = ride(5.0);
        r.trip_start_timestamp = "never".to_string();
        let (status, body) = predict(State(state()), Json(r)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.0["error"]
            .as_str()
            .unwrap()
            .contains("trip_start_timestamp"));
    }
}
