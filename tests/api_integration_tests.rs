//! API integration tests.
//!
//! Exercises every endpoint against in-memory state: built-in reference
//! table, a stub classifier, and a tiny sensor corpus. Run with:
//! cargo test --features api --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use polars::{df, prelude::*};
    use serde_json::Value;
    use tower::ServiceExt; // for oneshot

    use crop_advisor_rust::classifier::{CropModel, FEATURE_COUNT};
    use crop_advisor_rust::{
        create_router, AppState, ClassifierAdapter, ReferenceTable, SensorCorpus,
    };

    /// Fixed-distribution stand-in for the trained classifier.
    struct StubModel;

    impl CropModel for StubModel {
        fn predict_probabilities(
            &self,
            _features: &[f64; FEATURE_COUNT],
        ) -> anyhow::Result<(Vec<String>, Vec<f64>)> {
            Ok((
                vec![
                    "rice".to_string(),
                    "wheat".to_string(),
                    "maize".to_string(),
                    "cotton".to_string(),
                ],
                vec![0.55, 0.25, 0.15, 0.05],
            ))
        }
    }

    fn sensor_corpus() -> SensorCorpus {
        SensorCorpus::from_frame(
            df!(
                "crop_label" => ["rice", "rice"],
                "N" => [80.0, 90.0],
                "P" => [50.0, 60.0],
                "K" => [38.0, 42.0],
                "temperature" => [24.0, 26.0],
                "humidity" => [78.0, 82.0],
                "ph" => [6.4, 6.6],
                "rainfall" => [2.0, 3.0],
            )
            .unwrap(),
        )
    }

    fn app_with_model() -> axum::Router {
        let state = AppState::from_parts(
            ClassifierAdapter::new(Box::new(StubModel)),
            ReferenceTable::builtin().unwrap(),
            Some(sensor_corpus()),
        );
        create_router(state)
    }

    fn app_without_model() -> axum::Router {
        let state = AppState::from_parts(
            ClassifierAdapter::unavailable(),
            ReferenceTable::builtin().unwrap(),
            None,
        );
        create_router(state)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    // =========================================================================
    // Health
    // =========================================================================

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let response = app_with_model()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn schemes_directory_is_served() {
        let response = app_with_model()
            .oneshot(
                Request::builder()
                    .uri("/api/schemes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        let schemes = body["schemes"].as_array().unwrap();
        assert_eq!(schemes.len(), 5);
        assert_eq!(schemes[0]["name"], "PM-KISAN");
        assert!(schemes[0]["link"].as_str().unwrap().starts_with("https://"));
    }

    // =========================================================================
    // Crop prediction
    // =========================================================================

    #[tokio::test]
    async fn predict_crop_returns_top3_percentages() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/predict_crop",
                r#"{"N":85,"P":55,"K":40,"temperature":25,"humidity":70,"ph":6.8,"rainfall":250}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["predicted_crop"], "rice");

        let top = body["top_3_predictions"].as_array().unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0]["crop"], "rice");
        assert_eq!(top[0]["probability"], 55.0);
        // Non-increasing order.
        assert!(top[0]["probability"].as_f64() >= top[1]["probability"].as_f64());
        assert!(top[1]["probability"].as_f64() >= top[2]["probability"].as_f64());
    }

    #[tokio::test]
    async fn predict_crop_accepts_lowercase_aliases() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/predict_crop",
                r#"{"n":85,"p":55,"k":40,"temp":25,"humidity":70,"ph":6.8,"rainfall":250}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn predict_crop_without_model_degrades_to_error_payload() {
        let response = app_without_model()
            .oneshot(post_json(
                "/api/predict_crop",
                r#"{"N":85,"P":55,"K":40,"temperature":25,"humidity":70,"ph":6.8,"rainfall":250}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("not loaded"));
    }

    // =========================================================================
    // Crop selection
    // =========================================================================

    #[tokio::test]
    async fn select_crop_with_hostile_conditions_returns_empty_list() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/select_crop",
                r#"{"N":0,"P":0,"K":0,"ph":4.0,"temperature":100,"rainfall":0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["recommended_crops"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn select_crop_returns_ranked_shortlist() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/select_crop",
                r#"{"N":85,"P":55,"K":40,"ph":6.8,"temperature":25,"rainfall":1600}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        let crops = body["recommended_crops"].as_array().unwrap();
        assert!(!crops.is_empty());
        assert!(crops.len() <= 5);
        assert_eq!(crops[0], "rice");
    }

    // =========================================================================
    // Water advisory
    // =========================================================================

    #[tokio::test]
    async fn water_advisor_rice_heat_stress_scenario() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/water_advisor",
                r#"{"Crop_Name":"rice","Rainfall_Requirement":1500,"Temperature_Requirement":40,
                    "Yield":5000,"Crop_Cycle_Duration":120,"Soil_Type":"Clay",
                    "Irrigation_Type":"Canal","Water_Scarcity":"Low"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        let advice = body["advice"].as_str().unwrap();
        assert!(advice.contains("heat stress"));
        assert!(advice.contains("adequate"));
        assert!(!advice.contains("unrealistic"));
        assert!(!advice.contains("drip"));
        assert_eq!(body["predicted_rainfall_requirement"], "1000–2000 mm/year");
        assert_eq!(body["soil_type"], "Clay");
    }

    #[tokio::test]
    async fn water_advisor_unknown_crop_is_an_error_payload() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/water_advisor",
                r#"{"Crop_Name":"dragonfruit"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("dragonfruit"));
    }

    // =========================================================================
    // ROI
    // =========================================================================

    #[tokio::test]
    async fn roi_baseline_scenario() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/calculate_roi",
                r#"{"crop":"wheat","investment":1000,"expected_yield":500,"market_price":3}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["revenue"], 1500.0);
        assert_eq!(body["roi_percent"], 50.0);
        assert_eq!(body["crop"], "wheat");
    }

    #[tokio::test]
    async fn roi_accepts_camel_case_aliases() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/calculate_roi",
                r#"{"crop":"wheat","investment":1000,"expectedYield":500,"marketPrice":3}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["roi_percent"], 50.0);
    }

    #[tokio::test]
    async fn roi_with_zero_investment_is_an_error_payload() {
        let response = app_with_model()
            .oneshot(post_json(
                "/api/calculate_roi",
                r#"{"crop":"rice","investment":0,"expected_yield":500,"market_price":3}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("positive"));
        assert!(body.get("revenue").is_none());
    }

    // =========================================================================
    // Recommended inputs
    // =========================================================================

    #[tokio::test]
    async fn recommend_inputs_returns_corpus_means() {
        let response = app_with_model()
            .oneshot(
                Request::builder()
                    .uri("/api/recommend_inputs/rice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_response(response).await;
        assert_eq!(body["crop"], "rice");
        assert_eq!(body["recommended_inputs"]["N"], 85.0);
        // Echoed back in mm/year.
        assert_eq!(body["recommended_inputs"]["rainfall"], 250.0);
    }

    #[tokio::test]
    async fn recommend_inputs_without_corpus_is_an_error_payload() {
        let response = app_without_model()
            .oneshot(
                Request::builder()
                    .uri("/api/recommend_inputs/rice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("not loaded"));
    }
}
