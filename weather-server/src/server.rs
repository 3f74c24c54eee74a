//! HTTP surface: `GET /weather/{city}` and `GET /hello`.

use std::{sync::Arc, time::Instant};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use weather_core::{Aggregator, TemperatureReport};

/// Application state shared across handlers.
pub struct AppState {
    pub aggregator: Aggregator,
}

type AppStateArc = Arc<AppState>;

pub fn router(state: AppStateArc) -> Router {
    Router::new()
        .route("/hello", get(hello))
        .route("/weather/{city}", get(weather))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind `listen` and serve until the process is stopped.
pub async fn serve(listen: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {listen}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

async fn hello() -> &'static str {
    "hello!"
}

async fn weather(
    State(state): State<AppStateArc>,
    Path(city): Path<String>,
) -> Result<Json<TemperatureReport>, (StatusCode, String)> {
    let begin = Instant::now();

    let temp = state.aggregator.temperature(&city).await.map_err(|e| {
        error!(%city, "aggregate failed: {e:#}");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
    })?;

    Ok(Json(TemperatureReport::new(city, temp, begin.elapsed())))
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use tower::ServiceExt;
    use weather_core::TemperatureProvider;

    #[derive(Debug)]
    struct Fixed(f64);

    #[async_trait]
    impl TemperatureProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn temperature(&self, _city: &str) -> anyhow::Result<f64> {
            Ok(self.0)
        }
    }

    #[derive(Debug)]
    struct Down;

    #[async_trait]
    impl TemperatureProvider for Down {
        fn name(&self) -> &str {
            "down"
        }

        async fn temperature(&self, _city: &str) -> anyhow::Result<f64> {
            Err(anyhow::anyhow!("upstream unavailable"))
        }
    }

    fn fixed(kelvin: f64) -> Arc<dyn TemperatureProvider> {
        Arc::new(Fixed(kelvin))
    }

    fn down() -> Arc<dyn TemperatureProvider> {
        Arc::new(Down)
    }

    fn app(providers: Vec<Arc<dyn TemperatureProvider>>) -> Router {
        router(Arc::new(AppState { aggregator: Aggregator::new(providers) }))
    }

    async fn send_get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let res = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();

        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn weather_returns_mean_as_json() {
        let app = app(vec![fixed(290.0), fixed(296.0)]);

        let (status, content_type, body) = send_get(app, "/weather/tokyo").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["city"], "tokyo");
        assert_eq!(json["temp"], 293.0);
        assert!(json["took"].is_string());
    }

    #[tokio::test]
    async fn percent_encoded_city_is_decoded() {
        let app = app(vec![fixed(280.0)]);

        let (status, _, body) = send_get(app, "/weather/new%20york").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["city"], "new york");
    }

    #[tokio::test]
    async fn provider_failure_is_plain_text_500() {
        let app = app(vec![fixed(290.0), down()]);

        let (status, content_type, body) = send_get(app, "/weather/tokyo").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(content_type.unwrap().starts_with("text/plain"));
        assert_eq!(body, "upstream unavailable");
    }

    #[tokio::test]
    async fn no_providers_is_500() {
        let (status, _, body) = send_get(app(Vec::new()), "/weather/tokyo").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "no temperature providers configured");
    }

    #[tokio::test]
    async fn missing_city_is_not_found() {
        let (status, _, _) = send_get(app(vec![fixed(1.0)]), "/weather/").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn hello_route() {
        let (status, _, body) = send_get(app(Vec::new()), "/hello").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "hello!");
    }
}
