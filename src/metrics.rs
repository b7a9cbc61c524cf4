//! Prometheus metrics middleware.

use std::collections::HashMap;

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;

pub const SERVICE_LABEL: &str = "team-manager";

/// Request counters and latencies under the `api` namespace, served at `/metrics`.
/// Scrapes and the root health check are left out of the counts.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    let labels = HashMap::from([("service".to_string(), SERVICE_LABEL.to_string())]);
    PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics")
        .const_labels(labels)
        .exclude("/metrics")
        .exclude("/")
        .build()
        .expect("metrics builder")
});

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    #[actix_rt::test]
    async fn requests_are_counted_with_the_service_label() {
        let app = test::init_service(
            App::new()
                .wrap(METRICS.clone())
                .route("/teams", web::get().to(HttpResponse::Ok))
                .route("/", web::get().to(HttpResponse::Ok)),
        )
        .await;

        test::call_service(&app, test::TestRequest::get().uri("/teams").to_request()).await;
        test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
        assert!(resp.status().is_success());
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("api_http_requests_total"));
        assert!(body.contains(r#"service="team-manager""#));
        assert!(body.contains(r#"endpoint="/teams""#));
        assert!(!body.contains(r#"endpoint="/metrics""#));
        assert!(!body.contains(r#"endpoint="/""#));
    }
}
