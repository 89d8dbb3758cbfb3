use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};

/// Stable `endpoint` label for a matched route and method.
///
/// `/salvar-ficha` carries two operations when the export is mounted there,
/// so the method picks between them.
fn endpoint_label(matched: Option<&str>, method: &Method) -> &'static str {
    match (matched, method) {
        (_, &Method::OPTIONS) => "preflight",
        (Some("/get-token"), _) => "token",
        (Some("/salvar-ficha"), &Method::GET) => "export",
        (Some("/salvar-ficha"), _) => "submit",
        (Some("/api-fichas"), _) => "api_write",
        (Some("/api-powerbi"), _) => "export",
        (Some("/health"), _) => "health",
        (Some("/metrics"), _) => "metrics",
        (Some(_), _) => "docs",
        (None, _) => "unmatched",
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// Records `http_requests_total{endpoint,status}` and
/// `http_request_duration_seconds{endpoint}`.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let endpoint = endpoint_label(
        request.extensions().get::<MatchedPath>().map(MatchedPath::as_str),
        request.method(),
    );

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = status_class(response.status().as_u16());
    metrics::counter!("http_requests_total", "endpoint" => endpoint, "status" => status).increment(1);
    metrics::histogram!("http_request_duration_seconds", "endpoint" => endpoint).record(elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_path_is_split_by_method() {
        assert_eq!(endpoint_label(Some("/salvar-ficha"), &Method::POST), "submit");
        assert_eq!(endpoint_label(Some("/salvar-ficha"), &Method::GET), "export");
        assert_eq!(endpoint_label(Some("/salvar-ficha"), &Method::OPTIONS), "preflight");
    }

    #[test]
    fn api_routes_have_their_own_labels() {
        assert_eq!(endpoint_label(Some("/api-fichas"), &Method::POST), "api_write");
        assert_eq!(endpoint_label(Some("/api-powerbi"), &Method::GET), "export");
        assert_eq!(endpoint_label(Some("/get-token"), &Method::GET), "token");
        assert_eq!(endpoint_label(Some("/docs/{*rest}"), &Method::GET), "docs");
        assert_eq!(endpoint_label(None, &Method::GET), "unmatched");
    }

    #[test]
    fn statuses_collapse_to_classes() {
        assert_eq!(status_class(201), "2xx");
        assert_eq!(status_class(405), "4xx");
        assert_eq!(status_class(503), "5xx");
        assert_eq!(status_class(101), "other");
    }
}
