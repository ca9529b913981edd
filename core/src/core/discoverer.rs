use log::{debug, warn};
use rand::Rng;
use reqwest::Method;
use scraper::{Html, Selector};
use tokio::time::sleep;
use url::Url;

use crate::core::{InjectionKind, InjectionPoint};
use crate::http::HttpClient;
use crate::SinkRef;

/// Marker echoed back by servers that reflect unknown query parameters.
pub const PROBE_MARKER: &str = "test_xss_marker_12345";

/// Parameter names XSS commonly targets. Only the first few get probed to
/// keep the discovery pass cheap.
pub const COMMON_PARAMS: &[&str] = &[
    "q", "search", "keyword", "id", "name", "email", "msg", "message", "comment", "text", "input",
    "query", "term", "page", "url", "link", "next", "redirect", "return", "callback",
];

const PROBED_COMMON_PARAMS: usize = 5;

/// Extracts injection points from a fetched page without any I/O:
/// forms in document order, then the query-parameter set, then the fragment.
pub fn points_from_page(base_url: &Url, body: &str) -> Vec<InjectionPoint> {
    let mut points = Vec::new();

    let document = Html::parse_document(body);
    let form_selector = Selector::parse("form").expect("static selector");
    let input_selector = Selector::parse("input").expect("static selector");

    for form in document.select(&form_selector) {
        let inputs: Vec<String> = form
            .select(&input_selector)
            .filter_map(|i| i.value().attr("name"))
            .filter(|n| !n.is_empty())
            .map(|n| n.to_string())
            .collect();
        if inputs.is_empty() {
            continue;
        }

        let action = form.value().attr("action").unwrap_or("");
        let full_url = if action.is_empty() {
            base_url.clone()
        } else {
            base_url.join(action).unwrap_or_else(|_| base_url.clone())
        };
        let method = form
            .value()
            .attr("method")
            .map(|m| m.to_uppercase())
            .and_then(|m| Method::from_bytes(m.as_bytes()).ok())
            .unwrap_or(Method::GET);

        points.push(InjectionPoint::new(
            InjectionKind::Form,
            full_url.to_string(),
            method,
            inputs,
        ));
    }

    if base_url.query().map_or(false, |q| !q.is_empty()) {
        let mut keys: Vec<String> = Vec::new();
        for (k, _) in base_url.query_pairs() {
            if !keys.iter().any(|seen| seen.as_str() == k.as_ref()) {
                keys.push(k.to_string());
            }
        }
        if !keys.is_empty() {
            points.push(InjectionPoint::new(
                InjectionKind::UrlParam,
                base_url.to_string(),
                Method::GET,
                keys,
            ));
        }
    }

    if let Some(fragment) = base_url.fragment() {
        if !fragment.is_empty() {
            points.push(InjectionPoint::new(
                InjectionKind::Fragment,
                base_url.to_string(),
                Method::GET,
                vec![fragment.to_string()],
            ));
        }
    }

    points
}

/// Builds the probe URL for one common-parameter candidate.
fn probe_url(base_url: &str, param: &str) -> String {
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", base_url, sep, param, PROBE_MARKER)
}

/// Discovers all injection points on the target: HTML forms, existing query
/// parameters, the URL fragment, and echoing common parameter names.
///
/// Any failure — unreachable target, unparseable page — is reported through
/// the sink and yields an empty list; discovery never propagates errors.
pub async fn discover_injection_points(
    base_url: &str,
    client: &HttpClient,
    geo_spoof: bool,
    sink: &SinkRef,
) -> Vec<InjectionPoint> {
    let parsed = match Url::parse(base_url) {
        Ok(u) => u,
        Err(e) => {
            sink.on_log("error", &format!("    Error: invalid target URL: {}", e));
            return Vec::new();
        }
    };

    sink.on_log("info", &format!("[+] Fetching: {}", base_url));
    client.randomize_headers(geo_spoof);
    let settle = {
        let mut rng = rand::rng();
        rng.random_range(0.5..1.5)
    };
    sleep(std::time::Duration::from_secs_f64(settle)).await;

    let body = match client.get(base_url).await {
        Ok(resp) => match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                sink.on_log("error", &format!("    Error reading target page: {}", e));
                return Vec::new();
            }
        },
        Err(e) => {
            sink.on_log("error", &format!("    Error fetching target: {}", e));
            return Vec::new();
        }
    };

    let mut points = points_from_page(&parsed, &body);
    for point in &points {
        match point.kind {
            InjectionKind::Form => {
                sink.on_log("info", &format!("    [FORM] {} → {}", point.method, point.url));
                sink.on_log("info", &format!("        Inputs: {}", point.params.join(", ")));
            }
            InjectionKind::UrlParam => {
                sink.on_log("info", &format!("    [URL PARAM] GET → {}", point.url));
                sink.on_log("info", &format!("        Parameters: {}", point.params.join(", ")));
            }
            InjectionKind::Fragment => {
                sink.on_log("info", &format!("    [FRAGMENT] GET → #{}", point.params[0]));
            }
        }
    }

    // Probe common parameter names the page itself never exposed; a server
    // echoing the marker treats the parameter as live input.
    for param in COMMON_PARAMS.iter().take(PROBED_COMMON_PARAMS) {
        client.randomize_headers(geo_spoof);
        let pause = {
            let mut rng = rand::rng();
            rng.random_range(0.2..0.8)
        };
        sleep(std::time::Duration::from_secs_f64(pause)).await;

        let test_url = probe_url(base_url, param);
        match client.get(&test_url).await {
            Ok(resp) => match resp.text().await {
                Ok(text) if text.contains(PROBE_MARKER) => {
                    points.push(
                        InjectionPoint::new(
                            InjectionKind::UrlParam,
                            base_url.to_string(),
                            Method::GET,
                            vec![param.to_string()],
                        )
                        .tagged("common_param"),
                    );
                    sink.on_log(
                        "info",
                        &format!("    [URL PARAM] GET → {} (common parameter)", param),
                    );
                }
                Ok(_) => {}
                Err(e) => debug!("probe body read failed for {}: {}", test_url, e),
            },
            Err(e) => warn!("probe request failed for {}: {}", test_url, e),
        }
    }

    if points.is_empty() {
        sink.on_log("warn", "    No injection points found.");
        sink.on_log("info", "    [INFO] Site may have:");
        sink.on_log("info", "           - No HTML forms");
        sink.on_log("info", "           - No URL parameters");
        sink.on_log("info", "           - JavaScript-based forms (SPA)");
        sink.on_log("info", "           - Rate limiting or blocking bot requests");
    }

    points
}
