use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;
use tokio::time::sleep;

use crate::core::detector::{
    check_filter_bypass, detect_attribute_context, detect_dom_sinks, detect_reflection,
    priority_detection,
};
use crate::core::injector::build_injected;
use crate::core::report::VulnerabilityRecord;
use crate::core::InjectionPoint;
use crate::http::HttpClient;
use crate::{ScanConfig, SinkRef};

/// Statuses that indicate the target is rate limiting or a WAF is blocking.
const BLOCK_STATUSES: [u16; 3] = [403, 406, 418];

const STEALTH_DELAY_RANGE: (f64, f64) = (1.0, 3.0);
const MAX_BACKOFF_SECS: f64 = 10.0;
const SNIPPET_CHARS: usize = 300;

/// Consecutive-block counter driving adaptive backoff.
/// Scoped to one injection point's scan and reset at point entry.
#[derive(Debug, Default)]
struct BlockTracker {
    consecutive_blocks: u32,
}

impl BlockTracker {
    fn record_block(&mut self) {
        self.consecutive_blocks += 1;
    }

    fn reset(&mut self) {
        self.consecutive_blocks = 0;
    }

    fn over_threshold(&self) -> bool {
        self.consecutive_blocks > 2
    }
}

/// Extra sleep applied once the block threshold is crossed.
fn backoff_delay(base_delay: f64, consecutive_blocks: u32) -> f64 {
    (base_delay * (consecutive_blocks / 2) as f64).min(MAX_BACKOFF_SECS)
}

fn is_block_status(status: u16) -> bool {
    status == 429 || BLOCK_STATUSES.contains(&status)
}

/// First 300 characters of the body with newlines collapsed to spaces.
fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_CHARS).collect::<String>().replace('\n', " ")
}

/// Sequential XSS scan engine.
///
/// For every discovered injection point, iterates the full payload list:
/// delays (adaptively backing off on repeated blocks), rebuilds randomized
/// headers in aggressive-WAF mode, injects, sends, and classifies the response
/// with the detection heuristics. One request is in flight at a time; no early
/// termination on a finding.
pub struct ScanEngine {
    client: Arc<HttpClient>,
    payloads: Vec<String>,
    config: ScanConfig,
    sink: SinkRef,
}

impl ScanEngine {
    pub fn new(
        client: Arc<HttpClient>,
        payloads: Vec<String>,
        config: ScanConfig,
        sink: SinkRef,
    ) -> Self {
        Self { client, payloads, config, sink }
    }

    /// Scans every point in sequence and returns all accumulated findings.
    pub async fn run(&self, points: &[InjectionPoint]) -> Vec<VulnerabilityRecord> {
        let mut all_results = Vec::new();
        for (idx, point) in points.iter().enumerate() {
            self.sink
                .on_progress("Scanning injection points", idx + 1, points.len());
            all_results.extend(self.scan_point(point).await);
        }
        all_results
    }

    async fn scan_point(&self, point: &InjectionPoint) -> Vec<VulnerabilityRecord> {
        let mut results = Vec::new();
        let mut tracker = BlockTracker::default();

        self.sink.on_log(
            "phase",
            &format!(
                "\n[*] Scanning {} {} {}",
                point.kind.to_string().to_uppercase(),
                point.method,
                point.url
            ),
        );
        self.sink.on_log(
            "info",
            &format!(
                "    Parameters: {}{}",
                point.params.iter().take(3).cloned().collect::<Vec<_>>().join(", "),
                if point.params.len() > 3 { "..." } else { "" }
            ),
        );
        self.sink
            .on_log("info", &format!("    Payloads to test: {}", self.payloads.len()));

        for (i, payload) in self.payloads.iter().enumerate() {
            self.pace(&mut tracker).await;

            if self.config.aggressive_waf {
                self.client.randomize_headers(self.config.geo_spoof);
            }

            let display: String = payload.chars().take(55).collect::<String>().replace('\n', "\\n");
            debug!("[{}/{}] {}", i + 1, self.payloads.len(), display);

            let injected = match build_injected(
                &point.url,
                payload,
                &point.params,
                &point.method,
                point.kind,
            ) {
                Ok(req) => req,
                Err(e) => {
                    warn!("failed to build injected URL for {}: {}", point.url, e);
                    continue;
                }
            };

            let response = if let Some(form) = &injected.form_body {
                self.client.post_form(&injected.url, form).await
            } else {
                self.client.get(&injected.url).await
            };

            let response = match response {
                Ok(resp) => resp,
                Err(e) => {
                    if e.is_timeout() {
                        info!("[TIMEOUT] {}", injected.url);
                    } else if e.is_connect() {
                        info!("[CONN ERROR] {}", injected.url);
                    } else {
                        info!("[ERROR] {}: {}", injected.url, e);
                    }
                    continue;
                }
            };

            let status = response.status().as_u16();
            if is_block_status(status) {
                debug!("[HTTP {} Blocked]", status);
                tracker.record_block();
                continue;
            }
            if status >= 400 {
                debug!("[HTTP {}]", status);
                continue;
            }
            if status == 200 {
                tracker.reset();
            }

            let body = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!("failed to read response body: {}", e);
                    continue;
                }
            };

            let reflection = detect_reflection(payload, &body);
            let dom = detect_dom_sinks(payload, &body);
            let attribute = detect_attribute_context(payload, &body);
            let bypasses = check_filter_bypass(payload, &body);

            if reflection.0 || dom.0 || attribute.0 {
                let record = VulnerabilityRecord {
                    url: point.url.clone(),
                    method: point.method.to_string(),
                    params: point.params.clone(),
                    payload: payload.clone(),
                    status,
                    point_type: point.kind,
                    detection_method: priority_detection(&reflection, &dom, &attribute),
                    bypasses,
                    snippet: snippet(&body),
                };
                self.sink.on_finding(&record);
                results.push(record);
            }
        }

        results
    }

    /// Sleeps between requests: the configured base delay, a stealth-mode
    /// random draw, or the escalated backoff once blocks pile up.
    async fn pace(&self, tracker: &mut BlockTracker) {
        let base_delay = if self.config.stealth {
            let mut rng = rand::rng();
            rng.random_range(STEALTH_DELAY_RANGE.0..STEALTH_DELAY_RANGE.1)
        } else {
            self.config.delay
        };

        if tracker.over_threshold() {
            let extra = backoff_delay(base_delay, tracker.consecutive_blocks);
            info!("rate limiting detected, adding {:.1}s delay", extra);
            sleep(Duration::from_secs_f64(extra)).await;
            tracker.reset();
        } else if base_delay > 0.0 {
            sleep(Duration::from_secs_f64(base_delay)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScanEventSink, VulnerabilityRecord};
    use crate::core::InjectionKind;
    use percent_encoding::percent_decode_str;
    use reqwest::Method;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::Mutex;

    struct CapturingSink {
        findings: Mutex<Vec<VulnerabilityRecord>>,
    }

    impl CapturingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self { findings: Mutex::new(Vec::new()) })
        }
    }

    impl ScanEventSink for CapturingSink {
        fn on_log(&self, _level: &str, _message: &str) {}
        fn on_finding(&self, record: &VulnerabilityRecord) {
            self.findings.lock().unwrap().push(record.clone());
        }
        fn on_progress(&self, _phase: &str, _current: usize, _total: usize) {}
    }

    #[test]
    fn test_backoff_delay_scales_and_caps() {
        assert_eq!(backoff_delay(0.5, 3), 0.5);
        assert_eq!(backoff_delay(0.5, 4), 1.0);
        assert_eq!(backoff_delay(2.0, 6), 6.0);
        assert_eq!(backoff_delay(5.0, 8), 10.0);
    }

    #[test]
    fn test_block_tracker_threshold() {
        let mut tracker = BlockTracker::default();
        tracker.record_block();
        tracker.record_block();
        assert!(!tracker.over_threshold());
        tracker.record_block();
        assert!(tracker.over_threshold());
        tracker.reset();
        assert!(!tracker.over_threshold());
    }

    #[test]
    fn test_block_status_classification() {
        for status in [429, 403, 406, 418] {
            assert!(is_block_status(status));
        }
        for status in [200, 301, 404, 500] {
            assert!(!is_block_status(status));
        }
    }

    #[test]
    fn test_snippet_truncates_and_collapses_newlines() {
        let body = format!("line1\nline2\n{}", "x".repeat(400));
        let snip = snippet(&body);
        assert_eq!(snip.chars().count(), 300);
        assert!(!snip.contains('\n'));
        assert!(snip.starts_with("line1 line2 "));
    }

    /// Minimal echo server: replies 200 text/html with the decoded `search`
    /// query value embedded in the body.
    fn spawn_echo_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut buf = [0u8; 4096];
                let n = stream.read(&mut buf).unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let echoed = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .and_then(|path| path.split("search=").nth(1))
                    .map(|v| v.split('&').next().unwrap_or(v).split(' ').next().unwrap_or(v))
                    .map(|v| percent_decode_str(v).decode_utf8_lossy().to_string())
                    .unwrap_or_default();
                let body = format!("<html><body>You searched for: {}</body></html>", echoed);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        port
    }

    #[tokio::test]
    async fn test_end_to_end_direct_reflection() {
        let port = spawn_echo_server();
        let target = format!("http://127.0.0.1:{}/?search=test", port);

        let point = InjectionPoint::new(
            InjectionKind::UrlParam,
            target.clone(),
            Method::GET,
            vec!["search".to_string()],
        );
        let config = ScanConfig { target, delay: 0.0, ..Default::default() };
        let client = Arc::new(HttpClient::new(5, None).unwrap());
        let sink = CapturingSink::new();
        let engine = ScanEngine::new(
            Arc::clone(&client),
            vec!["<script>alert(1)</script>".to_string()],
            config,
            sink.clone(),
        );

        let results = engine.run(&[point]).await;

        assert_eq!(results.len(), 1);
        let record = &results[0];
        assert_eq!(record.detection_method, "Direct reflection");
        assert_eq!(record.status, 200);
        assert!(record.bypasses.is_empty());
        assert_eq!(record.point_type, InjectionKind::UrlParam);
        assert_eq!(record.params, vec!["search".to_string()]);
        assert_eq!(sink.findings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_target_yields_no_records() {
        // Reserved port with nothing listening; transport errors skip payloads.
        let point = InjectionPoint::new(
            InjectionKind::UrlParam,
            "http://127.0.0.1:1/?q=test".to_string(),
            Method::GET,
            vec!["q".to_string()],
        );
        let config = ScanConfig { delay: 0.0, ..Default::default() };
        let client = Arc::new(HttpClient::new(1, None).unwrap());
        let engine = ScanEngine::new(
            client,
            vec!["<svg onload=alert(1)>".to_string()],
            config,
            CapturingSink::new(),
        );
        let results = engine.run(&[point]).await;
        assert!(results.is_empty());
    }
}
