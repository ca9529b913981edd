use std::sync::Mutex;
use std::time::Duration;

use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Proxy, RequestBuilder, Response};
use tokio::time::sleep;

use super::headers::random_headers;

const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
const MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF_SECS: f64 = 0.5;

/// HTTP session for the scan: one reqwest client with certificate validation
/// disabled and redirects followed, plus a mutable randomized header set that
/// callers regenerate between requests.
///
/// Requests retry a bounded number of times on transient statuses with
/// exponential backoff. The retry policy is opaque to callers: a request
/// either eventually yields a response or returns a terminal transport error.
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
    session_headers: Mutex<HeaderMap>,
}

impl HttpClient {
    pub fn new(timeout_seconds: u64, proxy_url: Option<&str>) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(timeout_seconds);

        let mut builder = ClientBuilder::new()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(proxy) = proxy_url {
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        let inner = builder.build()?;

        Ok(Self {
            inner,
            timeout,
            session_headers: Mutex::new(random_headers(false)),
        })
    }

    /// Replaces the session headers with a freshly randomized set.
    pub fn randomize_headers(&self, geo_spoof: bool) {
        let fresh = random_headers(geo_spoof);
        if let Ok(mut guard) = self.session_headers.lock() {
            *guard = fresh;
        }
    }

    fn current_headers(&self) -> HeaderMap {
        self.session_headers
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        let req = self
            .inner
            .get(url)
            .headers(self.current_headers())
            .timeout(self.timeout);
        self.send_with_retry(req).await
    }

    pub async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<Response, reqwest::Error> {
        let req = self
            .inner
            .post(url)
            .headers(self.current_headers())
            .form(form)
            .timeout(self.timeout);
        self.send_with_retry(req).await
    }

    /// Bounded retry on {429, 500, 502, 503, 504}: up to MAX_RETRIES resends
    /// with 0.5s exponential backoff, then the response is returned as-is.
    async fn send_with_retry(&self, req: RequestBuilder) -> Result<Response, reqwest::Error> {
        for attempt in 0..MAX_RETRIES {
            let builder = match req.try_clone() {
                Some(b) => b,
                None => break,
            };
            match builder.send().await {
                Ok(resp) if RETRY_STATUSES.contains(&resp.status().as_u16()) => {
                    let backoff = RETRY_BACKOFF_SECS * 2f64.powi(attempt as i32);
                    debug!(
                        "retryable status {} (attempt {}/{}), backing off {:.1}s",
                        resp.status(),
                        attempt + 1,
                        MAX_RETRIES,
                        backoff
                    );
                    sleep(Duration::from_secs_f64(backoff)).await;
                }
                other => return other,
            }
        }
        req.send().await
    }
}
