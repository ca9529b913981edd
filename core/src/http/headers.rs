use rand::prelude::IndexedRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Static candidate tables for per-request header randomization.
/// WAFs fingerprint static header sets; rotating these between requests makes
/// consecutive probes look like unrelated browsers.

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15",
    "Mozilla/5.0 (Linux; Android 11; SM-G991B) AppleWebKit/537.36",
];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

const ACCEPT_LANGUAGES: &[&str] = &["en-US,en;q=0.9", "en-GB,en;q=0.8", "en;q=0.7", "fr-FR,fr;q=0.9"];

const CONNECTIONS: &[&str] = &["keep-alive", "upgrade"];

const REFERERS: &[&str] = &[
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://duckduckgo.com/",
];

const SEC_CH_UA: &str = "\" Not A;Brand\";v=\"99\", \"Chromium\";v=\"99\", \"Google Chrome\";v=\"99\"";

const UA_MOBILE: &[&str] = &["?0", "?1"];

const UA_PLATFORMS: &[&str] = &["\"Windows\"", "\"macOS\"", "\"Linux\"", "\"Android\""];

const FORWARDED_PROTOS: &[&str] = &["http", "https"];

const COUNTRY_CODES: &[&str] = &["US", "GB", "DE", "CA", "AU", "NG"];

fn random_ipv4<R: Rng>(rng: &mut R) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.random_range(1..=255),
        rng.random_range(1..=255),
        rng.random_range(1..=255),
        rng.random_range(1..=255)
    )
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(v) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), v);
    }
}

fn choose<'a, R: Rng>(rng: &mut R, table: &[&'a str]) -> &'a str {
    table.choose(rng).copied().unwrap_or("")
}

/// Generates a fresh randomized header set for one request.
/// With `geo_spoof`, Cloudflare geolocation headers are added on top.
pub fn random_headers(geo_spoof: bool) -> HeaderMap {
    let mut rng = rand::rng();
    let mut headers = HeaderMap::new();

    insert(&mut headers, "user-agent", choose(&mut rng, USER_AGENTS));

    // Forwarded-IP spoofing set
    let xff = random_ipv4(&mut rng);
    insert(&mut headers, "x-forwarded-for", &xff);
    insert(&mut headers, "x-forwarded-proto", choose(&mut rng, FORWARDED_PROTOS));
    insert(
        &mut headers,
        "x-forwarded-host",
        &format!("192.168.{}.{}", rng.random_range(1..=254), rng.random_range(1..=254)),
    );
    insert(&mut headers, "x-originating-ip", &format!("[{}]", random_ipv4(&mut rng)));
    insert(
        &mut headers,
        "x-forwarded-server",
        &format!("server{}.local", rng.random_range(1..=100)),
    );
    insert(&mut headers, "x-real-ip", &random_ipv4(&mut rng));
    insert(&mut headers, "x-client-ip", &random_ipv4(&mut rng));

    insert(&mut headers, "accept", ACCEPT);
    insert(&mut headers, "accept-language", choose(&mut rng, ACCEPT_LANGUAGES));
    insert(&mut headers, "accept-encoding", "gzip, deflate, br");
    insert(&mut headers, "connection", choose(&mut rng, CONNECTIONS));
    insert(&mut headers, "upgrade-insecure-requests", "1");

    insert(&mut headers, "cache-control", "no-cache, no-store, must-revalidate");
    insert(&mut headers, "pragma", "no-cache");

    insert(&mut headers, "referer", choose(&mut rng, REFERERS));

    insert(&mut headers, "sec-ch-ua", SEC_CH_UA);
    insert(&mut headers, "sec-ch-ua-mobile", choose(&mut rng, UA_MOBILE));
    insert(&mut headers, "sec-ch-ua-platform", choose(&mut rng, UA_PLATFORMS));
    insert(&mut headers, "sec-fetch-dest", "document");
    insert(&mut headers, "sec-fetch-mode", "navigate");
    insert(&mut headers, "sec-fetch-site", "none");
    insert(&mut headers, "sec-fetch-user", "?1");

    if geo_spoof {
        insert(&mut headers, "cf-ipcountry", choose(&mut rng, COUNTRY_CODES));
        insert(&mut headers, "cf-connecting-ip", &random_ipv4(&mut rng));
    }

    headers
}
