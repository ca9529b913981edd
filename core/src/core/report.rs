use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::InjectionKind;
use crate::{ScanConfig, SinkRef};

/// One confirmed finding. Appended by the scan loop when a heuristic fires
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub url: String,
    pub method: String,
    pub params: Vec<String>,
    pub payload: String,
    pub status: u16,
    pub point_type: InjectionKind,
    pub detection_method: String,
    pub bypasses: Vec<String>,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    pub stealth: bool,
    pub aggressive_waf: bool,
    pub geo_spoof: bool,
}

/// The JSON report document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_time: String,
    pub target_url: String,
    pub scan_mode: String,
    pub total_vulnerabilities: usize,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub scan_options: ScanOptions,
}

impl ScanReport {
    /// Builds a report stamped with the current local time.
    pub fn generate(config: &ScanConfig, results: Vec<VulnerabilityRecord>) -> Self {
        Self::new(config, results, Local::now())
    }

    pub fn new(config: &ScanConfig, results: Vec<VulnerabilityRecord>, now: DateTime<Local>) -> Self {
        Self {
            scan_time: now.to_rfc3339(),
            target_url: config.target.clone(),
            scan_mode: config.mode.to_string(),
            total_vulnerabilities: results.len(),
            vulnerabilities: results,
            scan_options: ScanOptions {
                stealth: config.stealth,
                aggressive_waf: config.aggressive_waf,
                geo_spoof: config.geo_spoof,
            },
        }
    }
}

/// Derives the report base name from the target's network location:
/// dots become underscores, colons become dashes.
pub fn report_base_name(target_url: &str, now: DateTime<Local>) -> String {
    let netloc = Url::parse(target_url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(p) => format!("{}:{}", h, p),
                None => h.to_string(),
            })
        })
        .unwrap_or_else(|| "unknown_host".to_string());
    let domain = netloc.replace('.', "_").replace(':', "-");
    format!("{}_{}", domain, now.format("%Y%m%d_%H%M%S"))
}

/// Writes JSON and HTML report files into a configured results directory.
pub struct Reporter {
    results_dir: PathBuf,
}

impl Reporter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self { results_dir: results_dir.into() }
    }

    /// Persists the report as `<base>.json` and `<base>.html`.
    /// Nothing is written when the report holds zero vulnerabilities.
    pub fn save(&self, report: &ScanReport) -> anyhow::Result<Option<(PathBuf, PathBuf)>> {
        if report.vulnerabilities.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(&self.results_dir)?;
        let base = report_base_name(&report.target_url, Local::now());

        let json_path = self.results_dir.join(format!("{}.json", base));
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&json_path, json)?;

        let html_path = self.results_dir.join(format!("{}.html", base));
        fs::write(&html_path, render_html(report))?;

        Ok(Some((json_path, html_path)))
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }
}

fn render_html(report: &ScanReport) -> String {
    let mut html = format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>XSS Scan Report - {target}</title>
<style>body{{font-family:Arial,Helvetica,sans-serif;background:#f6f8fa;color:#222}}.wrap{{max-width:980px;margin:24px auto;padding:18px;background:#fff;border-radius:6px;box-shadow:0 2px 8px rgba(0,0,0,.06)}}h1{{font-size:20px;color:#c62828}}pre{{white-space:pre-wrap;word-break:break-word;background:#f4f4f4;padding:8px;border-radius:4px}}</style>
</head>
<body>
<div class="wrap">
<h1>XSS Scan Report</h1>
<p><strong>Target:</strong> {target}</p>
<p><strong>Scan Time:</strong> {time}</p>
<p><strong>Mode:</strong> {mode}</p>
<p><strong>Vulnerabilities Found:</strong> {total}</p>
<hr/>
"#,
        target = report.target_url,
        time = report.scan_time,
        mode = report.scan_mode,
        total = report.total_vulnerabilities,
    );

    for (idx, vuln) in report.vulnerabilities.iter().enumerate() {
        html.push_str(&format!(
            "<h2>#{} - {}</h2>\n",
            idx + 1,
            vuln.point_type.to_string().to_uppercase()
        ));
        html.push_str(&format!("<p><strong>URL:</strong> {}</p>\n", vuln.url));
        html.push_str(&format!(
            "<p><strong>Parameters:</strong> {}</p>\n",
            vuln.params.join(", ")
        ));
        html.push_str(&format!("<p><strong>Method:</strong> {}</p>\n", vuln.method));
        html.push_str(&format!(
            "<p><strong>Detection:</strong> {}</p>\n",
            vuln.detection_method
        ));
        if !vuln.bypasses.is_empty() {
            html.push_str(&format!(
                "<p><strong>Bypasses:</strong> {}</p>\n",
                vuln.bypasses.join(", ")
            ));
        }
        html.push_str(&format!(
            "<p><strong>Payload:</strong></p><pre>{}</pre>\n",
            vuln.payload
        ));
        html.push_str(&format!(
            "<p><strong>Snippet:</strong></p><pre>{}</pre>\n<hr/>\n",
            vuln.snippet
        ));
    }

    html.push_str(&format!(
        "<footer><p>Report generated: {}</p></footer>\n</div>\n</body>\n</html>",
        Local::now().to_rfc3339()
    ));
    html
}

/// Prints the closing summary: totals, unique URLs, detection methods,
/// point kinds.
pub fn print_summary(results: &[VulnerabilityRecord], sink: &SinkRef) {
    if results.is_empty() {
        sink.on_log("success", "[-] No XSS vulnerabilities detected.");
        return;
    }

    sink.on_log("warn", &format!("[+] Total Vulnerabilities: {}", results.len()));

    let urls: HashSet<&str> = results.iter().map(|r| r.url.as_str()).collect();
    sink.on_log("info", &format!("[+] Unique URLs Affected: {}", urls.len()));

    let methods: HashSet<&str> = results.iter().map(|r| r.detection_method.as_str()).collect();
    let mut methods: Vec<&str> = methods.into_iter().collect();
    methods.sort_unstable();
    sink.on_log("info", &format!("[+] Detection Methods Used: {}", methods.join(", ")));

    let kinds: HashSet<String> = results.iter().map(|r| r.point_type.to_string()).collect();
    let mut kinds: Vec<String> = kinds.into_iter().collect();
    kinds.sort_unstable();
    sink.on_log("info", &format!("[+] Injection Point Types: {}", kinds.join(", ")));
}
