pub mod core;
pub mod http;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use crate::core::detector::{
    check_filter_bypass, detect_attribute_context, detect_dom_sinks, detect_reflection,
};
pub use crate::core::discoverer::discover_injection_points;
pub use crate::core::engine::ScanEngine;
pub use crate::core::injector::{build_injected, InjectedRequest};
pub use crate::core::report::{print_summary, Reporter, ScanReport, VulnerabilityRecord};
pub use crate::core::{InjectionKind, InjectionPoint, ScanMode};
pub use crate::http::HttpClient;
pub use crate::utils::payload_loader::PayloadLoader;

/// Shared scan configuration used by the CLI and the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    pub target: String,
    pub mode: ScanMode,
    pub timeout: u64,
    pub delay: f64,
    pub proxy: String,
    pub results_dir: String,
    pub payload_file: String,
    pub max_payloads: usize,
    pub stealth: bool,
    pub aggressive_waf: bool,
    pub geo_spoof: bool,
    pub verbose: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            mode: ScanMode::Reflected,
            timeout: 15,
            delay: 0.5,
            proxy: String::new(),
            results_dir: "scan_results".to_string(),
            payload_file: String::new(),
            max_payloads: 0,
            stealth: false,
            aggressive_waf: false,
            geo_spoof: false,
            verbose: false,
        }
    }
}

impl ScanConfig {
    pub fn proxy_ref(&self) -> Option<&str> {
        if self.proxy.is_empty() { None } else { Some(&self.proxy) }
    }

    pub fn payload_file_ref(&self) -> Option<&str> {
        if self.payload_file.is_empty() { None } else { Some(&self.payload_file) }
    }
}

/// Output abstraction for the scan pipeline.
/// CLI implements this with colored terminal output; tests use a capturing sink.
pub trait ScanEventSink: Send + Sync {
    fn on_log(&self, level: &str, message: &str);
    fn on_finding(&self, record: &VulnerabilityRecord);
    fn on_progress(&self, phase: &str, current: usize, total: usize);
}

pub type SinkRef = Arc<dyn ScanEventSink>;

/// Terminal output sink for CLI usage.
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new_ref() -> SinkRef {
        Arc::new(Self)
    }
}

impl ScanEventSink for ConsoleSink {
    fn on_log(&self, level: &str, message: &str) {
        use colored::*;
        use std::io::Write;
        let colored = match level {
            "success" => message.green().to_string(),
            "error"   => message.red().to_string(),
            "warn"    => message.yellow().to_string(),
            "phase"   => message.bright_cyan().bold().to_string(),
            _         => message.to_string(),
        };
        print!("{}\r\n", colored);
        std::io::stdout().flush().ok();
    }

    fn on_finding(&self, record: &VulnerabilityRecord) {
        use colored::*;
        use std::io::Write;
        let out = |text: &str| {
            print!("{}\r\n", text);
            std::io::stdout().flush().ok();
        };
        out(&format!(
            "\n{} {} XSS detected!",
            "[+]".green().bold(),
            record.point_type.to_string().to_uppercase().red().bold()
        ));
        out(&format!("    Target:    {}", record.url.white()));
        out(&format!("    Params:    {}", record.params.join(", ").white()));
        out(&format!("    Payload:   {}", record.payload.bright_yellow()));
        out(&format!("    Detection: {}", record.detection_method.cyan()));
        if !record.bypasses.is_empty() {
            out(&format!("    Bypasses:  {}", record.bypasses.join(", ").yellow()));
        }
        out(&format!(
            "    Info:      Status [{}] | Method [{}]",
            record.status.to_string().cyan(),
            record.method.blue()
        ));
        out(&"──────────────────────────────────────────".dimmed().to_string());
    }

    fn on_progress(&self, phase: &str, current: usize, total: usize) {
        use colored::*;
        use std::io::Write;
        if total > 0 {
            print!("{}\r\n", format!("[*] {} ({}/{})", phase, current, total).bright_cyan());
        } else {
            print!("{}\r\n", format!("[*] {}", phase).bright_cyan());
        }
        std::io::stdout().flush().ok();
    }
}
