pub mod detector;
pub mod discoverer;
pub mod engine;
pub mod injector;
pub mod report;

use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Kind of surface a payload gets injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionKind {
    Form,
    UrlParam,
    Fragment,
}

impl std::fmt::Display for InjectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InjectionKind::Form => write!(f, "form"),
            InjectionKind::UrlParam => write!(f, "url_param"),
            InjectionKind::Fragment => write!(f, "fragment"),
        }
    }
}

/// Scan mode selects which payload list gets loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    #[default]
    Reflected,
    Blind,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Reflected => "reflected",
            ScanMode::Blind => "blind",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reflected" => Some(ScanMode::Reflected),
            "blind" => Some(ScanMode::Blind),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single injectable surface discovered on the target.
/// Created once per discovery pass and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionPoint {
    pub kind: InjectionKind,
    pub url: String,
    pub method: Method,
    pub params: Vec<String>,
    pub discovery_tag: Option<String>,
}

impl InjectionPoint {
    pub fn new(kind: InjectionKind, url: String, method: Method, params: Vec<String>) -> Self {
        Self { kind, url, method, params, discovery_tag: None }
    }

    pub fn tagged(mut self, tag: &str) -> Self {
        self.discovery_tag = Some(tag.to_string());
        self
    }
}
