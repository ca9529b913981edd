use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::RegexBuilder;

/// Response-side heuristics for XSS classification.
///
/// Each predicate is a pure function of (payload, response body) returning the
/// verdict plus a short human-readable explanation. The heuristics are
/// independent and non-exclusive; a payload/response pair counts as vulnerable
/// when any of reflection, DOM-sink, or attribute-context fires.

const XSS_MARKERS: &[(&str, &str)] = &[
    ("alert", "alert function detected"),
    ("<script", "script tag detected"),
    ("onerror", "event handler detected"),
    ("onload", "onload handler detected"),
];

const DOM_SINKS: &[&str] = &[
    "innerHTML",
    "outerHTML",
    "insertAdjacentHTML",
    "eval",
    "setTimeout",
    "setInterval",
    "Function",
    "document.write",
];

const PAYLOAD_DOM_MARKERS: &[&str] = &["script", "onerror", "onload", "javascript"];

/// Percent-encoding set matching the conventional URL-quote default:
/// alphanumerics and `/ _ . - ~` stay literal.
const QUOTE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Detects whether the payload is reflected in the response, verbatim or in a
/// common encoded form.
pub fn detect_reflection(payload: &str, body: &str) -> (bool, String) {
    if body.contains(payload) {
        return (true, "Direct reflection".to_string());
    }

    let encoded_variants = [
        payload.replace('<', "&lt;").replace('>', "&gt;"),
        payload.replace('"', "&quot;").replace('\'', "&#x27;"),
        utf8_percent_encode(payload, QUOTE_SET).to_string(),
        BASE64.encode(payload.as_bytes()),
    ];

    for variant in &encoded_variants {
        if variant != payload && body.contains(variant.as_str()) {
            let shown: String = variant.chars().take(50).collect();
            return (true, format!("Encoded reflection: {}", shown));
        }
    }

    let payload_lower = payload.to_lowercase();
    let body_lower = body.to_lowercase();
    for (marker, desc) in XSS_MARKERS {
        if payload_lower.contains(marker) && body_lower.contains(marker) {
            return (true, format!("Partial XSS pattern: {}", desc));
        }
    }

    (false, "Not found".to_string())
}

/// Detects dangerous DOM sinks co-occurring with an executable payload.
pub fn detect_dom_sinks(payload: &str, body: &str) -> (bool, String) {
    let payload_lower = payload.to_lowercase();
    let payload_is_executable = PAYLOAD_DOM_MARKERS.iter().any(|m| payload_lower.contains(m));

    for sink in DOM_SINKS {
        if body.contains(sink) && payload_is_executable {
            return (true, format!("DOM sink detected: {}", sink));
        }
    }

    (false, "No DOM sinks found".to_string())
}

/// Detects whether the payload could break out of an attribute context.
pub fn detect_attribute_context(payload: &str, body: &str) -> (bool, String) {
    let in_attribute = body.contains("=\"") || body.contains("='");
    if in_attribute {
        let body_lower = body.to_lowercase();
        let payload_lower = payload.to_lowercase();
        if payload_lower.split_whitespace().any(|tok| body_lower.contains(tok)) {
            return (true, "Attribute context breakout potential".to_string());
        }
    }
    (false, "Not in attribute context".to_string())
}

/// Tags which filter classes the payload may have slipped past.
/// Informational only; never gates the vulnerability verdict.
pub fn check_filter_bypass(payload: &str, body: &str) -> Vec<String> {
    let mut bypasses = Vec::new();

    if payload.chars().any(|c| c.is_uppercase()) {
        // The payload text is matched as a regex, like the filters it targets.
        if let Ok(re) = RegexBuilder::new(payload).case_insensitive(true).build() {
            if re.is_match(body) {
                bypasses.push("case-variation bypass".to_string());
            }
        }
    }

    if payload.contains("%2F") || payload.contains("&#") || payload.contains("\\u") {
        bypasses.push("encoding bypass".to_string());
    }

    if payload.contains("%00") || payload.contains("\\x00") {
        bypasses.push("null-byte bypass".to_string());
    }

    let whitespace_tricks = ["\n", "\r", "\t", "&#9;", "&#10;", "&#13;"];
    if whitespace_tricks.iter().any(|ws| payload.contains(ws)) {
        bypasses.push("whitespace bypass".to_string());
    }

    bypasses
}

/// Picks the reported detection text by fixed priority:
/// reflection, then DOM sink, then attribute context.
pub fn priority_detection(
    reflection: &(bool, String),
    dom: &(bool, String),
    attribute: &(bool, String),
) -> String {
    if reflection.0 {
        reflection.1.clone()
    } else if dom.0 {
        dom.1.clone()
    } else {
        attribute.1.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_reflection() {
        let payload = "<script>alert(1)</script>";
        let body = "<div><script>alert(1)</script></div>";
        let (hit, why) = detect_reflection(payload, body);
        assert!(hit);
        assert_eq!(why, "Direct reflection");
    }

    #[test]
    fn test_entity_encoded_reflection() {
        let payload = "<script>alert(1)</script>";
        let body = "<div>&lt;script&gt;alert(1)&lt;/script&gt;</div>";
        // Entity-encoded form is present, raw form is not, but the shared
        // "alert"/"<script" markers must not shadow the encoded verdict.
        let (hit, why) = detect_reflection(payload, body);
        assert!(hit);
        assert!(why.starts_with("Encoded reflection"), "got: {}", why);
    }

    #[test]
    fn test_percent_encoded_reflection_keeps_slash_literal() {
        let payload = "</title><svg><animate onbegin=javascript:confirm(1) />";
        // Quote-style reflection: slashes stay literal, the rest is escaped.
        let body = format!(
            "<p>blocked input: {}</p>",
            utf8_percent_encode(payload, QUOTE_SET)
        );
        assert!(body.contains("%3C/title%3E"));
        let (hit, why) = detect_reflection(payload, &body);
        assert!(hit);
        assert!(why.starts_with("Encoded reflection"), "got: {}", why);
    }

    #[test]
    fn test_base64_reflection() {
        let payload = "injected-value";
        let body = format!("<div data-state=\"{}\"></div>", BASE64.encode(payload));
        let (hit, why) = detect_reflection(payload, &body);
        assert!(hit);
        assert!(why.starts_with("Encoded reflection"));
    }

    #[test]
    fn test_partial_marker_reflection() {
        let payload = "<img src=x onerror=alert(1)>";
        let body = "input rejected, but onerror handlers are logged";
        let (hit, why) = detect_reflection(payload, body);
        assert!(hit);
        assert!(why.contains("event handler detected"));
    }

    #[test]
    fn test_no_reflection() {
        let (hit, why) = detect_reflection("<svg onload=alert(1)>", "nothing to see here");
        assert!(!hit);
        assert_eq!(why, "Not found");
    }

    #[test]
    fn test_dom_sink_with_executable_payload() {
        let body = "<script>el.innerHTML = location.hash;</script>";
        let (hit, why) = detect_dom_sinks("<img src=x onerror=alert(1)>", body);
        assert!(hit);
        assert_eq!(why, "DOM sink detected: innerHTML");
    }

    #[test]
    fn test_dom_sink_requires_executable_payload() {
        let body = "<script>el.innerHTML = location.hash;</script>";
        let (hit, _) = detect_dom_sinks("harmless text", body);
        assert!(!hit);
    }

    #[test]
    fn test_attribute_context_breakout() {
        let payload = "\" onmouseover=alert(1) x=\"";
        let body = "<input value=\"\" onmouseover=alert(1) x=\"\">";
        let (hit, why) = detect_attribute_context(payload, body);
        assert!(hit);
        assert_eq!(why, "Attribute context breakout potential");
    }

    #[test]
    fn test_attribute_context_needs_assignment_pattern() {
        let (hit, _) = detect_attribute_context("alert(1)", "plain text alert(1) page");
        assert!(!hit);
    }

    #[test]
    fn test_case_variation_bypass() {
        let payload = "<ScRiPt>alert\\(1\\)</sCriPt>";
        let body = "<script>alert(1)</script>";
        let bypasses = check_filter_bypass(payload, body);
        assert!(bypasses.contains(&"case-variation bypass".to_string()));
    }

    #[test]
    fn test_encoding_and_nullbyte_bypass_tags() {
        let bypasses = check_filter_bypass("%2Fpath&#97;%00", "irrelevant");
        assert!(bypasses.contains(&"encoding bypass".to_string()));
        assert!(bypasses.contains(&"null-byte bypass".to_string()));
    }

    #[test]
    fn test_whitespace_bypass_tag() {
        let bypasses = check_filter_bypass("<svg\nonload=x>", "irrelevant");
        assert!(bypasses.contains(&"whitespace bypass".to_string()));
    }

    #[test]
    fn test_invalid_regex_payload_does_not_panic() {
        let bypasses = check_filter_bypass("<A[unclosed", "body");
        assert!(!bypasses.contains(&"case-variation bypass".to_string()));
    }

    #[test]
    fn test_no_bypasses_for_plain_payload() {
        assert!(check_filter_bypass("<script>alert(1)</script>", "other").is_empty());
    }

    #[test]
    fn test_priority_order() {
        let reflection = (true, "Direct reflection".to_string());
        let dom = (true, "DOM sink detected: eval".to_string());
        let attr = (true, "Attribute context breakout potential".to_string());
        assert_eq!(priority_detection(&reflection, &dom, &attr), "Direct reflection");

        let no_reflection = (false, "Not found".to_string());
        assert_eq!(
            priority_detection(&no_reflection, &dom, &attr),
            "DOM sink detected: eval"
        );
        let no_dom = (false, "No DOM sinks found".to_string());
        assert_eq!(
            priority_detection(&no_reflection, &no_dom, &attr),
            "Attribute context breakout potential"
        );
    }
}
