use reqwest::Method;
use url::Url;

use crate::core::InjectionKind;

/// A fully built probe request: the rewritten URL plus, for POST injection,
/// the form body pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectedRequest {
    pub url: String,
    pub form_body: Option<Vec<(String, String)>>,
}

/// Builds the injected URL or form body for one payload against one point.
///
/// Fragment points get the raw payload spliced after `#`, leaving path and
/// query untouched. GET points get every listed parameter overwritten with the
/// payload (parameters absent from the query are appended). POST points keep
/// the URL and map every parameter to the payload in the form body.
pub fn build_injected(
    url: &str,
    payload: &str,
    params: &[String],
    method: &Method,
    kind: InjectionKind,
) -> Result<InjectedRequest, url::ParseError> {
    if kind == InjectionKind::Fragment {
        let base = url.split('#').next().unwrap_or(url);
        return Ok(InjectedRequest {
            url: format!("{}#{}", base, payload),
            form_body: None,
        });
    }

    if *method == Method::GET {
        let parsed = Url::parse(url)?;
        let existing: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        // Existing occurrences of a targeted key collapse into one injected
        // pair at the first occurrence; untouched keys keep their repeats.
        let mut rewritten: Vec<(String, String)> = Vec::new();
        let mut injected: Vec<&String> = Vec::new();
        for (k, v) in &existing {
            if params.iter().any(|p| p == k) {
                if !injected.iter().any(|p| *p == k) {
                    rewritten.push((k.clone(), payload.to_string()));
                    if let Some(p) = params.iter().find(|p| *p == k) {
                        injected.push(p);
                    }
                }
            } else {
                rewritten.push((k.clone(), v.clone()));
            }
        }
        for p in params {
            if !injected.iter().any(|q| *q == p) {
                rewritten.push((p.clone(), payload.to_string()));
            }
        }

        let mut out = parsed.clone();
        out.set_query(None);
        {
            let mut qp = out.query_pairs_mut();
            for (k, v) in &rewritten {
                qp.append_pair(k, v);
            }
        }
        return Ok(InjectedRequest { url: out.to_string(), form_body: None });
    }

    // POST: body maps each parameter to the identical payload, URL unchanged.
    let body = params
        .iter()
        .map(|p| (p.clone(), payload.to_string()))
        .collect();
    Ok(InjectedRequest { url: url.to_string(), form_body: Some(body) })
}
