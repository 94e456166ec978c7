use std::collections::HashSet;
use std::time::Duration;

pub const USER_AGENT: &str = concat!("showcase/", env!("CARGO_PKG_VERSION"));

/// Shared client for dataset fetches and the realtime-database backend.
pub fn build_http_client(
    timeout_seconds: u64,
    proxy: Option<&str>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(USER_AGENT),
    );

    let timeout = Duration::from_secs(if timeout_seconds == 0 { 10 } else { timeout_seconds });
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    builder.build()
}

/// Splits `a, b,,c` into ids, dropping blanks and repeats but keeping order.
pub fn parse_id_csv(value: &str) -> Result<Vec<String>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("id list is empty".to_string());
    }
    let mut out = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        if item.contains('/') {
            return Err(format!("invalid project id '{item}'"));
        }
        if seen.insert(item) {
            out.push(item.to_string());
        }
    }
    if out.is_empty() {
        return Err("id list is empty".to_string());
    }
    Ok(out)
}

/// Accepts `5` or `5/s`. Zero disables limiting.
pub fn parse_rate(value: &str) -> Result<u32, String> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("/s").unwrap_or(trimmed).trim();
    number
        .parse::<u32>()
        .map_err(|_| format!("invalid rate '{value}', expected requests per second"))
}
