use url::Url;

/// Host (and port) of an endpoint URL for menu display.
pub fn short_host(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "not configured".to_owned();
    }

    if let Ok(url) = Url::parse(raw) {
        if let Some(host) = url.host_str() {
            return match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_owned(),
            };
        }
    }

    let after_scheme = raw.rsplit("//").next().unwrap_or(raw);
    after_scheme
        .split('/')
        .next()
        .unwrap_or(after_scheme)
        .to_owned()
}
