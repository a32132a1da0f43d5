pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Looks up `name` in a `document.cookie` string.
///
/// The raw value is returned; the browser layer URI-decodes it.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then(|| v.to_string())
        })
}

pub fn csrf_token(cookies: &str) -> Option<String> {
    cookie_value(cookies, CSRF_COOKIE)
}
