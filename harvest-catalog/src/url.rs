/// Size token substituted into screenshot URLs by default.
pub const DEFAULT_SIZE_TOKEN: &str = "t_screenshot_big";

/// Size token the catalog puts in listed screenshot URLs.
const THUMB_TOKEN: &str = "t_thumb";

/// Turn a catalog screenshot URL into something fetchable at full size.
///
/// Protocol-relative URLs (`//host/path`) get an `https:` scheme, and the
/// thumbnail size token is swapped for `size_token`.
pub fn normalize_image_url(url: &str, size_token: &str) -> String {
    let url = url.trim();
    let upgraded = url.replace(THUMB_TOKEN, size_token);
    if upgraded.starts_with("http://") || upgraded.starts_with("https://") {
        upgraded
    } else if upgraded.starts_with("//") {
        format!("https:{upgraded}")
    } else {
        format!("https://{upgraded}")
    }
}
