//! Endpoint normalisation.
//!
//! Accepts a site URL in any of the three shapes users paste around and
//! produces the canonical `.../check_mk/webapi.py` URL.

const SCRIPT: &str = "webapi.py";
const CONFIG_ROOT: &str = "check_mk";

/// Resolve a user-supplied base URL to the web API endpoint.
///
/// ```
/// use cmk_core::resolve_endpoint;
///
/// let canonical = "http://h/monitor/check_mk/webapi.py";
/// assert_eq!(resolve_endpoint("http://h/monitor"), canonical);
/// assert_eq!(resolve_endpoint("http://h/monitor/check_mk/"), canonical);
/// assert_eq!(resolve_endpoint(canonical), canonical);
/// ```
pub fn resolve_endpoint(base_url: &str) -> String {
    let url = base_url.trim_end_matches('/');
    if url.ends_with(&format!("/{SCRIPT}")) {
        url.to_string()
    } else if url.ends_with(&format!("/{CONFIG_ROOT}")) {
        format!("{url}/{SCRIPT}")
    } else {
        format!("{url}/{CONFIG_ROOT}/{SCRIPT}")
    }
}
