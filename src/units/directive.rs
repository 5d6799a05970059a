//! File level override directive.
//!
//! A stylesheet containing `px2remvw-plugin-ipad` (usually inside a comment) is laid out
//! against a tablet viewport instead of the configured width. An explicit width may follow
//! the marker as `px2remvw-plugin-ipad:1024`.

use std::sync::OnceLock;

use regex::Regex;

/// Viewport width used when the directive carries no usable width.
pub const TABLET_VIEWPORT_WIDTH: f64 = 768.0;

fn directive() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)px2remvw-plugin-ipad(:(\d+))?").expect("invalid directive regex")
    })
}

/// Find the directive in `css` and return its captured width argument.
///
/// `None` means the directive is absent; `Some(None)` means it is present without a width.
pub fn find_directive(css: &str) -> Option<Option<&str>> {
    directive()
        .captures(css)
        .map(|caps| caps.get(2).map(|width| width.as_str()))
}

/// Viewport width requested by the directive in `css`, if any.
pub fn viewport_override(css: &str) -> Option<f64> {
    let argument = find_directive(css)?;
    let width = argument
        .and_then(|raw| raw.parse::<f64>().ok())
        .filter(|width| *width > 0.0)
        .unwrap_or(TABLET_VIEWPORT_WIDTH);
    Some(width)
}
