//! Pixel token replacement and precision rounding.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Largest accepted `unitPrecision`; `f64` carries no more significant decimals.
pub const MAX_UNIT_PRECISION: u32 = 15;

/// Matches quoted strings, `url(...)` spans and comments so they can be passed through
/// untouched, capturing the number of every other `<number>px` token.
fn pixel_token() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)"[^"]+"|'[^']+'|url\([^)]+\)|/\*(?s:.*?)\*/|(\d*\.?\d+)px"#)
            .expect("invalid pixel regex")
    })
}

/// Whether `value` contains the `px` suffix anywhere, ignoring case.
pub fn has_pixel_candidate(value: &str) -> bool {
    value
        .as_bytes()
        .windows(2)
        .any(|pair| pair.eq_ignore_ascii_case(b"px"))
}

/// Round `value` to `precision` decimals, half up.
///
/// The value is scaled one digit past the requested precision and floored before the
/// final rounding step, so products such as `37.5 / 7.5` land on `5` rather than on a
/// binary neighbour like `4.99999`. Precisions above [`MAX_UNIT_PRECISION`] are clamped.
pub fn round_to_precision(value: f64, precision: u32) -> f64 {
    let exponent = i32::try_from(precision.min(MAX_UNIT_PRECISION)).unwrap_or(0) + 1;
    let multiplier = 10f64.powi(exponent);
    let whole = (value * multiplier).floor();
    (whole / 10.0).round() * 10.0 / multiplier
}

/// Converts `<number>px` tokens into a relative unit with a fixed ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelReplacer {
    /// Pixels per target unit.
    pub ratio: f64,
    /// Unit suffix written after the converted number.
    pub unit: &'static str,
    /// Tokens at or below this pixel value are left as written.
    pub min_pixel_value: f64,
    /// Number of decimal digits kept after conversion.
    pub precision: u32,
}

impl PixelReplacer {
    /// Rewrite every eligible pixel token in `value`.
    pub fn replace(&self, value: &str) -> String {
        pixel_token()
            .replace_all(value, |caps: &Captures| self.replace_token(caps))
            .into_owned()
    }

    fn replace_token(&self, caps: &Captures) -> String {
        let matched = &caps[0];
        let Some(number) = caps.get(1) else {
            return matched.to_string();
        };
        let Ok(pixels) = number.as_str().parse::<f64>() else {
            return matched.to_string();
        };
        if pixels <= self.min_pixel_value {
            return matched.to_string();
        }

        let converted = round_to_precision(pixels / self.ratio, self.precision);
        format!("{converted}{}", self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vw(ratio: f64, precision: u32) -> PixelReplacer {
        PixelReplacer {
            ratio,
            unit: "vw",
            min_pixel_value: 1.0,
            precision,
        }
    }

    #[test]
    fn rounds_without_binary_artifacts() {
        assert_eq!(round_to_precision(37.5 / 7.5, 2), 5.0);
        assert_eq!(round_to_precision(0.125, 2), 0.13);
        assert_eq!(round_to_precision(2.0 / 3.0, 3), 0.667);
        assert_eq!(round_to_precision(0.000004, 5), 0.0);
    }

    #[test]
    fn clamps_oversized_precision() {
        assert_eq!(round_to_precision(2.5, u32::MAX), 2.5);
        assert_eq!(round_to_precision(2.5, 400), round_to_precision(2.5, MAX_UNIT_PRECISION));
    }

    #[test]
    fn converts_tokens_above_minimum() {
        assert_eq!(vw(7.5, 2).replace("37.5px"), "5vw");
        assert_eq!(vw(7.5, 5).replace("0 16px"), "0 2.13333vw");
        assert_eq!(vw(7.5, 5).replace(".75px 75PX"), ".75px 10vw");
    }

    #[test]
    fn leaves_tokens_at_or_below_minimum() {
        assert_eq!(vw(7.5, 5).replace("1px solid #000"), "1px solid #000");
        assert_eq!(vw(7.5, 5).replace("0px"), "0px");
    }

    #[test]
    fn skips_strings_and_urls() {
        let replacer = vw(7.5, 5);
        assert_eq!(
            replacer.replace("url(icon-75px.png) 75px"),
            "url(icon-75px.png) 10vw"
        );
        assert_eq!(replacer.replace("\"75px\" '150px'"), "\"75px\" '150px'");
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            vw(7.5, 5).replace("0 /* was 750px */ 75px"),
            "0 /* was 750px */ 10vw"
        );
    }

    #[test]
    fn ignores_non_pixel_numbers() {
        assert_eq!(vw(7.5, 5).replace("1.5em 30% 2rem"), "1.5em 30% 2rem");
    }

    #[test]
    fn detects_candidates_case_insensitively() {
        assert!(has_pixel_candidate("10PX"));
        assert!(has_pixel_candidate("calc(100% - 10px)"));
        assert!(!has_pixel_candidate("1em"));
    }
}
