//! Typed options for the unit rewriter.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, de};

use crate::error::ConfigError;
use crate::units::replace::MAX_UNIT_PRECISION;
use crate::units::rewriter::UnitRewriter;

const VENDOR_PREFIXES: [&str; 4] = ["-webkit-", "-moz-", "-o-", "-ms-"];

/// Viewport relative unit produced by the viewport conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportUnit {
    /// Percentage of the viewport width.
    #[default]
    Vw,
    /// Percentage of the smaller viewport dimension.
    Vmin,
}

impl ViewportUnit {
    /// CSS suffix for the unit.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vw => "vw",
            Self::Vmin => "vmin",
        }
    }
}

/// Options accepted by the unit rewriter, as written in configuration.
///
/// `viewport_width` and `rem_root` accept `false`, `null` or `0` to switch the
/// corresponding conversion off. `exclude` and `include` accept a regular expression
/// string or `false`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnitOptions {
    /// Design width in pixels that maps to `100vw`. Default `750`.
    #[serde(deserialize_with = "number_or_false")]
    pub viewport_width: Option<f64>,
    /// Unit emitted by the viewport conversion. Default `vw`.
    pub viewport_unit: ViewportUnit,
    /// Root font size in pixels that maps to `1rem`. Default `100`.
    #[serde(deserialize_with = "number_or_false")]
    pub rem_root: Option<f64>,
    /// Pixel values at or below this threshold are never converted. Default `1`.
    pub min_pixel_value: f64,
    /// Decimal digits kept in converted values, at most `15`. Default `5`.
    pub unit_precision: u32,
    /// Property names left untouched, with or without a vendor prefix.
    pub ignore_property: Vec<String>,
    /// Files whose path matches are passed through. Default off.
    #[serde(deserialize_with = "pattern_or_false")]
    pub exclude: Option<String>,
    /// When set, only files whose path matches are converted. Default off.
    #[serde(deserialize_with = "pattern_or_false")]
    pub include: Option<String>,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            viewport_width: Some(750.0),
            viewport_unit: ViewportUnit::Vw,
            rem_root: Some(100.0),
            min_pixel_value: 1.0,
            unit_precision: 5,
            ignore_property: Vec::new(),
            exclude: None,
            include: None,
        }
    }
}

impl UnitOptions {
    /// Validate the options and compile them into a rewriter.
    pub fn build(&self) -> Result<UnitRewriter, ConfigError> {
        let viewport_width = positive("viewportWidth", self.viewport_width)?;
        let rem_root = positive("remRoot", self.rem_root)?;
        if !self.min_pixel_value.is_finite() {
            return Err(ConfigError::InvalidNumber {
                option: "minPixelValue",
                value: self.min_pixel_value,
            });
        }
        if self.unit_precision > MAX_UNIT_PRECISION {
            return Err(ConfigError::InvalidNumber {
                option: "unitPrecision",
                value: f64::from(self.unit_precision),
            });
        }

        Ok(UnitRewriter {
            viewport_width,
            viewport_unit: self.viewport_unit,
            rem_root,
            min_pixel_value: self.min_pixel_value,
            precision: self.unit_precision,
            ignored_properties: ignored_property_pattern(&self.ignore_property)?,
            exclude: compile_pattern("exclude", self.exclude.as_deref())?,
            include: compile_pattern("include", self.include.as_deref())?,
        })
    }
}

fn positive(option: &'static str, value: Option<f64>) -> Result<Option<f64>, ConfigError> {
    match value {
        Some(value) if !value.is_finite() || value < 0.0 => {
            Err(ConfigError::InvalidNumber { option, value })
        }
        Some(value) if value == 0.0 => Ok(None),
        other => Ok(other),
    }
}

fn compile_pattern(
    option: &'static str,
    pattern: Option<&str>,
) -> Result<Option<Regex>, ConfigError> {
    pattern
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { option, source })
        })
        .transpose()
}

fn ignored_property_pattern(properties: &[String]) -> Result<Option<Regex>, ConfigError> {
    if properties.is_empty() {
        return Ok(None);
    }

    let prefixes = VENDOR_PREFIXES
        .iter()
        .map(|prefix| regex::escape(prefix))
        .collect::<Vec<_>>()
        .join("|");
    let names = properties
        .iter()
        .map(|name| regex::escape(name.trim()))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&format!("^({prefixes})?({names})$"))
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|source| ConfigError::InvalidPattern {
            option: "ignoreProperty",
            source,
        })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrFlag {
    Number(f64),
    Flag(bool),
}

fn number_or_false<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrFlag>::deserialize(deserializer)? {
        Some(NumberOrFlag::Number(value)) => Ok(Some(value)),
        Some(NumberOrFlag::Flag(false)) | None => Ok(None),
        Some(NumberOrFlag::Flag(true)) => Err(de::Error::custom("expected a number or `false`")),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternOrFlag {
    Pattern(String),
    Flag(bool),
}

fn pattern_or_false<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<PatternOrFlag>::deserialize(deserializer)? {
        Some(PatternOrFlag::Pattern(pattern)) => Ok(Some(pattern)),
        Some(PatternOrFlag::Flag(false)) | None => Ok(None),
        Some(PatternOrFlag::Flag(true)) => Err(de::Error::custom("expected a pattern or `false`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options: UnitOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, UnitOptions::default());
        assert_eq!(options.viewport_width, Some(750.0));
        assert_eq!(options.rem_root, Some(100.0));
        assert_eq!(options.unit_precision, 5);
    }

    #[test]
    fn false_and_zero_disable_conversions() {
        let options: UnitOptions =
            serde_json::from_str(r#"{ "viewportWidth": false, "remRoot": 0, "exclude": false }"#)
                .unwrap();
        assert_eq!(options.viewport_width, None);
        assert_eq!(options.rem_root, Some(0.0));
        assert_eq!(options.exclude, None);

        let rewriter = options.build().unwrap();
        assert_eq!(rewriter.viewport_width, None);
        assert_eq!(rewriter.rem_root, None);
    }

    #[test]
    fn parses_vmin_and_patterns() {
        let options: UnitOptions = serde_json::from_str(
            r#"{ "viewportUnit": "vmin", "include": "src/", "ignoreProperty": ["border"] }"#,
        )
        .unwrap();
        assert_eq!(options.viewport_unit, ViewportUnit::Vmin);
        assert_eq!(options.include.as_deref(), Some("src/"));
        assert!(options.build().is_ok());
    }

    #[test]
    fn rejects_true_flags_and_unknown_units() {
        assert!(serde_json::from_str::<UnitOptions>(r#"{ "remRoot": true }"#).is_err());
        assert!(serde_json::from_str::<UnitOptions>(r#"{ "viewportUnit": "rem" }"#).is_err());
    }

    #[test]
    fn rejects_malformed_patterns_at_setup() {
        let options = UnitOptions {
            exclude: Some("node_modules(".into()),
            ..UnitOptions::default()
        };
        let err = options.build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPattern {
                option: "exclude",
                ..
            }
        ));
    }

    #[test]
    fn rejects_precision_beyond_f64_digits() {
        let options: UnitOptions = serde_json::from_str(r#"{ "unitPrecision": 400 }"#).unwrap();
        assert!(matches!(
            options.build(),
            Err(ConfigError::InvalidNumber {
                option: "unitPrecision",
                ..
            })
        ));

        let options = UnitOptions {
            unit_precision: MAX_UNIT_PRECISION,
            ..UnitOptions::default()
        };
        assert!(options.build().is_ok());
    }

    #[test]
    fn rejects_negative_widths() {
        let options = UnitOptions {
            viewport_width: Some(-1.0),
            ..UnitOptions::default()
        };
        assert!(matches!(
            options.build(),
            Err(ConfigError::InvalidNumber {
                option: "viewportWidth",
                ..
            })
        ));
    }

    #[test]
    fn ignored_properties_match_vendor_prefixes() {
        let pattern = ignored_property_pattern(&["border".into(), "font-size".into()])
            .unwrap()
            .unwrap();
        assert!(pattern.is_match("border"));
        assert!(pattern.is_match("-webkit-border"));
        assert!(pattern.is_match("Font-Size"));
        assert!(!pattern.is_match("border-width"));
        assert!(!pattern.is_match("-khtml-border"));
    }
}
