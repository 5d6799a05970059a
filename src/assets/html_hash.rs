//! Publishes a content-hashed copy of the interactive HTML entry and points its manifests at it.

use anyhow::Result;
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::assets::{Asset, AssetMap, content_digest};
use crate::error::ConfigError;
use crate::plugin::EmitPlugin;

const DEFAULT_HTML_PATTERN: &str = r"/interactive/index\.html";
const DEFAULT_MANIFEST_PATTERN: &str = r"/interactive-manifest/index\.html";
const DEFAULT_OUTPUT_DIR: &str = "static/html/interactive/";
const DEFAULT_BOE_BASE_URL: &str = "https://gglmind.bytedance.net";
const DEFAULT_ONLINE_BASE_URL: &str = "https://mind.ggl.cn";
const DEFAULT_DIGEST_LENGTH: usize = 8;
const DEFAULT_MARKER: &str = "<!-- take hash -->";
const MAX_DIGEST_LENGTH: usize = 64;

/// Options for [`HtmlHashEmitter`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HtmlHashOptions {
    /// Pattern selecting the HTML asset whose content is hashed.
    pub html_pattern: String,
    /// Pattern selecting manifest assets rewritten to point at the hashed HTML.
    pub manifest_pattern: String,
    /// Directory the hashed HTML copy is emitted into.
    pub output_dir: String,
    /// Base URL of the staging (BOE) environment.
    pub boe_base_url: String,
    /// Base URL of the production environment.
    pub online_base_url: String,
    /// Number of hex characters kept from the digest.
    pub digest_length: usize,
    /// Marker appended to the hashed HTML copy.
    pub marker: String,
}

impl Default for HtmlHashOptions {
    fn default() -> Self {
        Self {
            html_pattern: DEFAULT_HTML_PATTERN.into(),
            manifest_pattern: DEFAULT_MANIFEST_PATTERN.into(),
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            boe_base_url: DEFAULT_BOE_BASE_URL.into(),
            online_base_url: DEFAULT_ONLINE_BASE_URL.into(),
            digest_length: DEFAULT_DIGEST_LENGTH,
            marker: DEFAULT_MARKER.into(),
        }
    }
}

impl HtmlHashOptions {
    /// Compile the asset patterns into an emitter.
    pub fn build(&self) -> Result<HtmlHashEmitter, ConfigError> {
        let compile = |option: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { option, source })
        };

        let mut output_dir = self.output_dir.trim_start_matches('/').to_string();
        if !output_dir.is_empty() && !output_dir.ends_with('/') {
            output_dir.push('/');
        }

        Ok(HtmlHashEmitter {
            html_pattern: compile("htmlPattern", &self.html_pattern)?,
            manifest_pattern: compile("manifestPattern", &self.manifest_pattern)?,
            output_dir,
            boe_base_url: self.boe_base_url.trim_end_matches('/').to_string(),
            online_base_url: self.online_base_url.trim_end_matches('/').to_string(),
            digest_length: self.digest_length.clamp(1, MAX_DIGEST_LENGTH),
            marker: self.marker.clone(),
        })
    }
}

/// Redirect document written into every manifest asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectManifest {
    /// Staging redirect URL.
    pub boe: String,
    /// Production redirect URL.
    pub online: String,
}

/// Emit hook that hashes the designated HTML asset and republishes it under its digest.
///
/// The emitted `index.<digest>.html` contains the original bytes followed by the marker, but
/// reports the original byte length as its size. Consumers read either value, so both are
/// kept as they are.
#[derive(Debug, Clone)]
pub struct HtmlHashEmitter {
    html_pattern: Regex,
    manifest_pattern: Regex,
    output_dir: String,
    boe_base_url: String,
    online_base_url: String,
    digest_length: usize,
    marker: String,
}

impl Default for HtmlHashEmitter {
    fn default() -> Self {
        Self {
            html_pattern: Regex::new(DEFAULT_HTML_PATTERN).expect("invalid default html pattern"),
            manifest_pattern: Regex::new(DEFAULT_MANIFEST_PATTERN)
                .expect("invalid default manifest pattern"),
            output_dir: DEFAULT_OUTPUT_DIR.into(),
            boe_base_url: DEFAULT_BOE_BASE_URL.into(),
            online_base_url: DEFAULT_ONLINE_BASE_URL.into(),
            digest_length: DEFAULT_DIGEST_LENGTH,
            marker: DEFAULT_MARKER.into(),
        }
    }
}

impl HtmlHashEmitter {
    /// Rewrite `assets` and return the digest used.
    pub fn apply(&self, assets: &mut AssetMap) -> Result<String> {
        let html_source = self.designated_html(assets);
        let digest = content_digest(&html_source, self.digest_length);

        let manifest = serde_json::to_string_pretty(&self.redirect_manifest(&digest))?;
        for (path, asset) in assets.iter_mut() {
            if self.manifest_pattern.is_match(path) {
                info!("rewriting manifest {path}");
                *asset = Asset::new(manifest.as_bytes());
            }
        }

        let hashed_path = self.hashed_html_path(&digest);
        let mut content = html_source.clone();
        content.extend_from_slice(self.marker.as_bytes());
        assets.insert(
            hashed_path.clone(),
            Asset::with_reported_size(content, html_source.len()),
        );
        info!("emitted {hashed_path}");

        Ok(digest)
    }

    /// Path the hashed HTML copy is written to for `digest`.
    pub fn hashed_html_path(&self, digest: &str) -> String {
        format!("{}index.{digest}.html", self.output_dir)
    }

    /// Redirect document pointing both environments at `digest`.
    pub fn redirect_manifest(&self, digest: &str) -> RedirectManifest {
        RedirectManifest {
            boe: format!("{}/interactive/redirect?htmlHash={digest}", self.boe_base_url),
            online: format!("{}/interactive/redirect?htmlHash={digest}", self.online_base_url),
        }
    }

    /// Content of the designated HTML asset, empty when none matches. The last match wins.
    fn designated_html(&self, assets: &AssetMap) -> Vec<u8> {
        let matches: Vec<(&String, &Asset)> = assets
            .iter()
            .filter(|(path, _)| self.html_pattern.is_match(path))
            .collect();

        if matches.len() > 1 {
            warn!(
                "{} assets match {}; hashing {}",
                matches.len(),
                self.html_pattern,
                matches[matches.len() - 1].0
            );
        }

        match matches.last() {
            Some((_, asset)) => asset.source().to_vec(),
            None => {
                warn!("no asset matches {}; hashing empty content", self.html_pattern);
                Vec::new()
            }
        }
    }
}

impl EmitPlugin for HtmlHashEmitter {
    fn name(&self) -> &'static str {
        "html-hash"
    }

    fn emit(&self, assets: &mut AssetMap) -> Result<()> {
        let digest = self.apply(assets)?;
        info!("interactive html digest {digest}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = "<html><body>interactive</body></html>";

    fn assets() -> AssetMap {
        let mut assets = AssetMap::new();
        assets.insert("static/js/main.js".into(), Asset::new("console.log(1)"));
        assets.insert("html/interactive/index.html".into(), Asset::new(HTML));
        assets.insert(
            "html/interactive-manifest/index.html".into(),
            Asset::new("<html>placeholder</html>"),
        );
        assets
    }

    #[test]
    fn emits_hashed_copy_with_marker_and_original_size() {
        let mut assets = assets();
        let digest = HtmlHashEmitter::default().apply(&mut assets).unwrap();

        assert_eq!(digest, content_digest(HTML.as_bytes(), 8));
        assert_eq!(digest.len(), 8);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let hashed = &assets[&format!("static/html/interactive/index.{digest}.html")];
        assert_eq!(hashed.source(), format!("{HTML}<!-- take hash -->").as_bytes());
        assert_eq!(hashed.size(), HTML.len());
        assert_eq!(assets.len(), 4);
    }

    #[test]
    fn manifests_point_at_digest() {
        let mut assets = assets();
        let digest = HtmlHashEmitter::default().apply(&mut assets).unwrap();

        let manifest = &assets["html/interactive-manifest/index.html"];
        let document: RedirectManifest = serde_json::from_slice(manifest.source()).unwrap();
        assert_eq!(
            document.boe,
            format!("https://gglmind.bytedance.net/interactive/redirect?htmlHash={digest}")
        );
        assert_eq!(
            document.online,
            format!("https://mind.ggl.cn/interactive/redirect?htmlHash={digest}")
        );
        assert_eq!(manifest.size(), manifest.source().len());
    }

    #[test]
    fn digest_is_stable_across_runs() {
        let emitter = HtmlHashEmitter::default();
        let first = emitter.apply(&mut assets()).unwrap();
        let second = emitter.apply(&mut assets()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_html_hashes_empty_content() {
        let mut assets = AssetMap::new();
        assets.insert("static/js/main.js".into(), Asset::new("x"));

        let digest = HtmlHashEmitter::default().apply(&mut assets).unwrap();
        assert_eq!(digest, "e3b0c442");

        let hashed = &assets["static/html/interactive/index.e3b0c442.html"];
        assert_eq!(hashed.source(), b"<!-- take hash -->");
        assert_eq!(hashed.size(), 0);
        assert_eq!(assets["static/js/main.js"].source(), b"x");
    }

    #[test]
    fn options_override_layout_and_length() {
        let options = HtmlHashOptions {
            output_dir: "/pages".into(),
            digest_length: 6,
            boe_base_url: "https://staging.example.com/".into(),
            ..HtmlHashOptions::default()
        };
        let emitter = options.build().unwrap();
        let mut assets = assets();
        let digest = emitter.apply(&mut assets).unwrap();

        assert_eq!(digest.len(), 6);
        assert!(assets.contains_key(&format!("pages/index.{digest}.html")));
        assert_eq!(
            emitter.redirect_manifest(&digest).boe,
            format!("https://staging.example.com/interactive/redirect?htmlHash={digest}")
        );
    }

    #[test]
    fn rejects_malformed_patterns() {
        let options = HtmlHashOptions {
            manifest_pattern: "(".into(),
            ..HtmlHashOptions::default()
        };
        assert!(matches!(
            options.build(),
            Err(ConfigError::InvalidPattern {
                option: "manifestPattern",
                ..
            })
        ));
    }
}
