//! Minimal host build that drives the plugin hooks over an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::assets::{Asset, AssetMap};
use crate::config::BundlerConfig;
use crate::error::ConfigError;
use crate::plugin::{EmitPlugin, StylesheetPlugin};
use crate::stylesheet::Stylesheet;

/// Summary of a pipeline run over an output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Stylesheet assets handed to the stylesheet plugins.
    pub stylesheets: usize,
    /// Asset paths written back to disk, relative to the output directory.
    pub written: Vec<String>,
}

/// Ordered set of plugins invoked at their build phases.
#[derive(Default)]
pub struct BuildPipeline {
    stylesheet_plugins: Vec<Box<dyn StylesheetPlugin>>,
    emit_plugins: Vec<Box<dyn EmitPlugin>>,
}

impl BuildPipeline {
    /// Pipeline without plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with the unit rewriter and the hashed HTML emitter configured from `config`.
    pub fn from_config(config: &BundlerConfig) -> Result<Self, ConfigError> {
        Ok(
            Self::new()
                .with_stylesheet_plugin(config.unit_rewriter()?)
                .with_emit_plugin(config.html_hash_emitter()?),
        )
    }

    /// Register a file transform plugin.
    pub fn with_stylesheet_plugin(mut self, plugin: impl StylesheetPlugin + 'static) -> Self {
        self.stylesheet_plugins.push(Box::new(plugin));
        self
    }

    /// Register an asset finalisation plugin.
    pub fn with_emit_plugin(mut self, plugin: impl EmitPlugin + 'static) -> Self {
        self.emit_plugins.push(Box::new(plugin));
        self
    }

    /// Run every stylesheet plugin over `sheet`, in registration order.
    pub fn transform_stylesheet(&self, sheet: &mut Stylesheet) {
        for plugin in &self.stylesheet_plugins {
            debug!(
                "{} -> {}",
                plugin.name(),
                sheet.path().map(|path| path.display().to_string()).unwrap_or_default()
            );
            plugin.transform(sheet);
        }
    }

    /// Run every emit plugin once over the finished asset mapping.
    pub fn emit(&self, assets: &mut AssetMap) -> Result<()> {
        for plugin in &self.emit_plugins {
            plugin
                .emit(assets)
                .with_context(|| format!("emit plugin `{}` failed", plugin.name()))?;
        }
        Ok(())
    }

    /// Stylesheet phase over every `.css` asset, then the emit phase.
    ///
    /// Asset keys are resolved against `root` to give the stylesheet plugins a file path.
    /// Returns the number of stylesheets processed.
    pub fn process(&self, root: &Path, assets: &mut AssetMap) -> Result<usize> {
        let mut stylesheets = 0;
        for (key, asset) in assets.iter_mut() {
            if !key.ends_with(".css") {
                continue;
            }

            let Ok(source) = std::str::from_utf8(asset.source()) else {
                warn!("skipping {key}: not valid UTF-8");
                continue;
            };

            let mut sheet = Stylesheet::parse(source, Some(root.join(key)));
            self.transform_stylesheet(&mut sheet);
            stylesheets += 1;

            let css = sheet.to_css();
            if css.as_bytes() != asset.source() {
                *asset = Asset::new(css);
            }
        }

        self.emit(assets)?;
        Ok(stylesheets)
    }

    /// Load `output_dir`, run both phases and write changed or new assets back.
    pub fn run(&self, output_dir: &Path) -> Result<BuildReport> {
        let original = load_assets(output_dir)?;
        let mut assets = original.clone();
        let stylesheets = self.process(output_dir, &mut assets)?;
        let written = write_assets(output_dir, &assets, &original)?;

        info!(
            "processed {stylesheets} stylesheet(s), wrote {} asset(s) to {}",
            written.len(),
            output_dir.display()
        );
        Ok(BuildReport {
            stylesheets,
            written,
        })
    }
}

/// Read every file under `root` into an asset mapping keyed by `/`-separated relative path.
pub fn load_assets(root: &Path) -> Result<AssetMap> {
    let mut files = Vec::new();
    collect_files(root, Path::new(""), &mut files)?;
    files.sort();

    let mut assets = AssetMap::new();
    for relative in files {
        let path = root.join(&relative);
        let content =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        let key = relative.to_string_lossy().replace('\\', "/");
        assets.insert(key, Asset::new(content));
    }
    Ok(assets)
}

/// Write assets that are new or differ from `previous`. Returns the written keys.
pub fn write_assets(root: &Path, assets: &AssetMap, previous: &AssetMap) -> Result<Vec<String>> {
    let mut written = Vec::new();
    for (key, asset) in assets {
        if previous.get(key).is_some_and(|old| old.source() == asset.source()) {
            continue;
        }

        let destination = root.join(key);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&destination, asset.source())
            .with_context(|| format!("failed to write {}", destination.display()))?;
        written.push(key.clone());
    }
    Ok(written)
}

fn collect_files(root: &Path, relative: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let current = root.join(relative);
    for entry in
        fs::read_dir(&current).with_context(|| format!("failed to read {}", current.display()))?
    {
        let entry = entry?;
        let child = relative.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_files(root, &child, files)?;
        } else if file_type.is_file() {
            files.push(child);
        }
    }
    Ok(())
}
