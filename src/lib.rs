#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod assets;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod plugin;
pub mod stylesheet;
pub mod units;

pub use assets::{Asset, AssetMap, HtmlHashEmitter, HtmlHashOptions};
pub use config::BundlerConfig;
pub use error::ConfigError;
pub use pipeline::{BuildPipeline, BuildReport};
pub use plugin::{EmitPlugin, StylesheetPlugin};
pub use stylesheet::Stylesheet;
pub use units::{UnitOptions, UnitRewriter, ViewportUnit};
