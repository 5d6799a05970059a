//! Hook interface between the host build and the plugins it drives.

use anyhow::Result;

use crate::assets::AssetMap;
use crate::stylesheet::Stylesheet;

/// File transform hook, invoked synchronously once per stylesheet.
pub trait StylesheetPlugin {
    /// Name used in log output.
    fn name(&self) -> &'static str;

    /// Transform `sheet` in place. Returning signals completion.
    fn transform(&self, sheet: &mut Stylesheet);
}

/// Asset finalisation hook, invoked once per build after every asset is materialised.
pub trait EmitPlugin {
    /// Name used in log output.
    fn name(&self) -> &'static str;

    /// Inspect and rewrite the build's assets.
    ///
    /// Returning `Ok(())` is the completion signal; an error is surfaced to the host, which
    /// decides whether the build aborts. The plugin borrows the mapping for the duration of
    /// the call and never retains it.
    fn emit(&self, assets: &mut AssetMap) -> Result<()>;
}
