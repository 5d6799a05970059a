//! Pixel to `rem`/`vw` rewriting for stylesheet declarations.
//!
//! Each declaration value is scanned for `<number>px` tokens, skipping quoted strings,
//! comments and `url(...)` references. Tokens above the configured minimum are divided by the
//! viewport ratio (`viewportWidth / 100`) and/or the root font size. When both conversions are active
//! the root relative form is inserted as a sibling declaration ahead of the viewport form so
//! browsers without viewport unit support fall back to `rem`.
//!
//! A trailing `/* px */` or `/* no */` comment right after a declaration leaves it alone, and a
//! `px2remvw-plugin-ipad[:width]` marker anywhere in a file switches that file to a tablet
//! viewport base.

mod directive;
mod options;
mod replace;
mod rewriter;

pub use directive::{TABLET_VIEWPORT_WIDTH, find_directive, viewport_override};
pub use options::{UnitOptions, ViewportUnit};
pub use replace::{MAX_UNIT_PRECISION, PixelReplacer, has_pixel_candidate, round_to_precision};
pub use rewriter::{RewriteSummary, UnitRewriter};
