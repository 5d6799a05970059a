//! Rewrites pixel lengths in stylesheet declarations into viewport and root relative units.

use std::path::Path;

use log::{debug, trace};
use regex::Regex;

use crate::plugin::StylesheetPlugin;
use crate::stylesheet::{AtRule, Declaration, Node, Stylesheet};
use crate::units::directive::viewport_override;
use crate::units::options::ViewportUnit;
use crate::units::replace::{PixelReplacer, has_pixel_candidate};

/// Validated unit rewriter built from [`crate::units::UnitOptions`].
#[derive(Debug, Clone)]
pub struct UnitRewriter {
    pub(crate) viewport_width: Option<f64>,
    pub(crate) viewport_unit: ViewportUnit,
    pub(crate) rem_root: Option<f64>,
    pub(crate) min_pixel_value: f64,
    pub(crate) precision: u32,
    pub(crate) ignored_properties: Option<Regex>,
    pub(crate) exclude: Option<Regex>,
    pub(crate) include: Option<Regex>,
}

/// Outcome of rewriting one stylesheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Whether the file passed the include/exclude filters.
    pub admitted: bool,
    /// Declarations whose value changed.
    pub rewritten: usize,
    /// Root relative declarations inserted ahead of a viewport converted sibling.
    pub inserted: usize,
}

/// Replacers in effect for a single file.
#[derive(Debug, Clone, Copy)]
struct Passes {
    viewport: Option<PixelReplacer>,
    rem: Option<PixelReplacer>,
}

impl UnitRewriter {
    /// Whether a file at `path` is subject to conversion.
    ///
    /// When `include` is configured it alone decides; otherwise files matching `exclude`
    /// are passed through. A stylesheet without a path is matched as the empty string.
    pub fn admits(&self, path: Option<&Path>) -> bool {
        let file = path
            .map(|path| path.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        match (&self.include, &self.exclude) {
            (Some(include), _) => include.is_match(&file),
            (None, Some(exclude)) => !exclude.is_match(&file),
            (None, None) => true,
        }
    }

    /// Rewrite every eligible declaration of `sheet` in place.
    pub fn rewrite(&self, sheet: &mut Stylesheet) -> RewriteSummary {
        let mut summary = RewriteSummary::default();
        if !self.admits(sheet.path()) {
            debug!(
                "skipping {}: filtered by include/exclude",
                sheet.path().map(|path| path.display().to_string()).unwrap_or_default()
            );
            return summary;
        }
        summary.admitted = true;

        let passes = self.passes_for(sheet.source());
        if passes.viewport.is_none() && passes.rem.is_none() {
            return summary;
        }

        sheet.walk_rules_mut(|rule| self.rewrite_block(&mut rule.nodes, &passes, &mut summary));
        summary
    }

    fn passes_for(&self, css: &str) -> Passes {
        let viewport_width = match viewport_override(css) {
            Some(width) => {
                debug!("viewport base overridden to {width}px by file directive");
                Some(width)
            }
            None => self.viewport_width,
        };

        Passes {
            viewport: viewport_width
                .map(|width| self.replacer(width / 100.0, self.viewport_unit.as_str())),
            rem: self.rem_root.map(|root| self.replacer(root, "rem")),
        }
    }

    fn replacer(&self, ratio: f64, unit: &'static str) -> PixelReplacer {
        PixelReplacer {
            ratio,
            unit,
            min_pixel_value: self.min_pixel_value,
            precision: self.precision,
        }
    }

    /// Rewrite the declarations of a rule block and of every block nested in it.
    ///
    /// Nested rules are visited again by the outer rule walk; by then their values hold no
    /// convertible tokens, so the second visit changes nothing.
    fn rewrite_block(
        &self,
        nodes: &mut Vec<Node>,
        passes: &Passes,
        summary: &mut RewriteSummary,
    ) {
        let mut index = 0;
        while index < nodes.len() {
            let suppressed = matches!(
                nodes.get(index + 1),
                Some(Node::Comment(comment)) if is_suppression(&comment.text)
            );

            let sibling = match &mut nodes[index] {
                Node::Declaration(decl) if !suppressed => {
                    if self.is_eligible(decl) {
                        self.rewrite_declaration(decl, passes, summary)
                    } else {
                        None
                    }
                }
                Node::Rule(rule) => {
                    self.rewrite_block(&mut rule.nodes, passes, summary);
                    None
                }
                Node::AtRule(AtRule {
                    nodes: Some(children),
                    ..
                }) => {
                    self.rewrite_block(children, passes, summary);
                    None
                }
                _ => None,
            };

            if let Some(sibling) = sibling {
                nodes.insert(index, Node::Declaration(sibling));
                summary.inserted += 1;
                index += 1;
            }
            index += 1;
        }
    }

    fn is_eligible(&self, decl: &Declaration) -> bool {
        if !has_pixel_candidate(&decl.value) {
            return false;
        }
        !self
            .ignored_properties
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(&decl.prop))
    }

    /// Returns the root relative sibling to insert before `decl` when both passes apply.
    fn rewrite_declaration(
        &self,
        decl: &mut Declaration,
        passes: &Passes,
        summary: &mut RewriteSummary,
    ) -> Option<Declaration> {
        let original = decl.value.clone();
        if let Some(viewport) = &passes.viewport {
            decl.value = viewport.replace(&original);
        }

        let mut sibling = None;
        if let Some(rem) = &passes.rem {
            let rem_value = rem.replace(&original);
            if passes.viewport.is_some() && rem_value != original {
                sibling = Some(decl.with_value(rem_value));
            } else {
                decl.value = rem_value;
            }
        }

        if decl.value != original {
            trace!("{}: {} -> {}", decl.prop, original, decl.value);
            summary.rewritten += 1;
        }
        sibling
    }
}

impl StylesheetPlugin for UnitRewriter {
    fn name(&self) -> &'static str {
        "px2remvw"
    }

    fn transform(&self, sheet: &mut Stylesheet) {
        self.rewrite(sheet);
    }
}

fn is_suppression(text: &str) -> bool {
    text.eq_ignore_ascii_case("px") || text.eq_ignore_ascii_case("no")
}
