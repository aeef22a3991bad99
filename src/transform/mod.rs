//! Rewrite rules and the pipeline that runs them
//!
//! Each rule mutates the shared [`Document`] and reports how many edits it
//! made. Rules run in order; a rule sees the edits of the rules before it.

mod exports;
mod imports;
mod pragmas;

use crate::error::PipelineError;
use crate::syntax::{self, Document, PrintOptions};

pub use self::exports::NormalizeExportKinds;
pub use self::imports::NormalizeImportKinds;
pub use self::pragmas::StripPragmas;

/// A named, self-contained rewrite of a document.
pub trait RewriteRule: Send + Sync {
    /// Stable identifier used by `--disable-rule`.
    fn name(&self) -> &'static str;

    /// Rewrite `doc` in place and return the number of edits. Zero means no-op.
    fn apply(&self, doc: &mut Document) -> usize;
}

/// Ordered rules plus the print style for touched declarations.
pub struct Pipeline {
    rules: Vec<Box<dyn RewriteRule>>,
    options: PrintOptions,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("rules", &self.rule_names())
            .field("options", &self.options)
            .finish()
    }
}

impl Pipeline {
    /// Names of the built-in rules, in pipeline order.
    pub const STANDARD_RULES: &'static [&'static str] = &[
        StripPragmas::NAME,
        NormalizeImportKinds::NAME,
        NormalizeExportKinds::NAME,
    ];

    /// An empty pipeline: parse and print only.
    pub fn new(options: PrintOptions) -> Self {
        Self {
            rules: Vec::new(),
            options,
        }
    }

    /// Pragma stripping, then import and export kind normalization.
    pub fn standard() -> Self {
        Self::new(PrintOptions::default())
            .with_rule(StripPragmas)
            .with_rule(NormalizeImportKinds)
            .with_rule(NormalizeExportKinds)
    }

    /// Append `rule` to the end of the pipeline.
    pub fn with_rule(mut self, rule: impl RewriteRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Remove every rule called `name`. Unknown names are ignored.
    pub fn without(mut self, name: &str) -> Self {
        self.rules.retain(|rule| rule.name() != name);
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn options(&self) -> &PrintOptions {
        &self.options
    }

    /// Apply every rule to an already parsed document; returns total edits.
    pub fn apply(&self, doc: &mut Document) -> usize {
        self.rules
            .iter()
            .map(|rule| {
                let edits = rule.apply(doc);
                if edits > 0 {
                    tracing::debug!(rule = rule.name(), edits, "rule applied");
                }
                edits
            })
            .sum()
    }

    /// Parse, rewrite and print `source`.
    ///
    /// Nothing is printed if parsing fails.
    pub fn run(&self, source: &str) -> Result<String, PipelineError> {
        self.run_counted(source).map(|(output, _)| output)
    }

    /// Like [`Pipeline::run`], also returning the number of edits made.
    pub fn run_counted(&self, source: &str) -> Result<(String, usize), PipelineError> {
        let mut doc = syntax::parse(source)?;
        let edits = self.apply(&mut doc);
        Ok((syntax::print(&doc, &self.options), edits))
    }
}
