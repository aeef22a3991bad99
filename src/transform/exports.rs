use super::RewriteRule;
use crate::syntax::{BindingKind, Document};

/// Turns `export type { ... }` and `export typeof { ... }` into value exports.
///
/// Every specifier is reset to a value specifier as well, including `type`
/// specifiers inside an already-value declaration, so the declaration and its
/// specifiers never disagree.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeExportKinds;

impl NormalizeExportKinds {
    pub const NAME: &'static str = "normalize-export-kinds";
}

impl RewriteRule for NormalizeExportKinds {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, doc: &mut Document) -> usize {
        let mut edits = 0;
        for decl in doc.exports_mut() {
            if !decl.kind().is_value() {
                decl.set_kind(BindingKind::Value);
                edits += 1;
            }
            if decl.specifiers().items.iter().any(|s| !s.kind.is_value()) {
                for spec in &mut decl.specifiers_mut().items {
                    if !spec.kind.is_value() {
                        spec.kind = BindingKind::Value;
                        edits += 1;
                    }
                }
            }
        }
        edits
    }
}
