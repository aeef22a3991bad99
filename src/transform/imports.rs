use super::RewriteRule;
use crate::syntax::{BindingKind, Document};

/// Turns `import type` and `import typeof` declarations into value imports.
///
/// Specifiers keep whatever kind they were written with.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeImportKinds;

impl NormalizeImportKinds {
    pub const NAME: &'static str = "normalize-import-kinds";
}

impl RewriteRule for NormalizeImportKinds {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, doc: &mut Document) -> usize {
        let mut edits = 0;
        for decl in doc.imports_mut() {
            if !decl.kind().is_value() {
                decl.set_kind(BindingKind::Value);
                edits += 1;
            }
        }
        edits
    }
}
