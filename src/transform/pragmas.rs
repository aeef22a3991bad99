//! Removal of Flow pragma and suppression comments

use std::sync::LazyLock;

use regex::Regex;

use super::RewriteRule;
use crate::syntax::Document;

/// `@flow` in any mode, `@noflow`, and the error suppression markers.
static PRAGMA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@flow\b|@noflow\b|\$Flow(?:FixMe|Issue|ExpectedError|Ignore)\b")
        .expect("PRAGMA_PATTERN regex is invalid")
});

/// Check whether comment text carries a Flow pragma or suppression.
pub fn is_pragma(comment_text: &str) -> bool {
    PRAGMA_PATTERN.is_match(comment_text)
}

/// Deletes every comment that mentions a Flow pragma, along with the line it
/// sat on when it was alone there.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripPragmas;

impl StripPragmas {
    pub const NAME: &'static str = "strip-pragmas";
}

impl RewriteRule for StripPragmas {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, doc: &mut Document) -> usize {
        doc.remove_comments(|c| is_pragma(c.body()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{PrintOptions, parse, print};

    fn strip(src: &str) -> (String, usize) {
        let mut doc = parse(src).unwrap();
        let edits = StripPragmas.apply(&mut doc);
        (print(&doc, &PrintOptions::default()), edits)
    }

    #[test]
    fn test_pattern() {
        assert!(is_pragma(" @flow"));
        assert!(is_pragma(" @flow strict-local"));
        assert!(is_pragma("*\n * @noflow\n "));
        assert!(is_pragma(" $FlowFixMe[incompatible-call]"));
        assert!(is_pragma(" $FlowExpectedError"));
        assert!(is_pragma(" $FlowIgnore"));
        assert!(!is_pragma(" @flowtype is not a pragma"));
        assert!(!is_pragma(" ordinary comment"));
        assert!(!is_pragma(" $FlowFixMeLater"));
    }

    #[test]
    fn test_header_pragma_line_removed() {
        let (out, edits) = strip("// @flow\nconst a = 1;\n");
        assert_eq!(out, "const a = 1;\n");
        assert_eq!(edits, 1);
    }

    #[test]
    fn test_block_header_removed() {
        let (out, _) = strip("/**\n * @flow strict\n */\n\nimport a from 'a';\n");
        assert_eq!(out, "import a from 'a';\n");
    }

    #[test]
    fn test_indented_suppression_removed_with_its_line() {
        let src = "function f() {\n  // $FlowFixMe\n  return g();\n}\n";
        let (out, _) = strip(src);
        assert_eq!(out, "function f() {\n  return g();\n}\n");
    }

    #[test]
    fn test_trailing_suppression_removed_with_leading_space() {
        let (out, _) = strip("const x = y; // $FlowIssue\nnext();\n");
        assert_eq!(out, "const x = y;\nnext();\n");
    }

    #[test]
    fn test_inline_block_suppression() {
        let (out, _) = strip("call(/* $FlowFixMe */ arg);\n");
        assert_eq!(out, "call( arg);\n");
    }

    #[test]
    fn test_other_comments_untouched() {
        let src = "// keep me\n/* and me */\nconst a = 1;\n";
        let (out, edits) = strip(src);
        assert_eq!(out, src);
        assert_eq!(edits, 0);
    }

    #[test]
    fn test_comment_inside_declaration() {
        let (out, edits) = strip("import {\n  a, // $FlowFixMe\n  b,\n} from 'x';\n");
        assert_eq!(edits, 1);
        assert_eq!(out, "import {\n  a,\n  b,\n} from 'x';\n");
    }

    #[test]
    fn test_second_pass_is_noop() {
        let (once, _) = strip("// @flow\n// $FlowFixMe\nfoo();\n");
        let (twice, edits) = strip(&once);
        assert_eq!(once, "foo();\n");
        assert_eq!(twice, once);
        assert_eq!(edits, 0);
    }
}
