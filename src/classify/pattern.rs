//! Path glob patterns compiled to anchored regular expressions
//!
//! - `**` matches zero or more whole path segments
//! - `*` matches zero or more characters within one segment
//! - `?` matches exactly one character within one segment
//!
//! Everything else is literal. A leading `**/` may consume nothing, so
//! `**/test/**` matches `test/a.js`; a trailing `/**` also matches the
//! directory itself, so `**/test/**` matches `src/test`.

use regex::Regex;

/// A compiled skip pattern.
#[derive(Debug, Clone)]
pub struct SkipPattern {
    source: String,
    regex: Regex,
}

impl SkipPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_string(),
            regex: Regex::new(&glob_to_regex(pattern))?,
        })
    }

    /// The pattern text as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whole-string match against a forward-slash path.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Translate a glob into an anchored regex source string.
///
/// Wildcards are recognized first and literal runs are escaped as they are
/// emitted, so escaped text is never read back as wildcard syntax.
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        let rest = &chars[i..];
        match rest {
            ['/', '*', '*'] => {
                out.push_str("(?:/.*)?");
                i += 3;
            }
            ['*', '*', '/', ..] if i == 0 || chars[i - 1] == '/' => {
                out.push_str("(?:.*/)?");
                i += 3;
            }
            ['*', '*', ..] => {
                out.push_str(".*");
                i += 2;
            }
            ['*', ..] => {
                out.push_str("[^/]*");
                i += 1;
            }
            ['?', ..] => {
                out.push_str("[^/]");
                i += 1;
            }
            [c, ..] => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
            [] => break,
        }
    }

    out.push('$');
    out
}

/// Return the first pattern matching `path`, if any.
pub fn first_match<'a>(patterns: &'a [SkipPattern], path: &str) -> Option<&'a SkipPattern> {
    patterns.iter().find(|p| p.matches(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        SkipPattern::new(pattern).unwrap().matches(path)
    }

    #[test]
    fn test_translation() {
        assert_eq!(glob_to_regex("*.js"), r"^[^/]*\.js$");
        assert_eq!(glob_to_regex("a?c"), r"^a[^/]c$");
        assert_eq!(glob_to_regex("**/x"), r"^(?:.*/)?x$");
        assert_eq!(glob_to_regex("x/**"), r"^x(?:/.*)?$");
        assert_eq!(glob_to_regex("a/**b"), r"^a/.*b$");
    }

    #[test]
    fn test_double_star_directory() {
        assert!(matches("**/test/**", "src/test/unit/a.js"));
        assert!(matches("**/test/**", "test/a.js"));
        assert!(matches("**/test/**", "src/test"));
        assert!(!matches("**/test/**", "src/testing/a.js"));
        assert!(!matches("**/test/**", "src/contest/a.js"));
    }

    #[test]
    fn test_double_star_file() {
        assert!(matches("**/*.test.js", "src/a.test.js"));
        assert!(matches("**/*.test.js", "a.test.js"));
        assert!(!matches("**/*.test.js", "src/a.test.js.bak"));
        assert!(!matches("**/*.test.js", "src/a_test.js"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        assert!(matches("src/*.js", "src/a.js"));
        assert!(!matches("src/*.js", "src/lib/a.js"));
        assert!(matches("src/**/*.js", "src/a.js"));
        assert!(matches("src/**/*.js", "src/lib/deep/a.js"));
    }

    #[test]
    fn test_question_mark() {
        assert!(matches("a?.js", "ab.js"));
        assert!(!matches("a?.js", "a/.js"));
        assert!(!matches("a?.js", "abc.js"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        assert!(matches("a+b.js", "a+b.js"));
        assert!(!matches("a+b.js", "aab.js"));
        assert!(matches("(x)[1].js", "(x)[1].js"));
        assert!(!matches("a.js", "abjs"));
        assert!(matches("$weird^.js", "$weird^.js"));
    }

    #[test]
    fn test_full_path_anchoring() {
        assert!(!matches("dist/**", "src/dist/a.js"));
        assert!(matches("dist/**", "dist/a.js"));
        assert!(!matches("a.js", "src/a.js"));
    }

    #[test]
    fn test_absolute_paths_with_leading_double_star() {
        assert!(matches("**/node_modules/**", "/tmp/x/node_modules/lib/a.js"));
    }

    #[test]
    fn test_first_match_short_circuits_in_order() {
        let patterns = vec![
            SkipPattern::new("**/*.js").unwrap(),
            SkipPattern::new("**/a.js").unwrap(),
        ];
        assert_eq!(first_match(&patterns, "x/a.js").unwrap().as_str(), "**/*.js");
        assert!(first_match(&patterns, "x/a.ts").is_none());
    }
}
