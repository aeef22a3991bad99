//! Document tree produced by the parser
//!
//! The tree is shallow: comments, module-level `import` declarations and
//! named-specifier `export` declarations are structured; everything else is
//! kept as verbatim code. Declarations remember their source text until they
//! are mutated, so untouched declarations print exactly as they were read.

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Whitespace, including newlines
    Trivia(String),
    Comment(Comment),
    /// Any other source text, verbatim
    Code(String),
    Import(ImportDeclaration),
    Export(ExportNamedDeclaration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub kind: CommentKind,
    /// Full text including the delimiters
    pub text: String,
}

impl Comment {
    pub fn new(kind: CommentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Comment text without the `//` or `/* */` delimiters.
    pub fn body(&self) -> &str {
        match self.kind {
            CommentKind::Line => self.text.strip_prefix("//").unwrap_or(&self.text),
            CommentKind::Block => self
                .text
                .strip_prefix("/*")
                .and_then(|t| t.strip_suffix("*/"))
                .unwrap_or(&self.text),
        }
    }
}

/// Whether a declaration or specifier carries a runtime value or only a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingKind {
    #[default]
    Value,
    /// `type`
    Type,
    /// `typeof`
    Typeof,
}

impl BindingKind {
    /// Keyword written before the bindings, if any.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            BindingKind::Value => None,
            BindingKind::Type => Some("type"),
            BindingKind::Typeof => Some("typeof"),
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "type" => Some(BindingKind::Type),
            "typeof" => Some(BindingKind::Typeof),
            _ => None,
        }
    }

    pub fn is_value(self) -> bool {
        self == BindingKind::Value
    }
}

/// A string literal as written: its quote character and the raw text between the quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    pub quote: char,
    pub raw: String,
}

/// `name`, `name as alias`, or `type name as alias` inside braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub kind: BindingKind,
    /// Identifier or string-literal source text
    pub name: String,
    pub alias: Option<String>,
}

impl Specifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: BindingKind::Value,
            name: name.into(),
            alias: None,
        }
    }
}

/// The braced specifier list of an import or export.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecifierList {
    pub items: Vec<Specifier>,
    /// The list was written across several lines
    pub multiline: bool,
}

/// `import [type|typeof] [default][, * as ns | { ... }] from 'source' [with {...}];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDeclaration {
    kind: BindingKind,
    default: Option<String>,
    namespace: Option<String>,
    specifiers: Option<SpecifierList>,
    source: StringLiteral,
    attributes: Option<String>,
    comments: Vec<Comment>,
    raw: Option<String>,
}

impl ImportDeclaration {
    /// A freshly built declaration with no source text; it always prints in canonical form.
    pub fn new(source: StringLiteral) -> Self {
        Self {
            kind: BindingKind::Value,
            default: None,
            namespace: None,
            specifiers: None,
            source,
            attributes: None,
            comments: Vec::new(),
            raw: None,
        }
    }

    pub(crate) fn with_parts(
        mut self,
        kind: BindingKind,
        default: Option<String>,
        namespace: Option<String>,
        specifiers: Option<SpecifierList>,
    ) -> Self {
        self.kind = kind;
        self.default = default;
        self.namespace = namespace;
        self.specifiers = specifiers;
        self
    }

    pub(crate) fn with_attributes(mut self, attributes: Option<String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub(crate) fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    pub(crate) fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: BindingKind) {
        if self.kind != kind {
            self.kind = kind;
            self.raw = None;
        }
    }

    pub fn default_binding(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn specifiers(&self) -> Option<&SpecifierList> {
        self.specifiers.as_ref()
    }

    /// Mutable access to the specifiers; the declaration will be re-printed.
    pub fn specifiers_mut(&mut self) -> Option<&mut SpecifierList> {
        self.raw = None;
        self.specifiers.as_mut()
    }

    pub fn source(&self) -> &StringLiteral {
        &self.source
    }

    pub fn attributes(&self) -> Option<&str> {
        self.attributes.as_deref()
    }

    /// Comments that appeared between the tokens of the declaration.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Drop interior comments failing `keep`; returns how many were dropped.
    pub fn retain_comments(&mut self, keep: impl FnMut(&Comment) -> bool) -> usize {
        let removed = retain_counting(&mut self.comments, keep);
        if removed > 0 {
            self.raw = None;
        }
        removed
    }

    /// Source text, present until the declaration is mutated.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

/// `export [type|typeof] { ... } [from 'source' [with {...}]];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportNamedDeclaration {
    kind: BindingKind,
    specifiers: SpecifierList,
    source: Option<StringLiteral>,
    attributes: Option<String>,
    comments: Vec<Comment>,
    raw: Option<String>,
}

impl ExportNamedDeclaration {
    pub fn new(specifiers: SpecifierList) -> Self {
        Self {
            kind: BindingKind::Value,
            specifiers,
            source: None,
            attributes: None,
            comments: Vec::new(),
            raw: None,
        }
    }

    pub(crate) fn with_kind(mut self, kind: BindingKind) -> Self {
        self.kind = kind;
        self
    }

    pub(crate) fn with_source(
        mut self,
        source: Option<StringLiteral>,
        attributes: Option<String>,
    ) -> Self {
        self.source = source;
        self.attributes = attributes;
        self
    }

    pub(crate) fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    pub(crate) fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: BindingKind) {
        if self.kind != kind {
            self.kind = kind;
            self.raw = None;
        }
    }

    pub fn specifiers(&self) -> &SpecifierList {
        &self.specifiers
    }

    /// Mutable access to the specifiers; the declaration will be re-printed.
    pub fn specifiers_mut(&mut self) -> &mut SpecifierList {
        self.raw = None;
        &mut self.specifiers
    }

    pub fn source(&self) -> Option<&StringLiteral> {
        self.source.as_ref()
    }

    pub fn attributes(&self) -> Option<&str> {
        self.attributes.as_deref()
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn retain_comments(&mut self, keep: impl FnMut(&Comment) -> bool) -> usize {
        let removed = retain_counting(&mut self.comments, keep);
        if removed > 0 {
            self.raw = None;
        }
        removed
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

fn retain_counting(comments: &mut Vec<Comment>, keep: impl FnMut(&Comment) -> bool) -> usize {
    let before = comments.len();
    comments.retain(keep);
    before - comments.len()
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportDeclaration> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Import(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn imports_mut(&mut self) -> impl Iterator<Item = &mut ImportDeclaration> {
        self.nodes.iter_mut().filter_map(|n| match n {
            Node::Import(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn exports(&self) -> impl Iterator<Item = &ExportNamedDeclaration> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Export(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn exports_mut(&mut self) -> impl Iterator<Item = &mut ExportNamedDeclaration> {
        self.nodes.iter_mut().filter_map(|n| match n {
            Node::Export(decl) => Some(decl),
            _ => None,
        })
    }

    /// Every comment in the document, including those inside declarations.
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.nodes.iter().flat_map(|n| {
            let (own, inner): (Option<&Comment>, &[Comment]) = match n {
                Node::Comment(c) => (Some(c), &[]),
                Node::Import(decl) => (None, decl.comments()),
                Node::Export(decl) => (None, decl.comments()),
                _ => (None, &[]),
            };
            own.into_iter().chain(inner.iter())
        })
    }

    /// Remove every comment matching `pred`, tidying the whitespace it leaves.
    ///
    /// A comment alone on its line takes the line with it. A comment trailing
    /// other text takes the spaces before it. Returns the number removed.
    pub fn remove_comments(&mut self, mut pred: impl FnMut(&Comment) -> bool) -> usize {
        let mut removed = 0;

        for node in &mut self.nodes {
            match node {
                Node::Import(decl) => removed += decl.retain_comments(|c| !pred(c)),
                Node::Export(decl) => removed += decl.retain_comments(|c| !pred(c)),
                _ => {}
            }
        }

        let targets: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                Node::Comment(c) if pred(c) => Some(i),
                _ => None,
            })
            .collect();

        let mut cleared_head = false;
        for &i in targets.iter().rev() {
            if self.leading_position(i) {
                cleared_head = true;
            }
            self.remove_comment_at(i);
            removed += 1;
        }

        if cleared_head {
            if let Some(Node::Trivia(text)) = self.nodes.first() {
                if text.trim().is_empty() {
                    self.nodes.remove(0);
                }
            }
        }

        removed
    }

    /// True if only whitespace precedes node `index`.
    fn leading_position(&self, index: usize) -> bool {
        self.nodes[..index]
            .iter()
            .all(|n| matches!(n, Node::Trivia(_)))
    }

    fn remove_comment_at(&mut self, index: usize) {
        let prev_line_tail = match index.checked_sub(1).map(|p| &self.nodes[p]) {
            None => Some(0),
            Some(Node::Trivia(text)) => {
                let tail = text.rsplit('\n').next().unwrap_or("");
                if text.contains('\n') || index == 1 {
                    Some(tail.len())
                } else {
                    None
                }
            }
            Some(_) => None,
        };
        let next_starts_line = match self.nodes.get(index + 1) {
            None => true,
            Some(Node::Trivia(text)) => {
                let rest = text.trim_start_matches([' ', '\t']);
                rest.starts_with('\n')
                    || rest.starts_with("\r\n")
                    || (rest.is_empty() && index + 2 == self.nodes.len())
            }
            Some(_) => false,
        };

        match (prev_line_tail, next_starts_line) {
            (Some(tail), true) => {
                // Own line: drop its indentation and its line break.
                if let Some(Node::Trivia(next)) = self.nodes.get_mut(index + 1) {
                    let rest = next.trim_start_matches([' ', '\t']);
                    let rest = rest
                        .strip_prefix("\r\n")
                        .or_else(|| rest.strip_prefix('\n'))
                        .unwrap_or(rest);
                    *next = rest.to_string();
                }
                if index > 0 {
                    if let Node::Trivia(prev) = &mut self.nodes[index - 1] {
                        let keep = prev.len() - tail;
                        prev.truncate(keep);
                    }
                }
            }
            _ => {
                // Trailing or inline: drop the spaces in front of it.
                if index > 0 {
                    if let Node::Trivia(prev) = &mut self.nodes[index - 1] {
                        if !prev.contains('\n') {
                            prev.clear();
                        }
                    }
                }
            }
        }

        self.nodes.remove(index);
        self.nodes
            .retain(|n| !matches!(n, Node::Trivia(text) if text.is_empty()));
    }
}
