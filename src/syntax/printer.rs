//! Document to text
//!
//! Untouched nodes are written back exactly as they were read. Declarations
//! that a rule modified are printed in one canonical style.

use super::ast::{
    BindingKind, Comment, Document, ExportNamedDeclaration, ImportDeclaration, Node, Specifier,
    SpecifierList, StringLiteral,
};

/// Formatting used for re-printed declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    /// Preferred string quote
    pub quote: char,
    /// Trailing comma after the last item of a multi-line list
    pub trailing_comma: bool,
    pub tab_width: usize,
    pub use_tabs: bool,
    /// Lists longer than this are broken over several lines
    pub wrap_column: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            quote: '\'',
            trailing_comma: true,
            tab_width: 2,
            use_tabs: false,
            wrap_column: 80,
        }
    }
}

impl PrintOptions {
    fn indent(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.tab_width)
        }
    }
}

/// Print `doc` back to source text.
pub fn print(doc: &Document, options: &PrintOptions) -> String {
    let eol = line_ending(doc);
    let mut out = String::new();
    for node in &doc.nodes {
        match node {
            Node::Trivia(text) | Node::Code(text) => out.push_str(text),
            Node::Comment(comment) => out.push_str(&comment.text),
            Node::Import(decl) => match decl.raw() {
                Some(raw) => out.push_str(raw),
                None => print_import(&mut out, decl, options, eol),
            },
            Node::Export(decl) => match decl.raw() {
                Some(raw) => out.push_str(raw),
                None => print_export(&mut out, decl, options, eol),
            },
        }
    }
    out
}

/// `\r\n` if the first line break in `doc` is one, otherwise `\n`.
fn line_ending(doc: &Document) -> &'static str {
    let first_break = doc.nodes.iter().find_map(|node| {
        let text = match node {
            Node::Trivia(text) | Node::Code(text) => text.as_str(),
            Node::Comment(comment) => comment.text.as_str(),
            Node::Import(decl) => decl.raw()?,
            Node::Export(decl) => decl.raw()?,
        };
        text.find('\n').map(|i| text[..i].ends_with('\r'))
    });
    match first_break {
        Some(true) => "\r\n",
        _ => "\n",
    }
}

/// Comments from between a declaration's tokens go on their own lines above it.
fn hoist_comments(out: &mut String, comments: &[Comment], eol: &str) {
    for comment in comments {
        out.push_str(&comment.text);
        out.push_str(eol);
    }
}

fn print_import(out: &mut String, decl: &ImportDeclaration, options: &PrintOptions, eol: &str) {
    hoist_comments(out, decl.comments(), eol);

    let mut head = String::from("import");
    push_kind(&mut head, decl.kind());

    let mut clauses: Vec<String> = Vec::new();
    if let Some(default) = decl.default_binding() {
        clauses.push(default.to_string());
    }
    if let Some(namespace) = decl.namespace() {
        clauses.push(format!("* as {}", namespace));
    }

    let mut tail = String::new();
    let has_bindings = !clauses.is_empty() || decl.specifiers().is_some();
    if has_bindings {
        tail.push_str(" from");
    }
    tail.push(' ');
    tail.push_str(&quote_string(decl.source(), options.quote));
    if let Some(attributes) = decl.attributes() {
        tail.push(' ');
        tail.push_str(attributes);
    }
    tail.push(';');

    head.push(' ');
    head.push_str(&clauses.join(", "));
    match decl.specifiers() {
        Some(list) => {
            if !clauses.is_empty() {
                head.push_str(", ");
            }
            push_specifier_list(out, &head, list, &tail, options, eol);
        }
        None => {
            out.push_str(head.trim_end());
            out.push_str(&tail);
        }
    }
}

fn print_export(
    out: &mut String,
    decl: &ExportNamedDeclaration,
    options: &PrintOptions,
    eol: &str,
) {
    hoist_comments(out, decl.comments(), eol);

    let mut head = String::from("export");
    push_kind(&mut head, decl.kind());
    head.push(' ');

    let mut tail = String::new();
    if let Some(source) = decl.source() {
        tail.push_str(" from ");
        tail.push_str(&quote_string(source, options.quote));
        if let Some(attributes) = decl.attributes() {
            tail.push(' ');
            tail.push_str(attributes);
        }
    }
    tail.push(';');

    push_specifier_list(out, &head, decl.specifiers(), &tail, options, eol);
}

fn push_kind(head: &mut String, kind: BindingKind) {
    if let Some(keyword) = kind.keyword() {
        head.push(' ');
        head.push_str(keyword);
    }
}

/// `head{ a, b }tail`, or one specifier per line when it was written that way or is too long.
fn push_specifier_list(
    out: &mut String,
    head: &str,
    list: &SpecifierList,
    tail: &str,
    options: &PrintOptions,
    eol: &str,
) {
    let items: Vec<String> = list.items.iter().map(print_specifier).collect();

    if items.is_empty() {
        out.push_str(head);
        out.push_str("{}");
        out.push_str(tail);
        return;
    }

    let flat = format!("{}{{ {} }}{}", head, items.join(", "), tail);
    if !list.multiline && flat.chars().count() <= options.wrap_column {
        out.push_str(&flat);
        return;
    }

    let indent = options.indent();
    out.push_str(head);
    out.push('{');
    out.push_str(eol);
    let last = items.len() - 1;
    for (i, item) in items.iter().enumerate() {
        out.push_str(&indent);
        out.push_str(item);
        if i < last || options.trailing_comma {
            out.push(',');
        }
        out.push_str(eol);
    }
    out.push('}');
    out.push_str(tail);
}

fn print_specifier(spec: &Specifier) -> String {
    let mut text = String::new();
    if let Some(keyword) = spec.kind.keyword() {
        text.push_str(keyword);
        text.push(' ');
    }
    text.push_str(&spec.name);
    if let Some(alias) = &spec.alias {
        text.push_str(" as ");
        text.push_str(alias);
    }
    text
}

/// Re-quote a string literal with `preferred` unless that would need more escaping.
fn quote_string(lit: &StringLiteral, preferred: char) -> String {
    if lit.quote == preferred || lit.raw.contains(preferred) {
        return format!("{0}{1}{0}", lit.quote, lit.raw);
    }

    let mut out = String::with_capacity(lit.raw.len() + 2);
    out.push(preferred);
    let mut chars = lit.raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if next == lit.quote => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out.push(preferred);
    out
}
