//! Token stream to `Document`
//!
//! Bracket nesting is tracked over the whole file so that `import` and
//! `export` are only recognized as declarations at module level. Everything
//! that is not a comment or one of those declarations becomes verbatim code.

use crate::error::SyntaxError;

use super::ast::{
    BindingKind, Comment, CommentKind, Document, ExportNamedDeclaration, ImportDeclaration, Node,
    Specifier, SpecifierList, StringLiteral,
};
use super::scanner::{Token, TokenKind, tokenize};

/// Parse `source` into a document.
///
/// Fails on unterminated block comments or template literals, unbalanced
/// brackets, and malformed module-level import/export declarations.
pub fn parse(source: &str) -> Result<Document, SyntaxError> {
    let tokens = tokenize(source)?;
    DocumentBuilder::new(source, &tokens).build()
}

struct DocumentBuilder<'a> {
    src: &'a str,
    tokens: &'a [Token],
    nodes: Vec<Node>,
    /// Open brackets with their byte offsets
    brackets: Vec<(char, usize)>,
    prev_significant: Option<Token>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(src: &'a str, tokens: &'a [Token]) -> Self {
        Self {
            src,
            tokens,
            nodes: Vec::new(),
            brackets: Vec::new(),
            prev_significant: None,
        }
    }

    fn build(mut self) -> Result<Document, SyntaxError> {
        let mut i = 0;
        while i < self.tokens.len() {
            let token = self.tokens[i];
            match token.kind {
                TokenKind::Whitespace => {
                    self.nodes.push(Node::Trivia(token.text(self.src).to_string()));
                    i += 1;
                    continue;
                }
                TokenKind::LineComment => {
                    self.push_comment(CommentKind::Line, token);
                    i += 1;
                    continue;
                }
                TokenKind::BlockComment => {
                    self.push_comment(CommentKind::Block, token);
                    i += 1;
                    continue;
                }
                _ => {}
            }

            if self.at_module_level() && !self.after_dot() {
                if token.is_ident(self.src, "import") && self.is_import_declaration(i) {
                    let mut cursor = DeclCursor::new(self.src, self.tokens, i + 1);
                    let decl = cursor.import_declaration()?;
                    let raw = &self.src[token.start..cursor.end_offset()];
                    self.nodes.push(Node::Import(
                        decl.with_comments(cursor.comments).with_raw(raw),
                    ));
                    self.prev_significant = Some(self.tokens[cursor.pos - 1]);
                    i = cursor.pos;
                    continue;
                }
                if token.is_ident(self.src, "export") {
                    let mut cursor = DeclCursor::new(self.src, self.tokens, i + 1);
                    if let Some(decl) = cursor.export_declaration()? {
                        let raw = &self.src[token.start..cursor.end_offset()];
                        self.nodes.push(Node::Export(
                            decl.with_comments(cursor.comments).with_raw(raw),
                        ));
                        self.prev_significant = Some(self.tokens[cursor.pos - 1]);
                        i = cursor.pos;
                        continue;
                    }
                }
            }

            self.track_bracket(token)?;
            self.push_code(token.text(self.src));
            self.prev_significant = Some(token);
            i += 1;
        }

        if let Some(&(open, offset)) = self.brackets.last() {
            return Err(SyntaxError::at(
                self.src,
                offset,
                format!("unclosed `{}`", open),
            ));
        }

        Ok(Document::new(self.nodes))
    }

    fn at_module_level(&self) -> bool {
        self.brackets.is_empty()
    }

    fn after_dot(&self) -> bool {
        self.prev_significant
            .is_some_and(|t| t.is_punct(self.src, '.'))
    }

    /// `import(...)` and `import.meta` are expressions, not declarations.
    fn is_import_declaration(&self, index: usize) -> bool {
        match self.tokens[index + 1..].iter().find(|t| !t.is_trivia()) {
            Some(next) => !(next.is_punct(self.src, '(') || next.is_punct(self.src, '.')),
            None => true,
        }
    }

    fn track_bracket(&mut self, token: Token) -> Result<(), SyntaxError> {
        if token.kind != TokenKind::Punct {
            return Ok(());
        }
        let c = token.text(self.src).chars().next().unwrap_or(' ');
        match c {
            '{' | '(' | '[' => self.brackets.push((c, token.start)),
            '}' | ')' | ']' => {
                let expected = match c {
                    '}' => '{',
                    ')' => '(',
                    _ => '[',
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, offset)) => {
                        let (line, column) = crate::error::line_col(self.src, offset);
                        return Err(SyntaxError::at(
                            self.src,
                            token.start,
                            format!(
                                "mismatched `{}` (`{}` opened at {}:{})",
                                c, open, line, column
                            ),
                        ));
                    }
                    None => {
                        return Err(SyntaxError::at(
                            self.src,
                            token.start,
                            format!("unexpected `{}`", c),
                        ));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn push_comment(&mut self, kind: CommentKind, token: Token) {
        self.nodes
            .push(Node::Comment(Comment::new(kind, token.text(self.src))));
    }

    /// Append code, folding whitespace that sits between two code runs into one node.
    fn push_code(&mut self, text: &str) {
        let len = self.nodes.len();
        if let Some(Node::Code(code)) = self.nodes.last_mut() {
            code.push_str(text);
            return;
        }
        if len >= 2 {
            if let (Node::Code(_), Node::Trivia(_)) = (&self.nodes[len - 2], &self.nodes[len - 1]) {
                if let Some(Node::Trivia(space)) = self.nodes.pop() {
                    if let Some(Node::Code(code)) = self.nodes.last_mut() {
                        code.push_str(&space);
                        code.push_str(text);
                        return;
                    }
                }
            }
        }
        self.nodes.push(Node::Code(text.to_string()));
    }
}

/// Reads one declaration, skipping whitespace and collecting comments between its tokens.
struct DeclCursor<'a> {
    src: &'a str,
    tokens: &'a [Token],
    pos: usize,
    comments: Vec<Comment>,
}

impl<'a> DeclCursor<'a> {
    fn new(src: &'a str, tokens: &'a [Token], pos: usize) -> Self {
        Self {
            src,
            tokens,
            pos,
            comments: Vec::new(),
        }
    }

    /// Byte offset just past the last consumed token.
    fn end_offset(&self) -> usize {
        self.tokens[self.pos - 1].end
    }

    fn significant_index(&self, n: usize) -> Option<usize> {
        self.tokens[self.pos..]
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_trivia())
            .nth(n)
            .map(|(offset, _)| self.pos + offset)
    }

    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.significant_index(n).map(|i| self.tokens[i])
    }

    fn peek(&self) -> Option<Token> {
        self.peek_nth(0)
    }

    fn peek_is_punct(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_punct(self.src, c))
    }

    fn peek_is_ident(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_ident(self.src, word))
    }

    fn bump(&mut self) -> Option<Token> {
        let index = self.significant_index(0)?;
        for token in &self.tokens[self.pos..index] {
            let kind = match token.kind {
                TokenKind::LineComment => CommentKind::Line,
                TokenKind::BlockComment => CommentKind::Block,
                _ => continue,
            };
            self.comments
                .push(Comment::new(kind, token.text(self.src)));
        }
        self.pos = index + 1;
        Some(self.tokens[index])
    }

    fn error(&self, message: &str) -> SyntaxError {
        let offset = match self.peek() {
            Some(t) => t.start,
            None => self.src.len(),
        };
        SyntaxError::at(self.src, offset, message)
    }

    fn expect_punct(&mut self, c: char, message: &str) -> Result<Token, SyntaxError> {
        if self.peek_is_punct(c) {
            self.bump().ok_or_else(|| self.error(message))
        } else {
            Err(self.error(message))
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Ident => {
                self.bump();
                Ok(t.text(self.src).to_string())
            }
            _ => Err(self.error(message)),
        }
    }

    fn expect_keyword(&mut self, word: &str, message: &str) -> Result<(), SyntaxError> {
        if self.peek_is_ident(word) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn string_literal(&mut self) -> Result<StringLiteral, SyntaxError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Str => {
                self.bump();
                let text = t.text(self.src);
                let quote = text.chars().next().unwrap_or('\'');
                Ok(StringLiteral {
                    quote,
                    raw: text[1..text.len() - 1].to_string(),
                })
            }
            _ => Err(self.error("expected a module specifier string")),
        }
    }

    /// A `type`/`typeof` keyword in modifier position, if `is_modifier` agrees.
    fn kind_modifier(&self) -> Option<BindingKind> {
        let token = self.peek()?;
        if token.kind != TokenKind::Ident {
            return None;
        }
        BindingKind::from_keyword(token.text(self.src))
    }

    /// `with { ... }` or `assert { ... }` after the module specifier.
    fn attributes(&mut self) -> Result<Option<String>, SyntaxError> {
        let is_clause = (self.peek_is_ident("with") || self.peek_is_ident("assert"))
            && self.peek_nth(1).is_some_and(|t| t.is_punct(self.src, '{'));
        if !is_clause {
            return Ok(None);
        }
        let start = self.bump().map(|t| t.start).unwrap_or(0);
        self.bump();
        loop {
            match self.bump() {
                Some(t) if t.is_punct(self.src, '}') => {
                    return Ok(Some(self.src[start..t.end].to_string()));
                }
                Some(_) => {}
                None => return Err(self.error("unterminated import attributes")),
            }
        }
    }

    fn semicolon(&mut self) {
        if self.peek_is_punct(';') {
            self.bump();
        }
    }

    fn import_declaration(&mut self) -> Result<ImportDeclaration, SyntaxError> {
        if self.peek().is_some_and(|t| t.kind == TokenKind::Str) {
            let source = self.string_literal()?;
            let attributes = self.attributes()?;
            self.semicolon();
            return Ok(ImportDeclaration::new(source).with_attributes(attributes));
        }

        let mut kind = BindingKind::Value;
        if let Some(modifier) = self.kind_modifier() {
            // `import type from 'x'` and `import type, {...}` bind a default named `type`.
            let next = self.peek_nth(1);
            let is_binding_name = next.is_some_and(|t| t.is_punct(self.src, ','))
                || (next.is_some_and(|t| t.is_ident(self.src, "from"))
                    && self.peek_nth(2).is_some_and(|t| t.kind == TokenKind::Str));
            if !is_binding_name {
                kind = modifier;
                self.bump();
            }
        }

        let mut default = None;
        let mut namespace = None;
        let mut specifiers = None;

        if self.peek().is_some_and(|t| t.kind == TokenKind::Ident) {
            default = Some(self.expect_ident("expected a default import name")?);
            if self.peek_is_punct(',') {
                self.bump();
                if !(self.peek_is_punct('*') || self.peek_is_punct('{')) {
                    return Err(self.error("expected `*` or `{` after `,` in import"));
                }
            }
        }

        if self.peek_is_punct('*') {
            self.bump();
            self.expect_keyword("as", "expected `as` after `*` in import")?;
            namespace = Some(self.expect_ident("expected a namespace name")?);
        } else if self.peek_is_punct('{') {
            specifiers = Some(self.specifier_list()?);
        }

        if default.is_none() && namespace.is_none() && specifiers.is_none() {
            return Err(self.error("expected import bindings"));
        }

        self.expect_keyword("from", "expected `from` in import declaration")?;
        let source = self.string_literal()?;
        let attributes = self.attributes()?;
        self.semicolon();

        Ok(ImportDeclaration::new(source)
            .with_parts(kind, default, namespace, specifiers)
            .with_attributes(attributes))
    }

    /// `None` when the export is not a braced specifier list (e.g. `export const`).
    fn export_declaration(&mut self) -> Result<Option<ExportNamedDeclaration>, SyntaxError> {
        let mut kind = BindingKind::Value;
        if let Some(modifier) = self.kind_modifier() {
            if self.peek_nth(1).is_some_and(|t| t.is_punct(self.src, '{')) {
                kind = modifier;
                self.bump();
            }
        }
        if !self.peek_is_punct('{') {
            return Ok(None);
        }

        let specifiers = self.specifier_list()?;
        let mut source = None;
        let mut attributes = None;
        if self.peek_is_ident("from") {
            self.bump();
            source = Some(self.string_literal()?);
            attributes = self.attributes()?;
        }
        self.semicolon();

        Ok(Some(
            ExportNamedDeclaration::new(specifiers)
                .with_kind(kind)
                .with_source(source, attributes),
        ))
    }

    fn specifier_name(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(t) if matches!(t.kind, TokenKind::Ident | TokenKind::Str) => {
                self.bump();
                Ok(t.text(self.src).to_string())
            }
            _ => Err(self.error("expected a specifier name")),
        }
    }

    fn specifier_list(&mut self) -> Result<SpecifierList, SyntaxError> {
        let open = self.expect_punct('{', "expected `{`")?;
        let mut items = Vec::new();

        let close = loop {
            match self.peek() {
                None => return Err(self.error("unterminated specifier list")),
                Some(t) if t.is_punct(self.src, '}') => {
                    self.bump();
                    break t;
                }
                Some(_) => {}
            }

            let mut kind = BindingKind::Value;
            if let Some(modifier) = self.kind_modifier() {
                let is_modifier = match self.peek_nth(1) {
                    Some(next) if next.is_ident(self.src, "as") => self
                        .peek_nth(2)
                        .is_some_and(|t| t.is_ident(self.src, "as")),
                    Some(next) => matches!(next.kind, TokenKind::Ident | TokenKind::Str),
                    None => false,
                };
                if is_modifier {
                    kind = modifier;
                    self.bump();
                }
            }

            let name = self.specifier_name()?;
            let alias = if self.peek_is_ident("as") {
                self.bump();
                Some(self.specifier_name()?)
            } else {
                None
            };
            items.push(Specifier { kind, name, alias });

            if self.peek_is_punct(',') {
                self.bump();
            } else if !self.peek_is_punct('}') {
                return Err(self.error("expected `,` or `}` in specifier list"));
            }
        };

        Ok(SpecifierList {
            items,
            multiline: self.src[open.start..close.end].contains('\n'),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_import(src: &str) -> ImportDeclaration {
        parse(src).unwrap().imports().next().cloned().unwrap()
    }

    fn only_export(src: &str) -> ExportNamedDeclaration {
        parse(src).unwrap().exports().next().cloned().unwrap()
    }

    #[test]
    fn test_type_import() {
        let decl = only_import("import type { A, B as C } from './types';");
        assert_eq!(decl.kind(), BindingKind::Type);
        let specs = decl.specifiers().unwrap();
        assert_eq!(specs.items.len(), 2);
        assert_eq!(specs.items[1].name, "B");
        assert_eq!(specs.items[1].alias.as_deref(), Some("C"));
        assert_eq!(decl.source().raw, "./types");
        assert_eq!(decl.raw(), Some("import type { A, B as C } from './types';"));
    }

    #[test]
    fn test_typeof_default_import() {
        let decl = only_import("import typeof React from \"react\"");
        assert_eq!(decl.kind(), BindingKind::Typeof);
        assert_eq!(decl.default_binding(), Some("React"));
        assert_eq!(decl.source().quote, '"');
    }

    #[test]
    fn test_default_binding_named_type() {
        let decl = only_import("import type from 'x';");
        assert_eq!(decl.kind(), BindingKind::Value);
        assert_eq!(decl.default_binding(), Some("type"));

        let decl = only_import("import type, { a } from 'x';");
        assert_eq!(decl.kind(), BindingKind::Value);
        assert_eq!(decl.default_binding(), Some("type"));
    }

    #[test]
    fn test_namespace_and_side_effect_imports() {
        let decl = only_import("import * as path from 'path';");
        assert_eq!(decl.namespace(), Some("path"));

        let decl = only_import("import './polyfill';");
        assert!(decl.default_binding().is_none());
        assert!(decl.specifiers().is_none());
    }

    #[test]
    fn test_specifier_level_kinds() {
        let decl = only_import("import { type A, typeof B, type as C, type } from 'x';");
        let items = &decl.specifiers().unwrap().items;
        assert_eq!(items[0].kind, BindingKind::Type);
        assert_eq!(items[0].name, "A");
        assert_eq!(items[1].kind, BindingKind::Typeof);
        assert_eq!(items[2].kind, BindingKind::Value);
        assert_eq!(items[2].name, "type");
        assert_eq!(items[2].alias.as_deref(), Some("C"));
        assert_eq!(items[3].name, "type");
    }

    #[test]
    fn test_dynamic_import_is_code() {
        let doc = parse("const m = import('./m');\nimport.meta.url;").unwrap();
        assert_eq!(doc.imports().count(), 0);
    }

    #[test]
    fn test_nested_import_keyword_is_code() {
        let doc = parse("function f() { return obj.import; }").unwrap();
        assert_eq!(doc.imports().count(), 0);
    }

    #[test]
    fn test_type_export_list() {
        let decl = only_export("export type { A, B };");
        assert_eq!(decl.kind(), BindingKind::Type);
        assert_eq!(decl.specifiers().items.len(), 2);
        assert!(decl.source().is_none());
    }

    #[test]
    fn test_reexport_with_source() {
        let decl = only_export("export { a as b } from './a'");
        assert_eq!(decl.kind(), BindingKind::Value);
        assert_eq!(decl.source().unwrap().raw, "./a");
    }

    #[test]
    fn test_other_exports_are_code() {
        let doc = parse("export type Props = { a: number };\nexport default {};\nexport const x = 1;")
            .unwrap();
        assert_eq!(doc.exports().count(), 0);
    }

    #[test]
    fn test_multiline_flag() {
        let decl = only_import("import {\n  a,\n  b,\n} from 'x';");
        assert!(decl.specifiers().unwrap().multiline);
    }

    #[test]
    fn test_interior_comments_are_collected() {
        let decl = only_import("import { a, // $FlowFixMe\n b } from 'x';");
        assert_eq!(decl.comments().len(), 1);
    }

    #[test]
    fn test_trailing_comment_stays_outside() {
        let doc = parse("import a from 'a' // note\nfoo();").unwrap();
        let decl = doc.imports().next().unwrap();
        assert!(decl.comments().is_empty());
        assert_eq!(doc.comments().count(), 1);
    }

    #[test]
    fn test_import_attributes() {
        let decl = only_import("import data from './d.json' with { type: 'json' };");
        assert_eq!(decl.attributes(), Some("with { type: 'json' }"));
    }

    #[test]
    fn test_code_runs_are_coalesced() {
        let doc = parse("const a = 1;\nconst b = 2;\n").unwrap();
        assert_eq!(
            doc.nodes,
            vec![
                Node::Code("const a = 1;\nconst b = 2;".to_string()),
                Node::Trivia("\n".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_import() {
        let err = parse("import { a from 'x';").unwrap_err();
        assert!(err.message.contains("specifier"), "{}", err);
        let err = parse("import a 'x';").unwrap_err();
        assert!(err.message.contains("from"), "{}", err);
    }

    #[test]
    fn test_unbalanced_brackets() {
        let err = parse("function f( {\n").unwrap_err();
        assert!(err.message.contains("unclosed"), "{}", err);
        let err = parse("a);").unwrap_err();
        assert!(err.message.contains("unexpected"), "{}", err);
        let err = parse("f(]").unwrap_err();
        assert!(err.message.contains("mismatched"), "{}", err);
    }

    #[test]
    fn test_braces_in_strings_and_templates_are_ignored() {
        let doc = parse("const s = '{' + `${'}'}`;\nimport x from 'x';").unwrap();
        assert_eq!(doc.imports().count(), 1);
    }
}
