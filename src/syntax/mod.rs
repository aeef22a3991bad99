//! Shallow concrete syntax for Flow-typed JavaScript
//!
//! `parse` turns source text into a [`Document`]; `print` turns it back.
//! A document that no rule touched prints byte-for-byte as its input.

mod ast;
mod parser;
mod printer;
mod scanner;

pub use self::ast::{
    BindingKind, Comment, CommentKind, Document, ExportNamedDeclaration, ImportDeclaration, Node,
    Specifier, SpecifierList, StringLiteral,
};
pub use self::parser::parse;
pub use self::printer::{PrintOptions, print};
pub use self::scanner::{Token, TokenKind, tokenize};

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"/**
 * @flow strict
 */
'use strict';

import type { Node } from 'react';
import typeof Foo from "./foo";
import { useState } from 'react';

// $FlowFixMe[incompatible-type]
const a: number = (b: any);

function render(): Node {
  return <div className='x'>{`it's ${a}`}</div>;
}

export type { Node };
export { render };
"#;

    #[test]
    fn test_round_trip_is_verbatim() {
        let doc = parse(FIXTURE).unwrap();
        assert_eq!(print(&doc, &PrintOptions::default()), FIXTURE);
    }

    #[test]
    fn test_fixture_structure() {
        let doc = parse(FIXTURE).unwrap();
        assert_eq!(doc.imports().count(), 3);
        assert_eq!(doc.exports().count(), 2);
        assert_eq!(doc.comments().count(), 2);
    }

    #[test]
    fn test_jsx_component_structure() {
        let src = include_str!("../../tests/fixtures/List.jsx");
        let doc = parse(src).unwrap();
        assert_eq!(doc.imports().count(), 4);
        assert_eq!(doc.exports().count(), 1);
        assert_eq!(doc.comments().count(), 2);
        assert_eq!(print(&doc, &PrintOptions::default()), src);
    }
}
