//! The structural pass: parse a file as TypeScript/JavaScript (JSX-enabled
//! where the extension calls for it) and enumerate every reference form the
//! operations care about.
//!
//! Per the "Polymorphism over AST kinds" design note, references are
//! flattened into one tagged variant, [`Reference`], carrying the byte range
//! of the specifier's literal (including its quote characters) so the
//! rewriter can splice without re-deriving positions from the AST a second
//! time. No visitor pattern leaks past this module.

use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap};
use swc_ecma_ast::{Callee, EsVersion, Expr, Lit, Module, Str};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Import,
    ExportAll,
    ExportNamed,
    DynamicImport,
    Require,
}

/// A reference to another module: the specifier text plus the byte range of
/// its quoted literal (including the quotes) in the original source.
#[derive(Debug, Clone)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub specifier: String,
    pub literal_range: (usize, usize),
    pub quote: char,
}

/// Parse `source` (whose file extension is `ext`, one of the source
/// extensions) and return every reference the structural pass recognizes.
/// `None` on a parse failure; the caller must treat that as "no match",
/// never as fatal, logging at debug level only.
pub fn parse_references(source: &str, ext: &str) -> Option<Vec<Reference>> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), source.to_string());
    let base_pos = fm.start_pos.0;

    let jsx = ext == "tsx" || ext == "jsx";
    let syntax = if ext == "ts" || ext == "tsx" {
        Syntax::Typescript(TsSyntax {
            tsx: jsx,
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx,
            ..Default::default()
        })
    };

    let lexer = Lexer::new(syntax, EsVersion::latest(), StringInput::from(&*fm), None);
    let mut parser = Parser::new_from(lexer);
    let module: Module = parser.parse_module().ok()?;

    let mut visitor = ReferenceVisitor {
        source,
        base_pos,
        refs: Vec::new(),
    };
    module.visit_with(&mut visitor);
    Some(visitor.refs)
}

struct ReferenceVisitor<'a> {
    source: &'a str,
    base_pos: u32,
    refs: Vec<Reference>,
}

impl<'a> ReferenceVisitor<'a> {
    fn literal_range(&self, str_lit: &Str) -> Option<(usize, usize, char)> {
        let lo = str_lit.span.lo.0.checked_sub(self.base_pos)? as usize;
        let hi = str_lit.span.hi.0.checked_sub(self.base_pos)? as usize;
        if hi <= lo || hi > self.source.len() || !self.source.is_char_boundary(lo) {
            return None;
        }
        let quote = self.source[lo..].chars().next()?;
        Some((lo, hi, quote))
    }

    fn push(&mut self, kind: ReferenceKind, str_lit: &Str) {
        if let Some((lo, hi, quote)) = self.literal_range(str_lit) {
            self.refs.push(Reference {
                kind,
                specifier: str_lit.value.to_string(),
                literal_range: (lo, hi),
                quote,
            });
        }
    }
}

impl<'a> Visit for ReferenceVisitor<'a> {
    fn visit_import_decl(&mut self, node: &swc_ecma_ast::ImportDecl) {
        self.push(ReferenceKind::Import, &node.src);
        node.visit_children_with(self);
    }

    fn visit_named_export(&mut self, node: &swc_ecma_ast::NamedExport) {
        if let Some(src) = &node.src {
            self.push(ReferenceKind::ExportNamed, src);
        }
        node.visit_children_with(self);
    }

    fn visit_export_all(&mut self, node: &swc_ecma_ast::ExportAll) {
        self.push(ReferenceKind::ExportAll, &node.src);
        node.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, node: &swc_ecma_ast::CallExpr) {
        match &node.callee {
            Callee::Import(_) => {
                if let Some(arg) = node.args.first() {
                    if let Expr::Lit(Lit::Str(s)) = &*arg.expr {
                        self.push(ReferenceKind::DynamicImport, s);
                    }
                }
            }
            Callee::Expr(expr) => {
                if let Expr::Ident(ident) = &**expr {
                    if &*ident.sym == "require" && node.args.len() == 1 {
                        if let Expr::Lit(Lit::Str(s)) = &*node.args[0].expr {
                            self.push(ReferenceKind::Require, s);
                        }
                    }
                }
            }
            _ => {}
        }
        node.visit_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_static_and_dynamic_forms() {
        let src = r#"
import { helper } from './helper';
export * from './lib/util';
export { thing } from './thing';
const x = () => import('./lazy');
const y = require('./legacy');
"#;
        let refs = parse_references(src, "ts").expect("should parse");
        let specs: Vec<_> = refs.iter().map(|r| r.specifier.as_str()).collect();
        assert!(specs.contains(&"./helper"));
        assert!(specs.contains(&"./lib/util"));
        assert!(specs.contains(&"./thing"));
        assert!(specs.contains(&"./lazy"));
        assert!(specs.contains(&"./legacy"));
    }

    #[test]
    fn ignores_template_literals() {
        let src = "const mod = `./${name}`; import(mod);";
        let refs = parse_references(src, "ts").expect("should parse");
        assert!(refs.is_empty());
    }

    #[test]
    fn parses_tsx_with_jsx() {
        let src = r#"
import React from 'react';
export const C = () => <div>{1}</div>;
"#;
        let refs = parse_references(src, "tsx").expect("tsx should parse with jsx enabled");
        assert!(refs.iter().any(|r| r.specifier == "react"));
    }

    #[test]
    fn parse_error_is_none_not_panic() {
        let src = "import from ';";
        assert!(parse_references(src, "ts").is_none());
    }
}
