//! Structural parser for Go source files.
//!
//! Recursive descent over the token stream. The parser recognizes exactly
//! the declaration structure the query layer needs; function bodies,
//! initializer expressions, array lengths, and type parameters are skipped
//! by balanced-delimiter matching rather than parsed. Newlines terminate
//! specs and fields the way the language's semicolon insertion does, so the
//! parser treats them as separators in those positions and as trivia
//! everywhere else.

use logos::Logos;
use smol_str::SmolStr;

use crate::base::{LineIndex, TextRange, TextSize};
use crate::error::{Error, Result};
use crate::syntax::ast::*;
use crate::syntax::token::Token;

/// Parse one source file into its declaration-level syntax tree.
///
/// `file` is used in error positions only; it should be the path as the
/// caller wants it displayed.
pub fn parse_file(file: &str, source: &str) -> Result<SourceFile> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(tok) = lexer.next() {
        let span = lexer.span();
        let range = TextRange::new(
            TextSize::from(span.start as u32),
            TextSize::from(span.end as u32),
        );
        // The catch-all rule makes lex errors unreachable; fold any that
        // slip through into plain characters for the parser to reject.
        tokens.push((tok.unwrap_or(Token::Other), range));
    }

    let mut parser = Parser {
        file,
        src: source,
        tokens,
        pos: 0,
        last_end: TextSize::from(0),
        line_index: LineIndex::new(source),
    };
    parser.parse_source_file()
}

struct Parser<'a> {
    file: &'a str,
    src: &'a str,
    tokens: Vec<(Token, TextRange)>,
    pos: usize,
    last_end: TextSize,
    line_index: LineIndex,
}

impl<'a> Parser<'a> {
    // ========================================================================
    // CURSOR PRIMITIVES
    // ========================================================================

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(t, _)| *t)
    }

    fn nth(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| *t)
    }

    fn bump(&mut self) -> Option<(Token, TextRange)> {
        let entry = self.tokens.get(self.pos).copied();
        if let Some((_, range)) = entry {
            self.pos += 1;
            self.last_end = range.end();
        }
        entry
    }

    fn at(&self, token: Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.at(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<TextRange> {
        if self.at(token) {
            if let Some((_, range)) = self.bump() {
                return Ok(range);
            }
        }
        Err(self.error_here(format!("expected {what}")))
    }

    fn text(&self, range: TextRange) -> &'a str {
        &self.src[range]
    }

    fn cur_offset(&self) -> TextSize {
        match self.tokens.get(self.pos) {
            Some((_, range)) => range.start(),
            None => TextSize::of(self.src),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        self.error_at(self.cur_offset(), message)
    }

    fn error_at(&self, offset: TextSize, message: impl Into<String>) -> Error {
        let pos = self.line_index.line_col(offset);
        Error::ParseFailure {
            file: self.file.into(),
            line: pos.line_one_indexed(),
            col: pos.col_one_indexed(),
            message: message.into().into(),
        }
    }

    fn skip_newlines(&mut self) {
        while self.at(Token::Newline) {
            self.bump();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(t) if t.is_separator()) {
            self.bump();
        }
    }

    fn expect_separator(&mut self, what: &str) -> Result<()> {
        match self.peek() {
            Some(t) if t.is_separator() => {
                self.bump();
                Ok(())
            }
            None => Ok(()),
            _ => Err(self.error_here(format!("expected newline or ';' {what}"))),
        }
    }

    /// Consume a balanced delimiter group. The cursor must be on an opening
    /// delimiter; afterwards it sits just past the matching closer.
    fn skip_balanced(&mut self) -> Result<()> {
        let start = self.cur_offset();
        match self.peek() {
            Some(t) if t.is_open_delim() => {}
            _ => return Err(self.error_here("expected delimiter")),
        }
        let mut depth = 0usize;
        while let Some((tok, _)) = self.bump() {
            if tok.is_open_delim() {
                depth += 1;
            } else if tok.is_close_delim() {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(self.error_at(start, "unbalanced delimiters"))
    }

    /// Token index just past the group's matching closer, without moving the
    /// cursor. The cursor must be on an opening delimiter.
    fn index_after_balanced(&self) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some((tok, _)) = self.tokens.get(i) {
            if tok.is_open_delim() {
                depth += 1;
            } else if tok.is_close_delim() {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            i += 1;
        }
        None
    }

    /// Skip an expression up to (not including) the next separator or group
    /// closer at the current nesting depth.
    fn skip_expr(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return,
                Some(t) if depth == 0 && (t.is_separator() || t.is_close_delim()) => return,
                Some(t) => {
                    if t.is_open_delim() {
                        depth += 1;
                    } else if t.is_close_delim() {
                        depth = depth.saturating_sub(1);
                    }
                    self.bump();
                }
            }
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<SmolStr> {
        let range = self.expect(Token::Ident, what)?;
        Ok(SmolStr::new(self.text(range)))
    }

    // ========================================================================
    // FILE STRUCTURE
    // ========================================================================

    fn parse_source_file(&mut self) -> Result<SourceFile> {
        self.skip_separators();
        self.expect(Token::Package, "'package' clause")?;
        let package_name = self.expect_ident("package name")?;
        self.expect_separator("after package clause")?;

        let mut imports = Vec::new();
        loop {
            self.skip_separators();
            if self.at(Token::Import) {
                self.parse_import_decl(&mut imports)?;
            } else {
                break;
            }
        }

        let mut decls = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None => break,
                Some(Token::Type) => self.parse_type_decl(&mut decls)?,
                Some(Token::Func) => decls.push(Decl::Func(self.parse_func_decl()?)),
                Some(Token::Const) => self.parse_value_decl(&mut decls, true)?,
                Some(Token::Var) => self.parse_value_decl(&mut decls, false)?,
                Some(_) => return Err(self.error_here("expected declaration")),
            }
        }

        Ok(SourceFile {
            package_name,
            imports,
            decls,
        })
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportDecl>) -> Result<()> {
        self.expect(Token::Import, "'import'")?;
        if self.eat(Token::LParen) {
            loop {
                self.skip_separators();
                if self.eat(Token::RParen) {
                    break;
                }
                imports.push(self.parse_import_spec()?);
                if !self.at(Token::RParen) {
                    self.expect_separator("after import spec")?;
                }
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<ImportDecl> {
        let start = self.cur_offset();
        let alias = match self.peek() {
            Some(Token::Ident) => {
                let range = self.expect(Token::Ident, "import alias")?;
                Some(SmolStr::new(self.text(range)))
            }
            Some(Token::Dot) => {
                self.bump();
                Some(SmolStr::new("."))
            }
            _ => None,
        };
        let path = match self.peek() {
            Some(Token::String) | Some(Token::RawString) => match self.bump() {
                Some((_, range)) => self.unquote(range),
                None => return Err(self.error_here("expected import path string")),
            },
            _ => return Err(self.error_here("expected import path string")),
        };
        Ok(ImportDecl {
            alias,
            path,
            span: TextRange::new(start, self.last_end),
        })
    }

    // ========================================================================
    // TYPE DECLARATIONS
    // ========================================================================

    fn parse_type_decl(&mut self, decls: &mut Vec<Decl>) -> Result<()> {
        self.expect(Token::Type, "'type'")?;
        if self.eat(Token::LParen) {
            loop {
                self.skip_separators();
                if self.eat(Token::RParen) {
                    break;
                }
                decls.push(Decl::Type(self.parse_type_spec()?));
                if !self.at(Token::RParen) {
                    self.expect_separator("after type spec")?;
                }
            }
        } else {
            decls.push(Decl::Type(self.parse_type_spec()?));
        }
        Ok(())
    }

    fn parse_type_spec(&mut self) -> Result<TypeDecl> {
        let start = self.cur_offset();
        let name = self.expect_ident("type name")?;
        if self.at(Token::LBracket) && self.brackets_are_type_params() {
            self.skip_balanced()?;
        }
        let alias = self.eat(Token::Assign);
        let ty = self.parse_type_expr()?;
        Ok(TypeDecl {
            name,
            ty,
            alias,
            span: TextRange::new(start, self.last_end),
        })
    }

    /// Distinguish `type List[T any] ...` (type parameters, skipped) from
    /// `type Buf [16]byte` (an array type, parsed). Type parameter lists
    /// start with an identifier followed by its constraint; array lengths
    /// are expressions, and a lone identifier length closes immediately.
    fn brackets_are_type_params(&self) -> bool {
        if self.nth(1) == Some(Token::RBracket) {
            return false; // "[]": a slice type
        }
        if self.nth(1) != Some(Token::Ident) {
            return false; // "[16]", "[...]": an array length
        }
        !matches!(self.nth(2), Some(Token::RBracket)) // "[N]": const length
    }

    fn parse_type_expr(&mut self) -> Result<TypeExpr> {
        match self.peek() {
            Some(Token::Star) => {
                self.bump();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type_expr()?)))
            }
            Some(Token::Arrow) => {
                self.bump();
                self.expect(Token::Chan, "'chan' after '<-'")?;
                Ok(TypeExpr::Chan(Box::new(self.parse_type_expr()?)))
            }
            Some(Token::Chan) => {
                self.bump();
                self.eat(Token::Arrow);
                Ok(TypeExpr::Chan(Box::new(self.parse_type_expr()?)))
            }
            Some(Token::Map) => {
                self.bump();
                self.expect(Token::LBracket, "'[' after 'map'")?;
                let key = self.parse_type_expr()?;
                self.expect(Token::RBracket, "']' after map key type")?;
                let value = self.parse_type_expr()?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            Some(Token::LBracket) => {
                self.bump();
                if self.eat(Token::RBracket) {
                    Ok(TypeExpr::Slice(Box::new(self.parse_type_expr()?)))
                } else {
                    self.skip_array_length()?;
                    Ok(TypeExpr::Array(Box::new(self.parse_type_expr()?)))
                }
            }
            Some(Token::Func) => {
                self.bump();
                Ok(TypeExpr::Func(self.parse_signature()?))
            }
            Some(Token::Struct) => {
                self.bump();
                Ok(TypeExpr::Struct(self.parse_struct_body()?))
            }
            Some(Token::Interface) => {
                self.bump();
                Ok(TypeExpr::Interface(self.parse_interface_body()?))
            }
            Some(Token::LParen) => {
                self.bump();
                self.skip_newlines();
                let inner = self.parse_type_expr()?;
                self.skip_newlines();
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident) => {
                let first = self.expect_ident("type name")?;
                let ty = if self.eat(Token::Dot) {
                    let name = self.expect_ident("type name after '.'")?;
                    TypeExpr::Named {
                        qualifier: Some(first),
                        name,
                    }
                } else {
                    TypeExpr::Named {
                        qualifier: None,
                        name: first,
                    }
                };
                // Generic instantiation: type arguments carry no structure
                // the query layer uses.
                if self.at(Token::LBracket) {
                    self.skip_balanced()?;
                }
                Ok(ty)
            }
            _ => Err(self.error_here("expected type")),
        }
    }

    /// Consume an array length expression; the cursor sits just past the
    /// opening '[' and ends just past the matching ']'.
    fn skip_array_length(&mut self) -> Result<()> {
        let start = self.cur_offset();
        let mut depth = 1usize;
        while let Some((tok, _)) = self.bump() {
            if tok.is_open_delim() {
                depth += 1;
            } else if tok.is_close_delim() {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(self.error_at(start, "unbalanced array length"))
    }

    // ========================================================================
    // STRUCT BODIES
    // ========================================================================

    fn parse_struct_body(&mut self) -> Result<StructType> {
        self.expect(Token::LBrace, "'{' after 'struct'")?;
        let mut fields = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(Token::RBrace) {
                break;
            }
            self.parse_field(&mut fields)?;
            if !self.at(Token::RBrace) {
                self.expect_separator("after struct field")?;
            }
        }
        Ok(StructType { fields })
    }

    fn parse_field(&mut self, fields: &mut Vec<Field>) -> Result<()> {
        let start = self.cur_offset();

        // Embedded pointer field: *T or *pkg.T
        if self.at(Token::Star) {
            let ty = self.parse_type_expr()?;
            if ty.base_name().is_none() {
                return Err(self.error_at(start, "embedded field must be a named type"));
            }
            let tag = self.maybe_tag();
            fields.push(Field {
                name: SmolStr::new(""),
                ty,
                tag,
                embedded: true,
                span: TextRange::new(start, self.last_end),
            });
            return Ok(());
        }

        let mut names = vec![self.expect_ident("field name")?];

        // Qualified embedded field: pkg.T
        if self.eat(Token::Dot) {
            let name = self.expect_ident("type name after '.'")?;
            let ty = TypeExpr::Named {
                qualifier: Some(names.remove(0)),
                name,
            };
            if self.at(Token::LBracket) {
                self.skip_balanced()?;
            }
            let tag = self.maybe_tag();
            fields.push(Field {
                name: SmolStr::new(""),
                ty,
                tag,
                embedded: true,
                span: TextRange::new(start, self.last_end),
            });
            return Ok(());
        }

        while self.eat(Token::Comma) {
            self.skip_newlines();
            names.push(self.expect_ident("field name")?);
        }

        let embedded_plain = match self.peek() {
            Some(t) if t.is_separator() => true,
            Some(Token::RBrace) | Some(Token::String) | Some(Token::RawString) | None => true,
            Some(Token::LBracket) => {
                // `Base[T]` (embedded generic) vs `buf [16]byte` (array field):
                // only the former is followed by end-of-field.
                names.len() == 1 && self.lookahead_ends_field()
            }
            _ => false,
        };

        if embedded_plain {
            if self.at(Token::LBracket) {
                self.skip_balanced()?;
            }
            if names.len() != 1 {
                return Err(self.error_at(start, "expected field type"));
            }
            let tag = self.maybe_tag();
            fields.push(Field {
                name: SmolStr::new(""),
                ty: TypeExpr::Named {
                    qualifier: None,
                    name: names.remove(0),
                },
                tag,
                embedded: true,
                span: TextRange::new(start, self.last_end),
            });
            return Ok(());
        }

        let ty = self.parse_type_expr()?;
        let tag = self.maybe_tag();
        let span = TextRange::new(start, self.last_end);
        for name in names {
            fields.push(Field {
                name,
                ty: ty.clone(),
                tag: tag.clone(),
                embedded: false,
                span,
            });
        }
        Ok(())
    }

    /// True when the bracket group under the cursor is followed by the end
    /// of a field (separator, tag, or closing brace).
    fn lookahead_ends_field(&self) -> bool {
        let Some(after) = self.index_after_balanced() else {
            return false;
        };
        match self.tokens.get(after).map(|(t, _)| *t) {
            None => true,
            Some(t) if t.is_separator() => true,
            Some(Token::RBrace) | Some(Token::String) | Some(Token::RawString) => true,
            _ => false,
        }
    }

    fn maybe_tag(&mut self) -> Option<SmolStr> {
        match self.peek() {
            Some(Token::String) | Some(Token::RawString) => {
                let (_, range) = self.bump()?;
                Some(self.unquote(range))
            }
            _ => None,
        }
    }

    // ========================================================================
    // INTERFACE BODIES
    // ========================================================================

    fn parse_interface_body(&mut self) -> Result<InterfaceType> {
        self.expect(Token::LBrace, "'{' after 'interface'")?;
        let mut methods = Vec::new();
        let mut embeds = Vec::new();
        loop {
            self.skip_separators();
            if self.eat(Token::RBrace) {
                break;
            }
            if self.at(Token::Tilde) {
                // Constraint element; no method set to record.
                self.skip_expr();
            } else if self.at(Token::Ident) && self.nth(1) == Some(Token::LParen) {
                let start = self.cur_offset();
                let name = self.expect_ident("method name")?;
                let sig = self.parse_signature()?;
                methods.push(InterfaceMethod {
                    name,
                    sig,
                    span: TextRange::new(start, self.last_end),
                });
            } else if matches!(self.peek(), Some(t) if t.starts_type()) {
                let ty = self.parse_type_expr()?;
                if self.at(Token::Pipe) {
                    // Union constraint; discard the whole element.
                    self.skip_expr();
                } else {
                    embeds.push(ty);
                }
            } else {
                return Err(self.error_here("expected method or embedded interface"));
            }
            if !self.at(Token::RBrace) {
                self.expect_separator("after interface element")?;
            }
        }
        Ok(InterfaceType { methods, embeds })
    }

    // ========================================================================
    // FUNCTIONS
    // ========================================================================

    fn parse_func_decl(&mut self) -> Result<FuncDecl> {
        let start = self.cur_offset();
        self.expect(Token::Func, "'func'")?;

        let receiver = if self.at(Token::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };

        let name = self.expect_ident("function name")?;
        if self.at(Token::LBracket) && self.brackets_are_type_params() {
            self.skip_balanced()?;
        }
        let sig = self.parse_signature()?;
        if self.at(Token::LBrace) {
            self.skip_balanced()?;
        }
        Ok(FuncDecl {
            name,
            receiver,
            sig,
            span: TextRange::new(start, self.last_end),
        })
    }

    fn parse_receiver(&mut self) -> Result<Receiver> {
        self.expect(Token::LParen, "'('")?;
        self.skip_newlines();

        let receiver = if self.eat(Token::Star) {
            Receiver {
                name: None,
                type_name: self.expect_ident("receiver type")?,
                pointer: true,
            }
        } else {
            let first = self.expect_ident("receiver")?;
            if self.eat(Token::Star) {
                Receiver {
                    name: Some(first),
                    type_name: self.expect_ident("receiver type")?,
                    pointer: true,
                }
            } else if self.at(Token::Ident) {
                Receiver {
                    name: Some(first),
                    type_name: self.expect_ident("receiver type")?,
                    pointer: false,
                }
            } else {
                Receiver {
                    name: None,
                    type_name: first,
                    pointer: false,
                }
            }
        };

        // Receiver type parameters: (l *List[T])
        if self.at(Token::LBracket) {
            self.skip_balanced()?;
        }
        self.expect(Token::RParen, "')' after receiver")?;
        Ok(receiver)
    }

    fn parse_signature(&mut self) -> Result<FuncSig> {
        self.expect(Token::LParen, "'(' for parameter list")?;
        let params = self.count_group_entries()?;

        let results = match self.peek() {
            Some(Token::LParen) => {
                self.bump();
                self.count_group_entries()?
            }
            Some(t) if t.starts_type() => {
                self.parse_type_expr()?;
                1
            }
            _ => 0,
        };

        Ok(FuncSig { params, results })
    }

    /// Count comma-separated entries until the closer matching the already
    /// consumed opening paren. Used for both parameter and result lists —
    /// one entry is one parameter, whether or not it is named, and a
    /// variadic parameter counts once.
    fn count_group_entries(&mut self) -> Result<usize> {
        let start = self.cur_offset();
        let mut depth = 1usize;
        let mut entries = 0usize;
        let mut entry_has_content = false;
        while let Some((tok, _)) = self.bump() {
            match tok {
                t if t.is_open_delim() => {
                    depth += 1;
                    entry_has_content = true;
                }
                t if t.is_close_delim() => {
                    depth -= 1;
                    if depth == 0 {
                        if entry_has_content {
                            entries += 1;
                        }
                        return Ok(entries);
                    }
                    entry_has_content = true;
                }
                Token::Comma if depth == 1 => {
                    if entry_has_content {
                        entries += 1;
                        entry_has_content = false;
                    }
                }
                Token::Newline | Token::Semi => {}
                _ => entry_has_content = true,
            }
        }
        Err(self.error_at(start, "unbalanced parameter list"))
    }

    // ========================================================================
    // CONST / VAR
    // ========================================================================

    fn parse_value_decl(&mut self, decls: &mut Vec<Decl>, is_const: bool) -> Result<()> {
        self.bump(); // const | var
        let mut push = |d: ValueDecl| {
            decls.push(if is_const {
                Decl::Const(d)
            } else {
                Decl::Var(d)
            });
        };
        if self.eat(Token::LParen) {
            loop {
                self.skip_separators();
                if self.eat(Token::RParen) {
                    break;
                }
                push(self.parse_value_spec()?);
                if !self.at(Token::RParen) {
                    self.expect_separator("after spec")?;
                }
            }
        } else {
            push(self.parse_value_spec()?);
        }
        Ok(())
    }

    fn parse_value_spec(&mut self) -> Result<ValueDecl> {
        let start = self.cur_offset();
        let mut names = vec![self.expect_ident("name")?];
        while self.eat(Token::Comma) {
            self.skip_newlines();
            names.push(self.expect_ident("name")?);
        }
        if !self.at(Token::Assign) && matches!(self.peek(), Some(t) if t.starts_type()) {
            self.parse_type_expr()?;
        }
        if self.eat(Token::Assign) {
            self.skip_expr();
        }
        Ok(ValueDecl {
            names,
            span: TextRange::new(start, self.last_end),
        })
    }

    // ========================================================================
    // LITERALS
    // ========================================================================

    fn unquote(&self, range: TextRange) -> SmolStr {
        let text = self.text(range);
        if let Some(stripped) = text.strip_prefix('`') {
            return SmolStr::new(stripped.strip_suffix('`').unwrap_or(stripped));
        }
        let inner = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);
        if !inner.contains('\\') {
            return SmolStr::new(inner);
        }
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => out.push('\\'),
                }
            } else {
                out.push(c);
            }
        }
        SmolStr::new(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SourceFile {
        match parse_file("test.go", src) {
            Ok(f) => f,
            Err(e) => panic!("parse failed: {e}"),
        }
    }

    fn struct_of(file: &SourceFile, name: &str) -> StructType {
        for decl in file.type_decls() {
            if decl.name == name {
                if let TypeExpr::Struct(s) = &decl.ty {
                    return s.clone();
                }
            }
        }
        panic!("no struct {name}");
    }

    #[test]
    fn test_package_clause_and_imports() {
        let file = parse(
            r#"package config

import (
    "fmt"
    env "os"
    _ "embed"
)

import "strings"
"#,
        );
        assert_eq!(file.package_name, "config");
        assert_eq!(file.imports.len(), 4);
        assert_eq!(file.imports[0].path, "fmt");
        assert_eq!(file.imports[0].alias, None);
        assert_eq!(file.imports[1].alias.as_deref(), Some("env"));
        assert_eq!(file.imports[1].path, "os");
        assert_eq!(file.imports[2].alias.as_deref(), Some("_"));
        assert_eq!(file.imports[3].path, "strings");
    }

    #[test]
    fn test_missing_package_clause() {
        let err = parse_file("bad.go", "import \"fmt\"\n").unwrap_err();
        match err {
            Error::ParseFailure { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_struct_fields_and_tags() {
        let file = parse(
            r#"package app

type Config struct {
    Name string `env:"APP_NAME"`
    Age  *int
    A, B int `json:"shared"`
}
"#,
        );
        let s = struct_of(&file, "Config");
        assert_eq!(s.fields.len(), 4);

        assert_eq!(s.fields[0].name, "Name");
        assert_eq!(s.fields[0].tag.as_deref(), Some(r#"env:"APP_NAME""#));
        assert!(!s.fields[0].embedded);

        assert_eq!(s.fields[1].name, "Age");
        assert!(s.fields[1].ty.is_pointer());
        assert_eq!(s.fields[1].tag, None);

        // A multi-name declaration fans out, tag and type shared.
        assert_eq!(s.fields[2].name, "A");
        assert_eq!(s.fields[3].name, "B");
        assert_eq!(s.fields[2].ty, s.fields[3].ty);
        assert_eq!(s.fields[3].tag.as_deref(), Some(r#"json:"shared""#));
    }

    #[test]
    fn test_embedded_fields() {
        let file = parse(
            r#"package app

type Server struct {
    Base
    *Conn
    net.Addr
    Port int
}
"#,
        );
        let s = struct_of(&file, "Server");
        assert_eq!(s.fields.len(), 4);

        assert!(s.fields[0].embedded);
        assert_eq!(s.fields[0].name, "");
        assert_eq!(s.fields[0].ty.base_name(), Some((None, "Base")));

        assert!(s.fields[1].embedded);
        assert!(s.fields[1].ty.is_pointer());
        assert_eq!(s.fields[1].ty.base_name(), Some((None, "Conn")));

        assert!(s.fields[2].embedded);
        assert_eq!(s.fields[2].ty.base_name(), Some((Some("net"), "Addr")));

        assert!(!s.fields[3].embedded);
    }

    #[test]
    fn test_array_field_is_not_embedded_generic() {
        let file = parse(
            "package a\n\ntype T struct {\n\tbuf [16]byte\n\tBase[int]\n}\n",
        );
        let s = struct_of(&file, "T");
        assert_eq!(s.fields[0].name, "buf");
        assert!(!s.fields[0].embedded);
        assert!(matches!(s.fields[0].ty, TypeExpr::Array(_)));

        assert!(s.fields[1].embedded);
        assert_eq!(s.fields[1].ty.base_name(), Some((None, "Base")));
    }

    #[test]
    fn test_interface_methods_and_embeds() {
        let file = parse(
            r#"package enc

type Codec interface {
    Marshal(v any) ([]byte, error)
    Unmarshal(data []byte, v any) error
    io.Closer
}
"#,
        );
        let decl = file.type_decls().next().expect("type decl");
        let TypeExpr::Interface(iface) = &decl.ty else {
            panic!("not an interface");
        };
        assert_eq!(iface.methods.len(), 2);
        assert_eq!(iface.methods[0].name, "Marshal");
        assert_eq!(iface.methods[0].sig, FuncSig { params: 1, results: 2 });
        assert_eq!(iface.methods[1].sig, FuncSig { params: 2, results: 1 });
        assert_eq!(iface.embeds.len(), 1);
        assert_eq!(iface.embeds[0].base_name(), Some((Some("io"), "Closer")));
    }

    #[test]
    fn test_func_decls_and_receivers() {
        let file = parse(
            r#"package c

func New(limit int) *Counter {
    return &Counter{limit: limit}
}

func (c Counter) Value() int { return c.n }

func (c *Counter) Add(n, m int) {}
"#,
        );
        let funcs: Vec<_> = file.func_decls().collect();
        assert_eq!(funcs.len(), 3);

        assert_eq!(funcs[0].name, "New");
        assert!(funcs[0].receiver.is_none());
        assert_eq!(funcs[0].sig, FuncSig { params: 1, results: 1 });

        let recv = funcs[1].receiver.as_ref().expect("receiver");
        assert_eq!(recv.type_name, "Counter");
        assert!(!recv.pointer);
        assert_eq!(funcs[1].sig, FuncSig { params: 0, results: 1 });

        let recv = funcs[2].receiver.as_ref().expect("receiver");
        assert!(recv.pointer);
        assert_eq!(funcs[2].sig, FuncSig { params: 2, results: 0 });
    }

    #[test]
    fn test_bodies_with_nested_braces_are_skipped() {
        let file = parse(
            r#"package b

func Render() string {
    m := map[string]int{"a": 1, "b": 2}
    if len(m) > 0 {
        return "{"
    }
    return "}"
}

type After struct{}
"#,
        );
        assert_eq!(file.func_decls().count(), 1);
        assert_eq!(file.type_decls().count(), 1);
    }

    #[test]
    fn test_const_and_var_names() {
        let file = parse(
            r#"package k

const (
    ModeOff Mode = iota
    ModeOn
)

var DefaultTimeout, MaxTimeout = 30, 300
"#,
        );
        let mut names = Vec::new();
        for decl in &file.decls {
            names.extend(decl.introduced_names());
        }
        assert_eq!(names, ["ModeOff", "ModeOn", "DefaultTimeout", "MaxTimeout"]);
    }

    #[test]
    fn test_generic_decls_are_tolerated() {
        let file = parse(
            r#"package g

type List[T any] struct {
    head *node[T]
}

func Map[T, U any](in []T, f func(T) U) []U { return nil }
"#,
        );
        let s = struct_of(&file, "List");
        assert_eq!(s.fields.len(), 1);
        assert_eq!(s.fields[0].name, "head");

        let f = file.func_decls().next().expect("func");
        assert_eq!(f.name, "Map");
        assert_eq!(f.sig, FuncSig { params: 2, results: 1 });
    }

    #[test]
    fn test_variadic_counts_once() {
        let file = parse("package v\n\nfunc Join(sep string, parts ...string) string { return \"\" }\n");
        let f = file.func_decls().next().expect("func");
        assert_eq!(f.sig, FuncSig { params: 2, results: 1 });
    }

    #[test]
    fn test_parse_error_position() {
        let err = parse_file("x.go", "package p\n\ntype T struct {\n    Name 42\n}\n").unwrap_err();
        match err {
            Error::ParseFailure { file, line, .. } => {
                assert_eq!(file.as_ref(), "x.go");
                assert_eq!(line, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_type_groups() {
        let file = parse(
            "package t\n\ntype (\n\tA struct{ X int }\n\tB = A\n\tC int\n)\n",
        );
        let decls: Vec<_> = file.type_decls().collect();
        assert_eq!(decls.len(), 3);
        assert!(!decls[0].alias);
        assert!(decls[1].alias);
    }

    #[test]
    fn test_map_chan_func_types() {
        let file = parse(
            "package t\n\ntype H struct {\n\tm map[string][]*Item\n\tc chan Event\n\tf func(int, int) error\n}\n",
        );
        let s = struct_of(&file, "H");
        assert!(matches!(s.fields[0].ty, TypeExpr::Map(_, _)));
        assert!(matches!(s.fields[1].ty, TypeExpr::Chan(_)));
        assert_eq!(
            s.fields[2].ty,
            TypeExpr::Func(FuncSig { params: 2, results: 1 })
        );
    }
}
