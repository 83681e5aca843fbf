//! Token definitions for the structural Go lexer.
//!
//! The lexer only distinguishes what the declaration parser needs: keywords
//! that open declarations, identifiers, string/rune literals (import paths,
//! struct tags), delimiters, and newlines (Go terminates declarations and
//! specs at line ends, so newlines are tokens here, not trivia). Everything
//! else — operators, numbers — folds into [`Token::Other`]; it only ever
//! appears inside skipped regions such as function bodies and initializer
//! expressions, where delimiter balance is all that matters.

use logos::Logos;

/// A lexical token.
#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+([^/*][^*]*\*+)*/")]
pub enum Token {
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("type")]
    Type,
    #[token("struct")]
    Struct,
    #[token("interface")]
    Interface,
    #[token("func")]
    Func,
    #[token("map")]
    Map,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("var")]
    Var,

    /// Identifier (Go allows any Unicode letter plus `_`).
    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Ident,

    /// Interpreted string literal, escapes uninterpreted at the token level.
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    String,

    /// Raw string literal; may span lines.
    #[regex(r"`[^`]*`")]
    RawString,

    /// Rune literal. Lexed as a unit so a brace inside one cannot confuse
    /// delimiter matching.
    #[regex(r"'([^'\\\n]|\\.)+'")]
    Rune,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("...")]
    Ellipsis,
    #[token(".")]
    Dot,
    #[token("*")]
    Star,
    #[token("<-")]
    Arrow,
    #[token("=")]
    Assign,
    #[token("|")]
    Pipe,
    #[token("~")]
    Tilde,

    #[token("\n")]
    Newline,

    /// Any other single character (operators, digits, ...).
    #[regex(r".", priority = 1)]
    Other,
}

impl Token {
    /// Tokens that terminate a spec or field declaration.
    pub fn is_separator(self) -> bool {
        matches!(self, Token::Semi | Token::Newline)
    }

    /// Tokens that can begin a type expression.
    pub fn starts_type(self) -> bool {
        matches!(
            self,
            Token::Ident
                | Token::Star
                | Token::LBracket
                | Token::LParen
                | Token::Map
                | Token::Chan
                | Token::Arrow
                | Token::Func
                | Token::Struct
                | Token::Interface
        )
    }

    /// Opening delimiters, for balanced skipping.
    pub fn is_open_delim(self) -> bool {
        matches!(self, Token::LParen | Token::LBrace | Token::LBracket)
    }

    /// Closing delimiters, for balanced skipping.
    pub fn is_close_delim(self) -> bool {
        matches!(self, Token::RParen | Token::RBrace | Token::RBracket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Token::lexer(src).map(|t| t.unwrap_or(Token::Other)).collect()
    }

    #[test]
    fn test_keywords_vs_idents() {
        assert_eq!(
            lex("package types"),
            vec![Token::Package, Token::Ident]
        );
        // A keyword prefix does not make an identifier a keyword.
        assert_eq!(lex("packages"), vec![Token::Ident]);
        assert_eq!(lex("typeSpec"), vec![Token::Ident]);
    }

    #[test]
    fn test_string_and_raw_string() {
        assert_eq!(
            lex(r#"import x "fmt""#),
            vec![Token::Import, Token::Ident, Token::String]
        );
        assert_eq!(lex("`json:\"name\"`"), vec![Token::RawString]);
    }

    #[test]
    fn test_string_with_escaped_quote() {
        assert_eq!(lex(r#""a\"b""#), vec![Token::String]);
    }

    #[test]
    fn test_brace_in_literal_is_atomic() {
        // Braces inside string and rune literals must not surface as
        // delimiter tokens, or body skipping would go off balance.
        assert_eq!(lex(r#""{""#), vec![Token::String]);
        assert_eq!(lex("'{'"), vec![Token::Rune]);
    }

    #[test]
    fn test_comments_are_trivia() {
        assert_eq!(
            lex("type // trailing\nT"),
            vec![Token::Type, Token::Newline, Token::Ident]
        );
        assert_eq!(lex("/* a { b */ type"), vec![Token::Type]);
    }

    #[test]
    fn test_newline_is_a_token() {
        assert_eq!(
            lex("a\nb"),
            vec![Token::Ident, Token::Newline, Token::Ident]
        );
    }

    #[test]
    fn test_ellipsis_beats_dot() {
        assert_eq!(lex("...x"), vec![Token::Ellipsis, Token::Ident]);
        assert_eq!(lex("a.b"), vec![Token::Ident, Token::Dot, Token::Ident]);
    }

    #[test]
    fn test_unicode_identifier() {
        assert_eq!(lex("αβ1"), vec![Token::Ident]);
    }

    #[test]
    fn test_other_catches_operators() {
        assert_eq!(lex("+"), vec![Token::Other]);
        assert_eq!(lex("1"), vec![Token::Other]);
    }
}
