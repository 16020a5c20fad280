//! Header text tokeniser.
//!
//! Classifies raw header text into the token kinds of [`crate::token`]. A
//! directive's name and its trailing value text are folded into adjacent
//! `DirectiveName`/`DirectiveValue` tokens; bytes outside the printable
//! ASCII range turn the rest of the directive span into a single `Unknown`
//! token, which the parser rejects wherever it appears.

use crate::token::{DirectiveKind, Location, Token, TokenKind};

/// Tokenises one header value.
pub fn tokenise(text: &str) -> Vec<Token> {
    Lexer::new(text).run()
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            line: 1,
            column: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        loop {
            self.skip_wsp();
            let Some(c) = self.peek_char() else {
                break;
            };
            match c {
                ',' => self.lex_separator(TokenKind::PolicySeparator),
                ';' => self.lex_separator(TokenKind::DirectiveSeparator),
                c if is_name_char(c) => self.lex_directive(),
                _ => self.lex_unknown(),
            }
        }
        self.tokens
    }

    fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += c.len_utf8();
        }
    }

    fn skip_wsp(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == ' ' || c == '\t' {
                self.bump(c);
            } else {
                break;
            }
        }
    }

    fn push_token(&mut self, kind: TokenKind, from: usize, start: Location) {
        self.tokens.push(Token {
            kind,
            value: self.text[from..self.pos].to_string(),
            start: Some(start),
            end: Some(self.location()),
        });
    }

    fn lex_separator(&mut self, kind: TokenKind) {
        let start = self.location();
        let from = self.pos;
        if let Some(c) = self.peek_char() {
            self.bump(c);
        }
        self.push_token(kind, from, start);
    }

    fn lex_directive(&mut self) {
        let start = self.location();
        let from = self.pos;
        while let Some(c) = self.peek_char() {
            if is_name_char(c) {
                self.bump(c);
            } else {
                break;
            }
        }
        let kind = DirectiveKind::from_name(&self.text[from..self.pos]);
        self.push_token(TokenKind::DirectiveName(kind), from, start);
        self.skip_wsp();
        self.lex_directive_value();
    }

    fn lex_directive_value(&mut self) {
        let start = self.location();
        let from = self.pos;
        let mut value_end = self.pos;
        let mut end = start;
        while let Some(c) = self.peek_char() {
            if c == ';' || c == ',' || !is_value_char(c) {
                break;
            }
            self.bump(c);
            if c != ' ' && c != '\t' {
                value_end = self.pos;
                end = self.location();
            }
        }
        if value_end > from {
            self.tokens.push(Token {
                kind: TokenKind::DirectiveValue,
                value: self.text[from..value_end].to_string(),
                start: Some(start),
                end: Some(end),
            });
        }
        if matches!(self.peek_char(), Some(c) if c != ';' && c != ',') {
            self.lex_unknown();
        }
    }

    fn lex_unknown(&mut self) {
        let start = self.location();
        let from = self.pos;
        while let Some(c) = self.peek_char() {
            if c == ';' || c == ',' {
                break;
            }
            self.bump(c);
        }
        self.push_token(TokenKind::Unknown, from, start);
    }
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

const fn is_value_char(c: char) -> bool {
    c == '\t' || matches!(c, ' '..='~')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenise(text).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn name_and_value_fold_into_adjacent_tokens() {
        let tokens = tokenise("default-src 'self' https://cdn.example.com");
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            tokens[0].kind,
            TokenKind::DirectiveName(DirectiveKind::DefaultSrc)
        );
        assert_eq!(tokens[0].value, "default-src");
        assert_eq!(tokens[1].kind, TokenKind::DirectiveValue);
        assert_eq!(tokens[1].value, "'self' https://cdn.example.com");
    }

    #[test]
    fn separators_are_classified() {
        assert_eq!(
            kinds("a; b, c"),
            [
                TokenKind::DirectiveName(DirectiveKind::Unrecognised),
                TokenKind::DirectiveSeparator,
                TokenKind::DirectiveName(DirectiveKind::Unrecognised),
                TokenKind::PolicySeparator,
                TokenKind::DirectiveName(DirectiveKind::Unrecognised),
            ]
        );
    }

    #[test]
    fn value_is_right_trimmed() {
        let tokens = tokenise("img-src *   ;");
        assert_eq!(tokens[1].value, "*");
        assert_eq!(tokens[2].kind, TokenKind::DirectiveSeparator);
    }

    #[test]
    fn name_without_value_yields_single_token() {
        let tokens = tokenise("sandbox");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::DirectiveName(DirectiveKind::Sandbox));
    }

    #[test]
    fn non_ascii_byte_becomes_one_unknown_token() {
        let tokens = tokenise("img-src a.com \u{e9}xtra stuff; font-src x");
        assert_eq!(tokens[0].kind, TokenKind::DirectiveName(DirectiveKind::ImgSrc));
        assert_eq!(tokens[1].kind, TokenKind::DirectiveValue);
        assert_eq!(tokens[1].value, "a.com");
        assert_eq!(tokens[2].kind, TokenKind::Unknown);
        assert_eq!(tokens[2].value, "\u{e9}xtra stuff");
        assert_eq!(tokens[3].kind, TokenKind::DirectiveSeparator);
        assert_eq!(tokens[4].kind, TokenKind::DirectiveName(DirectiveKind::FontSrc));
    }

    #[test]
    fn span_not_starting_with_name_char_is_unknown() {
        let tokens = tokenise("'self'");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].value, "'self'");
    }

    #[test]
    fn locations_are_byte_offsets() {
        let tokens = tokenise("img-src a.com b.org");
        let value = &tokens[1];
        assert_eq!(value.start.unwrap().offset, 8);
        assert_eq!(value.start.unwrap().column, 8);
        assert_eq!(value.end.unwrap().offset, 19);
        assert_eq!(value.start.unwrap().line, 1);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenise("").is_empty());
        assert!(tokenise("   \t ").is_empty());
    }
}
