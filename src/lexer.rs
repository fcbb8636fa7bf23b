//! Byte stream → token stream.
//!
//! Mirrors the shape of a hand-written scanner: a `Peekable<Chars>` cursor
//! with running line/column counters, producing one [`Token`] per call to
//! [`Lexer::next_token`].

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use once_cell::sync::Lazy;

use crate::error::MplError;
use crate::token::{Token, TokenKind};

static RESERVED_WORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    HashMap::from([
        ("type", Type),
        ("fun", Fun),
        ("var", Var),
        ("if", If),
        ("then", Then),
        ("elseif", ElseIf),
        ("else", Else),
        ("end", End),
        ("while", While),
        ("do", Do),
        ("for", For),
        ("to", To),
        ("return", Return),
        ("new", New),
        ("nil", Nil),
        ("neg", Neg),
        ("and", And),
        ("or", Or),
        ("not", Not),
        ("int", IntType),
        ("double", DoubleType),
        ("bool", BoolType),
        ("char", CharType),
        ("string", StringType),
    ])
});

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let next = self.chars.next();
        match next {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }
        next
    }

    fn error(&self, msg: impl Into<String>) -> MplError {
        MplError::lexer(msg, self.line, self.column)
    }

    /// Skip whitespace and `#`-to-end-of-line comments, including any
    /// number of consecutive comment lines.
    fn skip_trivia(&mut self) {
        loop {
            while let Some(c) = self.peek() {
                if c.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }

            if self.peek() == Some('#') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    /// Return the next token in the stream, terminating with [`TokenKind::Eos`]
    /// at end of input.
    pub fn next_token(&mut self) -> Result<Token, MplError> {
        self.skip_trivia();

        let (line, column) = (self.line, self.column);

        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenKind::Eos, "", line, column));
        };

        if ch.is_alphabetic() || ch == '_' {
            return Ok(self.lex_identifier(line, column));
        }

        if ch.is_ascii_digit() {
            return self.lex_number(line, column);
        }

        if ch == '~' {
            return self.lex_pointer(line, column, TokenKind::PointerType);
        }

        if ch == '&' {
            return self.lex_pointer(line, column, TokenKind::PointerVal);
        }

        if ch == '"' {
            return self.lex_string(line, column);
        }

        if ch == '\'' {
            return self.lex_char(line, column);
        }

        self.lex_symbol(line, column)
    }

    fn lex_identifier(&mut self, line: usize, column: usize) -> Token {
        let mut lexeme = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if lexeme == "true" || lexeme == "false" {
            return Token::new(TokenKind::BoolVal, lexeme, line, column);
        }

        let kind = RESERVED_WORDS
            .get(lexeme.as_str())
            .copied()
            .unwrap_or(TokenKind::Id);
        Token::new(kind, lexeme, line, column)
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Result<Token, MplError> {
        let mut lexeme = String::new();
        let mut dots = 0usize;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                if c == '.' {
                    dots += 1;
                }
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if dots > 0 {
            Ok(Token::new(TokenKind::DoubleVal, lexeme, line, column))
        } else {
            Ok(Token::new(TokenKind::IntVal, lexeme, line, column))
        }
    }

    fn lex_pointer(&mut self, line: usize, column: usize, kind: TokenKind) -> Result<Token, MplError> {
        let sigil = self.advance().expect("caller verified a sigil is present");

        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            _ => return self.lex_symbol_from(sigil, line, column),
        }

        let mut lexeme = String::from(sigil);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Ok(Token::new(kind, lexeme, line, column))
    }

    fn lex_string(&mut self, line: usize, column: usize) -> Result<Token, MplError> {
        self.advance(); // opening quote
        let mut lexeme = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\n') => return Err(self.error("unterminated string literal")),
                Some(c) => lexeme.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
        Ok(Token::new(TokenKind::StringVal, lexeme, line, column))
    }

    fn lex_char(&mut self, line: usize, column: usize) -> Result<Token, MplError> {
        self.advance(); // opening quote
        let Some(value) = self.advance() else {
            return Err(self.error("unterminated character literal"));
        };
        match self.advance() {
            Some('\'') => Ok(Token::new(TokenKind::CharVal, value.to_string(), line, column)),
            _ => Err(self.error("malformed character literal")),
        }
    }

    fn lex_symbol(&mut self, line: usize, column: usize) -> Result<Token, MplError> {
        let ch = self.advance().expect("caller verified a character is present");
        self.lex_symbol_from(ch, line, column)
    }

    fn lex_symbol_from(&mut self, ch: char, line: usize, column: usize) -> Result<Token, MplError> {
        use TokenKind::*;

        let token = match ch {
            '=' if self.peek() == Some('=') => {
                self.advance();
                Token::new(Equal, "==", line, column)
            }
            '=' => Token::new(Assign, "=", line, column),
            '!' if self.peek() == Some('=') => {
                self.advance();
                Token::new(NotEqual, "!=", line, column)
            }
            '<' if self.peek() == Some('=') => {
                self.advance();
                Token::new(LessEqual, "<=", line, column)
            }
            '<' => Token::new(Less, "<", line, column),
            '>' if self.peek() == Some('=') => {
                self.advance();
                Token::new(GreaterEqual, ">=", line, column)
            }
            '>' => Token::new(Greater, ">", line, column),
            '+' => Token::new(Plus, "+", line, column),
            '-' => Token::new(Minus, "-", line, column),
            '*' => Token::new(Multiply, "*", line, column),
            '/' => Token::new(Divide, "/", line, column),
            '%' => Token::new(Modulo, "%", line, column),
            '(' => Token::new(LParen, "(", line, column),
            ')' => Token::new(RParen, ")", line, column),
            '.' => Token::new(Dot, ".", line, column),
            ',' => Token::new(Comma, ",", line, column),
            ':' => Token::new(Colon, ":", line, column),
            other => return Err(self.error(format!("illegal character '{other}'"))),
        };
        Ok(token)
    }

    /// Drain the lexer into a vector of tokens, the trailing [`TokenKind::Eos`]
    /// included. Convenience for callers (e.g. the `lex` CLI mode) that do
    /// not need streaming behavior.
    pub fn tokenize(mut self) -> Result<Vec<Token>, MplError> {
        let mut tokens = vec![];
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eos;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_identifiers_and_reserved_words() {
        assert_eq!(
            kinds("var x fun"),
            vec![TokenKind::Var, TokenKind::Id, TokenKind::Fun, TokenKind::Eos]
        );
    }

    #[test]
    fn lexes_booleans_as_bool_val() {
        assert_eq!(kinds("true false"), vec![TokenKind::BoolVal, TokenKind::BoolVal, TokenKind::Eos]);
    }

    #[test]
    fn lexes_integer_and_double_literals() {
        assert_eq!(
            kinds("42 3.14"),
            vec![TokenKind::IntVal, TokenKind::DoubleVal, TokenKind::Eos]
        );
    }

    #[test]
    fn lexes_two_char_operators_greedily() {
        assert_eq!(
            kinds("== != <= >= = < >"),
            vec![
                TokenKind::Equal,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Assign,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eos,
            ]
        );
    }

    #[test]
    fn lexes_pointer_tokens() {
        let tokens = Lexer::new("~foo &bar").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::PointerType);
        assert_eq!(tokens[0].lexeme, "~foo");
        assert_eq!(tokens[1].kind, TokenKind::PointerVal);
        assert_eq!(tokens[1].lexeme, "&bar");
    }

    #[test]
    fn collapses_consecutive_comment_lines() {
        assert_eq!(kinds("# one\n# two\nx"), vec![TokenKind::Id, TokenKind::Eos]);
    }

    #[test]
    fn string_literal_stops_at_closing_quote() {
        let tokens = Lexer::new("\"hi\\n\"").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringVal);
        assert_eq!(tokens[0].lexeme, "hi\\n");
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        let err = Lexer::new("\"abc\ndef\"").tokenize().unwrap_err();
        assert_eq!(err.stage, crate::error::Stage::Lexer);
    }

    #[test]
    fn malformed_char_literal_is_a_lex_error() {
        assert!(Lexer::new("'ab'").tokenize().is_err());
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = Lexer::new("x\n  y").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
    }
}
