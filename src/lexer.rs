use crate::error::{Error, Result};
use crate::token::{Position, Token, TokenKind};
use phf::phf_map;
use std::iter::Peekable;
use std::str::CharIndices;

/// Pulls tokens out of source text one at a time.
///
/// Once the end of input is reached every further call yields `EOF`. An
/// unrecognized character, or a number too large for an `f64`, stops the
/// lexer for good: the same error is returned from then on.
pub struct Lexer<'a> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
    start: usize,
    start_position: Position,
    line: usize,
    column: usize,
    failure: Option<Error>,
}

/// Lexes all of `source`, including the trailing `EOF` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::EOF;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            source,
            iter: source.char_indices().peekable(),
            start: 0,
            start_position: Position::new(1, 1),
            line: 1,
            column: 1,
            failure: None,
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let result = self.scan_token();
        if let Err(err) = &result {
            self.failure = Some(err.clone());
        }
        result
    }

    /// The next raw character, without consuming it.
    pub fn peek_char(&mut self) -> Option<char> {
        self.iter.peek().map(|(_, c)| *c)
    }

    fn scan_token(&mut self) -> Result<Token> {
        loop {
            self.start = self.current();
            self.start_position = Position::new(self.line, self.column);
            let c = match self.advance() {
                None => return Ok(self.token(TokenKind::EOF)),
                Some(c) => c,
            };
            let kind = match c {
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                '{' => TokenKind::LeftBrace,
                '}' => TokenKind::RightBrace,
                '[' => TokenKind::LeftBracket,
                ']' => TokenKind::RightBracket,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                ':' => TokenKind::Colon,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '%' => TokenKind::Percent,
                '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal),
                '!' => self.either('=', TokenKind::BangEqual, TokenKind::Bang),
                '<' => self.either('=', TokenKind::LessEqual, TokenKind::Less),
                '>' => self.either('=', TokenKind::GreaterEqual, TokenKind::Greater),
                '&' if self.next_if('&') => TokenKind::AndAnd,
                '|' if self.next_if('|') => TokenKind::OrOr,
                '/' => {
                    if self.next_if('/') {
                        self.skip_line();
                        continue;
                    }
                    TokenKind::Slash
                }
                '#' => {
                    self.skip_line();
                    continue;
                }
                c if c.is_whitespace() => continue,
                '"' => self.text()?,
                '0'..='9' => self.number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.identifier(),
                c => {
                    return Err(Error::UnexpectedCharacter {
                        character: c,
                        position: self.start_position,
                    })
                }
            };
            return Ok(self.token(kind));
        }
    }

    fn current(&mut self) -> usize {
        match self.iter.peek() {
            None => self.source.len(),
            Some((idx, _)) => *idx,
        }
    }

    fn token(&mut self, kind: TokenKind) -> Token {
        let current = self.current();
        Token {
            kind,
            lexeme: self.source[self.start..current].to_string(),
            position: self.start_position,
        }
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.iter.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn next_if(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            return true;
        }
        false
    }

    fn either(&mut self, expected: char, matched: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.next_if(expected) {
            matched
        } else {
            otherwise
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn text(&mut self) -> Result<TokenKind> {
        loop {
            match self.advance() {
                Some('"') => break,
                Some(_) => {}
                None => {
                    return Err(Error::UnterminatedText {
                        position: self.start_position,
                    })
                }
            }
        }
        let current = self.current();
        Ok(TokenKind::Text(
            self.source[self.start + 1..current - 1].to_string(),
        ))
    }

    fn number(&mut self) -> Result<TokenKind> {
        self.digits();

        // A '.' only belongs to the number when a digit follows it.
        if self.peek_char() == Some('.') {
            let mut lookahead = self.iter.clone();
            lookahead.next();
            if let Some((_, '0'..='9')) = lookahead.peek() {
                self.advance();
                self.digits();
            }
        }

        let current = self.current();
        let literal = &self.source[self.start..current];
        // Only ASCII digits with at most one inner '.' reach here.
        let value: f64 = literal.parse().unwrap_or_default();
        if !value.is_finite() {
            return Err(Error::NumberOutOfRange {
                literal: literal.to_string(),
                position: self.start_position,
            });
        }
        Ok(TokenKind::Number(value))
    }

    fn digits(&mut self) {
        while let Some('0'..='9') = self.peek_char() {
            self.advance();
        }
    }

    fn identifier(&mut self) -> TokenKind {
        while let Some(c) = self.peek_char() {
            match c {
                '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' => {
                    self.advance();
                }
                _ => break,
            }
        }
        let current = self.current();
        let word = &self.source[self.start..current];
        match KEYWORDS.get(word) {
            None => TokenKind::Identifier(word.to_string()),
            Some(keyword) => keyword.clone(),
        }
    }
}

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "let" => TokenKind::Let,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "for" => TokenKind::For,
    "try" => TokenKind::Try,
    "catch" => TokenKind::Catch,
    "function" => TokenKind::Function,
    "return" => TokenKind::Return,
    "print" => TokenKind::Print,
};

#[cfg(test)]
mod lexer_tests {
    use super::{tokenize, Lexer};
    use crate::error::{Error, ErrorKind};
    use crate::token::{Position, TokenKind};
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn basic_lexer_test() {
        assert_eq!(
            kinds("let x = 2;"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier("x".to_string()),
                TokenKind::Equal,
                TokenKind::Number(2.0),
                TokenKind::Semicolon,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn number_parsing() {
        assert_eq!(
            kinds("1+2.5"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Plus,
                TokenKind::Number(2.5),
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn operators_take_the_longest_match() {
        assert_eq!(
            kinds("== != <= >= < > = ! && || %"),
            vec![
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Equal,
                TokenKind::Bang,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Percent,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            kinds("( ) { } [ ] , ; :"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Colon,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(
            kinds("function functional returns return"),
            vec![
                TokenKind::Function,
                TokenKind::Identifier("functional".to_string()),
                TokenKind::Identifier("returns".to_string()),
                TokenKind::Return,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn comments_and_text() {
        let source = "# a comment\nprint \"hi there\"; // trailing\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Print,
                TokenKind::Text("hi there".to_string()),
                TokenKind::Semicolon,
                TokenKind::EOF,
            ]
        );
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = tokenize("let a = 1;\n  a").unwrap();
        assert_eq!(tokens[1].position, Position::new(1, 5));
        assert_eq!(tokens[5].position, Position::new(2, 3));
        assert_eq!(tokens[5].lexeme, "a");
    }

    #[test]
    fn eof_repeats_forever() {
        let mut lexer = Lexer::new("x");
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOF);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EOF);
    }

    #[test]
    fn peek_char_does_not_consume() {
        let mut lexer = Lexer::new("ab");
        assert_eq!(lexer.peek_char(), Some('a'));
        assert_eq!(lexer.peek_char(), Some('a'));
        assert_eq!(
            lexer.next_token().unwrap().kind,
            TokenKind::Identifier("ab".to_string())
        );
        assert_eq!(lexer.peek_char(), None);
    }

    #[test]
    fn unexpected_character_stops_lexing() {
        let mut lexer = Lexer::new("x @ y");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedCharacter {
                character: '@',
                position: Position::new(1, 3),
            }
        );
        assert_eq!(lexer.next_token().unwrap_err(), err);
    }

    #[test]
    fn single_ampersand_is_rejected() {
        let err = tokenize("a & b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LexError);
    }

    #[test]
    fn unterminated_text() {
        let err = tokenize("print \"oops").unwrap_err();
        assert_eq!(
            err,
            Error::UnterminatedText {
                position: Position::new(1, 7),
            }
        );
    }

    #[test]
    fn number_too_large_for_f64() {
        let literal = "9".repeat(400);
        let source = format!("let x = {};", literal);
        let mut lexer = Lexer::new(&source);
        for _ in 0..3 {
            lexer.next_token().unwrap();
        }
        let err = lexer.next_token().unwrap_err();
        assert_eq!(
            err,
            Error::NumberOutOfRange {
                literal,
                position: Position::new(1, 9),
            }
        );
        assert_eq!(err.kind(), ErrorKind::LexError);
        assert_eq!(lexer.next_token().unwrap_err(), err);
    }

    #[test]
    fn large_but_finite_numbers_are_kept() {
        assert_eq!(
            kinds("1e3"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Identifier("e3".to_string()),
                TokenKind::EOF,
            ]
        );
        let digits = format!("1{}", "0".repeat(300));
        assert_eq!(kinds(&digits)[0], TokenKind::Number(1e300));
    }
}
