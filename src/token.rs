use std::fmt;
use strum_macros::Display;

#[rustfmt::skip]
#[derive(Debug, Clone, PartialEq, Display)]
pub enum TokenKind {
    // Punctuation.
    #[strum(serialize = "'('")] LeftParen,
    #[strum(serialize = "')'")] RightParen,
    #[strum(serialize = "'{'")] LeftBrace,
    #[strum(serialize = "'}'")] RightBrace,
    #[strum(serialize = "'['")] LeftBracket,
    #[strum(serialize = "']'")] RightBracket,
    #[strum(serialize = "','")] Comma,
    #[strum(serialize = "';'")] Semicolon,
    #[strum(serialize = "':'")] Colon,

    // Operators.
    #[strum(serialize = "'+'")] Plus,
    #[strum(serialize = "'-'")] Minus,
    #[strum(serialize = "'*'")] Star,
    #[strum(serialize = "'/'")] Slash,
    #[strum(serialize = "'%'")] Percent,
    #[strum(serialize = "'='")] Equal,
    #[strum(serialize = "'=='")] EqualEqual,
    #[strum(serialize = "'!'")] Bang,
    #[strum(serialize = "'!='")] BangEqual,
    #[strum(serialize = "'<'")] Less,
    #[strum(serialize = "'<='")] LessEqual,
    #[strum(serialize = "'>'")] Greater,
    #[strum(serialize = "'>='")] GreaterEqual,
    #[strum(serialize = "'&&'")] AndAnd,
    #[strum(serialize = "'||'")] OrOr,

    // Literals.
    #[strum(serialize = "identifier")] Identifier(String),
    #[strum(serialize = "text")] Text(String),
    #[strum(serialize = "number")] Number(f64),

    // Keywords.
    #[strum(serialize = "'let'")] Let,
    #[strum(serialize = "'if'")] If,
    #[strum(serialize = "'else'")] Else,
    #[strum(serialize = "'while'")] While,
    #[strum(serialize = "'for'")] For,
    #[strum(serialize = "'try'")] Try,
    #[strum(serialize = "'catch'")] Catch,
    #[strum(serialize = "'function'")] Function,
    #[strum(serialize = "'return'")] Return,
    #[strum(serialize = "'print'")] Print,

    #[strum(serialize = "end of input")] EOF,
}

impl TokenKind {
    /// True when both kinds are the same lexical class, ignoring any literal payload.
    pub fn same_class(&self, other: &TokenKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Position {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub position: Position,
}

impl Token {
    /// How the token is named in diagnostics: its source text, or its class at end of input.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::EOF => self.kind.to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}
