use std::fmt;
use std::{iter::Peekable, str::Chars};
use thiserror::Error;

/// Position in a text document expressed as zero-based line and character offset.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Default)]
pub struct Position {
    /// Line position in a document (zero-based).
    pub line: usize,
    /// Character offset on a line in a document (zero-based).
    pub character: usize,
}

// The effective range of a token.
// `start` inclusive, `end` exclusive.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Default)]
pub struct EffectiveRange {
    pub length: usize,
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub range: EffectiveRange,
    pub leading_trivia: Vec<Trivia>,
    text: String,
}

/// Trivia is not part of the normal language syntax and can appear anywhere between any two tokens.
#[derive(Debug, PartialEq, Clone)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub range: EffectiveRange,
    text: String,
}

impl Token {
    /// The source text of this token, quotes and escapes included.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}

impl Trivia {
    pub fn text(&self) -> &str {
        self.text.as_str()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    // Primitive
    Identifier(String),
    // `math.ops:add`
    QualifiedName { namespace: String, name: String },
    // Literals keep their source text. Coercion happens at evaluation time.
    Integer(String),
    Decimal(String),
    String(String),
    Boolean(bool),

    // Keywords
    If,
    Else,
    Null,

    // Operators
    Eq,  // "=="
    Ne,  // "!="
    Le,  // "<="
    Ge,  // ">="
    And, // "&&"
    Or,  // "||"

    // punctuations
    Char(char),

    // End of input source
    Eos,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TriviaKind {
    LineComment(String),
    // `@arg first Entier`
    Annotation(String),
    Whitespace,
}

#[derive(Debug)]
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    at_end: bool,
    /// Only whitespace has been seen since the last newline.
    at_line_start: bool,
    /// Tracking the range of token.
    lineno: usize,
    columnno: usize,
    start_position: Option<Position>,
    token_text: String,

    /// Remember a peeked value, even if it was None.
    peeked: Option<Result<Token, TokenError>>,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("{kind} at {position}")]
pub struct TokenError {
    pub position: Position,
    pub kind: TokenErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenErrorKind {
    Error(String), // Genetic error
}

impl fmt::Display for TokenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenErrorKind::Error(message) => write!(f, "{}", message),
        }
    }
}

impl<'a> Tokenizer<'a> {
    pub fn from_string<S: AsRef<str> + ?Sized>(src: &'a S) -> Tokenizer<'a> {
        let mut iter = src.as_ref().chars().peekable();
        let at_end = iter.peek().is_none();

        Tokenizer {
            chars: iter,
            at_end,
            at_line_start: true,
            lineno: 0,
            columnno: 0,
            start_position: None,
            token_text: "".to_string(),
            peeked: None,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.at_end
    }

    /// Returns a reference to the `next_token()` value without advance the tokenizer.
    pub fn peek(&mut self) -> Result<&Token, &TokenError> {
        if self.peeked.is_none() {
            let token = self.advance_token();
            self.peeked = Some(token);
        }

        match self.peeked {
            Some(ref peeked) => peeked.as_ref(),
            None => unreachable!("a token has just been peeked"),
        }
    }

    pub fn peek_kind(&mut self) -> Result<&TokenKind, &TokenError> {
        self.peek().map(|x| &x.kind)
    }

    pub fn current_position(&self) -> Position {
        Position {
            line: self.lineno,
            character: self.columnno,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, TokenError> {
        match self.peeked.take() {
            Some(v) => v,
            None => self.advance_token(),
        }
    }

    fn begin_token(&mut self) {
        self.token_text.clear();
        self.start_position = Some(self.current_position());
    }

    fn end_token(&mut self) -> (String, EffectiveRange) {
        let start = self
            .start_position
            .take()
            .unwrap_or_else(|| self.current_position());
        let range = EffectiveRange {
            length: self.token_text.len(),
            start,
            end: self.current_position(),
        };

        (self.token_text.clone(), range)
    }

    fn error<S: Into<String>>(&self, message: S) -> TokenError {
        TokenError {
            position: self.current_position(),
            kind: TokenErrorKind::Error(message.into()),
        }
    }

    fn advance_token(&mut self) -> Result<Token, TokenError> {
        let leading_trivia = self.read_trivia();

        self.begin_token();
        self.at_line_start = false;

        let kind = match self.peek_char() {
            None => TokenKind::Eos,
            Some(nextc) => match nextc {
                '0'..='9' => self.read_number(nextc),
                'a'..='z' | 'A'..='Z' | '_' => self.read_name(nextc),
                '!' | '=' | '<' | '>' | '&' | '|' => self.read_operator(nextc)?,
                '"' => self.read_string()?,
                x => {
                    self.next_char();
                    TokenKind::Char(x)
                }
            },
        };

        let (text, range) = self.end_token();

        Ok(Token {
            kind,
            range,
            text,
            leading_trivia,
        })
    }

    // The literal is kept verbatim (quotes included), but escapes are checked here
    // so that a malformed string never reaches the evaluator.
    fn read_string(&mut self) -> Result<TokenKind, TokenError> {
        let mut string = String::new();
        self.next_char();
        string.push('"');

        loop {
            match self.peek_char() {
                Some('"') => {
                    self.next_char();
                    string.push('"');
                    break;
                }
                Some('\\') => {
                    self.next_char();
                    string.push('\\');

                    let c = match self.peek_char() {
                        Some(c) => c,
                        None => {
                            return Err(self.error("Premature EOF while reading escape sequence"))
                        }
                    };

                    match c {
                        'n' | 'r' | 't' | '"' | '\\' => string.push(c),
                        c => {
                            return Err(
                                self.error(format!("Unrecognized escape sequence: \"\\{}\"", c))
                            )
                        }
                    };
                    self.next_char();
                }
                Some('\n') | None => return Err(self.error("Premature EOF while reading string")),
                Some(c) => {
                    string.push(c);
                    self.next_char();
                }
            };
        }

        Ok(TokenKind::String(string))
    }

    fn read_operator(&mut self, nextc: char) -> Result<TokenKind, TokenError> {
        let c = nextc;
        self.next_char();

        let token = match (c, self.peek_char()) {
            ('=', Some('=')) => TokenKind::Eq,
            ('!', Some('=')) => TokenKind::Ne,
            ('<', Some('=')) => TokenKind::Le,
            ('>', Some('=')) => TokenKind::Ge,
            ('&', Some('&')) => TokenKind::And,
            ('|', Some('|')) => TokenKind::Or,
            ('&', _) | ('|', _) => return Err(self.error(format!("Unrecognized token `{}`", c))),
            _ => return Ok(TokenKind::Char(c)),
        };

        self.next_char();
        Ok(token)
    }

    fn read_identifier(&mut self, nextc: char) -> String {
        let mut value = nextc.to_string();
        self.next_char();

        while let Some(nextc) = self.peek_char() {
            match nextc {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => {
                    value.push(nextc);
                }
                _ => break,
            };
            self.next_char();
        }

        value
    }

    fn read_name(&mut self, nextc: char) -> TokenKind {
        let mut path = self.read_identifier(nextc);

        // A dotted path glued to `:ident` is a qualified name. Anything else
        // rewinds to the plain identifier (`first: 3` stays a named argument).
        let mut lookahead = self.chars.clone();
        let mut segments = String::new();

        loop {
            match lookahead.next() {
                Some('.') => {
                    match lookahead.peek() {
                        Some(c) if c.is_ascii_alphabetic() || *c == '_' => {}
                        _ => break,
                    }
                    segments.push('.');
                    while let Some(c) = lookahead.peek() {
                        if c.is_ascii_alphanumeric() || *c == '_' {
                            segments.push(*c);
                            lookahead.next();
                        } else {
                            break;
                        }
                    }
                }
                Some(':') => {
                    match lookahead.peek() {
                        Some(c) if c.is_ascii_alphabetic() || *c == '_' => {}
                        _ => break,
                    }

                    // Only a call target is qualified: `ns:name (`.
                    let mut rest = lookahead.clone();
                    while matches!(rest.peek(), Some(c) if c.is_ascii_alphanumeric() || *c == '_') {
                        rest.next();
                    }
                    while matches!(rest.peek(), Some(' ') | Some('\t')) {
                        rest.next();
                    }
                    if rest.peek() != Some(&'(') {
                        break;
                    }

                    for _ in 0..segments.len() + 1 {
                        self.next_char();
                    }
                    path.push_str(&segments);

                    let first = match self.peek_char() {
                        Some(c) => c,
                        None => break,
                    };
                    let name = self.read_identifier(first);

                    return TokenKind::QualifiedName {
                        namespace: path,
                        name,
                    };
                }
                _ => break,
            }
        }

        match path.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "null" => TokenKind::Null,
            "Vrai" | "true" => TokenKind::Boolean(true),
            "Faux" | "false" => TokenKind::Boolean(false),
            _ => TokenKind::Identifier(path),
        }
    }

    fn read_digits(&mut self, value: &mut String) {
        while let Some(x @ '0'..='9') = self.peek_char() {
            value.push(x);
            self.next_char();
        }
    }

    fn read_number(&mut self, nextc: char) -> TokenKind {
        let mut value = nextc.to_string();
        self.next_char();
        self.read_digits(&mut value);

        // "1.5" is a decimal only when a digit follows the dot.
        let mut lookahead = self.chars.clone();
        if let (Some('.'), Some('0'..='9')) = (lookahead.next(), lookahead.next()) {
            value.push('.');
            self.next_char();
            self.read_digits(&mut value);
            return TokenKind::Decimal(value);
        }

        TokenKind::Integer(value)
    }

    fn peek_char(&mut self) -> Option<char> {
        let c = self.chars.peek();
        self.at_end = c.is_none();
        c.copied()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next()?;

        self.token_text.push(c);
        self.columnno += 1;

        if c == '\n' {
            self.lineno += 1;
            self.columnno = 0;
            self.at_line_start = true;
        }

        Some(c)
    }

    fn read_whitespace(&mut self) -> TriviaKind {
        while let Some(c) = self.peek_char() {
            if !(c == ' ' || c == '\t' || c == '\n' || c == '\r') {
                break;
            }
            self.next_char();
        }

        TriviaKind::Whitespace
    }

    fn read_until_newline(&mut self) -> String {
        let mut text = String::new();

        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }

            text.push(c);
            self.next_char();
        }

        text
    }

    fn read_comment(&mut self) -> TriviaKind {
        self.next_char(); // '/'
        self.next_char(); // '/'

        TriviaKind::LineComment(self.read_until_newline())
    }

    fn read_annotation(&mut self) -> TriviaKind {
        TriviaKind::Annotation(self.read_until_newline().trim_end().to_string())
    }

    fn read_trivia(&mut self) -> Vec<Trivia> {
        let mut trivia = vec![];

        while let Some(c) = self.peek_char() {
            self.begin_token();

            let kind = if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
                self.read_whitespace()
            } else if c == '/' && self.chars.clone().nth(1) == Some('/') {
                self.read_comment()
            } else if c == '@' && self.at_line_start {
                self.read_annotation()
            } else {
                break;
            };

            let (text, range) = self.end_token();

            trivia.push(Trivia { kind, text, range })
        }

        trivia
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line:{}:{}", self.line, self.character)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "id<{}>", name),
            TokenKind::QualifiedName { namespace, name } => {
                write!(f, "qname<{}:{}>", namespace, name)
            }
            TokenKind::Integer(i) => write!(f, "int<{}>", i),
            TokenKind::Decimal(d) => write!(f, "dec<{}>", d),
            TokenKind::String(s) => write!(f, "str<{}>", s),
            TokenKind::Boolean(b) => write!(f, "bool<{}>", b),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::Ne => write!(f, "!="),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::Char(c) => write!(f, "{}", c),
            TokenKind::Eos => write!(f, "(EOF)"),
        }
    }
}
