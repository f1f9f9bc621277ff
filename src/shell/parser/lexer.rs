use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use super::error::{Position, SyntaxError, SyntaxErrorKind};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectOp {
    Input,     // <
    Output,    // >
    Append,    // >>
    Clobber,   // >|
    DupOutput, // >&
    DupInput,  // <&
    ReadWrite, // <>
}

impl RedirectOp {
    /// Descriptor affected when no IO number precedes the operator.
    pub fn default_fd(self) -> i32 {
        match self {
            RedirectOp::Input | RedirectOp::DupInput | RedirectOp::ReadWrite => 0,
            RedirectOp::Output | RedirectOp::Append | RedirectOp::Clobber | RedirectOp::DupOutput => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RedirectOp::Input => "<",
            RedirectOp::Output => ">",
            RedirectOp::Append => ">>",
            RedirectOp::Clobber => ">|",
            RedirectOp::DupOutput => ">&",
            RedirectOp::DupInput => "<&",
            RedirectOp::ReadWrite => "<>",
        }
    }
}

impl fmt::Display for RedirectOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenKind {
    Word(String),
    If,
    Then,
    Elif,
    Else,
    Fi,
    Semi,
    Newline,
    Redirect(RedirectOp),
    IoNumber(String),
    Eof,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Word(_) => "WORD",
            TokenKind::If => "IF",
            TokenKind::Then => "THEN",
            TokenKind::Elif => "ELIF",
            TokenKind::Else => "ELSE",
            TokenKind::Fi => "FI",
            TokenKind::Semi => "SEMICOLON",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Redirect(RedirectOp::Input) => "REDIR_IN",
            TokenKind::Redirect(RedirectOp::Output) => "REDIR_OUT",
            TokenKind::Redirect(RedirectOp::Append) => "REDIR_APPEND",
            TokenKind::Redirect(RedirectOp::Clobber) => "REDIR_CLOBBER",
            TokenKind::Redirect(RedirectOp::DupOutput) => "REDIR_OUT_ERR",
            TokenKind::Redirect(RedirectOp::DupInput) => "REDIR_IN_ERR",
            TokenKind::Redirect(RedirectOp::ReadWrite) => "REDIR_RDWR",
            TokenKind::IoNumber(_) => "IO_NUMBER",
            TokenKind::Eof => "END_OF_INPUT",
        }
    }

    /// String payload, present only for words and IO numbers.
    pub fn value(&self) -> Option<&str> {
        match self {
            TokenKind::Word(value) | TokenKind::IoNumber(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Word(word) | TokenKind::IoNumber(word) => write!(f, "'{}'", word),
            TokenKind::If => f.write_str("'if'"),
            TokenKind::Then => f.write_str("'then'"),
            TokenKind::Elif => f.write_str("'elif'"),
            TokenKind::Else => f.write_str("'else'"),
            TokenKind::Fi => f.write_str("'fi'"),
            TokenKind::Semi => f.write_str("';'"),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Redirect(op) => write!(f, "'{}'", op),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

fn reserved_word(word: &str) -> Option<TokenKind> {
    match word {
        "if" => Some(TokenKind::If),
        "then" => Some(TokenKind::Then),
        "elif" => Some(TokenKind::Elif),
        "else" => Some(TokenKind::Else),
        "fi" => Some(TokenKind::Fi),
        _ => None,
    }
}

fn is_word_break(c: char) -> bool {
    matches!(c, ' ' | '\t' | ';' | '\n' | '<' | '>')
}

/// On-demand tokenizer with a single token of lookahead.
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
    at_command_start: bool,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
            line: 1,
            col: 0,
            at_command_start: true,
            peeked: None,
        }
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.lex_one(),
        }
    }

    /// Returns the next token without consuming it; the following
    /// `next_token` hands out this same token.
    pub fn peek_token(&mut self) -> Result<&Token, SyntaxError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex_one()?,
        };
        Ok(self.peeked.insert(token))
    }

    fn read_char(&mut self) -> Option<char> {
        let c = self.input.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    /// Position of the next unread character.
    fn position(&self) -> Position {
        Position::new(self.line, self.col + 1)
    }

    fn skip_blanks(&mut self) {
        while let Some(' ' | '\t') = self.peek_char() {
            self.read_char();
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.read_char();
        }
    }

    fn lex_one(&mut self) -> Result<Token, SyntaxError> {
        loop {
            self.skip_blanks();
            if self.peek_char() != Some('#') {
                break;
            }
            // the terminating newline is left for the next round
            self.skip_comment();
        }

        let position = self.position();
        let Some(c) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, position));
        };

        match c {
            ';' => {
                self.read_char();
                self.at_command_start = true;
                Ok(Token::new(TokenKind::Semi, position))
            }
            '\n' => {
                self.read_char();
                self.at_command_start = true;
                Ok(Token::new(TokenKind::Newline, position))
            }
            '<' | '>' => Ok(self.read_redirection(c, position)),
            c if c.is_ascii_digit() => self.read_io_number(position),
            _ => self.read_word(position, String::new()),
        }
    }

    fn read_redirection(&mut self, first: char, position: Position) -> Token {
        self.read_char();
        let op = match (first, self.peek_char()) {
            ('<', Some('&')) => RedirectOp::DupInput,
            ('<', Some('>')) => RedirectOp::ReadWrite,
            ('<', _) => RedirectOp::Input,
            (_, Some('>')) => RedirectOp::Append,
            (_, Some('&')) => RedirectOp::DupOutput,
            (_, Some('|')) => RedirectOp::Clobber,
            (_, _) => RedirectOp::Output,
        };
        if op.as_str().len() == 2 {
            self.read_char();
        }

        self.at_command_start = false;
        Token::new(TokenKind::Redirect(op), position)
    }

    fn read_io_number(&mut self, position: Position) -> Result<Token, SyntaxError> {
        let mut digits = String::new();
        while let Some(c) = self.peek_char().filter(char::is_ascii_digit) {
            digits.push(c);
            self.read_char();
        }

        if let Some('<' | '>') = self.peek_char() {
            self.at_command_start = false;
            return Ok(Token::new(TokenKind::IoNumber(digits), position));
        }

        // not followed by an operator: the digits start an ordinary word
        self.read_word(position, digits)
    }

    fn read_word(&mut self, position: Position, mut word: String) -> Result<Token, SyntaxError> {
        let mut quoted = false;

        while let Some(c) = self.peek_char() {
            if is_word_break(c) {
                break;
            }
            let quote_position = self.position();
            self.read_char();
            if c == '\'' {
                quoted = true;
                self.read_single_quoted(&mut word, quote_position)?;
            } else {
                word.push(c);
            }
        }

        if self.at_command_start && !quoted {
            if let Some(keyword) = reserved_word(&word) {
                // the keyword's body starts a new command
                return Ok(Token::new(keyword, position));
            }
        }

        self.at_command_start = false;
        Ok(Token::new(TokenKind::Word(word), position))
    }

    fn read_single_quoted(
        &mut self,
        word: &mut String,
        quote_position: Position,
    ) -> Result<(), SyntaxError> {
        loop {
            match self.read_char() {
                Some('\'') => return Ok(()),
                Some(c) => word.push(c),
                None => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnterminatedQuote,
                        quote_position,
                    ))
                }
            }
        }
    }
}

/// Lexes the whole input, END_OF_INPUT included.
pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn word(value: &str) -> TokenKind {
        TokenKind::Word(value.to_string())
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(
            kinds("ls -l"),
            vec![word("ls"), word("-l"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_blank_and_comment_only_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("   \t   "), vec![TokenKind::Eof]);
        assert_eq!(kinds("  # just a comment"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_comment_ends_with_newline_token() {
        assert_eq!(
            kinds("echo hi # trailing\necho ok"),
            vec![
                word("echo"),
                word("hi"),
                TokenKind::Newline,
                word("echo"),
                word("ok"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_hash_inside_word_is_literal() {
        assert_eq!(kinds("echo a#b"), vec![word("echo"), word("a#b"), TokenKind::Eof]);
    }

    #[test]
    fn test_single_quotes_are_verbatim() {
        assert_eq!(
            kinds(r"echo 'a\nb' 'hello world'"),
            vec![word("echo"), word(r"a\nb"), word("hello world"), TokenKind::Eof]
        );
        assert_eq!(kinds("echo pre'#; x'post"), vec![word("echo"), word("pre#; xpost"), TokenKind::Eof]);
    }

    #[test]
    fn test_unterminated_quote_reports_quote_position() {
        let err = tokenize("echo\n  ab'cd").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedQuote);
        assert_eq!(err.position, Position::new(2, 5));
    }

    #[test]
    fn test_reserved_words_only_at_command_start() {
        assert_eq!(kinds("echo if"), vec![word("echo"), word("if"), TokenKind::Eof]);
        assert_eq!(
            kinds("if true; then echo fi; fi"),
            vec![
                TokenKind::If,
                word("true"),
                TokenKind::Semi,
                TokenKind::Then,
                word("echo"),
                word("fi"),
                TokenKind::Semi,
                TokenKind::Fi,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_keyword_keeps_command_start() {
        assert_eq!(
            kinds("if if x"),
            vec![TokenKind::If, TokenKind::If, word("x"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_quoted_keyword_is_a_word() {
        assert_eq!(kinds("'if'"), vec![word("if"), TokenKind::Eof]);
    }

    #[test]
    fn test_redirection_operators() {
        assert_eq!(
            kinds("a < b > c >> d >| e >& f <& g <> h"),
            vec![
                word("a"),
                TokenKind::Redirect(RedirectOp::Input),
                word("b"),
                TokenKind::Redirect(RedirectOp::Output),
                word("c"),
                TokenKind::Redirect(RedirectOp::Append),
                word("d"),
                TokenKind::Redirect(RedirectOp::Clobber),
                word("e"),
                TokenKind::Redirect(RedirectOp::DupOutput),
                word("f"),
                TokenKind::Redirect(RedirectOp::DupInput),
                word("g"),
                TokenKind::Redirect(RedirectOp::ReadWrite),
                word("h"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_redirection_without_spaces() {
        assert_eq!(
            kinds("echo hi>out"),
            vec![
                word("echo"),
                word("hi"),
                TokenKind::Redirect(RedirectOp::Output),
                word("out"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_io_number() {
        assert_eq!(
            kinds("cmd 2> err 12 2x"),
            vec![
                word("cmd"),
                TokenKind::IoNumber("2".to_string()),
                TokenKind::Redirect(RedirectOp::Output),
                word("err"),
                word("12"),
                word("2x"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("echo a;\n  ls >f").unwrap();
        let positions: Vec<_> = tokens.iter().map(|t| (t.position.line, t.position.col)).collect();
        assert_eq!(
            positions,
            vec![(1, 1), (1, 6), (1, 7), (1, 8), (2, 3), (2, 6), (2, 7), (2, 8)]
        );
    }

    #[test]
    fn test_peek_then_next_returns_same_token() {
        let mut lexer = Lexer::new("echo hello");
        let peeked = lexer.peek_token().unwrap().clone();
        assert_eq!(peeked, lexer.peek_token().unwrap().clone());
        assert_eq!(lexer.next_token().unwrap(), peeked);
        assert_eq!(lexer.next_token().unwrap().kind, word("hello"));
    }

    #[test]
    fn test_newline_restores_command_start() {
        assert_eq!(
            kinds("echo x\nfi"),
            vec![word("echo"), word("x"), TokenKind::Newline, TokenKind::Fi, TokenKind::Eof]
        );
    }

    #[test]
    fn test_token_names_and_values() {
        assert_eq!(TokenKind::Redirect(RedirectOp::Clobber).name(), "REDIR_CLOBBER");
        assert_eq!(TokenKind::IoNumber("3".to_string()).value(), Some("3"));
        assert_eq!(TokenKind::Semi.value(), None);
    }
}
