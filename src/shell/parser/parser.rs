use super::ast::{ElifBranch, IfClause, Node, Redirection, SimpleCommand};
use super::error::{Position, SyntaxError, SyntaxErrorKind};
use super::lexer::{Lexer, RedirectOp, TokenKind};

/// Keywords that end a compound list besides end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Eof,
    Then,
    Branch,
    Fi,
}

impl Terminator {
    fn stops_at(self, kind: &TokenKind) -> bool {
        match self {
            Terminator::Eof => false,
            Terminator::Then => matches!(kind, TokenKind::Then),
            Terminator::Branch => {
                matches!(kind, TokenKind::Elif | TokenKind::Else | TokenKind::Fi)
            }
            Terminator::Fi => matches!(kind, TokenKind::Fi),
        }
    }
}

/// Outcome of parsing a buffer that may still grow by more lines.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseStep {
    Complete(Option<Node>),
    NeedMoreInput,
}

/// Recursive-descent parser over a single lookahead token.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// `if` clauses entered but not yet closed by `fi`.
    open_ifs: usize,
    /// The last empty command list ended at end of input.
    empty_at_eof: bool,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input),
            open_ifs: 0,
            empty_at_eof: false,
        }
    }

    /// Whether `err`, returned by this parser, only arose because the input
    /// stopped inside a quote or an open `if`.
    pub fn needs_more_input(&self, err: &SyntaxError) -> bool {
        match err.kind {
            SyntaxErrorKind::UnterminatedQuote
            | SyntaxErrorKind::ExpectedThen
            | SyntaxErrorKind::ExpectedFi => true,
            SyntaxErrorKind::ExpectedCommand => self.open_ifs > 0 && self.empty_at_eof,
            _ => false,
        }
    }

    /// Parses the whole input unit.
    ///
    /// Returns `Ok(None)` when the input holds nothing but blanks, comments
    /// and newlines. A `;` with no command is an error like any other empty
    /// list. Any syntax error aborts the parse.
    pub fn parse_input(&mut self) -> Result<Option<Node>, SyntaxError> {
        while self.lexer.peek_token()?.kind == TokenKind::Newline {
            self.lexer.next_token()?;
        }
        if self.lexer.peek_token()?.kind == TokenKind::Eof {
            return Ok(None);
        }

        let root = self.parse_compound_list(Terminator::Eof)?;
        self.skip_separators()?;

        let token = self.lexer.next_token()?;
        if token.kind != TokenKind::Eof {
            return Err(SyntaxError::new(
                SyntaxErrorKind::TrailingInput(token.kind.to_string()),
                token.position,
            ));
        }
        Ok(Some(root))
    }

    /// Consumes `;` and newlines; reports whether any were present.
    fn skip_separators(&mut self) -> Result<bool, SyntaxError> {
        let mut skipped = false;
        while matches!(
            self.lexer.peek_token()?.kind,
            TokenKind::Semi | TokenKind::Newline
        ) {
            self.lexer.next_token()?;
            skipped = true;
        }
        Ok(skipped)
    }

    fn parse_compound_list(&mut self, terminator: Terminator) -> Result<Node, SyntaxError> {
        self.skip_separators()?;

        let mut items = Vec::new();
        loop {
            let token = self.lexer.peek_token()?;
            if token.kind == TokenKind::Eof || terminator.stops_at(&token.kind) {
                break;
            }

            items.push(self.parse_command()?);

            if !self.skip_separators()? {
                let token = self.lexer.peek_token()?;
                if token.kind != TokenKind::Eof && !terminator.stops_at(&token.kind) {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::ExpectedSeparator(token.kind.to_string()),
                        token.position,
                    ));
                }
            }
        }

        if items.is_empty() {
            let token = self.lexer.peek_token()?;
            let position = token.position;
            self.empty_at_eof = token.kind == TokenKind::Eof;
            return Err(SyntaxError::new(SyntaxErrorKind::ExpectedCommand, position));
        }
        Ok(Node::List(items))
    }

    fn parse_command(&mut self) -> Result<Node, SyntaxError> {
        let token = self.lexer.next_token()?;
        match token.kind {
            TokenKind::If => self.parse_if(token.position),
            TokenKind::Word(name) => self.parse_simple_command(name),
            other => Err(SyntaxError::new(
                SyntaxErrorKind::UnexpectedToken(other.to_string()),
                token.position,
            )),
        }
    }

    fn parse_simple_command(&mut self, name: String) -> Result<Node, SyntaxError> {
        let mut command = SimpleCommand {
            argv: vec![name],
            redirections: Vec::new(),
        };

        loop {
            match self.lexer.peek_token()?.kind {
                TokenKind::Word(_) | TokenKind::IoNumber(_) | TokenKind::Redirect(_) => {}
                _ => break,
            }

            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::Word(word) => command.argv.push(word),
                TokenKind::IoNumber(digits) => {
                    // the lexer only emits an IO number right before an operator
                    let fd = parse_fd(&digits, token.position)?;
                    let next = self.lexer.next_token()?;
                    let TokenKind::Redirect(operator) = next.kind else {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::UnexpectedToken(next.kind.to_string()),
                            next.position,
                        ));
                    };
                    let redirection = self.parse_redirection(operator, fd)?;
                    command.redirections.push(redirection);
                }
                TokenKind::Redirect(operator) => {
                    let redirection = self.parse_redirection(operator, operator.default_fd())?;
                    command.redirections.push(redirection);
                }
                other => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnexpectedToken(other.to_string()),
                        token.position,
                    ))
                }
            }
        }

        Ok(Node::Simple(command))
    }


    fn parse_redirection(&mut self, operator: RedirectOp, fd: i32) -> Result<Redirection, SyntaxError> {
        let token = self.lexer.next_token()?;
        match token.kind {
            TokenKind::Word(target) => Ok(Redirection {
                operator,
                target,
                fd,
            }),
            other => Err(SyntaxError::new(
                SyntaxErrorKind::ExpectedWord(other.to_string()),
                token.position,
            )),
        }
    }

    fn parse_if(&mut self, if_position: Position) -> Result<Node, SyntaxError> {
        self.open_ifs += 1;
        let condition = self.parse_compound_list(Terminator::Then)?;
        self.expect_keyword(TokenKind::Then, SyntaxErrorKind::ExpectedThen, if_position)?;
        let then_branch = self.parse_compound_list(Terminator::Branch)?;

        let mut elif_branches = Vec::new();
        while self.lexer.peek_token()?.kind == TokenKind::Elif {
            self.lexer.next_token()?;
            let condition = self.parse_compound_list(Terminator::Then)?;
            self.expect_keyword(TokenKind::Then, SyntaxErrorKind::ExpectedThen, if_position)?;
            let body = self.parse_compound_list(Terminator::Branch)?;
            elif_branches.push(ElifBranch { condition, body });
        }

        let else_branch = if self.lexer.peek_token()?.kind == TokenKind::Else {
            self.lexer.next_token()?;
            Some(Box::new(self.parse_compound_list(Terminator::Fi)?))
        } else {
            None
        };

        self.expect_keyword(TokenKind::Fi, SyntaxErrorKind::ExpectedFi, if_position)?;
        self.open_ifs -= 1;

        Ok(Node::If(IfClause {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            elif_branches,
            else_branch,
        }))
    }

    fn expect_keyword(
        &mut self,
        keyword: TokenKind,
        missing: SyntaxErrorKind,
        if_position: Position,
    ) -> Result<(), SyntaxError> {
        let token = self.lexer.next_token()?;
        if token.kind != keyword {
            return Err(SyntaxError::new(missing, if_position));
        }
        Ok(())
    }
}

fn parse_fd(digits: &str, position: Position) -> Result<i32, SyntaxError> {
    digits.parse::<i32>().map_err(|_| {
        SyntaxError::new(
            SyntaxErrorKind::InvalidIoNumber(digits.to_string()),
            position,
        )
    })
}

/// Parses a complete input unit; see [`Parser::parse_input`].
pub fn parse(input: &str) -> Result<Option<Node>, SyntaxError> {
    Parser::new(input).parse_input()
}

/// Like [`parse`], but input that is only unfinished asks for more lines
/// instead of failing.
pub fn parse_incremental(input: &str) -> Result<ParseStep, SyntaxError> {
    let mut parser = Parser::new(input);
    match parser.parse_input() {
        Ok(tree) => Ok(ParseStep::Complete(tree)),
        Err(err) if parser.needs_more_input(&err) => Ok(ParseStep::NeedMoreInput),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Vec<Node> {
        match parse(input).unwrap() {
            Some(Node::List(items)) => items,
            other => panic!("Expected command list, got {:?}", other),
        }
    }

    fn parse_err(input: &str) -> SyntaxError {
        parse(input).unwrap_err()
    }

    fn simple(node: &Node) -> &SimpleCommand {
        match node {
            Node::Simple(command) => command,
            _ => panic!("Expected simple command, got {:?}", node),
        }
    }

    fn only_simple(node: &Node) -> &SimpleCommand {
        match node {
            Node::List(items) if items.len() == 1 => simple(&items[0]),
            _ => panic!("Expected single-command list, got {:?}", node),
        }
    }

    #[test]
    fn test_simple_command() {
        let items = parse_ok("ls -l");
        assert_eq!(items.len(), 1);
        let command = simple(&items[0]);
        assert_eq!(command.argv, vec!["ls", "-l"]);
        assert!(command.redirections.is_empty());
    }

    #[test]
    fn test_list_of_commands() {
        let items = parse_ok("echo a; echo b\n\necho c;");
        assert_eq!(items.len(), 3);
        assert_eq!(simple(&items[1]).argv, vec!["echo", "b"]);
        assert_eq!(simple(&items[2]).argv, vec!["echo", "c"]);
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("  # nothing\n\n  \n").unwrap(), None);
    }

    #[test]
    fn test_separators_without_command_are_an_error() {
        for input in [";", "; ;", "\n;\n", "# c\n;"] {
            let err = parse_err(input);
            assert_eq!(err.kind, SyntaxErrorKind::ExpectedCommand, "input {:?}", input);
        }
        let err = parse_err(";");
        assert_eq!(err.position, Position::new(1, 2));
    }

    #[test]
    fn test_leading_separators_before_a_command() {
        let items = parse_ok("\n; echo a");
        assert_eq!(simple(&items[0]).argv, vec!["echo", "a"]);
    }

    #[test]
    fn test_redirection_default_fds() {
        let items = parse_ok("cmd > out < in >> log <> rw >| c >& 2 <& -");
        let fds: Vec<_> = simple(&items[0])
            .redirections
            .iter()
            .map(|r| (r.operator, r.fd, r.target.as_str()))
            .collect();
        assert_eq!(
            fds,
            vec![
                (RedirectOp::Output, 1, "out"),
                (RedirectOp::Input, 0, "in"),
                (RedirectOp::Append, 1, "log"),
                (RedirectOp::ReadWrite, 0, "rw"),
                (RedirectOp::Clobber, 1, "c"),
                (RedirectOp::DupOutput, 1, "2"),
                (RedirectOp::DupInput, 0, "-"),
            ]
        );
    }

    #[test]
    fn test_io_number_overrides_fd() {
        let items = parse_ok("cmd arg 2> errfile 3< input");
        let command = simple(&items[0]);
        assert_eq!(command.argv, vec!["cmd", "arg"]);
        assert_eq!(command.redirections[0].fd, 2);
        assert_eq!(command.redirections[0].target, "errfile");
        assert_eq!(command.redirections[1].fd, 3);
        assert_eq!(command.redirections[1].operator, RedirectOp::Input);
    }

    #[test]
    fn test_words_after_redirection_are_arguments() {
        let items = parse_ok("echo a > f b");
        let command = simple(&items[0]);
        assert_eq!(command.argv, vec!["echo", "a", "b"]);
        assert_eq!(command.redirections.len(), 1);
    }

    #[test]
    fn test_if_then_else() {
        let items = parse_ok("if true; then echo yes; else echo no; fi");
        let Node::If(clause) = &items[0] else {
            panic!("Expected if clause");
        };
        assert_eq!(only_simple(&clause.condition).argv, vec!["true"]);
        assert_eq!(only_simple(&clause.then_branch).argv, vec!["echo", "yes"]);
        assert!(clause.elif_branches.is_empty());
        let else_branch = clause.else_branch.as_ref().unwrap();
        assert_eq!(only_simple(else_branch).argv, vec!["echo", "no"]);
    }

    #[test]
    fn test_elif_chain_over_lines() {
        let items = parse_ok("if false\nthen\n  echo a\nelif true\nthen echo b\nelif x; then y\nfi\n");
        let Node::If(clause) = &items[0] else {
            panic!("Expected if clause");
        };
        assert_eq!(clause.elif_branches.len(), 2);
        assert_eq!(only_simple(&clause.elif_branches[0].body).argv, vec!["echo", "b"]);
        assert!(clause.else_branch.is_none());
    }

    #[test]
    fn test_nested_if_closes_without_separator() {
        let items = parse_ok("if true; then if true; then echo in; fi fi; echo out");
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Node::If(_)));
    }

    #[test]
    fn test_missing_fi_reports_if_position() {
        let err = parse_err("echo x\n  if true; then echo x");
        assert_eq!(err.kind, SyntaxErrorKind::ExpectedFi);
        assert_eq!(err.position, Position::new(2, 3));
    }

    #[test]
    fn test_missing_then_reports_if_position() {
        let err = parse_err("if true; echo x");
        assert_eq!(err.kind, SyntaxErrorKind::ExpectedThen);
        assert_eq!(err.position, Position::new(1, 1));

        let err = parse_err("if a; then b; elif c");
        assert_eq!(err.kind, SyntaxErrorKind::ExpectedThen);
        assert_eq!(err.position, Position::new(1, 1));
    }

    #[test]
    fn test_branch_keyword_in_condition_is_unexpected() {
        let err = parse_err("if true; else echo x; fi");
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken("'else'".to_string()));
        assert_eq!(err.position, Position::new(1, 10));

        let err = parse_err("if true; fi");
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken("'fi'".to_string()));
        assert_eq!(err.position, Position::new(1, 10));
    }

    #[test]
    fn test_empty_branch_is_an_error() {
        let err = parse_err("if true; then fi");
        assert_eq!(err.kind, SyntaxErrorKind::ExpectedCommand);
        assert_eq!(err.position, Position::new(1, 15));
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse_err("then echo");
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken("'then'".to_string()));

        let err = parse_err("> out echo");
        assert_eq!(err.kind, SyntaxErrorKind::UnexpectedToken("'>'".to_string()));
    }

    #[test]
    fn test_redirection_needs_a_word() {
        let err = parse_err("echo >");
        assert_eq!(err.kind, SyntaxErrorKind::ExpectedWord("end of input".to_string()));
        assert_eq!(err.position, Position::new(1, 7));

        let err = parse_err("echo > ; ls");
        assert_eq!(err.kind, SyntaxErrorKind::ExpectedWord("';'".to_string()));
    }

    #[test]
    fn test_command_after_fi_needs_separator() {
        let err = parse_err("if true; then true; fi echo");
        assert_eq!(err.kind, SyntaxErrorKind::ExpectedSeparator("'echo'".to_string()));
    }

    #[test]
    fn test_huge_io_number_is_rejected() {
        let err = parse_err("cmd 99999999999> f");
        assert_eq!(
            err.kind,
            SyntaxErrorKind::InvalidIoNumber("99999999999".to_string())
        );
    }

    #[test]
    fn test_lex_error_surfaces_from_parser() {
        let err = parse_err("echo 'open");
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedQuote);
        assert_eq!(err.position, Position::new(1, 6));
    }

    #[test]
    fn test_unfinished_input_needs_more() {
        for input in ["if true", "if true; then", "if true\nthen echo a\n", "echo 'a", "if a; then b; else"] {
            assert_eq!(
                parse_incremental(input).unwrap(),
                ParseStep::NeedMoreInput,
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_incremental_reports_real_errors() {
        assert_eq!(parse_incremental(";").unwrap_err().kind, SyntaxErrorKind::ExpectedCommand);
        assert_eq!(
            parse_incremental("if ; then").unwrap_err().kind,
            SyntaxErrorKind::ExpectedCommand
        );
        assert!(parse_incremental("echo >").is_err());
        assert!(parse_incremental("if true; then true; fi; fi").is_err());
    }

    #[test]
    fn test_incremental_completes_closed_input() {
        let step = parse_incremental("if true\nthen echo a\nfi\n").unwrap();
        assert!(matches!(step, ParseStep::Complete(Some(Node::List(_)))));
        assert_eq!(parse_incremental("\n").unwrap(), ParseStep::Complete(None));
    }

    #[test]
    fn test_display_reparses_to_same_tree() {
        let source = "if false; then echo a > out; elif true; then echo 'x y' 2>& 1; else false; fi; echo '' >> log";
        let tree = parse(source).unwrap().unwrap();
        let reparsed = parse(&tree.to_string()).unwrap().unwrap();
        assert_eq!(tree, reparsed);
    }
}
