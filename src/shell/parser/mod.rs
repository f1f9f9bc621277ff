pub mod ast;
pub mod error;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;

pub use ast::Node;
pub use error::{Position, SyntaxError, SyntaxErrorKind};
pub use lexer::{tokenize, Lexer, RedirectOp, Token, TokenKind};
pub use parser::{parse, parse_incremental, ParseStep, Parser};
