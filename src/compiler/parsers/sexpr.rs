//! S-expression reader
//!
//! Builds the [`AstNode`] tree out of the token stream. The driver wraps the
//! whole program in `[scope ...]` before parsing, so a compilation unit is
//! always exactly one expression.

use crate::ast_log;
use crate::compiler::compiler_messages::compiler_errors::CompileError;
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::compiler::parsers::tokenizer::{tokenize, Bracket, TokenKind};
use crate::return_syntax_error;

pub fn parse(source_code: &str) -> Result<AstNode, CompileError> {
    let tokens = tokenize(source_code)?;
    let mut reader = Reader { tokens, position: 0 };

    let ast = reader.read_expression()?;

    if reader.peek() != &TokenKind::Eof {
        return_syntax_error!(
            "Expected end of input after the top-level expression, found {:?}",
            reader.peek()
        );
    }

    ast_log!("{ast}");

    Ok(ast)
}

struct Reader {
    tokens: Vec<TokenKind>,
    position: usize,
}

impl Reader {
    fn peek(&self) -> &TokenKind {
        static EOF: TokenKind = TokenKind::Eof;
        self.tokens.get(self.position).unwrap_or(&EOF)
    }

    fn advance(&mut self) -> TokenKind {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .unwrap_or(TokenKind::Eof);
        self.position += 1;
        token
    }

    fn read_expression(&mut self) -> Result<AstNode, CompileError> {
        match self.advance() {
            TokenKind::Number(n) => Ok(AstNode::Number(n)),
            TokenKind::Fractional(x) => Ok(AstNode::Fractional(x)),
            TokenKind::Symbol(s) => Ok(AstNode::Symbol(s)),
            TokenKind::StringLiteral(s) => Ok(AstNode::Str(s)),
            TokenKind::Open(bracket) => self.read_list(bracket),
            TokenKind::Close(bracket) => {
                return_syntax_error!("Unexpected '{}'", bracket.close_char())
            }
            TokenKind::Eof => return_syntax_error!("Unexpected end of input"),
        }
    }

    fn read_list(&mut self, open: Bracket) -> Result<AstNode, CompileError> {
        let mut items = Vec::new();

        loop {
            match self.peek() {
                TokenKind::Close(close) => {
                    let close = *close;
                    if close != open {
                        return_syntax_error!(
                            "Mismatched brackets: '{}' closed with '{}'",
                            open.open_char(),
                            close.close_char()
                        );
                    }
                    self.advance();
                    return Ok(AstNode::List(items));
                }
                TokenKind::Eof => {
                    return_syntax_error!("Unclosed '{}'", open.open_char())
                }
                _ => items.push(self.read_expression()?),
            }
        }
    }
}
