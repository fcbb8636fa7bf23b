//! Predictive recursive-descent parser, one token of lookahead.
//!
//! The expression grammar is deliberately right-leaning and precedence-free:
//! `expr := 'not'? ('(' expr ')' | rvalue) (op expr)?`. Parenthesization in
//! source text is the only way to force grouping; this parser does not
//! climb precedence levels. See the module doc on `Expr` for why.

use crate::ast::*;
use crate::error::MplError;
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, MplError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream always has an EOS sentinel"))
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(MplError::syntax(
                format!("expected {kind:?}, found '{}'", found.lexeme),
                found.line,
                found.column,
            ))
        }
    }

    fn syntax_error(&self, message: impl Into<String>) -> MplError {
        let at = self.peek();
        MplError::syntax(message, at.line, at.column)
    }

    pub fn parse_program(mut self) -> PResult<Program> {
        let mut decls = vec![];
        while !self.check(TokenKind::Eos) {
            decls.push(self.parse_decl()?);
        }
        Ok(Program { decls })
    }

    fn parse_decl(&mut self) -> PResult<Decl> {
        match self.peek().kind {
            TokenKind::Type => Ok(Decl::Type(self.parse_type_decl()?)),
            TokenKind::Fun => Ok(Decl::Function(self.parse_fun_decl()?)),
            _ => Err(self.syntax_error(format!(
                "expected a top-level 'type' or 'fun' declaration, found '{}'",
                self.peek().lexeme
            ))),
        }
    }

    fn parse_type_decl(&mut self) -> PResult<TypeDecl> {
        self.expect(TokenKind::Type)?;
        let name = self.expect(TokenKind::Id)?;
        let mut fields = vec![];
        while !self.check(TokenKind::End) {
            fields.push(self.parse_var_decl()?);
        }
        self.expect(TokenKind::End)?;
        Ok(TypeDecl { name, fields })
    }

    fn parse_fun_decl(&mut self) -> PResult<FunDecl> {
        self.expect(TokenKind::Fun)?;

        let return_type = if self.check(TokenKind::Nil) {
            self.advance()
        } else {
            self.parse_dtype()?
        };

        let name = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::LParen)?;
        let mut params = vec![];
        if !self.check(TokenKind::RParen) {
            params.push(self.parse_param()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                params.push(self.parse_param()?);
            }
        }
        self.expect(TokenKind::RParen)?;

        let mut body = vec![];
        while !self.check(TokenKind::End) {
            body.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::End)?;

        Ok(FunDecl {
            name,
            params,
            return_type,
            body,
        })
    }

    fn parse_param(&mut self) -> PResult<Param> {
        let name = self.parse_binding_name()?;
        self.expect(TokenKind::Colon)?;
        let dtype = self.parse_dtype()?;
        Ok(Param { name, dtype })
    }

    /// A declared binding name: either a plain identifier or a pointer-type
    /// token naming an alias binding.
    fn parse_binding_name(&mut self) -> PResult<Token> {
        if self.check(TokenKind::PointerType) {
            Ok(self.advance())
        } else {
            self.expect(TokenKind::Id)
        }
    }

    /// `dtype := 'int'|'double'|'bool'|'char'|'string'|ID`, additionally
    /// accepting a pointer-type token as an alias-qualified type name (the
    /// source form `~int` used by `var p: ~int = &x`).
    fn parse_dtype(&mut self) -> PResult<Token> {
        if self.check(TokenKind::PointerType) {
            return Ok(self.advance());
        }
        if self.peek().kind.is_dtype_start() {
            return Ok(self.advance());
        }
        Err(self.syntax_error(format!("expected a type name, found '{}'", self.peek().lexeme)))
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.peek().kind {
            TokenKind::Var => Ok(Stmt::VarDecl(self.parse_var_decl()?)),
            TokenKind::If => Ok(Stmt::If(self.parse_if_stmt()?)),
            TokenKind::While => Ok(Stmt::While(self.parse_while_stmt()?)),
            TokenKind::For => Ok(Stmt::For(self.parse_for_stmt()?)),
            TokenKind::Return => {
                self.advance();
                Ok(Stmt::Return(self.parse_expr()?))
            }
            TokenKind::Id if self.peek_next_is(TokenKind::LParen) => {
                Ok(Stmt::Call(self.parse_call_expr()?))
            }
            TokenKind::Id | TokenKind::PointerType => Ok(Stmt::Assign(self.parse_assign_stmt()?)),
            _ => Err(self.syntax_error(format!("unexpected token '{}' in statement position", self.peek().lexeme))),
        }
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind == kind)
            .unwrap_or(false)
    }

    fn parse_var_decl(&mut self) -> PResult<VarDecl> {
        self.expect(TokenKind::Var)?;
        let name = self.parse_binding_name()?;
        let dtype = if self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_dtype()?)
        } else {
            None
        };
        self.expect(TokenKind::Assign)?;
        let init = self.parse_expr()?;
        Ok(VarDecl { name, dtype, init })
    }

    fn parse_lvalue(&mut self) -> PResult<Vec<Token>> {
        let mut path = vec![self.parse_binding_name()?];
        while self.check(TokenKind::Dot) {
            self.advance();
            path.push(self.expect(TokenKind::Id)?);
        }
        Ok(path)
    }

    fn parse_assign_stmt(&mut self) -> PResult<Assign> {
        let target = self.parse_lvalue()?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        Ok(Assign { target, value })
    }

    fn parse_if_stmt(&mut self) -> PResult<IfStmt> {
        self.expect(TokenKind::If)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let then_branch = self.parse_stmts_until(&[TokenKind::ElseIf, TokenKind::Else, TokenKind::End])?;

        let mut elseif_branches = vec![];
        while self.check(TokenKind::ElseIf) {
            self.advance();
            let cond = self.parse_expr()?;
            self.expect(TokenKind::Then)?;
            let body = self.parse_stmts_until(&[TokenKind::ElseIf, TokenKind::Else, TokenKind::End])?;
            elseif_branches.push((cond, body));
        }

        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            Some(self.parse_stmts_until(&[TokenKind::End])?)
        } else {
            None
        };

        self.expect(TokenKind::End)?;

        Ok(IfStmt {
            cond,
            then_branch,
            elseif_branches,
            else_branch,
        })
    }

    fn parse_stmts_until(&mut self, stops: &[TokenKind]) -> PResult<Vec<Stmt>> {
        let mut stmts = vec![];
        while !stops.contains(&self.peek().kind) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_while_stmt(&mut self) -> PResult<WhileStmt> {
        self.expect(TokenKind::While)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let body = self.parse_stmts_until(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        Ok(WhileStmt { cond, body })
    }

    fn parse_for_stmt(&mut self) -> PResult<ForStmt> {
        self.expect(TokenKind::For)?;
        let var = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::Assign)?;
        let from = self.parse_expr()?;
        self.expect(TokenKind::To)?;
        let to = self.parse_expr()?;
        self.expect(TokenKind::Do)?;
        let body = self.parse_stmts_until(&[TokenKind::End])?;
        self.expect(TokenKind::End)?;
        Ok(ForStmt { var, from, to, body })
    }

    fn parse_expr(&mut self) -> PResult<Expr> {
        let negated = if self.check(TokenKind::Not) {
            self.advance();
            true
        } else {
            false
        };

        let first = if self.check(TokenKind::LParen) {
            self.advance();
            let inner = self.parse_expr()?;
            self.expect(TokenKind::RParen)?;
            Term::Complex(Box::new(inner))
        } else {
            Term::Simple(Box::new(self.parse_rvalue()?))
        };

        let op = if self.peek().kind.is_operator() {
            Some(self.advance())
        } else {
            None
        };

        let rest = if op.is_some() {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        Ok(Expr {
            negated,
            first,
            op,
            rest,
        })
    }

    fn parse_rvalue(&mut self) -> PResult<RValue> {
        match self.peek().kind {
            TokenKind::Nil => Ok(RValue::Literal(self.advance())),
            TokenKind::New => {
                self.advance();
                Ok(RValue::New(self.expect(TokenKind::Id)?))
            }
            TokenKind::Neg => {
                self.advance();
                Ok(RValue::Negated(Box::new(self.parse_expr()?)))
            }
            TokenKind::PointerType => Ok(RValue::PointerType(self.advance())),
            TokenKind::PointerVal => Ok(RValue::PointerValue(self.advance())),
            TokenKind::IntVal
            | TokenKind::DoubleVal
            | TokenKind::BoolVal
            | TokenKind::CharVal
            | TokenKind::StringVal => Ok(RValue::Literal(self.advance())),
            TokenKind::Id => {
                if self.peek_next_is(TokenKind::LParen) {
                    Ok(RValue::Call(self.parse_call_expr()?))
                } else {
                    let mut path = vec![self.advance()];
                    while self.check(TokenKind::Dot) {
                        self.advance();
                        path.push(self.expect(TokenKind::Id)?);
                    }
                    Ok(RValue::Path(path))
                }
            }
            _ => Err(self.syntax_error(format!("unexpected token '{}' in expression", self.peek().lexeme))),
        }
    }

    fn parse_call_expr(&mut self) -> PResult<CallExpr> {
        let callee = self.expect(TokenKind::Id)?;
        self.expect(TokenKind::LParen)?;
        let mut args = vec![];
        if !self.check(TokenKind::RParen) {
            args.push(self.parse_expr()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(CallExpr { callee, args })
    }
}

/// Parse a complete token stream (including the trailing `Eos`) into a
/// [`Program`].
pub fn parse(tokens: Vec<Token>) -> PResult<Program> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_src(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().unwrap();
        parse(tokens).unwrap()
    }

    #[test]
    fn parses_minimal_main() {
        let program = parse_src("fun int main() return 0 end");
        assert_eq!(program.decls.len(), 1);
        match &program.decls[0] {
            Decl::Function(f) => {
                assert_eq!(f.name.lexeme, "main");
                assert_eq!(f.body.len(), 1);
            }
            _ => panic!("expected a function declaration"),
        }
    }

    #[test]
    fn parses_type_declaration_with_fields() {
        let program = parse_src("type P var v: int = 0 end");
        match &program.decls[0] {
            Decl::Type(t) => {
                assert_eq!(t.name.lexeme, "P");
                assert_eq!(t.fields.len(), 1);
                assert_eq!(t.fields[0].name.lexeme, "v");
            }
            _ => panic!("expected a type declaration"),
        }
    }

    #[test]
    fn parses_for_loop_and_call() {
        let program = parse_src(
            "fun int main() var x = 0 for i = 1 to 5 do x = x + i end print(itos(x)) return 0 end",
        );
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected a function declaration")
        };
        assert!(matches!(f.body[1], Stmt::For(_)));
        assert!(matches!(f.body[2], Stmt::Call(_)));
    }

    #[test]
    fn parses_pointer_var_decl() {
        let program = parse_src("fun int main() var x: int = 3 var p: ~int = &x return 0 end");
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected a function declaration")
        };
        let Stmt::VarDecl(decl) = &f.body[1] else {
            panic!("expected a var declaration")
        };
        assert_eq!(decl.dtype.as_ref().unwrap().kind, TokenKind::PointerType);
    }

    #[test]
    fn parses_right_leaning_chain() {
        let program = parse_src("fun int main() return 1 + 2 + 3 end");
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected a function declaration")
        };
        let Stmt::Return(expr) = &f.body[0] else {
            panic!("expected a return statement")
        };
        assert!(expr.rest.is_some());
        assert!(expr.rest.as_ref().unwrap().rest.is_some());
    }

    #[test]
    fn rejects_malformed_program() {
        let tokens = Lexer::new("fun int main(").tokenize().unwrap();
        assert!(parse(tokens).is_err());
    }
}
