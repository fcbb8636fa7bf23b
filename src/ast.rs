//! The AST node model: tagged Rust enums, not a visitor-pattern class
//! hierarchy. Every node that dispatches on its own shape does so with a
//! `match`, at the call site, rather than through a virtual `accept`.

use crate::token::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Function(FunDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: Token,
    pub params: Vec<Param>,
    /// Either a `dtype` token or the `nil` keyword token.
    pub return_type: Token,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Token,
    pub dtype: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: Token,
    pub fields: Vec<VarDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VarDecl),
    Assign(Assign),
    Return(Expr),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Call(CallExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Token,
    pub dtype: Option<Token>,
    pub init: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Vec<Token>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_branch: Vec<Stmt>,
    pub elseif_branches: Vec<(Expr, Vec<Stmt>)>,
    pub else_branch: Option<Vec<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub var: Token,
    pub from: Expr,
    pub to: Expr,
    pub body: Vec<Stmt>,
}

/// The right-leaning expression spine: a negation flag, one term, and an
/// optional `(operator, rest)` tail. Deliberately not a precedence-climbing
/// grammar — see the design notes on why this stays flat and right-leaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub negated: bool,
    pub first: Term,
    pub op: Option<Token>,
    pub rest: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Simple(Box<RValue>),
    Complex(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    Literal(Token),
    New(Token),
    Path(Vec<Token>),
    Call(CallExpr),
    Negated(Box<Expr>),
    PointerType(Token),
    PointerValue(Token),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Token,
    pub args: Vec<Expr>,
}
