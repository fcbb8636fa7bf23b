//! Static semantic analysis: scope resolution, arity checks, and the type
//! rules for every expression and statement shape.
//!
//! A single mutable "current inferred type" register is threaded through
//! expression visits, mirroring the interpreter's current-value register.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::*;
use crate::error::MplError;
use crate::symbol_table::SymbolTable;
use crate::token::{Token, TokenKind};

const NIL: &str = "nil";
const INT: &str = "int";
const DOUBLE: &str = "double";
const BOOL: &str = "bool";
const CHAR: &str = "char";
const STRING: &str = "string";

static BUILTINS: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        ("print", vec![STRING, NIL]),
        ("stoi", vec![STRING, INT]),
        ("stod", vec![STRING, DOUBLE]),
        ("itos", vec![INT, STRING]),
        ("dtos", vec![DOUBLE, STRING]),
        ("get", vec![INT, STRING, CHAR]),
        ("length", vec![STRING, INT]),
        ("read", vec![STRING]),
    ])
});

pub struct TypeChecker {
    table: SymbolTable,
    /// Declared function signatures: parameter types followed by the return
    /// type, keyed by function name. Mirrors what's installed into the
    /// symbol table, kept here too for call-site arity checks.
    functions: HashMap<String, Vec<String>>,
    /// Declared record types: field name → field type name.
    types: HashMap<String, HashMap<String, String>>,
    /// The field declaration order for each record type, so the interpreter
    /// (via `check`'s caller) can hand it to `new T` initialization.
    current: String,
}

type CResult<T> = Result<T, MplError>;

impl TypeChecker {
    pub fn new() -> Self {
        let mut table = SymbolTable::new();
        for (name, sig) in BUILTINS.iter() {
            table.set_signature(*name, sig.iter().map(|s| s.to_string()).collect());
        }
        Self {
            table,
            functions: BUILTINS
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
            types: HashMap::new(),
            current: NIL.to_string(),
        }
    }

    pub fn check(&mut self, program: &Program) -> CResult<()> {
        self.declare_types(program)?;
        self.declare_functions(program)?;

        for decl in &program.decls {
            match decl {
                Decl::Type(t) => self.check_type_decl(t)?,
                Decl::Function(f) => self.check_fun_decl(f)?,
            }
        }

        self.check_main_exists()?;
        Ok(())
    }

    fn declare_types(&mut self, program: &Program) -> CResult<()> {
        for decl in &program.decls {
            if let Decl::Type(t) = decl {
                if self.table.exists_in_current(&t.name.lexeme) {
                    return Err(self.error_at(&t.name, format!("type '{}' is already declared", t.name.lexeme)));
                }
                self.table.set_record(&t.name.lexeme, HashMap::new());
                self.types.insert(t.name.lexeme.clone(), HashMap::new());
            }
        }
        Ok(())
    }

    fn declare_functions(&mut self, program: &Program) -> CResult<()> {
        for decl in &program.decls {
            if let Decl::Function(f) = decl {
                if self.table.exists_in_current(&f.name.lexeme) {
                    return Err(self.error_at(&f.name, format!("function '{}' is already declared", f.name.lexeme)));
                }

                let mut seen = std::collections::HashSet::new();
                for p in &f.params {
                    if !seen.insert(p.name.lexeme.clone()) {
                        return Err(self.error_at(&p.name, format!("duplicate parameter name '{}'", p.name.lexeme)));
                    }
                }

                let mut signature: Vec<String> = f.params.iter().map(|p| self.dtype_name(&p.dtype)).collect();
                signature.push(self.dtype_name(&f.return_type));

                self.table.set_signature(&f.name.lexeme, signature.clone());
                self.functions.insert(f.name.lexeme.clone(), signature);
            }
        }
        Ok(())
    }

    fn check_main_exists(&self) -> CResult<()> {
        match self.functions.get("main") {
            Some(sig) if sig.last().map(String::as_str) == Some(INT) => Ok(()),
            Some(_) => Err(MplError::semantic_global("function 'main' must return 'int'")),
            None => Err(MplError::semantic_global("program has no 'main' function")),
        }
    }

    fn dtype_name(&self, token: &Token) -> String {
        match token.kind {
            TokenKind::PointerType => token.lexeme.trim_start_matches('~').to_string(),
            _ => token.lexeme.clone(),
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> MplError {
        MplError::semantic(message, token.line, token.column)
    }

    fn check_type_decl(&mut self, decl: &TypeDecl) -> CResult<()> {
        self.table.push_scope();
        let mut fields = HashMap::new();
        let mut seen = std::collections::HashSet::new();
        for field in &decl.fields {
            if !seen.insert(field.name.lexeme.clone()) {
                self.table.pop_scope();
                return Err(self.error_at(&field.name, format!("duplicate field '{}'", field.name.lexeme)));
            }
            let field_type = self.check_var_decl(field)?;
            fields.insert(field.name.lexeme.clone(), field_type);
        }
        self.table.pop_scope();

        self.table.set_record(&decl.name.lexeme, fields.clone());
        self.types.insert(decl.name.lexeme.clone(), fields);
        Ok(())
    }

    fn check_fun_decl(&mut self, decl: &FunDecl) -> CResult<()> {
        let return_type = self.dtype_name(&decl.return_type);
        self.table.push_scope();
        for param in &decl.params {
            self.table.set_scalar(&param.name.lexeme, self.dtype_name(&param.dtype));
        }
        for stmt in &decl.body {
            self.check_stmt(stmt, &return_type)?;
        }
        self.table.pop_scope();
        Ok(())
    }

    fn check_var_decl(&mut self, decl: &VarDecl) -> CResult<String> {
        if self.table.exists_in_current(&decl.name.lexeme) {
            return Err(self.error_at(&decl.name, format!("'{}' is already declared in this scope", decl.name.lexeme)));
        }

        self.check_expr(&decl.init)?;
        let init_type = self.current.clone();

        let declared = match &decl.dtype {
            Some(dtype) => {
                let declared = self.dtype_name(dtype);
                if init_type != declared && init_type != NIL {
                    return Err(self.error_at(
                        &decl.name,
                        format!("cannot initialize '{}' of type '{declared}' with '{init_type}'", decl.name.lexeme),
                    ));
                }
                declared
            }
            None => init_type,
        };

        self.table.set_scalar(&decl.name.lexeme, &declared);
        Ok(declared)
    }

    fn check_stmt(&mut self, stmt: &Stmt, return_type: &str) -> CResult<()> {
        match stmt {
            Stmt::VarDecl(decl) => {
                self.check_var_decl(decl)?;
                Ok(())
            }
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::Return(expr) => {
                self.check_expr(expr)?;
                if self.current != return_type && self.current != NIL {
                    return Err(MplError::semantic_global(format!(
                        "return type '{}' does not match declared return type '{return_type}'",
                        self.current
                    )));
                }
                Ok(())
            }
            Stmt::If(stmt) => self.check_if(stmt, return_type),
            Stmt::While(stmt) => self.check_while(stmt, return_type),
            Stmt::For(stmt) => self.check_for(stmt, return_type),
            Stmt::Call(call) => self.check_call(call).map(|_| ()),
        }
    }

    fn check_assign(&mut self, assign: &Assign) -> CResult<()> {
        let leading = &assign.target[0];
        let leading_name = self.dtype_name(leading);
        let Some(mut current_type) = self.table.get_scalar(&leading_name).map(str::to_string) else {
            return Err(self.error_at(leading, format!("'{leading_name}' is not declared")));
        };

        for field in &assign.target[1..] {
            let fields = self.table.get_record(&current_type).cloned().ok_or_else(|| {
                self.error_at(field, format!("'{current_type}' is not a record type"))
            })?;
            current_type = fields
                .get(&field.lexeme)
                .cloned()
                .ok_or_else(|| self.error_at(field, format!("unknown field '{}'", field.lexeme)))?;
        }

        self.check_expr(&assign.value)?;
        if self.current != current_type && self.current != NIL {
            return Err(MplError::semantic_global(format!(
                "cannot assign '{}' to '{current_type}'",
                self.current
            )));
        }
        Ok(())
    }

    fn check_if(&mut self, stmt: &IfStmt, return_type: &str) -> CResult<()> {
        self.check_condition(&stmt.cond)?;
        for s in &stmt.then_branch {
            self.check_stmt(s, return_type)?;
        }
        for (cond, body) in &stmt.elseif_branches {
            self.check_condition(cond)?;
            for s in body {
                self.check_stmt(s, return_type)?;
            }
        }
        if let Some(branch) = &stmt.else_branch {
            for s in branch {
                self.check_stmt(s, return_type)?;
            }
        }
        Ok(())
    }

    fn check_while(&mut self, stmt: &WhileStmt, return_type: &str) -> CResult<()> {
        self.check_condition(&stmt.cond)?;
        for s in &stmt.body {
            self.check_stmt(s, return_type)?;
        }
        Ok(())
    }

    fn check_for(&mut self, stmt: &ForStmt, return_type: &str) -> CResult<()> {
        self.check_expr(&stmt.from)?;
        let from_type = self.current.clone();
        self.check_expr(&stmt.to)?;
        let to_type = self.current.clone();
        if from_type != to_type {
            return Err(self.error_at(&stmt.var, "'for' start and end expressions must share a type"));
        }
        if from_type != INT {
            return Err(self.error_at(&stmt.var, "'for' bounds must be 'int'"));
        }

        self.table.push_scope();
        self.table.set_scalar(&stmt.var.lexeme, &from_type);
        for s in &stmt.body {
            self.check_stmt(s, return_type)?;
        }
        self.table.pop_scope();
        Ok(())
    }

    fn check_condition(&mut self, expr: &Expr) -> CResult<()> {
        self.check_expr(expr)?;
        if self.current != BOOL {
            return Err(MplError::semantic_global(format!(
                "condition must be 'bool', found '{}'",
                self.current
            )));
        }
        Ok(())
    }

    fn check_expr(&mut self, expr: &Expr) -> CResult<()> {
        match &expr.first {
            Term::Simple(rvalue) => self.check_rvalue(rvalue)?,
            Term::Complex(inner) => self.check_expr(inner)?,
        }

        if expr.negated {
            if self.current != BOOL {
                return Err(MplError::semantic_global(format!(
                    "'not' requires 'bool', found '{}'",
                    self.current
                )));
            }
        }

        if let Some(op) = &expr.op {
            let left = self.current.clone();
            let rest = expr.rest.as_ref().expect("operator always has a rest expression");
            self.check_expr(rest)?;
            let right = self.current.clone();
            self.current = self.check_binary(op, &left, &right)?;
        }

        Ok(())
    }

    fn check_binary(&self, op: &Token, left: &str, right: &str) -> CResult<String> {
        use TokenKind::*;
        let result = match op.kind {
            Plus if left == STRING && right == STRING => STRING.to_string(),
            Plus if left == CHAR && right == CHAR => STRING.to_string(),
            Plus if (left == STRING && right == CHAR) || (left == CHAR && right == STRING) => STRING.to_string(),
            Plus | Minus | Multiply | Divide => {
                if left == INT && right == INT {
                    INT.to_string()
                } else if left == DOUBLE && right == DOUBLE {
                    DOUBLE.to_string()
                } else {
                    return Err(self.error_at(
                        op,
                        format!("cannot apply '{}' to '{left}' and '{right}'", op.lexeme),
                    ));
                }
            }
            Modulo if left == INT && right == INT => INT.to_string(),
            Modulo => {
                return Err(self.error_at(op, "'%' requires both operands to be 'int'"));
            }
            Equal | NotEqual => {
                if left == right || left == NIL || right == NIL {
                    BOOL.to_string()
                } else {
                    return Err(self.error_at(
                        op,
                        format!("cannot compare '{left}' and '{right}' for equality"),
                    ));
                }
            }
            Less | LessEqual | Greater | GreaterEqual => {
                let orderable = matches!(left, INT | DOUBLE | CHAR | STRING);
                if left == right && orderable {
                    BOOL.to_string()
                } else {
                    return Err(self.error_at(
                        op,
                        format!("cannot order '{left}' and '{right}' with '{}'", op.lexeme),
                    ));
                }
            }
            And | Or => {
                if left == BOOL && right == BOOL {
                    BOOL.to_string()
                } else {
                    return Err(self.error_at(op, "'and'/'or' require both operands to be 'bool'"));
                }
            }
            _ => return Err(self.error_at(op, format!("'{}' is not a valid binary operator", op.lexeme))),
        };
        Ok(result)
    }

    fn check_rvalue(&mut self, rvalue: &RValue) -> CResult<()> {
        match rvalue {
            RValue::Literal(token) => {
                self.current = match token.kind {
                    TokenKind::Nil => NIL.to_string(),
                    TokenKind::IntVal => INT.to_string(),
                    TokenKind::DoubleVal => DOUBLE.to_string(),
                    TokenKind::BoolVal => BOOL.to_string(),
                    TokenKind::CharVal => CHAR.to_string(),
                    TokenKind::StringVal => STRING.to_string(),
                    _ => unreachable!("parser only emits literal tokens as RValue::Literal"),
                };
                Ok(())
            }
            RValue::New(name) => {
                if !self.types.contains_key(&name.lexeme) {
                    return Err(self.error_at(name, format!("'{}' is not a declared record type", name.lexeme)));
                }
                self.current = name.lexeme.clone();
                Ok(())
            }
            RValue::Path(path) => self.check_path(path),
            RValue::Call(call) => {
                self.current = self.check_call(call)?;
                Ok(())
            }
            RValue::Negated(expr) => {
                self.check_expr(expr)?;
                if self.current != INT && self.current != DOUBLE {
                    return Err(MplError::semantic_global(format!(
                        "'neg' requires 'int' or 'double', found '{}'",
                        self.current
                    )));
                }
                Ok(())
            }
            RValue::PointerType(token) => {
                let name = token.lexeme.trim_start_matches('~');
                match self.table.get_scalar(name) {
                    Some(t) => {
                        self.current = t.to_string();
                        Ok(())
                    }
                    None => Err(self.error_at(token, format!("'{name}' is not declared"))),
                }
            }
            RValue::PointerValue(token) => {
                let name = token.lexeme.trim_start_matches('&');
                if !self.table.exists_in_current(name) && !self.table.exists(name) {
                    return Err(self.error_at(token, format!("'{name}' is not declared")));
                }
                self.current = self
                    .table
                    .get_scalar(name)
                    .map(str::to_string)
                    .ok_or_else(|| self.error_at(token, format!("'{name}' is not declared")))?;
                Ok(())
            }
        }
    }

    fn check_path(&mut self, path: &[Token]) -> CResult<()> {
        let leading = &path[0];
        let leading_name = self.dtype_name(leading);
        let Some(mut current_type) = self.table.get_scalar(&leading_name).map(str::to_string) else {
            return Err(self.error_at(leading, format!("'{leading_name}' is not declared")));
        };

        for field in &path[1..] {
            let fields = self
                .table
                .get_record(&current_type)
                .cloned()
                .ok_or_else(|| self.error_at(field, format!("'{current_type}' is not a record type")))?;
            current_type = fields
                .get(&field.lexeme)
                .cloned()
                .ok_or_else(|| self.error_at(field, format!("unknown field '{}'", field.lexeme)))?;
        }

        self.current = current_type;
        Ok(())
    }

    fn check_call(&mut self, call: &CallExpr) -> CResult<String> {
        let Some(signature) = self.functions.get(&call.callee.lexeme).cloned() else {
            return Err(self.error_at(&call.callee, format!("'{}' is not declared", call.callee.lexeme)));
        };

        let (param_types, return_type) = signature.split_at(signature.len() - 1);
        if call.args.len() != param_types.len() {
            return Err(self.error_at(
                &call.callee,
                format!(
                    "'{}' expects {} argument(s), found {}",
                    call.callee.lexeme,
                    param_types.len(),
                    call.args.len()
                ),
            ));
        }

        for (arg, expected) in call.args.iter().zip(param_types) {
            self.check_expr(arg)?;
            if self.current != *expected && self.current != NIL {
                return Err(self.error_at(
                    &call.callee,
                    format!("argument type '{}' does not match expected '{expected}'", self.current),
                ));
            }
        }

        Ok(return_type[0].clone())
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the type checker over a parsed program.
pub fn check(program: &Program) -> CResult<()> {
    TypeChecker::new().check(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::parse;

    fn check_src(src: &str) -> CResult<()> {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let program = parse(tokens).unwrap();
        check(&program)
    }

    #[test]
    fn accepts_minimal_main() {
        assert!(check_src("fun int main() return 0 end").is_ok());
    }

    #[test]
    fn rejects_missing_main() {
        assert!(check_src("fun int notmain() return 0 end").is_err());
    }

    #[test]
    fn rejects_wrong_main_return_type() {
        assert!(check_src("fun double main() return 0.0 end").is_err());
    }

    #[test]
    fn rejects_mixed_int_double_arithmetic() {
        assert!(check_src("fun int main() var x = 1 + 2.0 return 0 end").is_err());
    }

    #[test]
    fn accepts_string_char_concatenation() {
        assert!(check_src("fun int main() var x = \"a\" + 'b' return 0 end").is_ok());
    }

    #[test]
    fn rejects_non_bool_condition() {
        assert!(check_src("fun int main() if 1 then return 0 end return 1 end").is_err());
    }

    #[test]
    fn rejects_arity_mismatch() {
        assert!(check_src("fun int main() print() return 0 end").is_err());
    }

    #[test]
    fn accepts_record_type_and_field_access() {
        assert!(check_src(
            "type P var v: int = 0 end fun int main() var p = new P p.v = 7 return p.v end"
        )
        .is_ok());
    }

    #[test]
    fn rejects_duplicate_var_in_same_scope() {
        assert!(check_src("fun int main() var x = 1 var x = 2 return 0 end").is_err());
    }
}
