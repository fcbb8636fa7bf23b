//! Tree-walking evaluator.
//!
//! A stack of frames with stable per-frame ids, so the call protocol can
//! jump back to the global scope and later restore the caller's frame.
//! Threads a single current-value register through expression evaluation
//! rather than returning a value from every visit.

use std::collections::HashMap;

use unescape::unescape;

use crate::ast::*;
use crate::error::MplError;
use crate::heap::{Heap, ObjectId, Record};
use crate::token::TokenKind;
use crate::value::Value;

struct Frame {
    id: usize,
    bindings: HashMap<String, Value>,
}

/// The interpreter's runtime binding stack — distinct from
/// [`crate::symbol_table::SymbolTable`], which tracks *type* facts for the
/// checker. This one tracks actual values.
struct Environment {
    frames: Vec<Frame>,
    /// Frames hidden by a `restore` to an outer scope, keyed by the id of
    /// the frame that was on top when they were set aside. A later
    /// `restore` to that same id splices them back on, so jumping to the
    /// global scope for a call never destroys the caller's locals.
    suspended: HashMap<usize, Vec<Frame>>,
    next_id: usize,
}

impl Environment {
    fn new() -> Self {
        let mut env = Self {
            frames: vec![],
            suspended: HashMap::new(),
            next_id: 0,
        };
        env.push();
        env
    }

    fn push(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.frames.push(Frame {
            id,
            bindings: HashMap::new(),
        });
        id
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn current_id(&self) -> usize {
        self.frames.last().expect("environment always has a frame").id
    }

    /// Switch the active base to the scope with the given id. If frames sit
    /// above it, they are set aside under the id currently on top rather
    /// than discarded, so a later `restore` to that id brings them back.
    fn restore(&mut self, id: usize) {
        if let Some(suffix) = self.suspended.remove(&id) {
            self.frames.extend(suffix);
            return;
        }

        if let Some(pos) = self.frames.iter().position(|f| f.id == id) {
            if pos + 1 < self.frames.len() {
                let key = self.frames.last().expect("environment always has a frame").id;
                let suffix = self.frames.split_off(pos + 1);
                self.suspended.insert(key, suffix);
            }
        }
    }

    fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.frames
            .last_mut()
            .expect("environment always has a frame")
            .bindings
            .insert(name.into(), value);
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.bindings.get(name))
    }

    fn update(&mut self, name: &str, value: Value) -> bool {
        for frame in self.frames.iter_mut().rev() {
            if frame.bindings.contains_key(name) {
                frame.bindings.insert(name.to_string(), value);
                return true;
            }
        }
        false
    }
}

/// A non-local return signal, caught only at the enclosing call boundary.
enum Flow {
    Normal,
    Return,
}

/// An alias binding: the target name it mirrors, and the value captured at
/// bind/refresh time.
struct Alias {
    target: String,
    value: Value,
}

pub struct Interpreter<'a> {
    program: &'a Program,
    env: Environment,
    current: Value,
    heap: Heap,
    functions: HashMap<String, &'a FunDecl>,
    types: HashMap<String, &'a TypeDecl>,
    global_scope: usize,
    exit_code: i32,
    aliases: HashMap<String, Alias>,
    /// The most recently dereferenced `&name` target, consumed by the next
    /// variable declaration to complete an alias binding.
    last_dereferenced: Option<String>,
}

type IResult<T> = Result<T, MplError>;

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program) -> Self {
        let mut functions = HashMap::new();
        let mut types = HashMap::new();
        for decl in &program.decls {
            match decl {
                Decl::Function(f) => {
                    functions.insert(f.name.lexeme.clone(), f);
                }
                Decl::Type(t) => {
                    types.insert(t.name.lexeme.clone(), t);
                }
            }
        }

        let env = Environment::new();
        let global_scope = env.current_id();

        Self {
            program,
            env,
            current: Value::Nil,
            heap: Heap::new(),
            functions,
            types,
            global_scope,
            exit_code: 0,
            aliases: HashMap::new(),
            last_dereferenced: None,
        }
    }

    pub fn run(&mut self) -> IResult<i32> {
        let main = CallExpr {
            callee: crate::token::Token::new(TokenKind::Id, "main", 0, 0),
            args: vec![],
        };
        self.eval_call(&main)?;
        self.env.pop();
        self.exit_code = self.current.as_integer().unwrap_or(0) as i32;
        Ok(self.exit_code)
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> IResult<Flow> {
        for stmt in stmts {
            if let Flow::Return = self.exec_stmt(stmt)? {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::VarDecl(decl) => {
                self.exec_var_decl(decl)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign(assign) => {
                self.exec_assign(assign)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(expr) => {
                self.eval_expr(expr)?;
                Ok(Flow::Return)
            }
            Stmt::If(stmt) => self.exec_if(stmt),
            Stmt::While(stmt) => self.exec_while(stmt),
            Stmt::For(stmt) => self.exec_for(stmt),
            Stmt::Call(call) => {
                self.eval_call(call)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_var_decl(&mut self, decl: &VarDecl) -> IResult<()> {
        self.eval_expr(&decl.init)?;
        let value = self.current.clone();
        self.env.bind(&decl.name.lexeme, value.clone());

        let is_alias = decl
            .dtype
            .as_ref()
            .map(|t| t.kind == TokenKind::PointerType)
            .unwrap_or(false)
            || decl.name.kind == TokenKind::PointerType;

        if is_alias {
            if let Some(target) = self.last_dereferenced.take() {
                self.aliases.insert(
                    decl.name.lexeme.trim_start_matches('~').to_string(),
                    Alias { target, value },
                );
            }
        }

        Ok(())
    }

    fn exec_assign(&mut self, assign: &Assign) -> IResult<()> {
        self.eval_expr(&assign.value)?;
        let value = self.current.clone();

        let leading = assign.target[0].lexeme.trim_start_matches('~').to_string();

        if assign.target.len() == 1 {
            self.env.update(&leading, value.clone());
        } else {
            let Some(Value::Object(id)) = self.env.get(&leading).cloned() else {
                return Err(MplError::runtime_global(format!("'{leading}' is not a record reference")));
            };
            self.write_field_path(id, &assign.target[1..], value.clone())?;
        }

        for alias in self.aliases.values_mut() {
            if alias.target == leading {
                alias.value = value.clone();
            }
        }

        Ok(())
    }

    fn write_field_path(&mut self, id: ObjectId, path: &[crate::token::Token], value: Value) -> IResult<()> {
        if path.len() == 1 {
            self.heap.get_object_mut(id)?.set_field(&path[0].lexeme, value)?;
            return Ok(());
        }

        let next = self.heap.get_object(id)?.get_field(&path[0].lexeme)?.clone();
        let Value::Object(next_id) = next else {
            return Err(MplError::runtime_global(format!("'{}' is not a record reference", path[0].lexeme)));
        };
        self.write_field_path(next_id, &path[1..], value)
    }

    fn exec_if(&mut self, stmt: &IfStmt) -> IResult<Flow> {
        if self.eval_bool(&stmt.cond)? {
            return self.exec_block(&stmt.then_branch);
        }

        for (cond, body) in &stmt.elseif_branches {
            if self.eval_bool(cond)? {
                return self.exec_block(body);
            }
        }

        if let Some(branch) = &stmt.else_branch {
            return self.exec_block(branch);
        }

        Ok(Flow::Normal)
    }

    fn exec_while(&mut self, stmt: &WhileStmt) -> IResult<Flow> {
        while self.eval_bool(&stmt.cond)? {
            if let Flow::Return = self.exec_block(&stmt.body)? {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(&mut self, stmt: &ForStmt) -> IResult<Flow> {
        self.eval_expr(&stmt.from)?;
        let start = self.current.clone();
        self.eval_expr(&stmt.to)?;
        let end = self.current.clone();

        let (Value::Int(start), Value::Int(end)) = (start, end) else {
            return Err(MplError::runtime_global("'for' bounds must be integers"));
        };

        self.env.push();
        self.env.bind(&stmt.var.lexeme, Value::Int(start));

        let mut i = start;
        let mut flow = Flow::Normal;
        while i < end {
            if let Flow::Return = self.exec_block(&stmt.body)? {
                flow = Flow::Return;
                break;
            }
            i += 1;
            self.env.update(&stmt.var.lexeme, Value::Int(i));
        }

        self.env.pop();
        Ok(flow)
    }

    fn eval_bool(&mut self, expr: &Expr) -> IResult<bool> {
        self.eval_expr(expr)?;
        match &self.current {
            Value::Bool(b) => Ok(*b),
            other => Err(MplError::runtime_global(format!(
                "expected 'bool', found '{}'",
                other.type_name()
            ))),
        }
    }

    fn eval_expr(&mut self, expr: &Expr) -> IResult<()> {
        match &expr.first {
            Term::Simple(rvalue) => self.eval_rvalue(rvalue)?,
            Term::Complex(inner) => self.eval_expr(inner)?,
        }

        if expr.negated {
            let Value::Bool(b) = self.current else {
                return Err(MplError::runtime_global("'not' requires a 'bool' operand"));
            };
            self.current = Value::Bool(!b);
        }

        if let Some(op) = &expr.op {
            let left = self.current.clone();
            let rest = expr.rest.as_ref().expect("operator always has a rest expression");
            self.eval_expr(rest)?;
            let right = self.current.clone();
            self.current = self.apply_binary(op.kind, left, right)?;
        }

        Ok(())
    }

    fn apply_binary(&self, op: TokenKind, left: Value, right: Value) -> IResult<Value> {
        use TokenKind::*;
        match op {
            Plus => self.apply_plus(left, right),
            Minus => self.apply_arith(left, right, |a, b| a - b, |a, b| a - b),
            Multiply => self.apply_arith(left, right, |a, b| a * b, |a, b| a * b),
            Divide => match (left, right) {
                (Value::Int(_), Value::Int(0)) => Err(MplError::runtime_global("division by zero")),
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
                (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a / b)),
                _ => Err(MplError::runtime_global("'/' requires matching numeric operands")),
            },
            Modulo => match (left, right) {
                (Value::Int(_), Value::Int(0)) => Err(MplError::runtime_global("modulo by zero")),
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a % b)),
                _ => Err(MplError::runtime_global("'%' requires 'int' operands")),
            },
            Equal => Ok(Value::Bool(self.values_equal(&left, &right))),
            NotEqual => Ok(Value::Bool(!self.values_equal(&left, &right))),
            Less => self.compare(left, right, |o| o == std::cmp::Ordering::Less),
            LessEqual => self.compare(left, right, |o| o != std::cmp::Ordering::Greater),
            Greater => self.compare(left, right, |o| o == std::cmp::Ordering::Greater),
            GreaterEqual => self.compare(left, right, |o| o != std::cmp::Ordering::Less),
            And => match (left, right) {
                (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
                _ => Err(MplError::runtime_global("'and' requires 'bool' operands")),
            },
            Or => match (left, right) {
                (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a || b)),
                _ => Err(MplError::runtime_global("'or' requires 'bool' operands")),
            },
            _ => Err(MplError::runtime_global("unsupported binary operator")),
        }
    }

    fn apply_plus(&self, left: Value, right: Value) -> IResult<Value> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            (Value::Double(a), Value::Double(b)) => Ok(Value::Double(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (Value::Char(a), Value::Char(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::Str(a), Value::Char(b)) => Ok(Value::Str(format!("{a}{b}"))),
            (Value::Char(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            _ => Err(MplError::runtime_global("'+' requires matching numeric, string, or char operands")),
        }
    }

    fn apply_arith(
        &self,
        left: Value,
        right: Value,
        int_op: impl Fn(i64, i64) -> i64,
        double_op: impl Fn(f64, f64) -> f64,
    ) -> IResult<Value> {
        match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(a, b))),
            (Value::Double(a), Value::Double(b)) => Ok(Value::Double(double_op(a, b))),
            _ => Err(MplError::runtime_global("operator requires matching numeric operands")),
        }
    }

    fn values_equal(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, _) | (_, Value::Nil) => false,
            _ => left.to_display_string() == right.to_display_string(),
        }
    }

    fn compare(&self, left: Value, right: Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> IResult<Value> {
        let ordering = match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => {
                a.partial_cmp(b).ok_or_else(|| MplError::runtime_global("cannot order NaN"))?
            }
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => return Err(MplError::runtime_global("operands are not orderable")),
        };
        Ok(Value::Bool(accept(ordering)))
    }

    fn eval_rvalue(&mut self, rvalue: &RValue) -> IResult<()> {
        match rvalue {
            RValue::Literal(token) => {
                self.current = self.eval_literal(token)?;
                Ok(())
            }
            RValue::New(name) => self.eval_new(name),
            RValue::Path(path) => self.eval_path(path),
            RValue::Call(call) => {
                self.eval_call(call)?;
                Ok(())
            }
            RValue::Negated(expr) => {
                self.eval_expr(expr)?;
                self.current = match &self.current {
                    Value::Int(v) => Value::Int(-v),
                    Value::Double(v) => Value::Double(-v),
                    other => {
                        return Err(MplError::runtime_global(format!(
                            "'neg' requires a numeric operand, found '{}'",
                            other.type_name()
                        )))
                    }
                };
                Ok(())
            }
            RValue::PointerType(token) => {
                let name = token.lexeme.trim_start_matches('~');
                let alias = self
                    .aliases
                    .get(name)
                    .ok_or_else(|| MplError::runtime_global(format!("'{name}' is not a bound alias")))?;
                self.current = alias.value.clone();
                Ok(())
            }
            RValue::PointerValue(token) => {
                let name = token.lexeme.trim_start_matches('&').to_string();
                let value = self
                    .env
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| MplError::runtime_global(format!("'{name}' is not declared")))?;
                self.current = value;
                self.last_dereferenced = Some(name);
                Ok(())
            }
        }
    }

    fn eval_literal(&self, token: &crate::token::Token) -> IResult<Value> {
        match token.kind {
            TokenKind::Nil => Ok(Value::Nil),
            TokenKind::IntVal => token
                .lexeme
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| MplError::runtime_global(format!("'{}' is out of range for 'int'", token.lexeme))),
            TokenKind::DoubleVal => token
                .lexeme
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| MplError::runtime_global(format!("'{}' is not a valid 'double'", token.lexeme))),
            TokenKind::BoolVal => Ok(Value::Bool(token.lexeme == "true")),
            TokenKind::CharVal => Ok(Value::Char(token.lexeme.chars().next().unwrap_or('\0'))),
            TokenKind::StringVal => Ok(Value::Str(token.lexeme.clone())),
            _ => Err(MplError::runtime_global("not a literal token")),
        }
    }

    fn eval_new(&mut self, name: &crate::token::Token) -> IResult<()> {
        let decl = *self
            .types
            .get(&name.lexeme)
            .ok_or_else(|| MplError::runtime_global(format!("'{}' is not a declared record type", name.lexeme)))?;

        let mut record = Record::new();
        for field in &decl.fields {
            self.eval_expr(&field.init)?;
            record.insert_field(&field.name.lexeme, self.current.clone());
        }

        let id = self.heap.allocate();
        self.heap.set_object(id, record);
        self.current = Value::Object(id);
        Ok(())
    }

    fn eval_path(&mut self, path: &[crate::token::Token]) -> IResult<()> {
        let leading = path[0].lexeme.trim_start_matches('~');
        let mut value = self
            .env
            .get(leading)
            .cloned()
            .ok_or_else(|| MplError::runtime_global(format!("'{leading}' is not declared")))?;

        for field in &path[1..] {
            let Value::Object(id) = value else {
                return Err(MplError::runtime_global(format!("'{}' is not a record reference", field.lexeme)));
            };
            value = self.heap.get_object(id)?.get_field(&field.lexeme)?.clone();
        }

        self.current = value;
        Ok(())
    }

    fn eval_call(&mut self, call: &CallExpr) -> IResult<()> {
        match call.callee.lexeme.as_str() {
            "print" => self.builtin_print(call),
            "stoi" => self.builtin_stoi(call),
            "stod" => self.builtin_stod(call),
            "itos" => self.builtin_itos(call),
            "dtos" => self.builtin_dtos(call),
            "get" => self.builtin_get(call),
            "length" => self.builtin_length(call),
            "read" => self.builtin_read(call),
            _ => self.call_user_function(call),
        }
    }

    fn eval_arg(&mut self, call: &CallExpr, index: usize) -> IResult<Value> {
        self.eval_expr(&call.args[index])?;
        Ok(self.current.clone())
    }

    fn builtin_print(&mut self, call: &CallExpr) -> IResult<()> {
        let value = self.eval_arg(call, 0)?;
        let rendered = value.to_display_string();
        let rendered = unescape(&rendered).unwrap_or(rendered);
        print!("{rendered}");
        self.current = Value::Nil;
        Ok(())
    }

    fn builtin_stoi(&mut self, call: &CallExpr) -> IResult<()> {
        let value = self.eval_arg(call, 0)?;
        let s = value.as_string().unwrap_or_default();
        let parsed = s
            .parse::<i64>()
            .map_err(|_| MplError::runtime_global(format!("'{s}' cannot be converted to 'int'")))?;
        self.current = Value::Int(parsed);
        Ok(())
    }

    fn builtin_stod(&mut self, call: &CallExpr) -> IResult<()> {
        let value = self.eval_arg(call, 0)?;
        let s = value.as_string().unwrap_or_default();
        let parsed = s
            .parse::<f64>()
            .map_err(|_| MplError::runtime_global(format!("'{s}' cannot be converted to 'double'")))?;
        self.current = Value::Double(parsed);
        Ok(())
    }

    fn builtin_itos(&mut self, call: &CallExpr) -> IResult<()> {
        let value = self.eval_arg(call, 0)?;
        self.current = Value::Str(value.to_display_string());
        Ok(())
    }

    fn builtin_dtos(&mut self, call: &CallExpr) -> IResult<()> {
        let value = self.eval_arg(call, 0)?;
        self.current = Value::Str(value.to_display_string());
        Ok(())
    }

    fn builtin_get(&mut self, call: &CallExpr) -> IResult<()> {
        let index = self.eval_arg(call, 0)?;
        let text = self.eval_arg(call, 1)?;
        let index = index
            .as_integer()
            .ok_or_else(|| MplError::runtime_global("'get' expects an 'int' index"))?;
        let text = text.as_string().unwrap_or_default().to_string();
        if index < 0 {
            return Err(MplError::runtime_global(format!("index {index} out of range")));
        }
        let ch = text
            .chars()
            .nth(index as usize)
            .ok_or_else(|| MplError::runtime_global(format!("index {index} out of range")))?;
        self.current = Value::Char(ch);
        Ok(())
    }

    fn builtin_length(&mut self, call: &CallExpr) -> IResult<()> {
        let value = self.eval_arg(call, 0)?;
        let s = value.as_string().unwrap_or_default();
        self.current = Value::Int(s.chars().count() as i64);
        Ok(())
    }

    fn builtin_read(&mut self, _call: &CallExpr) -> IResult<()> {
        use std::io::Read;
        let mut token = String::new();
        let mut byte = [0u8; 1];
        let stdin = std::io::stdin();
        let mut handle = stdin.lock();

        loop {
            match handle.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    let c = byte[0] as char;
                    if c.is_whitespace() {
                        if !token.is_empty() {
                            break;
                        }
                    } else {
                        token.push(c);
                    }
                }
                Err(e) => return Err(MplError::runtime_global(format!("failed to read stdin: {e}"))),
            }
        }

        self.current = Value::Str(token);
        Ok(())
    }

    fn call_user_function(&mut self, call: &CallExpr) -> IResult<()> {
        let decl = *self
            .functions
            .get(&call.callee.lexeme)
            .ok_or_else(|| MplError::runtime_global(format!("'{}' is not declared", call.callee.lexeme)))?;

        let mut args = Vec::with_capacity(call.args.len());
        for i in 0..call.args.len() {
            args.push(self.eval_arg(call, i)?);
        }

        let caller_scope = self.env.current_id();
        self.env.restore(self.global_scope);
        self.env.push();

        for (param, value) in decl.params.iter().zip(args) {
            self.env.bind(&param.name.lexeme, value);
        }

        self.current = Value::Nil;
        self.exec_block(&decl.body)?;

        self.env.pop();
        self.env.restore(caller_scope);
        Ok(())
    }
}

/// Run the interpreter over a type-checked program, returning the process
/// exit code.
pub fn run(program: &Program) -> IResult<i32> {
    Interpreter::new(program).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::parse;

    fn run_src(src: &str) -> i32 {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let program = parse(tokens).unwrap();
        run(&program).unwrap()
    }

    #[test]
    fn returns_literal_exit_code() {
        assert_eq!(run_src("fun int main() return 0 end"), 0);
        assert_eq!(run_src("fun int main() return 1 end"), 1);
    }

    #[test]
    fn for_loop_accumulates() {
        let code = "fun int main() var x = 0 for i = 1 to 5 do x = x + i end return x end";
        assert_eq!(run_src(code), 10);
    }

    #[test]
    fn record_field_assignment_and_read() {
        let code = "type P var v: int = 0 end fun int main() var p = new P p.v = 7 return p.v end";
        assert_eq!(run_src(code), 7);
    }

    #[test]
    fn if_else_branches() {
        assert_eq!(run_src("fun int main() if 1 < 2 then return 1 else return 0 end end"), 1);
        assert_eq!(run_src("fun int main() if 2 < 1 then return 1 else return 0 end end"), 0);
    }

    #[test]
    fn alias_observes_reassignment() {
        let code = "fun int main() var x: int = 3 var p: ~int = &x x = 9 return ~p end";
        assert_eq!(run_src(code), 9);
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let tokens = Lexer::new("fun int main() var x = 1 / 0 return x end").tokenize().unwrap();
        let program = parse(tokens).unwrap();
        assert!(run(&program).is_err());
    }

    #[test]
    fn heap_allocation_is_monotonic_across_news() {
        let code = "type P var v: int = 0 end fun int main() var a = new P var b = new P return 0 end";
        assert_eq!(run_src(code), 0);
    }

    #[test]
    fn calling_a_function_preserves_caller_locals() {
        let code = "fun int helper() return 0 end fun int main() var x = 7 var y = helper() return x end";
        assert_eq!(run_src(code), 7);
    }

    #[test]
    fn recursive_calls_compute_fibonacci() {
        let code = "fun int fib(n: int) if n < 2 then return n else return fib(n - 1) + fib(n - 2) end end \
                     fun int main() return fib(10) end";
        assert_eq!(run_src(code), 55);
    }

    #[test]
    fn environment_restore_round_trips_through_global() {
        let mut env = Environment::new();
        let global = env.current_id();
        env.push();
        let caller = env.current_id();
        env.bind("x", Value::Int(7));

        env.restore(global);
        assert_eq!(env.current_id(), global);
        assert!(env.get("x").is_none());

        env.restore(caller);
        assert_eq!(env.current_id(), caller);
        assert_eq!(env.get("x"), Some(&Value::Int(7)));
    }
}
