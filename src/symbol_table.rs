//! Stack-of-scopes symbol table shared by the type checker and the
//! interpreter's call protocol.
//!
//! Carries the three kinds of semantic fact the language needs (scalar
//! type, function signature, record field map), plus stable scope ids so
//! the interpreter can save and restore a caller's scope across a call.

use std::collections::HashMap;

/// A semantic fact recorded against a name in some scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    /// A variable's type name.
    Scalar(String),
    /// A function's parameter types followed by its return type.
    Signature(Vec<String>),
    /// A record type's field name → field type name map.
    Record(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Scope {
    id: usize,
    facts: HashMap<String, Fact>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    /// Scopes hidden by a `restore_scope` to an outer scope, keyed by the id
    /// of the scope that was on top when they were set aside.
    suspended: HashMap<usize, Vec<Scope>>,
    next_id: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            scopes: vec![],
            suspended: HashMap::new(),
            next_id: 0,
        };
        table.push_scope();
        table
    }

    pub fn push_scope(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.scopes.push(Scope {
            id,
            facts: HashMap::new(),
        });
        id
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// The id of the innermost (current) scope.
    pub fn scope_id(&self) -> usize {
        self.scopes
            .last()
            .expect("symbol table always has at least the global scope")
            .id
    }

    /// Switch the active base to the scope with the given id. Used by the
    /// interpreter's call protocol to jump back to the global scope while
    /// preserving the caller's scope for later resumption: any scopes above
    /// `id` are set aside rather than discarded, keyed by the scope
    /// currently on top, and spliced back by a later `restore_scope` to
    /// that same id.
    pub fn restore_scope(&mut self, id: usize) {
        if let Some(suffix) = self.suspended.remove(&id) {
            self.scopes.extend(suffix);
            return;
        }

        if let Some(pos) = self.scopes.iter().position(|s| s.id == id) {
            if pos + 1 < self.scopes.len() {
                let key = self.scopes.last().expect("symbol table always has at least the global scope").id;
                let suffix = self.scopes.split_off(pos + 1);
                self.suspended.insert(key, suffix);
            }
        }
    }

    pub fn add(&mut self, name: impl Into<String>, fact: Fact) {
        self.scopes
            .last_mut()
            .expect("symbol table always has at least the global scope")
            .facts
            .insert(name.into(), fact);
    }

    pub fn exists(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.facts.contains_key(name))
    }

    pub fn exists_in_current(&self, name: &str) -> bool {
        self.scopes
            .last()
            .expect("symbol table always has at least the global scope")
            .facts
            .contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<&Fact> {
        self.scopes.iter().rev().find_map(|s| s.facts.get(name))
    }

    pub fn get_scalar(&self, name: &str) -> Option<&str> {
        match self.lookup(name) {
            Some(Fact::Scalar(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn set_scalar(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        self.add(name, Fact::Scalar(type_name.into()));
    }

    pub fn get_signature(&self, name: &str) -> Option<&[String]> {
        match self.lookup(name) {
            Some(Fact::Signature(sig)) => Some(sig.as_slice()),
            _ => None,
        }
    }

    pub fn set_signature(&mut self, name: impl Into<String>, signature: Vec<String>) {
        self.add(name, Fact::Signature(signature));
    }

    pub fn get_record(&self, name: &str) -> Option<&HashMap<String, String>> {
        match self.lookup(name) {
            Some(Fact::Record(fields)) => Some(fields),
            _ => None,
        }
    }

    pub fn set_record(&mut self, name: impl Into<String>, fields: HashMap<String, String>) {
        self.add(name, Fact::Record(fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_has_one_scope() {
        let table = SymbolTable::new();
        assert_eq!(table.scope_id(), 0);
    }

    #[test]
    fn lookup_searches_outward() {
        let mut table = SymbolTable::new();
        table.set_scalar("x", "int");
        table.push_scope();
        assert_eq!(table.get_scalar("x"), Some("int"));
        assert!(!table.exists_in_current("x"));
    }

    #[test]
    fn shadowing_in_same_scope_is_visible_via_add() {
        let mut table = SymbolTable::new();
        table.set_scalar("x", "int");
        table.set_scalar("x", "double");
        assert_eq!(table.get_scalar("x"), Some("double"));
    }

    #[test]
    fn pop_scope_removes_its_bindings() {
        let mut table = SymbolTable::new();
        table.push_scope();
        table.set_scalar("y", "bool");
        table.pop_scope();
        assert!(!table.exists("y"));
    }

    #[test]
    fn restore_scope_jumps_to_target_and_back() {
        let mut table = SymbolTable::new();
        let global = table.scope_id();
        table.push_scope();
        let caller = table.scope_id();
        table.set_scalar("x", "int");
        table.restore_scope(global);
        assert_eq!(table.scope_id(), global);
        assert!(!table.exists("x"));
        table.restore_scope(caller);
        assert_eq!(table.scope_id(), caller);
        assert_eq!(table.get_scalar("x"), Some("int"));
    }

    #[test]
    fn signature_and_record_facts_round_trip() {
        let mut table = SymbolTable::new();
        table.set_signature("add", vec!["int".into(), "int".into(), "int".into()]);
        assert_eq!(table.get_signature("add"), Some(&["int".to_string(), "int".to_string(), "int".to_string()][..]));

        let mut fields = HashMap::new();
        fields.insert("v".to_string(), "int".to_string());
        table.set_record("P", fields.clone());
        assert_eq!(table.get_record("P"), Some(&fields));
    }
}
