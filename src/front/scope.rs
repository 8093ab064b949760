//! Lexically-nested scope stack. Each frame maps identifiers to
//! declarations and type names (typedefs, record tags) to types. Lookup
//! walks innermost-to-outermost; the file scope is permanent.

use rustc_hash::FxHashMap;

use crate::front::ast::DeclId;
use crate::front::types::TypeId;

#[derive(Default)]
struct ScopeFrame {
    decls: FxHashMap<String, DeclId>,
    types: FxHashMap<String, TypeId>,
}

pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { frames: vec![ScopeFrame::default()] }
    }

    pub fn enter(&mut self) {
        self.frames.push(ScopeFrame::default());
    }

    pub fn exit(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot exit the file scope");
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Install into the top frame. Returns false when the name is already
    /// bound at this level.
    pub fn install_decl(&mut self, name: &str, decl: DeclId) -> bool {
        match self.frames.last_mut() {
            Some(top) if !top.decls.contains_key(name) => {
                top.decls.insert(name.to_string(), decl);
                true
            }
            _ => false,
        }
    }

    pub fn install_type(&mut self, name: &str, ty: TypeId) -> bool {
        match self.frames.last_mut() {
            Some(top) if !top.types.contains_key(name) => {
                top.types.insert(name.to_string(), ty);
                true
            }
            _ => false,
        }
    }

    pub fn lookup_decl(&self, name: &str) -> Option<DeclId> {
        self.frames.iter().rev().find_map(|f| f.decls.get(name).copied())
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.frames.iter().rev().find_map(|f| f.types.get(name).copied())
    }

    /// Whether the identifier currently denotes a type. This query is how
    /// the parser settles C's type/identifier ambiguity.
    pub fn is_type_name(&self, name: &str) -> bool {
        self.lookup_type(name).is_some()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    #[test]
    fn innermost_wins() {
        let mut scopes = ScopeStack::new();
        let outer = DeclId::new(0);
        let inner = DeclId::new(1);
        assert!(scopes.install_decl("x", outer));
        scopes.enter();
        assert!(scopes.install_decl("x", inner));
        assert_eq!(scopes.lookup_decl("x"), Some(inner));
        scopes.exit();
        assert_eq!(scopes.lookup_decl("x"), Some(outer));
    }

    #[test]
    fn same_level_rebinding_is_rejected() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.install_decl("x", DeclId::new(0)));
        assert!(!scopes.install_decl("x", DeclId::new(1)));
    }

    #[test]
    fn type_names_fall_out_of_scope() {
        let mut scopes = ScopeStack::new();
        scopes.enter();
        assert!(scopes.install_type("T", TypeId::new(0)));
        assert!(scopes.is_type_name("T"));
        scopes.exit();
        assert!(!scopes.is_type_name("T"));
    }

    #[test]
    fn file_scope_survives_exit() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.depth(), 1);
        scopes.enter();
        scopes.exit();
        assert_eq!(scopes.depth(), 1);
    }
}
