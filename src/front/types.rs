//! Canonical representation of C types. Types live in the same arena as
//! the AST and are referenced by `TypeId` everywhere.

use cranelift_entity::entity_impl;

/// Handle into the type arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(u32);
entity_impl!(TypeId);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sign {
    None,
    Signed,
    Unsigned,
}

impl Sign {
    pub fn is_unsigned(self) -> bool {
        self == Sign::Unsigned
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayLen {
    Fixed(u64),
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    Void,
    Bool,
    Char(Sign),
    Short(Sign),
    Int(Sign),
    Long(Sign),
    LongLong(Sign),
    Float,
    Double { long: bool },
    Pointer { base: TypeId },
    Array { elem: TypeId, len: ArrayLen },
    Function { ret: TypeId, params: Vec<TypeId> },
    Record { kind: RecordKind, members: Vec<Member> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    /// Aggregate tag, typedef name, or — on parameter types — the
    /// parameter name captured by the declarator.
    pub name: Option<String>,
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Self { kind, name: None }
    }

    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self { kind, name: Some(name.into()) }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Bool
                | TypeKind::Char(_)
                | TypeKind::Short(_)
                | TypeKind::Int(_)
                | TypeKind::Long(_)
                | TypeKind::LongLong(_)
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(self.kind, TypeKind::Float | TypeKind::Double { .. })
    }

    pub fn is_arithmetic(&self) -> bool {
        self.is_integer() || self.is_floating()
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, TypeKind::Pointer { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeKind::Function { .. })
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, TypeKind::Record { .. })
    }
}
