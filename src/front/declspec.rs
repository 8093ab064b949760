//! Declaration specifiers: the mutable bag accumulated while the parser
//! sits on storage-class / qualifier / type-specifier tokens, and the
//! collapse into a canonical type.

use crate::error::{CompileError, CompileResult};
use crate::front::context::AstContext;
use crate::front::token::Span;
use crate::front::types::{Sign, Type, TypeId, TypeKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageClass {
    None,
    Typedef,
    Extern,
    Static,
    ThreadLocal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionSpec {
    None,
    Inline,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
    pub is_atomic: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeSpecKind {
    Unspecified,
    Void,
    Bool,
    Char,
    Int,
    Float,
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeSpecWidth {
    None,
    Short,
    Long,
    LongLong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeSpecSign {
    None,
    Signed,
    Unsigned,
}

/// Accumulator for one declaration-specifier sequence. Only alive during
/// parsing; `synthesize_type` collapses it.
#[derive(Clone, Debug, PartialEq)]
pub struct DeclSpec {
    pub storage: StorageClass,
    pub function_spec: FunctionSpec,
    pub qualifiers: Qualifiers,
    pub kind: TypeSpecKind,
    pub width: TypeSpecWidth,
    pub sign: TypeSpecSign,
    /// Set for struct/union definitions and typedef-name references; taken
    /// verbatim by `finish`.
    pub override_ty: Option<TypeId>,
}

impl DeclSpec {
    pub fn new() -> Self {
        Self {
            storage: StorageClass::None,
            function_spec: FunctionSpec::None,
            qualifiers: Qualifiers::default(),
            kind: TypeSpecKind::Unspecified,
            width: TypeSpecWidth::None,
            sign: TypeSpecSign::None,
            override_ty: None,
        }
    }

    pub fn is_typedef(&self) -> bool {
        self.storage == StorageClass::Typedef
    }

    pub fn set_storage_class(&mut self, sc: StorageClass, span: Span) -> CompileResult<()> {
        if self.storage != StorageClass::None {
            return Err(CompileError::type_synthesis("multiple storage classes", span));
        }
        self.storage = sc;
        self.check_typedef_exclusivity(span)
    }

    pub fn set_function_spec(&mut self, fs: FunctionSpec, span: Span) -> CompileResult<()> {
        self.function_spec = fs;
        self.check_typedef_exclusivity(span)
    }

    // typedef cannot be combined with extern/static/inline/thread-local
    fn check_typedef_exclusivity(&self, span: Span) -> CompileResult<()> {
        if self.storage == StorageClass::Typedef && self.function_spec == FunctionSpec::Inline {
            return Err(CompileError::type_synthesis("'typedef' cannot be 'inline'", span));
        }
        Ok(())
    }

    pub fn set_kind(&mut self, kind: TypeSpecKind, span: Span) -> CompileResult<()> {
        if self.kind != TypeSpecKind::Unspecified || self.override_ty.is_some() {
            return Err(CompileError::type_synthesis("duplicate type specifier", span));
        }
        self.kind = kind;
        Ok(())
    }

    pub fn set_short(&mut self, span: Span) -> CompileResult<()> {
        match self.width {
            TypeSpecWidth::None => {
                self.width = TypeSpecWidth::Short;
                Ok(())
            }
            _ => Err(CompileError::type_synthesis("cannot combine 'short' here", span)),
        }
    }

    pub fn add_long(&mut self, span: Span) -> CompileResult<()> {
        match self.width {
            TypeSpecWidth::None => {
                self.width = TypeSpecWidth::Long;
                Ok(())
            }
            TypeSpecWidth::Long => {
                self.width = TypeSpecWidth::LongLong;
                Ok(())
            }
            _ => Err(CompileError::type_synthesis("cannot combine 'long' here", span)),
        }
    }

    pub fn set_sign(&mut self, sign: TypeSpecSign, span: Span) -> CompileResult<()> {
        if self.sign != TypeSpecSign::None {
            return Err(CompileError::type_synthesis("duplicate sign specifier", span));
        }
        self.sign = sign;
        Ok(())
    }

    pub fn set_override(&mut self, ty: TypeId, span: Span) -> CompileResult<()> {
        if self.kind != TypeSpecKind::Unspecified || self.override_ty.is_some() {
            return Err(CompileError::type_synthesis("duplicate type specifier", span));
        }
        self.override_ty = Some(ty);
        Ok(())
    }

    /// Collapse the bag into a canonical type. A pure function of the
    /// accumulator state: equal bags produce equal types.
    pub fn synthesize_type(&self, span: Span) -> CompileResult<Type> {
        let sign = match self.sign {
            TypeSpecSign::None => Sign::None,
            TypeSpecSign::Signed => Sign::Signed,
            TypeSpecSign::Unsigned => Sign::Unsigned,
        };
        let no_width = self.width == TypeSpecWidth::None;
        let no_sign = self.sign == TypeSpecSign::None;
        let kind = match self.kind {
            TypeSpecKind::Void => {
                if !no_width || !no_sign {
                    return Err(CompileError::type_synthesis("'void' takes no modifiers", span));
                }
                TypeKind::Void
            }
            TypeSpecKind::Bool => {
                if !no_width || !no_sign {
                    return Err(CompileError::type_synthesis("'_Bool' takes no modifiers", span));
                }
                TypeKind::Bool
            }
            TypeSpecKind::Char => {
                if !no_width {
                    return Err(CompileError::type_synthesis(
                        "'char' cannot combine with short/long",
                        span,
                    ));
                }
                TypeKind::Char(sign)
            }
            TypeSpecKind::Int | TypeSpecKind::Unspecified => {
                if self.kind == TypeSpecKind::Unspecified && no_width && no_sign {
                    return Err(CompileError::type_synthesis("missing type specifier", span));
                }
                match self.width {
                    TypeSpecWidth::None => TypeKind::Int(sign),
                    TypeSpecWidth::Short => TypeKind::Short(sign),
                    TypeSpecWidth::Long => TypeKind::Long(sign),
                    TypeSpecWidth::LongLong => TypeKind::LongLong(sign),
                }
            }
            TypeSpecKind::Float => {
                if !no_width || !no_sign {
                    return Err(CompileError::type_synthesis("'float' takes no modifiers", span));
                }
                TypeKind::Float
            }
            TypeSpecKind::Double => {
                if !no_sign {
                    return Err(CompileError::type_synthesis(
                        "'double' cannot be signed/unsigned",
                        span,
                    ));
                }
                match self.width {
                    TypeSpecWidth::None => TypeKind::Double { long: false },
                    TypeSpecWidth::Long => TypeKind::Double { long: true },
                    _ => {
                        return Err(CompileError::type_synthesis(
                            "'double' cannot combine with 'short'",
                            span,
                        ))
                    }
                }
            }
        };
        Ok(Type::new(kind))
    }

    /// Produce the arena handle for this bag: the override verbatim, or a
    /// freshly allocated synthesized type.
    pub fn finish(&self, ctx: &mut AstContext, span: Span) -> CompileResult<TypeId> {
        if let Some(ty) = self.override_ty {
            return Ok(ty);
        }
        let ty = self.synthesize_type(span)?;
        Ok(ctx.alloc_type(ty))
    }
}

impl Default for DeclSpec {
    fn default() -> Self {
        Self::new()
    }
}

/// A declaration specifier paired with the shape the declarator suffixes
/// built, plus the declared identifier (absent for abstract declarators).
#[derive(Clone, Debug)]
pub struct Declarator {
    pub name: Option<(String, Span)>,
    pub ty: TypeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag() -> DeclSpec {
        DeclSpec::new()
    }

    #[test]
    fn synthesis_is_pure() {
        let sp = Span::dummy();
        let mut a = bag();
        a.set_sign(TypeSpecSign::Unsigned, sp).unwrap();
        a.add_long(sp).unwrap();
        a.add_long(sp).unwrap();
        let mut b = bag();
        b.set_sign(TypeSpecSign::Unsigned, sp).unwrap();
        b.add_long(sp).unwrap();
        b.add_long(sp).unwrap();
        assert_eq!(a.synthesize_type(sp).unwrap(), b.synthesize_type(sp).unwrap());
        assert_eq!(
            a.synthesize_type(sp).unwrap().kind,
            TypeKind::LongLong(Sign::Unsigned)
        );
    }

    #[test]
    fn long_long_unsigned() {
        let sp = Span::dummy();
        let mut s = bag();
        s.add_long(sp).unwrap();
        s.add_long(sp).unwrap();
        s.set_sign(TypeSpecSign::Unsigned, sp).unwrap();
        s.set_kind(TypeSpecKind::Int, sp).unwrap();
        assert_eq!(s.synthesize_type(sp).unwrap().kind, TypeKind::LongLong(Sign::Unsigned));
    }

    #[test]
    fn long_double() {
        let sp = Span::dummy();
        let mut s = bag();
        s.add_long(sp).unwrap();
        s.set_kind(TypeSpecKind::Double, sp).unwrap();
        assert_eq!(s.synthesize_type(sp).unwrap().kind, TypeKind::Double { long: true });
    }

    #[test]
    fn impossible_combinations_fail() {
        let sp = Span::dummy();

        let mut s = bag();
        s.set_kind(TypeSpecKind::Void, sp).unwrap();
        s.set_sign(TypeSpecSign::Unsigned, sp).unwrap();
        assert!(s.synthesize_type(sp).is_err());

        let mut s = bag();
        s.set_kind(TypeSpecKind::Char, sp).unwrap();
        s.add_long(sp).unwrap();
        assert!(s.synthesize_type(sp).is_err());

        let mut s = bag();
        s.set_short(sp).unwrap();
        s.set_kind(TypeSpecKind::Double, sp).unwrap();
        assert!(s.synthesize_type(sp).is_err());

        assert!(bag().synthesize_type(sp).is_err());
    }

    #[test]
    fn bare_sign_defaults_to_int() {
        let sp = Span::dummy();
        let mut s = bag();
        s.set_sign(TypeSpecSign::Unsigned, sp).unwrap();
        assert_eq!(s.synthesize_type(sp).unwrap().kind, TypeKind::Int(Sign::Unsigned));
    }

    #[test]
    fn duplicate_storage_class_fails() {
        let sp = Span::dummy();
        let mut s = bag();
        s.set_storage_class(StorageClass::Static, sp).unwrap();
        assert!(s.set_storage_class(StorageClass::Extern, sp).is_err());
    }

    #[test]
    fn typedef_excludes_inline() {
        let sp = Span::dummy();
        let mut s = bag();
        s.set_storage_class(StorageClass::Typedef, sp).unwrap();
        assert!(s.set_function_spec(FunctionSpec::Inline, sp).is_err());
    }
}
