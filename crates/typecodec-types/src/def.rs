//! Declared program elements and their storage.
//!
//! This is the read-only view of the front end's element model that the
//! generator consumes: classes, their type parameters, supertypes, fields,
//! methods, constructors and annotations. Elements are addressed by
//! [`ClassId`] into a [`ClassTable`].
//!
//! ## Well-known classes
//!
//! Every table starts with the same set of built-in classes registered in a
//! fixed order, so their ids are compile-time constants (see
//! [`well_known`]). The type algebra relies on this for `Object`,
//! `Cloneable` and `Serializable`, and the strategies use it to recognise
//! collections, maps, boxes and `Optional`.

use crate::annotations::{ClassAnnotations, MemberAnnotations};
use crate::types::{TypeExpr, TypeVar, VarOwner};
use bitflags::bitflags;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

/// Interned-ish name. Cheap to clone, compared by content.
pub type Name = Arc<str>;

// =============================================================================
// ClassId
// =============================================================================

/// Identifier of a declared class (or primitive) in a [`ClassTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ids of the built-in classes every [`ClassTable`] starts with.
pub mod well_known {
    use super::ClassId;

    pub const OBJECT: ClassId = ClassId(0);

    pub const BOOLEAN: ClassId = ClassId(1);
    pub const BYTE: ClassId = ClassId(2);
    pub const SHORT: ClassId = ClassId(3);
    pub const CHAR: ClassId = ClassId(4);
    pub const INT: ClassId = ClassId(5);
    pub const LONG: ClassId = ClassId(6);
    pub const FLOAT: ClassId = ClassId(7);
    pub const DOUBLE: ClassId = ClassId(8);

    pub const SERIALIZABLE: ClassId = ClassId(9);
    pub const CLONEABLE: ClassId = ClassId(10);
    pub const COMPARABLE: ClassId = ClassId(11);
    pub const CHAR_SEQUENCE: ClassId = ClassId(12);
    pub const STRING: ClassId = ClassId(13);
    pub const NUMBER: ClassId = ClassId(14);

    pub const BOXED_BOOLEAN: ClassId = ClassId(15);
    pub const BOXED_BYTE: ClassId = ClassId(16);
    pub const BOXED_SHORT: ClassId = ClassId(17);
    pub const CHARACTER: ClassId = ClassId(18);
    pub const INTEGER: ClassId = ClassId(19);
    pub const BOXED_LONG: ClassId = ClassId(20);
    pub const BOXED_FLOAT: ClassId = ClassId(21);
    pub const BOXED_DOUBLE: ClassId = ClassId(22);

    pub const BIG_INTEGER: ClassId = ClassId(23);
    pub const BIG_DECIMAL: ClassId = ClassId(24);
    pub const ENUM: ClassId = ClassId(25);

    pub const ITERABLE: ClassId = ClassId(26);
    pub const COLLECTION: ClassId = ClassId(27);
    pub const LIST: ClassId = ClassId(28);
    pub const SET: ClassId = ClassId(29);
    pub const ARRAY_LIST: ClassId = ClassId(30);
    pub const MAP: ClassId = ClassId(31);
    pub const HASH_MAP: ClassId = ClassId(32);
    pub const LINKED_HASH_MAP: ClassId = ClassId(33);
    pub const OPTIONAL: ClassId = ClassId(34);

    pub(super) const COUNT: u32 = 35;

    /// `(primitive, box)` pairs.
    pub const BOXES: [(ClassId, ClassId); 8] = [
        (BOOLEAN, BOXED_BOOLEAN),
        (BYTE, BOXED_BYTE),
        (SHORT, BOXED_SHORT),
        (CHAR, CHARACTER),
        (INT, INTEGER),
        (LONG, BOXED_LONG),
        (FLOAT, BOXED_FLOAT),
        (DOUBLE, BOXED_DOUBLE),
    ];
}

// =============================================================================
// Element data
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Record,
    Primitive,
}

bitflags! {
    /// Declaration modifiers relevant to introspection.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
        const FINAL = 1 << 2;
        const ABSTRACT = 1 << 3;
        const TRANSIENT = 1 << 4;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub name: Name,
    /// Declared bounds; empty means `Object`.
    pub bounds: Vec<TypeExpr>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldElement {
    pub name: Name,
    pub ty: TypeExpr,
    pub modifiers: Modifiers,
    pub annotations: MemberAnnotations,
}

impl FieldElement {
    /// A public, non-static field.
    pub fn new(name: &str, ty: TypeExpr) -> Self {
        Self {
            name: Name::from(name),
            ty,
            modifiers: Modifiers::PUBLIC,
            annotations: MemberAnnotations::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_annotations(mut self, annotations: MemberAnnotations) -> Self {
        self.annotations = annotations;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterElement {
    pub name: Name,
    pub ty: TypeExpr,
    pub annotations: MemberAnnotations,
}

impl ParameterElement {
    pub fn new(name: &str, ty: TypeExpr) -> Self {
        Self {
            name: Name::from(name),
            ty,
            annotations: MemberAnnotations::default(),
        }
    }

    pub fn with_annotations(mut self, annotations: MemberAnnotations) -> Self {
        self.annotations = annotations;
        self
    }
}

/// A method or constructor. Constructors are named `<init>` and have no
/// return type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodElement {
    pub name: Name,
    pub params: Vec<ParameterElement>,
    /// `None` for `void` and constructors.
    pub return_type: Option<TypeExpr>,
    pub type_params: Vec<TypeParamDecl>,
    pub modifiers: Modifiers,
    pub annotations: MemberAnnotations,
}

impl MethodElement {
    pub const CONSTRUCTOR_NAME: &'static str = "<init>";

    /// A public instance method.
    pub fn new(name: &str, params: Vec<ParameterElement>, return_type: Option<TypeExpr>) -> Self {
        Self {
            name: Name::from(name),
            params,
            return_type,
            type_params: Vec::new(),
            modifiers: Modifiers::PUBLIC,
            annotations: MemberAnnotations::default(),
        }
    }

    pub fn constructor(params: Vec<ParameterElement>) -> Self {
        Self::new(Self::CONSTRUCTOR_NAME, params, None)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_annotations(mut self, annotations: MemberAnnotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn is_constructor(&self) -> bool {
        &*self.name == Self::CONSTRUCTOR_NAME
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }
}

/// Complete information about a declared class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDecl {
    /// Fully qualified name, nested classes joined with `.`.
    pub name: Name,
    pub kind: ClassKind,
    pub modifiers: Modifiers,
    pub type_params: Vec<TypeParamDecl>,
    /// `None` for `Object`, interfaces and primitives.
    pub supertype: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
    pub enclosing: Option<ClassId>,
    pub fields: Vec<FieldElement>,
    pub methods: Vec<MethodElement>,
    pub constructors: Vec<MethodElement>,
    pub enum_constants: Vec<Name>,
    pub annotations: ClassAnnotations,
}

impl ClassDecl {
    fn new(name: &str, kind: ClassKind) -> Self {
        let supertype = match kind {
            ClassKind::Class | ClassKind::Record => Some(TypeExpr::Raw(well_known::OBJECT)),
            ClassKind::Enum | ClassKind::Interface | ClassKind::Primitive => None,
        };
        Self {
            name: Name::from(name),
            kind,
            modifiers: Modifiers::PUBLIC,
            type_params: Vec::new(),
            supertype,
            interfaces: Vec::new(),
            enclosing: None,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            enum_constants: Vec::new(),
            annotations: ClassAnnotations::default(),
        }
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.contains(Modifiers::ABSTRACT)
    }
}

// =============================================================================
// ClassTable
// =============================================================================

/// Storage for declared classes.
///
/// ## Usage
///
/// ```ignore
/// let mut table = ClassTable::new();
/// let node = table.declare("com.example.Node", ClassKind::Class);
/// table.class_mut(node).fields.push(FieldElement::new("value", TypeExpr::Raw(well_known::INT)));
/// ```
#[derive(Clone, Debug)]
pub struct ClassTable {
    classes: Vec<ClassDecl>,
    by_name: FxHashMap<Name, ClassId>,
    by_simple_name: FxHashMap<Name, Vec<ClassId>>,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassTable {
    /// Create a table holding the well-known classes.
    pub fn new() -> Self {
        let mut table = Self {
            classes: Vec::new(),
            by_name: FxHashMap::default(),
            by_simple_name: FxHashMap::default(),
        };
        table.register_builtins();
        table
    }

    /// Declare a class and return its id. Declaring an existing name
    /// returns the existing id unchanged.
    pub fn declare(&mut self, name: &str, kind: ClassKind) -> ClassId {
        if let Some(&existing) = self.by_name.get(name) {
            return existing;
        }
        let id = ClassId(self.classes.len() as u32);
        let mut decl = ClassDecl::new(name, kind);
        if kind == ClassKind::Enum {
            decl.modifiers |= Modifiers::FINAL;
            decl.supertype = Some(TypeExpr::parameterized(well_known::ENUM, vec![TypeExpr::Raw(id)]));
        }
        let simple: Name = Name::from(decl.simple_name());
        trace!(target: "typecodec::types", class = name, id = id.0, ?kind, "ClassTable::declare");
        self.by_name.insert(decl.name.clone(), id);
        self.by_simple_name.entry(simple).or_default().push(id);
        self.classes.push(decl);
        id
    }

    /// Declare a class nested in `enclosing`. Its name is
    /// `<enclosing>.<simple>`.
    pub fn declare_nested(
        &mut self,
        enclosing: ClassId,
        simple: &str,
        kind: ClassKind,
        is_static: bool,
    ) -> ClassId {
        let name = format!("{}.{}", self.class(enclosing).name, simple);
        let id = self.declare(&name, kind);
        let decl = self.class_mut(id);
        decl.enclosing = Some(enclosing);
        if is_static {
            decl.modifiers |= Modifiers::STATIC;
        }
        id
    }

    /// Add a type parameter to `class` and return it as a type variable.
    pub fn add_type_param(&mut self, class: ClassId, name: &str, bounds: Vec<TypeExpr>) -> TypeExpr {
        self.class_mut(class).type_params.push(TypeParamDecl {
            name: Name::from(name),
            bounds,
        });
        TypeExpr::variable(VarOwner::Class(class), name)
    }

    /// Get a class by id.
    ///
    /// Ids are only produced by this table; a foreign id is a caller bug.
    #[inline]
    pub fn class(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.index()]
    }

    pub fn get(&self, id: ClassId) -> Option<&ClassDecl> {
        self.classes.get(id.index())
    }

    #[inline]
    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDecl {
        &mut self.classes[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Look up by simple name. Returns `None` when the name is unknown or
    /// ambiguous.
    pub fn lookup_simple(&self, simple: &str) -> Option<ClassId> {
        match self.by_simple_name.get(simple).map(Vec::as_slice) {
            Some([single]) => Some(*single),
            _ => None,
        }
    }

    pub fn name(&self, id: ClassId) -> &str {
        &self.class(id).name
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len() as u32).map(ClassId)
    }

    /// Ids of user-declared classes (everything after the built-ins).
    pub fn user_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (well_known::COUNT..self.classes.len() as u32).map(ClassId)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn is_primitive(&self, id: ClassId) -> bool {
        self.class(id).kind == ClassKind::Primitive
    }

    pub fn is_interface(&self, id: ClassId) -> bool {
        self.class(id).kind == ClassKind::Interface
    }

    pub fn is_enum(&self, id: ClassId) -> bool {
        self.class(id).kind == ClassKind::Enum
    }

    /// Box class of a primitive, if `id` is one.
    pub fn boxed(&self, id: ClassId) -> Option<ClassId> {
        well_known::BOXES
            .iter()
            .find(|(prim, _)| *prim == id)
            .map(|(_, boxed)| *boxed)
    }

    /// Primitive of a box class, if `id` is one.
    pub fn unboxed(&self, id: ClassId) -> Option<ClassId> {
        well_known::BOXES
            .iter()
            .find(|(_, boxed)| *boxed == id)
            .map(|(prim, _)| *prim)
    }

    /// A non-static nested class whose instances carry an outer instance.
    pub fn is_inner_class(&self, id: ClassId) -> bool {
        let decl = self.class(id);
        let Some(enclosing) = decl.enclosing else {
            return false;
        };
        matches!(decl.kind, ClassKind::Class)
            && !decl.modifiers.contains(Modifiers::STATIC)
            && !self.is_interface(enclosing)
    }

    /// The class's own type variables, in declaration order.
    pub fn type_variables(&self, id: ClassId) -> Vec<TypeVar> {
        self.class(id)
            .type_params
            .iter()
            .map(|p| TypeVar::new(VarOwner::Class(id), &p.name))
            .collect()
    }

    /// `List` -> `List<E>`; non-generic classes stay raw.
    pub fn parameterize_with_own_variables(&self, id: ClassId) -> TypeExpr {
        let vars = self.type_variables(id);
        if vars.is_empty() {
            TypeExpr::Raw(id)
        } else {
            TypeExpr::parameterized(id, vars.into_iter().map(TypeExpr::Variable).collect())
        }
    }

    /// Declared bounds of a type variable. Unknown variables and variables
    /// without bounds are bounded by `Object`.
    pub fn variable_bounds(&self, var: &TypeVar) -> Vec<TypeExpr> {
        let params = match &var.owner {
            VarOwner::Class(class) => self.get(*class).map(|c| c.type_params.as_slice()),
            VarOwner::Method { class, method } => self.get(*class).and_then(|c| {
                c.methods
                    .iter()
                    .chain(c.constructors.iter())
                    .find(|m| m.name == *method)
                    .map(|m| m.type_params.as_slice())
            }),
        };
        params
            .and_then(|params| params.iter().find(|p| p.name == var.name))
            .filter(|p| !p.bounds.is_empty())
            .map(|p| p.bounds.clone())
            .unwrap_or_else(|| vec![TypeExpr::Raw(well_known::OBJECT)])
    }

    // -------------------------------------------------------------------------
    // Built-ins
    // -------------------------------------------------------------------------

    fn register_builtins(&mut self) {
        use well_known::*;

        let object = self.declare("java.lang.Object", ClassKind::Class);
        self.class_mut(object).supertype = None;

        for name in ["boolean", "byte", "short", "char", "int", "long", "float", "double"] {
            self.declare(name, ClassKind::Primitive);
        }

        self.declare("java.io.Serializable", ClassKind::Interface);
        self.declare("java.lang.Cloneable", ClassKind::Interface);
        let comparable = self.declare("java.lang.Comparable", ClassKind::Interface);
        self.add_type_param(comparable, "T", Vec::new());
        self.declare("java.lang.CharSequence", ClassKind::Interface);

        let string = self.declare("java.lang.String", ClassKind::Class);
        self.class_mut(string).modifiers |= Modifiers::FINAL;
        self.class_mut(string).interfaces = vec![
            TypeExpr::Raw(SERIALIZABLE),
            TypeExpr::parameterized(COMPARABLE, vec![TypeExpr::Raw(STRING)]),
            TypeExpr::Raw(CHAR_SEQUENCE),
        ];

        let number = self.declare("java.lang.Number", ClassKind::Class);
        self.class_mut(number).modifiers |= Modifiers::ABSTRACT;
        self.class_mut(number).interfaces = vec![TypeExpr::Raw(SERIALIZABLE)];

        for (name, superclass) in [
            ("java.lang.Boolean", OBJECT),
            ("java.lang.Byte", NUMBER),
            ("java.lang.Short", NUMBER),
            ("java.lang.Character", OBJECT),
            ("java.lang.Integer", NUMBER),
            ("java.lang.Long", NUMBER),
            ("java.lang.Float", NUMBER),
            ("java.lang.Double", NUMBER),
            ("java.math.BigInteger", NUMBER),
            ("java.math.BigDecimal", NUMBER),
        ] {
            let id = self.declare(name, ClassKind::Class);
            let decl = self.class_mut(id);
            decl.modifiers |= Modifiers::FINAL;
            decl.supertype = Some(TypeExpr::Raw(superclass));
            decl.interfaces = vec![
                TypeExpr::Raw(SERIALIZABLE),
                TypeExpr::parameterized(COMPARABLE, vec![TypeExpr::Raw(id)]),
            ];
        }

        let enum_class = self.declare("java.lang.Enum", ClassKind::Class);
        self.class_mut(enum_class).modifiers |= Modifiers::ABSTRACT;
        let e = TypeExpr::variable(VarOwner::Class(enum_class), "E");
        self.add_type_param(
            enum_class,
            "E",
            vec![TypeExpr::parameterized(enum_class, vec![e.clone()])],
        );
        self.class_mut(enum_class).interfaces = vec![
            TypeExpr::parameterized(COMPARABLE, vec![e]),
            TypeExpr::Raw(SERIALIZABLE),
        ];

        let iterable = self.declare("java.lang.Iterable", ClassKind::Interface);
        self.add_type_param(iterable, "T", Vec::new());

        for (name, parent) in [
            ("java.util.Collection", ITERABLE),
            ("java.util.List", COLLECTION),
            ("java.util.Set", COLLECTION),
        ] {
            let id = self.declare(name, ClassKind::Interface);
            let element = self.add_type_param(id, "E", Vec::new());
            self.class_mut(id).interfaces = vec![TypeExpr::parameterized(parent, vec![element])];
        }

        let array_list = self.declare("java.util.ArrayList", ClassKind::Class);
        let element = self.add_type_param(array_list, "E", Vec::new());
        self.class_mut(array_list).interfaces = vec![
            TypeExpr::parameterized(LIST, vec![element]),
            TypeExpr::Raw(CLONEABLE),
            TypeExpr::Raw(SERIALIZABLE),
        ];

        let map = self.declare("java.util.Map", ClassKind::Interface);
        self.add_type_param(map, "K", Vec::new());
        self.add_type_param(map, "V", Vec::new());

        let hash_map = self.declare("java.util.HashMap", ClassKind::Class);
        let k = self.add_type_param(hash_map, "K", Vec::new());
        let v = self.add_type_param(hash_map, "V", Vec::new());
        self.class_mut(hash_map).interfaces = vec![
            TypeExpr::parameterized(MAP, vec![k, v]),
            TypeExpr::Raw(CLONEABLE),
            TypeExpr::Raw(SERIALIZABLE),
        ];

        let linked = self.declare("java.util.LinkedHashMap", ClassKind::Class);
        let k = self.add_type_param(linked, "K", Vec::new());
        let v = self.add_type_param(linked, "V", Vec::new());
        self.class_mut(linked).supertype =
            Some(TypeExpr::parameterized(HASH_MAP, vec![k.clone(), v.clone()]));
        self.class_mut(linked).interfaces = vec![TypeExpr::parameterized(MAP, vec![k, v])];

        let optional = self.declare("java.util.Optional", ClassKind::Class);
        self.class_mut(optional).modifiers |= Modifiers::FINAL;
        self.add_type_param(optional, "T", Vec::new());

        debug_assert_eq!(self.classes.len() as u32, COUNT);
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod def_tests;
