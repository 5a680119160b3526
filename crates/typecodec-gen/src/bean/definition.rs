//! Property model of a bean, built per (type, direction).

use crate::linker::{Direction, Linker};
use crate::plan::{CreatorCall, Expr, Local, Stmt};
use crate::symbols::Symbol;
use typecodec_types::{ClassId, ClassTable, Inclusion, Name, SubtypeShape, TypeExpr};

/// How a property is read or written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Accessor {
    /// Public field named after the property's member name.
    Field,
    Getter { method: Name },
    Setter { method: Name },
    /// Parameter of the creator at this position.
    CreatorParam { index: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// Name on the wire.
    pub name: Name,
    /// Field or accessor-derived member name; also the runtime slot name.
    pub member: Name,
    pub ty: TypeExpr,
    pub accessor: Accessor,
    pub nullable: Option<bool>,
    pub aliases: Vec<Name>,
    pub inclusion: Inclusion,
    pub unwrapped: bool,
    pub required: bool,
    pub permit_recursive: bool,
}

impl Property {
    /// The wire name followed by the aliases.
    pub fn labels(&self) -> Vec<Name> {
        let mut labels = Vec::with_capacity(1 + self.aliases.len());
        labels.push(self.name.clone());
        for alias in &self.aliases {
            if !labels.contains(alias) {
                labels.push(alias.clone());
            }
        }
        labels
    }

    pub fn is_creator_param(&self) -> bool {
        matches!(self.accessor, Accessor::CreatorParam { .. })
    }

    /// Read the property from `target`.
    pub fn read(&self, target: Expr) -> Expr {
        match &self.accessor {
            Accessor::Getter { method } => Expr::CallGetter {
                target: Box::new(target),
                method: method.clone(),
            },
            _ => Expr::GetField {
                target: Box::new(target),
                field: self.member.clone(),
            },
        }
    }

    /// Store `value` into the bean in `target`. Creator parameters are
    /// passed to the creator instead and have no store.
    pub fn write(&self, target: Local, value: Expr) -> Option<Stmt> {
        match &self.accessor {
            Accessor::Setter { method } => Some(Stmt::CallSetter {
                target,
                method: method.clone(),
                value,
            }),
            Accessor::Field => Some(Stmt::SetField {
                target,
                field: self.member.clone(),
                value,
            }),
            Accessor::Getter { .. } | Accessor::CreatorParam { .. } => None,
        }
    }

    /// Whether null is accepted. Unannotated references are nullable,
    /// primitives are not.
    pub fn is_nullable(&self, table: &ClassTable) -> bool {
        self.nullable.unwrap_or_else(|| !self.ty.is_primitive(table))
    }

    /// The strategy planned for this property's value.
    pub fn symbol(&self, linker: &Linker<'_>) -> Symbol {
        let mut symbol = linker.find_symbol(&self.ty);
        if self.permit_recursive {
            symbol = symbol.with_recursive_serialization();
        }
        if self.is_nullable(linker.table()) {
            symbol.nullable()
        } else {
            symbol
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Creator {
    pub call: CreatorCall,
    /// Parameter names, in call order.
    pub params: Vec<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subtype {
    pub class: ClassId,
    pub ty: TypeExpr,
    /// Accepted tags; the first one is written.
    pub names: Vec<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subtyping {
    pub shape: SubtypeShape,
    /// Tag key for [`SubtypeShape::Property`].
    pub property: Name,
    pub subtypes: Vec<Subtype>,
    /// Index into `subtypes` used when no tag is present.
    pub default_impl: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeanDefinition {
    pub class: ClassId,
    /// Fully qualified class name.
    pub class_name: Name,
    pub ty: TypeExpr,
    pub direction: Direction,
    pub creator: Option<Creator>,
    /// Properties passed to the creator, in parameter order.
    pub creator_props: Vec<Property>,
    /// The single value of a delegating creator.
    pub delegating_prop: Option<Property>,
    /// A property that stands for the whole bean when serialized.
    pub value_prop: Option<Property>,
    /// Every other property.
    pub props: Vec<Property>,
    pub subtyping: Option<Subtyping>,
    pub ignore_unknown: bool,
    /// Keys skipped without error.
    pub ignored: Vec<Name>,
}

impl BeanDefinition {
    pub fn all_props(&self) -> impl Iterator<Item = &Property> {
        self.creator_props
            .iter()
            .chain(self.delegating_prop.iter())
            .chain(self.value_prop.iter())
            .chain(self.props.iter())
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.all_props().find(|prop| &*prop.name == name)
    }
}
