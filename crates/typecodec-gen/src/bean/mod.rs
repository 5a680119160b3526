//! Beans: introspection and the inline bean strategy.
//!
//! Serializable classes marked inline are planned at every use site from a
//! [`BeanDefinition`]. Other serializable classes get a standalone codec
//! and are reached through an injection.

pub mod bitset;
pub mod definition;
mod entity;
pub mod introspect;
mod serialize;

pub use bitset::{DuplicatePropertyManager, InlineBitSet};
pub use definition::{Accessor, BeanDefinition, Creator, Property, Subtype, Subtyping};
pub use introspect::introspect;

pub(crate) use entity::{deserialize_bean, supports_deserialization};
pub(crate) use introspect::member_name_of_accessor;
pub(crate) use serialize::serialize_bean;

use crate::linker::{Direction, Linker};
use crate::symbols::{DependencyVisitor, Symbol};
use typecodec_common::ProblemReporter;
use typecodec_types::{ClassTable, TypeExpr};

pub(crate) fn is_inline_bean(table: &ClassTable, ty: &TypeExpr) -> bool {
    if ty.is_array() {
        return false;
    }
    ty.class_id().is_some_and(|id| {
        let annotations = &table.class(id).annotations;
        annotations.serializable && annotations.inline && !table.is_enum(id)
    })
}

/// Report the property types of `ty` in both directions. Subtypes and
/// unwrapped properties are reported as bean elements so that the
/// dependency walk sees every edge.
pub(crate) fn visit_bean_dependencies(linker: &Linker<'_>, ty: &TypeExpr, visitor: &mut dyn DependencyVisitor) {
    let mut scratch = ProblemReporter::new();
    for direction in [Direction::Serialize, Direction::Deserialize] {
        let Some(def) = introspect(linker.table(), linker.config(), ty, direction, &mut scratch) else {
            continue;
        };
        if let Some(subtyping) = &def.subtyping {
            for sub in &subtyping.subtypes {
                let segment = linker.table().class(sub.class).simple_name().to_owned();
                visitor.visit_structure_element(&Symbol::Bean, &sub.ty, &segment);
            }
        }
        for prop in def.all_props() {
            if prop.unwrapped {
                visitor.visit_structure_element(&Symbol::Bean, &prop.ty, &prop.member);
            } else {
                visitor.visit_structure_element(&prop.symbol(linker), &prop.ty, &prop.member);
            }
        }
    }
}
