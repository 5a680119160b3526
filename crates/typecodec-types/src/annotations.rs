//! Codec-relevant annotations attached to declared elements.
//!
//! The front end resolves annotations; this crate only stores the parts the
//! generator reads. Every field defaults to "not annotated".

use crate::def::{ClassId, Name};
use serde::{Deserialize, Serialize};

/// Value inclusion policy for serialization (`@JsonInclude`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Inclusion {
    #[default]
    Always,
    NonNull,
    NonAbsent,
    NonEmpty,
    NonDefault,
}

/// How the concrete subtype of a polymorphic bean appears on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubtypeShape {
    /// `{"Tag": {...}}`
    WrapperObject,
    /// `["Tag", {...}]`
    WrapperArray,
    /// `{"@type": "Tag", ...}`
    Property,
    /// No tag; the subtype is deduced from the keys present.
    Deduction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtypeDecl {
    pub class: ClassId,
    /// Wire names. Empty means "type name annotation, else simple name".
    pub names: Vec<Name>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtypeInfo {
    pub shape: SubtypeShape,
    /// Tag property name for [`SubtypeShape::Property`].
    pub property: Name,
    pub subtypes: Vec<SubtypeDecl>,
    pub default_impl: Option<ClassId>,
}

impl SubtypeInfo {
    pub fn new(shape: SubtypeShape) -> Self {
        Self {
            shape,
            property: Name::from("@type"),
            subtypes: Vec::new(),
            default_impl: None,
        }
    }

    pub fn with_subtype(mut self, class: ClassId, names: &[&str]) -> Self {
        self.subtypes.push(SubtypeDecl {
            class,
            names: names.iter().map(|n| Name::from(*n)).collect(),
        });
        self
    }

    pub fn with_property(mut self, property: &str) -> Self {
        self.property = Name::from(property);
        self
    }
}

/// Class-level annotations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassAnnotations {
    /// Marks a type for which a codec is generated.
    pub serializable: bool,
    /// With `serializable`: emit the codec logic at each use site instead
    /// of referencing a standalone codec.
    pub inline: bool,
    pub ignore_unknown: Option<bool>,
    /// `@JsonIgnoreProperties({"a", "b"})`
    pub ignored_properties: Vec<Name>,
    pub inclusion: Option<Inclusion>,
    pub subtyping: Option<SubtypeInfo>,
    /// `@JsonTypeName`
    pub type_name: Option<Name>,
}

/// Member-level annotations (fields, methods, parameters).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberAnnotations {
    /// `@JsonProperty("name")`
    pub property: Option<Name>,
    /// `@JsonAlias`
    pub aliases: Vec<Name>,
    pub ignore: bool,
    pub unwrapped: bool,
    /// `Some(true)` for `@Nullable`, `Some(false)` for `@NonNull`.
    pub nullable: Option<bool>,
    pub inclusion: Option<Inclusion>,
    /// `@JsonCreator` on a constructor or static factory.
    pub creator: bool,
    /// `@JsonValue` on a getter or field.
    pub value: bool,
    pub permit_recursive_serialization: bool,
}

impl MemberAnnotations {
    pub fn named(name: &str) -> Self {
        Self {
            property: Some(Name::from(name)),
            ..Self::default()
        }
    }

    /// Whether this member is explicitly exposed as a property.
    pub fn is_explicit_property(&self) -> bool {
        self.property.is_some() || self.unwrapped || self.value
    }
}
