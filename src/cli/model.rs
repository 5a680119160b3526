//! JSON model descriptors.
//!
//! The CLI has no language front end of its own. The classes it generates
//! codecs for are described in a JSON file whose type strings use the
//! signature syntax of [`typecodec_types::parse_type`]:
//!
//! ```json
//! {
//!   "classes": [
//!     {
//!       "name": "com.example.Box",
//!       "typeParams": [{ "name": "T" }],
//!       "annotations": { "serializable": true },
//!       "fields": [{ "name": "value", "type": "T" }]
//!     }
//!   ],
//!   "roots": ["com.example.Box<java.lang.String>"]
//! }
//! ```
//!
//! Classes are declared before any signature is parsed, so descriptors may
//! reference each other in any order. Members without `modifiers` are
//! public instance members.

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::path::Path;

use typecodec_types::{
    ClassAnnotations, ClassId, ClassKind, ClassTable, FieldElement, Inclusion, MemberAnnotations, MethodElement,
    Modifiers, Name, ParameterElement, SubtypeInfo, SubtypeShape, TypeExpr, TypeParamDecl, TypeVar, VarOwner,
    parse_type, parse_type_in,
};

// =============================================================================
// Descriptor schema
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelDescriptor {
    pub classes: Vec<ClassDescriptor>,
    /// Generation roots besides the non-generic serializable beans,
    /// typically concrete parameterizations of generic beans.
    pub roots: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: KindName,
    #[serde(default)]
    pub type_params: Vec<TypeParamDescriptor>,
    #[serde(default)]
    pub supertype: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Added to the modifiers implied by the kind.
    #[serde(default)]
    pub modifiers: Vec<ModifierName>,
    #[serde(default)]
    pub enclosing: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default)]
    pub constructors: Vec<MethodDescriptor>,
    #[serde(default)]
    pub constants: Vec<String>,
    #[serde(default)]
    pub annotations: ClassAnnotationsDescriptor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindName {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
}

impl KindName {
    fn to_kind(self) -> ClassKind {
        match self {
            KindName::Class => ClassKind::Class,
            KindName::Interface => ClassKind::Interface,
            KindName::Enum => ClassKind::Enum,
            KindName::Record => ClassKind::Record,
        }
    }
}

/// `private` only documents the absence of `public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierName {
    Public,
    Private,
    Static,
    Final,
    Abstract,
    Transient,
}

fn modifiers_of(names: &[ModifierName]) -> Modifiers {
    names.iter().fold(Modifiers::empty(), |acc, name| {
        acc | match name {
            ModifierName::Public => Modifiers::PUBLIC,
            ModifierName::Private => Modifiers::empty(),
            ModifierName::Static => Modifiers::STATIC,
            ModifierName::Final => Modifiers::FINAL,
            ModifierName::Abstract => Modifiers::ABSTRACT,
            ModifierName::Transient => Modifiers::TRANSIENT,
        }
    })
}

/// Absent member modifiers mean `public`.
fn member_modifiers(names: Option<&[ModifierName]>) -> Modifiers {
    names.map_or(Modifiers::PUBLIC, modifiers_of)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeParamDescriptor {
    pub name: String,
    #[serde(default)]
    pub bounds: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub modifiers: Option<Vec<ModifierName>>,
    #[serde(default)]
    pub annotations: MemberAnnotations,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub annotations: MemberAnnotations,
}

/// A method or, inside `constructors`, a constructor (its name is ignored).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MethodDescriptor {
    pub name: String,
    pub type_params: Vec<TypeParamDescriptor>,
    pub params: Vec<ParameterDescriptor>,
    pub returns: Option<String>,
    pub modifiers: Option<Vec<ModifierName>>,
    pub annotations: MemberAnnotations,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassAnnotationsDescriptor {
    pub serializable: bool,
    pub inline: bool,
    pub ignore_unknown: Option<bool>,
    pub ignored_properties: Vec<String>,
    pub inclusion: Option<Inclusion>,
    pub subtyping: Option<SubtypingDescriptor>,
    pub type_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtypingDescriptor {
    #[serde(rename = "as")]
    pub shape: SubtypeShape,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub subtypes: Vec<SubtypeDescriptor>,
    #[serde(default)]
    pub default_impl: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtypeDescriptor {
    pub class: String,
    #[serde(default)]
    pub names: Vec<String>,
}

// =============================================================================
// Loading
// =============================================================================

/// A loaded element model and the types `check` generates.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub table: ClassTable,
    pub roots: Vec<TypeExpr>,
}

impl LoadedModel {
    pub fn parse_type(&self, text: &str) -> Result<TypeExpr> {
        parse_type(&self.table, text).with_context(|| format!("invalid type '{text}'"))
    }
}

pub fn load_model(path: &Path) -> Result<LoadedModel> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read model: {}", path.display()))?;
    parse_model(&source).with_context(|| format!("failed to load model: {}", path.display()))
}

pub fn parse_model(source: &str) -> Result<LoadedModel> {
    let descriptor: ModelDescriptor = serde_json::from_str(source).context("invalid model descriptor")?;
    build_model(&descriptor)
}

pub fn build_model(descriptor: &ModelDescriptor) -> Result<LoadedModel> {
    let mut table = ClassTable::new();

    let mut ids = Vec::with_capacity(descriptor.classes.len());
    for class in &descriptor.classes {
        if table.lookup(&class.name).is_some() {
            bail!("class {} is declared twice", class.name);
        }
        let id = table.declare(&class.name, class.kind.to_kind());
        for param in &class.type_params {
            table.add_type_param(id, &param.name, Vec::new());
        }
        ids.push(id);
    }

    for (class, &id) in descriptor.classes.iter().zip(&ids) {
        fill_class(&mut table, id, class).with_context(|| format!("class {}", class.name))?;
    }

    let mut roots: Vec<TypeExpr> = table
        .user_ids()
        .filter(|&id| {
            let decl = table.class(id);
            decl.annotations.serializable && !table.is_enum(id) && decl.type_params.is_empty()
        })
        .map(TypeExpr::Raw)
        .collect();
    for root in &descriptor.roots {
        let ty = parse_type(&table, root).with_context(|| format!("root {root}"))?;
        if !roots.contains(&ty) {
            roots.push(ty);
        }
    }

    tracing::debug!(
        target: "typecodec::cli",
        classes = descriptor.classes.len(),
        roots = roots.len(),
        "model loaded"
    );
    Ok(LoadedModel { table, roots })
}

fn fill_class(table: &mut ClassTable, id: ClassId, class: &ClassDescriptor) -> Result<()> {
    let scope = table.type_variables(id);

    let bounds = class
        .type_params
        .iter()
        .map(|param| parse_all(table, &param.bounds, &scope).with_context(|| format!("type parameter {}", param.name)))
        .collect::<Result<Vec<_>>>()?;
    let supertype = class
        .supertype
        .as_deref()
        .map(|text| parse_in(table, text, &scope))
        .transpose()
        .context("supertype")?;
    let interfaces = parse_all(table, &class.interfaces, &scope).context("interfaces")?;
    let enclosing = class
        .enclosing
        .as_deref()
        .map(|name| lookup_class(table, name))
        .transpose()
        .context("enclosing class")?;

    let fields = class
        .fields
        .iter()
        .map(|field| {
            let ty = parse_in(table, &field.ty, &scope).with_context(|| format!("field {}", field.name))?;
            Ok(FieldElement::new(&field.name, ty)
                .with_modifiers(member_modifiers(field.modifiers.as_deref()))
                .with_annotations(field.annotations.clone()))
        })
        .collect::<Result<Vec<_>>>()?;
    let methods = class
        .methods
        .iter()
        .map(|method| build_method(table, id, &scope, method, false).with_context(|| format!("method {}", method.name)))
        .collect::<Result<Vec<_>>>()?;
    let constructors = class
        .constructors
        .iter()
        .enumerate()
        .map(|(index, ctor)| build_method(table, id, &scope, ctor, true).with_context(|| format!("constructor #{index}")))
        .collect::<Result<Vec<_>>>()?;
    let annotations = build_class_annotations(table, &class.annotations).context("annotations")?;

    let decl = table.class_mut(id);
    for (param, bounds) in decl.type_params.iter_mut().zip(bounds) {
        param.bounds = bounds;
    }
    if supertype.is_some() {
        decl.supertype = supertype;
    }
    decl.interfaces = interfaces;
    decl.enclosing = enclosing;
    decl.modifiers |= modifiers_of(&class.modifiers);
    decl.fields = fields;
    decl.methods = methods;
    decl.constructors = constructors;
    decl.enum_constants = class.constants.iter().map(|c| Name::from(c.as_str())).collect();
    decl.annotations = annotations;
    Ok(())
}

fn build_method(
    table: &ClassTable,
    class: ClassId,
    class_scope: &[TypeVar],
    method: &MethodDescriptor,
    constructor: bool,
) -> Result<MethodElement> {
    let name = if constructor {
        MethodElement::CONSTRUCTOR_NAME
    } else if method.name.is_empty() {
        bail!("method without a name");
    } else {
        method.name.as_str()
    };

    let mut scope = class_scope.to_vec();
    scope.extend(method.type_params.iter().map(|param| {
        TypeVar::new(
            VarOwner::Method {
                class,
                method: Name::from(name),
            },
            &param.name,
        )
    }));
    let type_params = method
        .type_params
        .iter()
        .map(|param| {
            Ok(TypeParamDecl {
                name: Name::from(param.name.as_str()),
                bounds: parse_all(table, &param.bounds, &scope)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let params = method
        .params
        .iter()
        .map(|param| {
            let ty = parse_in(table, &param.ty, &scope).with_context(|| format!("parameter {}", param.name))?;
            Ok(ParameterElement::new(&param.name, ty).with_annotations(param.annotations.clone()))
        })
        .collect::<Result<Vec<_>>>()?;
    let return_type = match (constructor, method.returns.as_deref()) {
        (true, _) | (false, None) => None,
        (false, Some(text)) => Some(parse_in(table, text, &scope).context("return type")?),
    };

    let mut element = MethodElement::new(name, params, return_type)
        .with_modifiers(member_modifiers(method.modifiers.as_deref()))
        .with_annotations(method.annotations.clone());
    element.type_params = type_params;
    Ok(element)
}

fn build_class_annotations(table: &ClassTable, descriptor: &ClassAnnotationsDescriptor) -> Result<ClassAnnotations> {
    let subtyping = descriptor
        .subtyping
        .as_ref()
        .map(|subtyping| build_subtyping(table, subtyping))
        .transpose()
        .context("subtyping")?;
    Ok(ClassAnnotations {
        serializable: descriptor.serializable,
        inline: descriptor.inline,
        ignore_unknown: descriptor.ignore_unknown,
        ignored_properties: descriptor
            .ignored_properties
            .iter()
            .map(|name| Name::from(name.as_str()))
            .collect(),
        inclusion: descriptor.inclusion,
        subtyping,
        type_name: descriptor.type_name.as_deref().map(Name::from),
    })
}

fn build_subtyping(table: &ClassTable, descriptor: &SubtypingDescriptor) -> Result<SubtypeInfo> {
    let mut info = SubtypeInfo::new(descriptor.shape);
    if let Some(property) = &descriptor.property {
        info = info.with_property(property);
    }
    for subtype in &descriptor.subtypes {
        let class = lookup_class(table, &subtype.class)?;
        let names: Vec<&str> = subtype.names.iter().map(String::as_str).collect();
        info = info.with_subtype(class, &names);
    }
    info.default_impl = descriptor
        .default_impl
        .as_deref()
        .map(|name| lookup_class(table, name))
        .transpose()?;
    Ok(info)
}

fn lookup_class(table: &ClassTable, name: &str) -> Result<ClassId> {
    table
        .lookup(name)
        .or_else(|| table.lookup_simple(name))
        .ok_or_else(|| anyhow!("unknown class '{name}'"))
}

fn parse_in(table: &ClassTable, text: &str, scope: &[TypeVar]) -> Result<TypeExpr> {
    parse_type_in(table, text, scope).with_context(|| format!("invalid type '{text}'"))
}

fn parse_all(table: &ClassTable, texts: &[String], scope: &[TypeVar]) -> Result<Vec<TypeExpr>> {
    texts.iter().map(|text| parse_in(table, text, scope)).collect()
}
