//! Bean introspection.
//!
//! Builds a [`BeanDefinition`] from the declared members of a class and its
//! superclasses. Members contributing to the same property (field, getter,
//! setter, creator parameter) are grouped by member name and their
//! annotations merged; the first explicit value wins.
//!
//! | Member | Readable | Writable |
//! |--------|----------|----------|
//! | public field | yes | unless `final` |
//! | `getX()` / `isX()` | yes | no |
//! | `setX(v)` | no | yes |
//! | record component | yes | via the canonical constructor |
//! | creator parameter | no | via the creator |
//!
//! Definitions are built per direction and never cached: a getter and a
//! setter of one property may disagree on its type.

use super::definition::{Accessor, BeanDefinition, Creator, Property, Subtype, Subtyping};
use crate::config::GeneratorConfig;
use crate::linker::{Direction, capture_wildcards};
use crate::plan::CreatorCall;
use indexmap::IndexMap;
use tracing::{debug, trace};
use typecodec_common::limits::MAX_HIERARCHY_DEPTH;
use typecodec_common::{ProblemCode, ProblemReporter};
use typecodec_types::{
    ClassDecl, ClassId, ClassKind, ClassTable, Inclusion, MemberAnnotations, MethodElement, Modifiers, Name,
    ParameterElement, SubtypeShape, TypeExpr, TypeVar, VarOwner, well_known,
};

/// Introspect `ty` for one direction. `None` if `ty` is not a class type.
///
/// Problems (duplicate names, bad annotations, invalid subtyping) go to
/// `problems`; the returned definition leaves the offending part out.
pub fn introspect(
    table: &ClassTable,
    config: GeneratorConfig,
    ty: &TypeExpr,
    direction: Direction,
    problems: &mut ProblemReporter,
) -> Option<BeanDefinition> {
    let class = ty.class_id()?;
    if ty.is_array() || table.is_primitive(class) || table.is_enum(class) {
        return None;
    }
    let decl = table.class(class);
    let mut scan = Scan {
        table,
        bean: ty,
        decl,
        groups: IndexMap::new(),
    };
    for owner in hierarchy(table, class) {
        scan.collect_members(owner);
    }

    let creator = match direction {
        Direction::Deserialize => scan.find_creator(problems),
        Direction::Serialize => None,
    };
    if let Some(candidate) = &creator {
        scan.add_creator_params(&candidate.params);
    }

    let class_inclusion = decl.annotations.inclusion.unwrap_or(config.inclusion);
    let mut def = BeanDefinition {
        class,
        class_name: decl.name.clone(),
        ty: ty.clone(),
        direction,
        creator: None,
        creator_props: Vec::new(),
        delegating_prop: None,
        value_prop: None,
        props: Vec::new(),
        subtyping: None,
        ignore_unknown: decl.annotations.ignore_unknown.unwrap_or(config.ignore_unknown),
        ignored: decl.annotations.ignored_properties.clone(),
    };

    match direction {
        Direction::Serialize => scan.readable_properties(&mut def, class_inclusion, problems),
        Direction::Deserialize => {
            if let Some(candidate) = creator {
                scan.creator_properties(&mut def, candidate, class_inclusion);
            }
            scan.writable_properties(&mut def, class_inclusion);
        }
    }
    check_unwrapped(table, &mut def, problems);
    check_duplicate_names(&def, problems);
    def.subtyping = subtyping(table, decl, class, problems);

    debug!(
        target: "typecodec::introspect",
        class = %decl.name,
        ?direction,
        props = def.props.len(),
        creator_props = def.creator_props.len(),
        has_creator = def.creator.is_some(),
        "introspected bean"
    );
    Some(def)
}

/// Superclass chain from the topmost user superclass down to `class`.
fn hierarchy(table: &ClassTable, class: ClassId) -> Vec<ClassId> {
    let mut chain = vec![class];
    let mut current = class;
    while chain.len() < MAX_HIERARCHY_DEPTH as usize {
        let Some(parent) = table.class(current).supertype.as_ref().and_then(TypeExpr::class_id) else {
            break;
        };
        if parent == well_known::OBJECT || chain.contains(&parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain.reverse();
    chain
}

// =============================================================================
// Member scan
// =============================================================================

#[derive(Clone, Debug)]
struct FieldInfo {
    ty: TypeExpr,
    public: bool,
    writable: bool,
}

#[derive(Clone, Debug, Default)]
struct MemberGroup {
    field: Option<FieldInfo>,
    getter: Option<(Name, TypeExpr)>,
    setter: Option<(Name, TypeExpr)>,
    creator_param: Option<(usize, TypeExpr)>,
    annotations: MemberAnnotations,
}

struct CreatorCandidate {
    call: CreatorCall,
    params: Vec<ParameterElement>,
    explicit: bool,
}

struct Scan<'t> {
    table: &'t ClassTable,
    bean: &'t TypeExpr,
    decl: &'t ClassDecl,
    groups: IndexMap<Name, MemberGroup>,
}

impl Scan<'_> {
    fn group(&mut self, member: Name, annotations: &MemberAnnotations) -> &mut MemberGroup {
        let group = self.groups.entry(member).or_default();
        merge_annotations(&mut group.annotations, annotations);
        group
    }

    fn collect_members(&mut self, owner: ClassId) {
        let table = self.table;
        let decl = table.class(owner);
        let record = decl.kind == ClassKind::Record;

        for field in &decl.fields {
            if field.modifiers.contains(Modifiers::STATIC) || field.modifiers.contains(Modifiers::TRANSIENT) {
                continue;
            }
            let ty = member_type(table, self.bean, owner, &field.ty);
            let public = field.modifiers.contains(Modifiers::PUBLIC) || record;
            let writable = public && !record && !field.modifiers.contains(Modifiers::FINAL);
            let group = self.group(field.name.clone(), &field.annotations);
            group.field = Some(FieldInfo { ty, public, writable });
        }

        for method in &decl.methods {
            if method.is_static() || !method.is_public() {
                continue;
            }
            if let Some(member) = getter_member(decl, method) {
                let Some(ret) = &method.return_type else { continue };
                let ty = member_type(table, self.bean, owner, ret);
                let group = self.group(member, &method.annotations);
                group.getter = Some((method.name.clone(), ty));
            } else if let Some(member) = setter_member(method) {
                let ty = member_type(table, self.bean, owner, &method.params[0].ty);
                let group = self.group(member, &method.annotations);
                group.setter = Some((method.name.clone(), ty));
            }
        }
    }

    fn find_creator(&self, problems: &mut ProblemReporter) -> Option<CreatorCandidate> {
        let decl = self.decl;
        if decl.is_abstract() || !matches!(decl.kind, ClassKind::Class | ClassKind::Record) {
            return None;
        }
        let class = self.bean.class_id()?;

        let mut explicit: Vec<CreatorCandidate> = decl
            .constructors
            .iter()
            .filter(|ctor| ctor.annotations.creator)
            .map(|ctor| CreatorCandidate {
                call: CreatorCall::Constructor,
                params: ctor.params.clone(),
                explicit: true,
            })
            .collect();
        explicit.extend(
            decl.methods
                .iter()
                .filter(|m| m.annotations.creator && m.is_static())
                .filter(|m| m.return_type.as_ref().and_then(TypeExpr::class_id) == Some(class))
                .map(|m| CreatorCandidate {
                    call: CreatorCall::Factory { method: m.name.clone() },
                    params: m.params.clone(),
                    explicit: true,
                }),
        );
        if explicit.len() > 1 {
            problems.fail(
                ProblemCode::InvalidAnnotation,
                decl.name.to_string(),
                "More than one creator is annotated",
            );
            return None;
        }
        if let Some(candidate) = explicit.pop() {
            return Some(candidate);
        }

        let public: Vec<&MethodElement> = decl.constructors.iter().filter(|c| c.is_public()).collect();
        let implicit = |params: Vec<ParameterElement>| CreatorCandidate {
            call: CreatorCall::Constructor,
            params,
            explicit: false,
        };
        if decl.constructors.is_empty() {
            return Some(match decl.kind {
                ClassKind::Record => implicit(
                    decl.fields
                        .iter()
                        .filter(|f| !f.modifiers.contains(Modifiers::STATIC))
                        .map(|f| ParameterElement::new(&f.name, f.ty.clone()))
                        .collect(),
                ),
                _ => implicit(Vec::new()),
            });
        }
        if let Some(no_args) = public.iter().find(|c| c.params.is_empty()) {
            return Some(implicit(no_args.params.clone()));
        }
        match public.as_slice() {
            [single] => Some(implicit(single.params.clone())),
            _ => None,
        }
    }

    fn add_creator_params(&mut self, params: &[ParameterElement]) {
        let owner = self.decl_id();
        for (index, param) in params.iter().enumerate() {
            let ty = member_type(self.table, self.bean, owner, &param.ty);
            let group = self.group(param.name.clone(), &param.annotations);
            group.creator_param = Some((index, ty));
        }
    }

    fn decl_id(&self) -> ClassId {
        self.bean.class_id().unwrap_or(well_known::OBJECT)
    }

    fn is_ignored(&self, def: &BeanDefinition, member: &Name, group: &MemberGroup) -> bool {
        let name = group.annotations.property.as_ref().unwrap_or(member);
        group.annotations.ignore || def.ignored.contains(name) || def.ignored.contains(member)
    }

    fn readable_properties(&self, def: &mut BeanDefinition, inclusion: Inclusion, problems: &mut ProblemReporter) {
        for (member, group) in &self.groups {
            if self.is_ignored(def, member, group) {
                continue;
            }
            let (ty, accessor) = match (&group.getter, &group.field) {
                (Some((method, ty)), _) => (ty.clone(), Accessor::Getter { method: method.clone() }),
                (None, Some(field)) if field.public => (field.ty.clone(), Accessor::Field),
                _ => continue,
            };
            let prop = build_property(member, group, ty, accessor, inclusion, false);
            if group.annotations.value {
                if def.value_prop.is_some() {
                    problems.fail(
                        ProblemCode::InvalidAnnotation,
                        format!("{}#{member}", def.class_name),
                        "More than one value property",
                    );
                    continue;
                }
                def.value_prop = Some(prop);
            } else {
                trace!(target: "typecodec::introspect", member = %member, "readable property");
                def.props.push(prop);
            }
        }
    }

    fn creator_properties(&self, def: &mut BeanDefinition, candidate: CreatorCandidate, inclusion: Inclusion) {
        let params: Vec<Name> = candidate.params.iter().map(|p| p.name.clone()).collect();
        let delegating = candidate.explicit
            && matches!(candidate.params.as_slice(), [param] if param.annotations.property.is_none()
                && self.groups.get(&param.name).is_none_or(|g| g.field.is_none() && g.getter.is_none() && g.setter.is_none()));

        for param in &candidate.params {
            let Some(group) = self.groups.get(&param.name) else { continue };
            let Some((index, ty)) = group.creator_param.clone() else { continue };
            let optional = ty.class_id() == Some(well_known::OPTIONAL);
            let required = group.annotations.nullable != Some(true) && !optional;
            let prop = build_property(
                &param.name,
                group,
                ty,
                Accessor::CreatorParam { index },
                inclusion,
                required,
            );
            if delegating {
                def.delegating_prop = Some(prop);
            } else {
                def.creator_props.push(prop);
            }
        }
        def.creator = Some(Creator {
            call: candidate.call,
            params,
        });
    }

    fn writable_properties(&self, def: &mut BeanDefinition, inclusion: Inclusion) {
        for (member, group) in &self.groups {
            if group.creator_param.is_some() || self.is_ignored(def, member, group) {
                continue;
            }
            let (ty, accessor) = match (&group.setter, &group.field) {
                (Some((method, ty)), _) => (ty.clone(), Accessor::Setter { method: method.clone() }),
                (None, Some(field)) if field.writable => (field.ty.clone(), Accessor::Field),
                _ => continue,
            };
            def.props.push(build_property(member, group, ty, accessor, inclusion, false));
        }
    }
}

fn build_property(
    member: &Name,
    group: &MemberGroup,
    ty: TypeExpr,
    accessor: Accessor,
    inclusion: Inclusion,
    required: bool,
) -> Property {
    let annotations = &group.annotations;
    Property {
        name: annotations.property.clone().unwrap_or_else(|| member.clone()),
        member: member.clone(),
        ty,
        accessor,
        nullable: annotations.nullable,
        aliases: annotations.aliases.clone(),
        inclusion: annotations.inclusion.unwrap_or(inclusion),
        unwrapped: annotations.unwrapped,
        required,
        permit_recursive: annotations.permit_recursive_serialization,
    }
}

fn merge_annotations(into: &mut MemberAnnotations, from: &MemberAnnotations) {
    if into.property.is_none() {
        into.property = from.property.clone();
    }
    for alias in &from.aliases {
        if !into.aliases.contains(alias) {
            into.aliases.push(alias.clone());
        }
    }
    if into.nullable.is_none() {
        into.nullable = from.nullable;
    }
    if into.inclusion.is_none() {
        into.inclusion = from.inclusion;
    }
    into.ignore |= from.ignore;
    into.unwrapped |= from.unwrapped;
    into.value |= from.value;
    into.permit_recursive_serialization |= from.permit_recursive_serialization;
}

// =============================================================================
// Accessor names
// =============================================================================

fn getter_member(decl: &ClassDecl, method: &MethodElement) -> Option<Name> {
    if !method.params.is_empty() || method.is_constructor() {
        return None;
    }
    let ret = method.return_type.as_ref()?;
    if decl.kind == ClassKind::Record && decl.fields.iter().any(|f| f.name == method.name) {
        return Some(method.name.clone());
    }
    let name = &*method.name;
    if let Some(rest) = name.strip_prefix("get") {
        if let Some(member) = accessor_suffix(rest) {
            return Some(member);
        }
    }
    if let Some(rest) = name.strip_prefix("is") {
        let boolean = matches!(ret.class_id(), Some(well_known::BOOLEAN | well_known::BOXED_BOOLEAN));
        if boolean {
            if let Some(member) = accessor_suffix(rest) {
                return Some(member);
            }
        }
    }
    method.annotations.is_explicit_property().then(|| method.name.clone())
}

fn setter_member(method: &MethodElement) -> Option<Name> {
    if method.params.len() != 1 || method.is_constructor() {
        return None;
    }
    if let Some(member) = method.name.strip_prefix("set").and_then(accessor_suffix) {
        return Some(member);
    }
    method.annotations.is_explicit_property().then(|| method.name.clone())
}

/// `Name` -> `name`, `URL` -> `URL`.
fn accessor_suffix(rest: &str) -> Option<Name> {
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    if chars.next().is_some_and(char::is_uppercase) {
        return Some(Name::from(rest));
    }
    let mut member = first.to_lowercase().collect::<String>();
    member.push_str(&rest[first.len_utf8()..]);
    Some(Name::from(member))
}

/// Strip an accessor prefix the same way property discovery does.
pub(crate) fn member_name_of_accessor(method: &str) -> String {
    for prefix in ["get", "set", "is"] {
        if let Some(member) = method.strip_prefix(prefix).and_then(accessor_suffix) {
            return member.to_string();
        }
    }
    method.to_owned()
}

// =============================================================================
// Member types
// =============================================================================

/// Type of a member declared on `owner`, seen from the bean type `bean`.
///
/// The owner's type variables are bound through the bean's
/// parameterization of `owner`. A raw bean erases them, and method-level
/// variables are erased too.
fn member_type(table: &ClassTable, bean: &TypeExpr, owner: ClassId, declared: &TypeExpr) -> TypeExpr {
    let generic_owner = !table.class(owner).type_params.is_empty();
    let bindings: Option<Vec<(TypeVar, TypeExpr)>> = if generic_owner {
        match bean.find_parameterization(table, &TypeExpr::Raw(owner)) {
            Some(TypeExpr::Parameterized(p)) => Some(
                table
                    .type_variables(owner)
                    .into_iter()
                    .zip(p.params.iter().map(capture_wildcards))
                    .collect(),
            ),
            _ => None,
        }
    } else {
        Some(Vec::new())
    };
    let mut lookup = |var: &TypeVar| -> Option<TypeExpr> {
        match &var.owner {
            VarOwner::Method { .. } => None,
            VarOwner::Class(id) if *id == owner => bindings
                .as_ref()?
                .iter()
                .find(|(bound, _)| bound == var)
                .map(|(_, ty)| ty.clone()),
            VarOwner::Class(_) => Some(TypeExpr::Variable(var.clone())),
        }
    };
    declared
        .fold_type_variables_eager(table, &mut lookup)
        .unwrap_or_else(|| declared.erasure(table))
}

// =============================================================================
// Checks
// =============================================================================

fn check_unwrapped(table: &ClassTable, def: &mut BeanDefinition, problems: &mut ProblemReporter) {
    let class_name = def.class_name.clone();
    let props = def.creator_props.iter_mut().chain(def.props.iter_mut());
    for prop in props.filter(|p| p.unwrapped) {
        let valid = prop
            .ty
            .class_id()
            .is_some_and(|id| !prop.ty.is_array() && table.class(id).annotations.serializable && !table.is_enum(id));
        if !valid {
            problems.fail(
                ProblemCode::InvalidUnwrapped,
                format!("{class_name}#{}", prop.member),
                format!("Unwrapped property type {} is not a serializable bean", prop.ty.display(table)),
            );
            prop.unwrapped = false;
        }
    }
}

fn check_duplicate_names(def: &BeanDefinition, problems: &mut ProblemReporter) {
    let mut seen: IndexMap<Name, Name> = IndexMap::new();
    for prop in def.creator_props.iter().chain(def.props.iter()) {
        if prop.unwrapped {
            continue;
        }
        for label in prop.labels() {
            if let Some(previous) = seen.insert(label.clone(), prop.member.clone()) {
                if previous != prop.member {
                    problems.fail(
                        ProblemCode::DuplicatePropertyName,
                        format!("{}#{}", def.class_name, prop.member),
                        format!("Property name {label} is also used by {previous}"),
                    );
                }
            }
        }
    }
}

fn subtyping(table: &ClassTable, decl: &ClassDecl, class: ClassId, problems: &mut ProblemReporter) -> Option<Subtyping> {
    let info = decl.annotations.subtyping.as_ref()?;
    let base = TypeExpr::Raw(class);
    let mut subtypes: Vec<Subtype> = Vec::with_capacity(info.subtypes.len());
    let mut valid = true;
    for sub in &info.subtypes {
        let sub_ty = TypeExpr::Raw(sub.class);
        let sub_decl = table.class(sub.class);
        if sub.class == class || !base.is_assignable_from(table, &sub_ty, false) {
            problems.fail(
                ProblemCode::InvalidSubtyping,
                decl.name.to_string(),
                format!("{} is not a subtype of {}", sub_decl.name, decl.name),
            );
            valid = false;
            continue;
        }
        let names = if sub.names.is_empty() {
            vec![
                sub_decl
                    .annotations
                    .type_name
                    .clone()
                    .unwrap_or_else(|| Name::from(sub_decl.simple_name())),
            ]
        } else {
            sub.names.clone()
        };
        if let Some(clash) = names
            .iter()
            .find(|name| subtypes.iter().any(|other| other.names.contains(name)))
        {
            problems.fail(
                ProblemCode::InvalidSubtyping,
                decl.name.to_string(),
                format!("Type name {clash} is used by more than one subtype"),
            );
            valid = false;
        }
        subtypes.push(Subtype {
            class: sub.class,
            ty: sub_ty,
            names,
        });
    }
    let default_impl = match info.default_impl {
        Some(default) => match subtypes.iter().position(|s| s.class == default) {
            Some(index) => Some(index),
            None => {
                problems.fail(
                    ProblemCode::InvalidSubtyping,
                    decl.name.to_string(),
                    format!("Default implementation {} is not a listed subtype", table.name(default)),
                );
                valid = false;
                None
            }
        },
        None => None,
    };
    if info.shape == SubtypeShape::Deduction && info.default_impl.is_some() {
        debug!(target: "typecodec::introspect", class = %decl.name, "default implementation unused for deduction");
    }
    if !valid || subtypes.is_empty() {
        return None;
    }
    Some(Subtyping {
        shape: info.shape,
        property: info.property.clone(),
        subtypes,
        default_impl,
    })
}

#[cfg(test)]
#[path = "../../tests/introspect_tests.rs"]
mod introspect_tests;
