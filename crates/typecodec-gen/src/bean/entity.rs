//! Deserialization planning for beans.
//!
//! A bean definition is turned into a tree of entities before any
//! statement is emitted:
//!
//! | Entity | Emits |
//! |--------|-------|
//! | leaf | a default value up front, one read per key occurrence |
//! | structure | nothing on its own; its leaves share the parse loop, its epilogue creates the bean |
//! | unwrapped slot | a nested structure whose keys join the parent's key space |
//!
//! Four plan shapes are built on top:
//!
//! - **delegating**: decode the single creator value, then create.
//! - **structure**: one parse loop over the union of all keys, then the
//!   epilogue.
//! - **wrapper subtyping**: read the tag from a wrapping object or array,
//!   then switch to the subtype's own plan.
//! - **flat subtyping**: one parse loop over the keys of all subtypes,
//!   narrowing a bit set of possible subtypes on every key.

use super::bitset::{DuplicatePropertyManager, InlineBitSet};
use super::definition::{BeanDefinition, Property, Subtyping};
use super::introspect::introspect;
use crate::context::GeneratorContext;
use crate::linker::Direction;
use crate::plan::{Block, Expr, Failure, Local, ScalarKind, Stmt, StructureKind, SwitchCase};
use crate::symbols::{Setter, Symbol};
use indexmap::IndexMap;
use tracing::{debug, trace};
use typecodec_common::ProblemCode;
use typecodec_common::limits::MAX_DEPENDENCY_DEPTH;
use typecodec_runtime::Value;
use typecodec_types::{Name, SubtypeShape, TypeExpr};

pub(crate) fn deserialize_bean(
    ctx: &mut GeneratorContext<'_>,
    ty: &TypeExpr,
    decoder: Local,
    setter: Setter<'_>,
) -> Block {
    let table = ctx.table();
    let config = ctx.config();
    match introspect(table, config, ty, Direction::Deserialize, ctx.problems_mut()) {
        Some(def) => deserialize_definition(ctx, &def, decoder, setter),
        None => {
            let message = format!("{} is not a bean", ty.display(table));
            ctx.fail(ProblemCode::UnsupportedType, message.clone());
            Block::of(Stmt::Fail(Failure::Unsupported { message }))
        }
    }
}

/// Whether a deserializer can be planned for `def`.
pub(crate) fn supports_deserialization(def: &BeanDefinition) -> bool {
    def.creator.is_some() || def.subtyping.is_some()
}

fn deserialize_definition(
    ctx: &mut GeneratorContext<'_>,
    def: &BeanDefinition,
    decoder: Local,
    setter: Setter<'_>,
) -> Block {
    if let Some(subtyping) = &def.subtyping {
        return match subtyping.shape {
            SubtypeShape::WrapperObject | SubtypeShape::WrapperArray => {
                plan_wrapper(ctx, subtyping, decoder, setter)
            }
            SubtypeShape::Property | SubtypeShape::Deduction => plan_flat(ctx, def, subtyping, decoder, setter),
        };
    }
    if def.creator.is_none() {
        ctx.fail(
            ProblemCode::NoCreator,
            format!("{} has no usable constructor or creator", def.class_name),
        );
        return Block::of(Stmt::Fail(Failure::Unsupported {
            message: format!("{} cannot be deserialized", def.class_name),
        }));
    }
    if let Some(prop) = &def.delegating_prop {
        return plan_delegating(ctx, def, prop, decoder, setter);
    }
    plan_structure(ctx, def, decoder, setter)
}

fn bean_hint(def: &BeanDefinition) -> String {
    let simple = def.class_name.rsplit('.').next().unwrap_or(&def.class_name);
    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => "bean".to_owned(),
    }
}

// =============================================================================
// Entity tree
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct LeafId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct StructureId(u32);

#[derive(Clone, Debug)]
struct Leaf {
    name: Name,
    labels: Vec<Name>,
    member: Name,
    ty: TypeExpr,
    symbol: Symbol,
    local: Local,
    default: Expr,
}

#[derive(Copy, Clone, Debug)]
enum SlotKind {
    Leaf(LeafId),
    Unwrapped(StructureId),
}

#[derive(Clone, Debug)]
struct Slot {
    prop: Property,
    kind: SlotKind,
}

#[derive(Clone, Debug)]
struct Structure {
    def: BeanDefinition,
    slots: Vec<Slot>,
}

/// Reads tracked for duplicates: one per leaf, plus the type tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum ReadKey {
    Leaf(LeafId),
    Tag,
}

struct Planner<'c, 'a> {
    ctx: &'c mut GeneratorContext<'a>,
    leaves: Vec<Leaf>,
    structures: Vec<Structure>,
    /// Share leaves that are structurally identical (flat subtyping).
    merge: bool,
}

impl<'c, 'a> Planner<'c, 'a> {
    fn new(ctx: &'c mut GeneratorContext<'a>, merge: bool) -> Self {
        Self {
            ctx,
            leaves: Vec::new(),
            structures: Vec::new(),
            merge,
        }
    }

    fn leaf(&self, id: LeafId) -> &Leaf {
        &self.leaves[id.0 as usize]
    }

    fn build_structure(&mut self, def: BeanDefinition, depth: u32) -> StructureId {
        let mut slots = Vec::with_capacity(def.creator_props.len() + def.props.len());
        for prop in def.creator_props.iter().chain(def.props.iter()) {
            let kind = if prop.unwrapped {
                match self.unwrapped_definition(prop, depth) {
                    Some(nested) => SlotKind::Unwrapped(self.build_structure(nested, depth + 1)),
                    None => continue,
                }
            } else {
                SlotKind::Leaf(self.intern_leaf(prop))
            };
            slots.push(Slot {
                prop: prop.clone(),
                kind,
            });
        }
        let id = StructureId(self.structures.len() as u32);
        trace!(target: "typecodec::planner", class = %def.class_name, slots = slots.len(), "structure");
        self.structures.push(Structure { def, slots });
        id
    }

    fn unwrapped_definition(&mut self, prop: &Property, depth: u32) -> Option<BeanDefinition> {
        if depth >= MAX_DEPENDENCY_DEPTH {
            self.ctx.fail(
                ProblemCode::CyclicDependency,
                format!("Unwrapped property {} nests too deeply", prop.member),
            );
            return None;
        }
        let table = self.ctx.table();
        let config = self.ctx.config();
        let nested = introspect(table, config, &prop.ty, Direction::Deserialize, self.ctx.problems_mut())?;
        if nested.creator.is_none() || nested.subtyping.is_some() || nested.delegating_prop.is_some() {
            self.ctx.with_sub_path(&prop.member, |ctx| {
                ctx.fail(
                    ProblemCode::InvalidUnwrapped,
                    format!("{} cannot be unwrapped for deserialization", nested.class_name),
                )
            });
            return None;
        }
        Some(nested)
    }

    fn intern_leaf(&mut self, prop: &Property) -> LeafId {
        let symbol = prop.symbol(self.ctx.linker());
        let labels = prop.labels();
        if self.merge {
            if let Some(index) = self
                .leaves
                .iter()
                .position(|leaf| leaf.labels == labels && leaf.ty == prop.ty && leaf.symbol == symbol)
            {
                return LeafId(index as u32);
            }
        }
        let default = symbol.default_expr(self.ctx.table(), &prop.ty);
        let local = self.ctx.new_local(&prop.member);
        let id = LeafId(self.leaves.len() as u32);
        self.leaves.push(Leaf {
            name: prop.name.clone(),
            labels,
            member: prop.member.clone(),
            ty: prop.ty.clone(),
            symbol,
            local,
            default,
        });
        id
    }

    /// Every leaf under `root`, unwrapped ones included, in slot order.
    fn leaves_of(&self, root: StructureId) -> Vec<LeafId> {
        let mut out = Vec::new();
        self.collect_leaves(root, &mut out);
        out
    }

    fn collect_leaves(&self, id: StructureId, out: &mut Vec<LeafId>) {
        for slot in &self.structures[id.0 as usize].slots {
            match slot.kind {
                SlotKind::Leaf(leaf) => {
                    if !out.contains(&leaf) {
                        out.push(leaf);
                    }
                }
                SlotKind::Unwrapped(child) => self.collect_leaves(child, out),
            }
        }
    }

    /// Wire key to the leaves answering to it.
    fn key_space(&self, leaves: &[LeafId]) -> IndexMap<Name, Vec<LeafId>> {
        let mut keys: IndexMap<Name, Vec<LeafId>> = IndexMap::new();
        for &id in leaves {
            for label in &self.leaf(id).labels {
                let entry = keys.entry(label.clone()).or_default();
                if !entry.contains(&id) {
                    entry.push(id);
                }
            }
        }
        keys
    }

    fn duplicate_manager(&mut self, leaves: &[LeafId], tag: Option<&Name>) -> DuplicatePropertyManager<ReadKey> {
        let mut items: Vec<(ReadKey, Name)> = leaves
            .iter()
            .map(|&id| (ReadKey::Leaf(id), self.leaf(id).name.clone()))
            .collect();
        if let Some(tag) = tag {
            items.push((ReadKey::Tag, tag.clone()));
        }
        DuplicatePropertyManager::new(self.ctx, items)
    }

    /// Leaf defaults followed by the duplicate tracker's masks.
    fn prelude(&self, leaves: &[LeafId], dup: &DuplicatePropertyManager<ReadKey>) -> Block {
        let mut out = Block::new();
        for &id in leaves {
            let leaf = self.leaf(id);
            out.push(Stmt::Let {
                local: leaf.local,
                value: leaf.default.clone(),
            });
        }
        out.append(dup.declarations());
        out
    }

    fn read_leaf(&mut self, id: LeafId, decoder: Local) -> Block {
        let leaf = self.leaf(id).clone();
        let local = leaf.local;
        self.ctx.with_sub_path(&leaf.member, |ctx| {
            leaf.symbol.deserialize(
                ctx,
                &leaf.ty,
                decoder,
                Box::new(move |value| Block::of(Stmt::Let { local, value })),
            )
        })
    }

    /// Required checks, creator call and guarded stores for one structure.
    /// Returns the statements and the local holding the created bean.
    fn epilogue(&mut self, id: StructureId, dup: &DuplicatePropertyManager<ReadKey>) -> (Block, Local) {
        let structure = self.structures[id.0 as usize].clone();
        let mut out = Block::new();

        let mut values = Vec::with_capacity(structure.slots.len());
        for slot in &structure.slots {
            let value = match slot.kind {
                SlotKind::Leaf(leaf) => Expr::Local(self.leaf(leaf).local),
                SlotKind::Unwrapped(child) => {
                    let (block, result) = self.epilogue(child, dup);
                    out.append(block);
                    Expr::Local(result)
                }
            };
            values.push(value);
        }

        let required: Vec<ReadKey> = structure
            .slots
            .iter()
            .filter(|slot| slot.prop.required)
            .filter_map(|slot| match slot.kind {
                SlotKind::Leaf(leaf) => Some(ReadKey::Leaf(leaf)),
                SlotKind::Unwrapped(_) => None,
            })
            .collect();
        out.append(dup.check_required(&required));

        let result = self.ctx.new_local(&bean_hint(&structure.def));
        let Some(creator) = &structure.def.creator else {
            out.push(Stmt::Fail(Failure::Unsupported {
                message: format!("{} cannot be deserialized", structure.def.class_name),
            }));
            return (out, result);
        };
        let args = structure
            .slots
            .iter()
            .zip(values.iter())
            .filter(|(slot, _)| slot.prop.is_creator_param())
            .map(|(slot, value)| (slot.prop.member.clone(), value.clone()))
            .collect();
        out.push(Stmt::Let {
            local: result,
            value: Expr::Construct {
                class: structure.def.class_name.clone(),
                creator: creator.call.clone(),
                args,
            },
        });

        for (slot, value) in structure.slots.iter().zip(values) {
            let Some(store) = slot.prop.write(result, value) else {
                continue;
            };
            match slot.kind {
                SlotKind::Leaf(leaf) => out.push(Stmt::If {
                    cond: dup.has_been_read(&ReadKey::Leaf(leaf)),
                    then: Block::of(store),
                    otherwise: Block::new(),
                }),
                SlotKind::Unwrapped(_) => out.push(store),
            }
        }
        (out, result)
    }
}

fn parse_loop(object: Local, key: Local, cases: Vec<SwitchCase>, default: Block) -> Block {
    Block::from(vec![
        Stmt::Let {
            local: key,
            value: Expr::DecodeKey(object),
        },
        Stmt::If {
            cond: Expr::Local(key).is_null(),
            then: Block::of(Stmt::Break),
            otherwise: Block::new(),
        },
        Stmt::Switch {
            on: Expr::Local(key),
            cases,
            default,
        },
    ])
}

fn unknown_key(def: &BeanDefinition, object: Local, key: Local) -> Block {
    if def.ignore_unknown {
        Block::of(Stmt::SkipValue(object))
    } else {
        Block::of(Stmt::Fail(Failure::UnknownProperty {
            type_name: def.class_name.to_string(),
            key,
        }))
    }
}

/// A case skipping the explicitly ignored keys that no property claims.
fn ignored_case(def: &BeanDefinition, claimed: &IndexMap<Name, Vec<LeafId>>, object: Local) -> Option<SwitchCase> {
    let labels: Vec<Name> = def
        .ignored
        .iter()
        .filter(|name| !claimed.contains_key(*name))
        .cloned()
        .collect();
    (!labels.is_empty()).then(|| SwitchCase {
        labels,
        body: Block::of(Stmt::SkipValue(object)),
    })
}

// =============================================================================
// Delegating
// =============================================================================

fn plan_delegating(
    ctx: &mut GeneratorContext<'_>,
    def: &BeanDefinition,
    prop: &Property,
    decoder: Local,
    setter: Setter<'_>,
) -> Block {
    let symbol = prop.symbol(ctx.linker());
    let value = ctx.new_local(&prop.member);
    let mut out = ctx.with_sub_path(&prop.member, |ctx| {
        symbol.deserialize(
            ctx,
            &prop.ty,
            decoder,
            Box::new(move |decoded| Block::of(Stmt::Let { local: value, value: decoded })),
        )
    });
    let Some(creator) = &def.creator else {
        return out;
    };
    out.append(setter(Expr::Construct {
        class: def.class_name.clone(),
        creator: creator.call.clone(),
        args: vec![(prop.member.clone(), Expr::Local(value))],
    }));
    out
}

// =============================================================================
// Structure
// =============================================================================

fn plan_structure(
    ctx: &mut GeneratorContext<'_>,
    def: &BeanDefinition,
    decoder: Local,
    setter: Setter<'_>,
) -> Block {
    let mut planner = Planner::new(ctx, false);
    let root = planner.build_structure(def.clone(), 0);
    let leaves = planner.leaves_of(root);
    let keys = planner.key_space(&leaves);
    for (label, owners) in &keys {
        if owners.len() > 1 {
            planner.ctx.fail(
                ProblemCode::DuplicatePropertyName,
                format!("Property name {label} is claimed by more than one unwrapped property"),
            );
        }
    }

    let dup = planner.duplicate_manager(&leaves, None);
    let object = planner.ctx.new_local("objectDecoder");
    let key = planner.ctx.new_local("key");
    let mut out = planner.prelude(&leaves, &dup);

    let mut cases = Vec::with_capacity(leaves.len());
    for &id in &leaves {
        let labels: Vec<Name> = planner
            .leaf(id)
            .labels
            .iter()
            .filter(|label| keys.get(*label).and_then(|owners| owners.first()) == Some(&id))
            .cloned()
            .collect();
        if labels.is_empty() {
            continue;
        }
        let mut body = dup.mark_read(&ReadKey::Leaf(id));
        body.append(planner.read_leaf(id, object));
        cases.push(SwitchCase { labels, body });
    }
    cases.extend(ignored_case(def, &keys, object));

    out.push(Stmt::OpenDecoder {
        child: object,
        parent: decoder,
        kind: StructureKind::Object,
    });
    out.push(Stmt::Loop(parse_loop(object, key, cases, unknown_key(def, object, key))));
    out.push(Stmt::FinishDecoder(object));

    let (epilogue, result) = planner.epilogue(root, &dup);
    out.append(epilogue);
    debug!(
        target: "typecodec::planner",
        class = %def.class_name,
        keys = keys.len(),
        "planned structure"
    );
    out.append(setter(Expr::Local(result)));
    out
}

// =============================================================================
// Subtyping
// =============================================================================

fn plan_wrapper(
    ctx: &mut GeneratorContext<'_>,
    subtyping: &Subtyping,
    decoder: Local,
    setter: Setter<'_>,
) -> Block {
    let wrapper = ctx.new_local("wrapperDecoder");
    let tag = ctx.new_local("typeTag");
    let result = ctx.new_local("polymorphic");

    let (kind, read_tag) = match subtyping.shape {
        SubtypeShape::WrapperObject => (
            StructureKind::Object,
            vec![
                Stmt::Let {
                    local: tag,
                    value: Expr::DecodeKey(wrapper),
                },
                Stmt::If {
                    cond: Expr::Local(tag).is_null(),
                    then: Block::of(Stmt::Fail(Failure::MissingTypeTag)),
                    otherwise: Block::new(),
                },
            ],
        ),
        _ => (
            StructureKind::Array,
            vec![Stmt::Let {
                local: tag,
                value: Expr::Decode {
                    decoder: wrapper,
                    kind: ScalarKind::String,
                },
            }],
        ),
    };

    let mut out = Block::of(Stmt::OpenDecoder {
        child: wrapper,
        parent: decoder,
        kind,
    });
    out.append(Block::from(read_tag));
    out.push(Stmt::Let {
        local: result,
        value: Expr::Const(Value::Null),
    });

    let table = ctx.table();
    let config = ctx.config();
    let mut cases = Vec::with_capacity(subtyping.subtypes.len());
    for sub in &subtyping.subtypes {
        let Some(sub_def) = introspect(table, config, &sub.ty, Direction::Deserialize, ctx.problems_mut()) else {
            continue;
        };
        let segment = table.class(sub.class).simple_name().to_owned();
        let body = ctx.with_sub_path(&segment, |ctx| {
            deserialize_definition(
                ctx,
                &sub_def,
                wrapper,
                Box::new(move |value| Block::of(Stmt::Let { local: result, value })),
            )
        });
        cases.push(SwitchCase {
            labels: sub.names.clone(),
            body,
        });
    }
    out.push(Stmt::Switch {
        on: Expr::Local(tag),
        cases,
        default: Block::of(Stmt::Fail(Failure::UnknownTypeTag { tag })),
    });
    out.push(Stmt::FinishDecoder(wrapper));
    out.append(setter(Expr::Local(result)));
    out
}

fn plan_flat(
    ctx: &mut GeneratorContext<'_>,
    def: &BeanDefinition,
    subtyping: &Subtyping,
    decoder: Local,
    setter: Setter<'_>,
) -> Block {
    let table = ctx.table();
    let config = ctx.config();

    // (index into subtyping.subtypes, definition)
    let mut subs: Vec<(usize, BeanDefinition)> = Vec::with_capacity(subtyping.subtypes.len());
    for (index, sub) in subtyping.subtypes.iter().enumerate() {
        let Some(sub_def) = introspect(table, config, &sub.ty, Direction::Deserialize, ctx.problems_mut()) else {
            continue;
        };
        if sub_def.creator.is_none() || sub_def.subtyping.is_some() || sub_def.delegating_prop.is_some() {
            ctx.fail(
                ProblemCode::InvalidSubtyping,
                format!("{} cannot take part in flat subtype deserialization", sub_def.class_name),
            );
            continue;
        }
        subs.push((index, sub_def));
    }

    let mut planner = Planner::new(ctx, true);
    let roots: Vec<StructureId> = subs
        .iter()
        .map(|(_, sub_def)| planner.build_structure(sub_def.clone(), 0))
        .collect();

    // leaf -> positions in `subs` of the subtypes declaring it
    let mut owners: IndexMap<LeafId, Vec<usize>> = IndexMap::new();
    for (position, root) in roots.iter().enumerate() {
        for leaf in planner.leaves_of(*root) {
            let entry = owners.entry(leaf).or_default();
            if !entry.contains(&position) {
                entry.push(position);
            }
        }
    }
    let leaves: Vec<LeafId> = owners.keys().copied().collect();
    let keys = planner.key_space(&leaves);
    let tag_property = (subtyping.shape == SubtypeShape::Property).then(|| subtyping.property.clone());
    let all: Vec<usize> = (0..subs.len()).collect();

    let possible = InlineBitSet::new(planner.ctx, "possibleTypes", all.iter().copied());
    let dup = planner.duplicate_manager(&leaves, tag_property.as_ref());
    let object = planner.ctx.new_local("objectDecoder");
    let key = planner.ctx.new_local("key");
    let tag = planner.ctx.new_local("typeTag");

    let mut out = planner.prelude(&leaves, &dup);
    out.append(possible.declarations(true));

    let mut cases = Vec::new();
    if let Some(tag_name) = &tag_property {
        let tag_cases = subs
            .iter()
            .enumerate()
            .map(|(position, (index, _))| SwitchCase {
                labels: subtyping.subtypes[*index].names.clone(),
                body: possible.and(&[position]),
            })
            .collect();
        let mut body = dup.mark_read(&ReadKey::Tag);
        body.push(Stmt::Let {
            local: tag,
            value: Expr::Decode {
                decoder: object,
                kind: ScalarKind::String,
            },
        });
        body.push(Stmt::Switch {
            on: Expr::Local(tag),
            cases: tag_cases,
            default: Block::of(Stmt::Fail(Failure::UnknownTypeTag { tag })),
        });
        cases.push(SwitchCase {
            labels: vec![tag_name.clone()],
            body,
        });
    }

    // Keys answered by the same leaves share one case.
    let mut groups: IndexMap<Vec<LeafId>, Vec<Name>> = IndexMap::new();
    for (label, ids) in &keys {
        if tag_property.as_ref() == Some(label) {
            continue;
        }
        groups.entry(ids.clone()).or_default().push(label.clone());
    }
    for (ids, labels) in groups {
        let name = labels[0].clone();
        let body = match ids.as_slice() {
            [leaf] => {
                let declaring = &owners[leaf];
                let mut body = Block::new();
                if declaring.len() < subs.len() {
                    body.push(Stmt::If {
                        cond: possible.any_set(declaring).not(),
                        then: Block::of(Stmt::Fail(Failure::PropertyNotAllowed { name: name.clone() })),
                        otherwise: Block::new(),
                    });
                    body.append(possible.and(declaring));
                }
                body.append(dup.mark_read(&ReadKey::Leaf(*leaf)));
                body.append(planner.read_leaf(*leaf, object));
                body
            }
            _ => {
                let mut union: Vec<usize> = Vec::new();
                for id in &ids {
                    for position in &owners[id] {
                        if !union.contains(position) {
                            union.push(*position);
                        }
                    }
                }
                let mut chain = Block::of(Stmt::If {
                    cond: possible.any_set(&union),
                    then: Block::of(Stmt::Fail(Failure::AmbiguousProperty { name: name.clone() })),
                    otherwise: Block::of(Stmt::Fail(Failure::PropertyNotAllowed { name: name.clone() })),
                });
                for id in ids.iter().rev() {
                    let declaring = owners[id].clone();
                    let others: Vec<usize> = union.iter().copied().filter(|p| !declaring.contains(p)).collect();
                    let mut then = possible.and(&declaring);
                    then.append(dup.mark_read(&ReadKey::Leaf(*id)));
                    then.append(planner.read_leaf(*id, object));
                    chain = Block::of(Stmt::If {
                        cond: Expr::And(vec![possible.any_set(&declaring), possible.any_set(&others).not()]),
                        then,
                        otherwise: chain,
                    });
                }
                chain
            }
        };
        cases.push(SwitchCase { labels, body });
    }
    cases.extend(ignored_case(def, &keys, object));

    out.push(Stmt::OpenDecoder {
        child: object,
        parent: decoder,
        kind: StructureKind::Object,
    });
    out.push(Stmt::Loop(parse_loop(object, key, cases, unknown_key(def, object, key))));
    out.push(Stmt::FinishDecoder(object));

    if tag_property.is_some() {
        let default_position = subtyping
            .default_impl
            .and_then(|default| subs.iter().position(|(index, _)| *index == default));
        let missing = match default_position {
            Some(position) => possible.and(&[position]),
            None => Block::of(Stmt::Fail(Failure::MissingTypeTag)),
        };
        out.push(Stmt::If {
            cond: dup.has_been_read(&ReadKey::Tag).not(),
            then: missing,
            otherwise: Block::new(),
        });
    }
    out.push(Stmt::If {
        cond: possible.more_than_one(),
        then: Block::of(Stmt::Fail(Failure::AmbiguousType)),
        otherwise: Block::new(),
    });
    out.push(Stmt::If {
        cond: possible.any_set(&all).not(),
        then: Block::of(Stmt::Fail(Failure::NoMatchingType)),
        otherwise: Block::new(),
    });

    let result = planner.ctx.new_local("polymorphic");
    out.push(Stmt::Let {
        local: result,
        value: Expr::Const(Value::Null),
    });
    let mut dispatch = Block::new();
    for (position, root) in roots.iter().enumerate().rev() {
        let (mut then, created) = planner.epilogue(*root, &dup);
        then.push(Stmt::Let {
            local: result,
            value: Expr::Local(created),
        });
        dispatch = Block::of(Stmt::If {
            cond: possible.is_set(&position),
            then,
            otherwise: dispatch,
        });
    }
    out.append(dispatch);
    debug!(
        target: "typecodec::planner",
        class = %def.class_name,
        subtypes = subs.len(),
        keys = keys.len(),
        "planned flat subtyping"
    );
    out.append(setter(Expr::Local(result)));
    out
}
