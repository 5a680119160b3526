//! Bit sets held in plan locals.
//!
//! An [`InlineBitSet`] assigns every tracked item a stable bit offset and
//! keeps the bits in one 64-bit mask local per word. All operations produce
//! plan statements or expressions; nothing is evaluated at generation time.
//!
//! [`DuplicatePropertyManager`] builds on it to reject repeated keys and to
//! report each missing required property by name.

use crate::context::GeneratorContext;
use crate::plan::{Block, Expr, Failure, Local, Stmt};
use fixedbitset::FixedBitSet;
use indexmap::IndexMap;
use std::hash::Hash;
use typecodec_runtime::Value;
use typecodec_types::Name;

const WORD_BITS: usize = 64;

pub struct InlineBitSet<T> {
    offsets: IndexMap<T, usize>,
    masks: Vec<Local>,
}

impl<T: Hash + Eq + Clone> InlineBitSet<T> {
    /// Allocate offsets for `items` and one mask local per 64 items.
    /// Duplicate items share an offset.
    pub fn new(ctx: &mut GeneratorContext<'_>, hint: &str, items: impl IntoIterator<Item = T>) -> Self {
        let mut offsets = IndexMap::new();
        for item in items {
            let next = offsets.len();
            offsets.entry(item).or_insert(next);
        }
        let words = offsets.len().div_ceil(WORD_BITS);
        let masks = (0..words).map(|_| ctx.new_local(hint)).collect();
        Self { offsets, masks }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn masks(&self) -> &[Local] {
        &self.masks
    }

    pub fn offset(&self, item: &T) -> Option<usize> {
        self.offsets.get(item).copied()
    }

    /// Per-word bits of `items`; unknown items are ignored.
    fn words<'i>(&self, items: impl IntoIterator<Item = &'i T>) -> Vec<u64>
    where
        T: 'i,
    {
        let mut set = FixedBitSet::with_capacity(self.offsets.len());
        for item in items {
            if let Some(&offset) = self.offsets.get(item) {
                set.insert(offset);
            }
        }
        let mut words = vec![0u64; self.masks.len()];
        for bit in set.ones() {
            words[bit / WORD_BITS] |= 1u64 << (bit % WORD_BITS);
        }
        words
    }

    fn nonzero<'i>(&self, items: impl IntoIterator<Item = &'i T>) -> impl Iterator<Item = (Local, u64)> + '_
    where
        T: 'i,
    {
        self.words(items)
            .into_iter()
            .enumerate()
            .filter(|(_, bits)| *bits != 0)
            .map(|(word, bits)| (self.masks[word], bits))
    }

    /// Declare the mask locals, all clear or all set.
    pub fn declarations(&self, all_set: bool) -> Block {
        let full = self.words(self.offsets.keys());
        Block::from(
            self.masks
                .iter()
                .zip(full)
                .map(|(mask, bits)| Stmt::Let {
                    local: *mask,
                    value: Expr::Const(Value::Long(if all_set { bits as i64 } else { 0 })),
                })
                .collect::<Vec<_>>(),
        )
    }

    pub fn set(&self, item: &T) -> Block {
        Block::from(
            self.nonzero([item])
                .map(|(mask, bits)| Stmt::SetBits { mask, bits })
                .collect::<Vec<_>>(),
        )
    }

    pub fn is_set(&self, item: &T) -> Expr {
        match self.nonzero([item]).next() {
            Some((mask, bits)) => Expr::AnyBits { mask, bits },
            None => Expr::Const(Value::Bool(false)),
        }
    }

    pub fn all_set(&self, items: &[T]) -> Expr {
        let mut terms: Vec<Expr> = self
            .nonzero(items)
            .map(|(mask, bits)| Expr::AllBits { mask, bits })
            .collect();
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::And(terms)
        }
    }

    pub fn any_set(&self, items: &[T]) -> Expr {
        let mut terms: Vec<Expr> = self
            .nonzero(items)
            .map(|(mask, bits)| Expr::AnyBits { mask, bits })
            .collect();
        if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Or(terms)
        }
    }

    /// Clear every bit not belonging to `items`.
    pub fn and(&self, items: &[T]) -> Block {
        Block::from(
            self.masks
                .iter()
                .zip(self.words(items))
                .map(|(mask, bits)| Stmt::KeepBits { mask: *mask, bits })
                .collect::<Vec<_>>(),
        )
    }

    pub fn more_than_one(&self) -> Expr {
        Expr::MultipleBits(self.masks.clone())
    }

    /// `if (!all_set(items)) { f(item) for each unset item }`.
    pub fn on_missing(&self, items: &[T], mut f: impl FnMut(&T) -> Block) -> Block {
        if items.is_empty() {
            return Block::new();
        }
        let mut report = Block::new();
        for item in items {
            report.push(Stmt::If {
                cond: self.is_set(item).not(),
                then: f(item),
                otherwise: Block::new(),
            });
        }
        Block::of(Stmt::If {
            cond: self.all_set(items).not(),
            then: report,
            otherwise: Block::new(),
        })
    }
}

// =============================================================================
// DuplicatePropertyManager
// =============================================================================

/// Tracks which properties of one parse loop have been read.
pub struct DuplicatePropertyManager<T> {
    read: InlineBitSet<T>,
    names: IndexMap<T, Name>,
}

impl<T: Hash + Eq + Clone> DuplicatePropertyManager<T> {
    pub fn new(ctx: &mut GeneratorContext<'_>, items: Vec<(T, Name)>) -> Self {
        let read = InlineBitSet::new(ctx, "readProperties", items.iter().map(|(item, _)| item.clone()));
        Self {
            read,
            names: items.into_iter().collect(),
        }
    }

    pub fn declarations(&self) -> Block {
        self.read.declarations(false)
    }

    /// Fail on a second read, otherwise remember the read.
    pub fn mark_read(&self, item: &T) -> Block {
        let name = self.name(item);
        Block::of(Stmt::If {
            cond: self.read.is_set(item),
            then: Block::of(Stmt::Fail(Failure::DuplicateProperty { name })),
            otherwise: self.read.set(item),
        })
    }

    pub fn has_been_read(&self, item: &T) -> Expr {
        self.read.is_set(item)
    }

    /// Fail naming the first missing property among `required`.
    pub fn check_required(&self, required: &[T]) -> Block {
        self.read.on_missing(required, |item| {
            Block::of(Stmt::Fail(Failure::MissingProperty { name: self.name(item) }))
        })
    }

    fn name(&self, item: &T) -> Name {
        self.names.get(item).cloned().unwrap_or_else(|| Name::from("?"))
    }
}

#[cfg(test)]
#[path = "../../tests/bitset_tests.rs"]
mod bitset_tests;
