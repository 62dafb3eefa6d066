//! Link generation decision tree.
//!
//! Every key named by some entry's required link values gets a bit in a
//! vocabulary. Entries are grouped by the keys they need supplied and the keys
//! they need absent; a lookup computes the supplied-key bitsets once and
//! prunes whole groups with subset and disjointness tests before comparing
//! values of the remaining entries.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use sentier_template::{eq_ignore_case, fold_case};

use crate::context::VirtualPathContext;
use crate::entry::{LinkGenerationEntry, RequiredValue};

/// Fixed-size bitset over the key vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeySet(Vec<u64>);

impl KeySet {
    fn with_capacity(bits: usize) -> Self {
        Self(vec![0; bits.div_ceil(64)])
    }

    fn insert(&mut self, bit: usize) {
        self.0[bit / 64] |= 1 << (bit % 64);
    }

    fn contains(&self, bit: usize) -> bool {
        self.0[bit / 64] & (1 << (bit % 64)) != 0
    }

    fn is_subset(&self, other: &KeySet) -> bool {
        self.0.iter().zip(&other.0).all(|(a, b)| a & !b == 0)
    }

    fn is_disjoint(&self, other: &KeySet) -> bool {
        self.0.iter().zip(&other.0).all(|(a, b)| a & b == 0)
    }
}

#[derive(Debug)]
struct CompiledEntry {
    entry: Arc<LinkGenerationEntry>,
    /// Registration position, the final tie breaker.
    position: usize,
    exact: Vec<(usize, String)>,
    any: Vec<usize>,
    /// Required keys the entry's own defaults satisfy when nothing is supplied.
    satisfied_by_defaults: KeySet,
    required_count: usize,
}

/// Entries sharing the same footprint.
#[derive(Debug)]
struct Group {
    /// Keys that must be supplied, explicitly or ambiently.
    required: KeySet,
    /// Keys that must not be supplied explicitly.
    absent: KeySet,
    entries: Vec<CompiledEntry>,
}

/// How a key is supplied for one lookup.
#[derive(Debug, Clone, Copy)]
enum Supplied<'a> {
    Explicit(&'a str),
    Ambient(&'a str),
    Missing,
}

/// A viable entry for link generation.
#[derive(Debug, Clone)]
pub struct LinkGenerationMatch {
    pub entry: Arc<LinkGenerationEntry>,
    /// Viable only through ambient values.
    pub is_fallback: bool,
}

/// Orders link generation candidates for a set of supplied values.
#[derive(Debug)]
pub struct LinkGenerationDecisionTree {
    keys: Vec<String>,
    groups: Vec<Group>,
}

impl LinkGenerationDecisionTree {
    pub fn new(entries: &[Arc<LinkGenerationEntry>]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut keys = Vec::new();
        for entry in entries {
            for (key, _) in entry.required_link_values.iter() {
                vocabulary.entry(fold_case(key)).or_insert_with(|| {
                    keys.push(fold_case(key));
                    keys.len() - 1
                });
            }
        }

        let mut groups: Vec<Group> = Vec::new();
        let mut group_index: HashMap<(KeySet, KeySet), usize> = HashMap::new();

        for (position, entry) in entries.iter().enumerate() {
            let mut required = KeySet::with_capacity(keys.len());
            let mut absent = KeySet::with_capacity(keys.len());
            let mut satisfied_by_defaults = KeySet::with_capacity(keys.len());
            let mut exact = Vec::new();
            let mut any = Vec::new();

            for (key, value) in entry.required_link_values.iter() {
                let bit = vocabulary[&fold_case(key)];
                let default = entry.defaults().get_non_empty(key);
                match value {
                    RequiredValue::Exact(expected) => {
                        exact.push((bit, expected.clone()));
                        if default.is_some_and(|d| eq_ignore_case(d, expected)) {
                            satisfied_by_defaults.insert(bit);
                        } else {
                            required.insert(bit);
                        }
                    }
                    RequiredValue::Any => {
                        any.push(bit);
                        if default.is_some() {
                            satisfied_by_defaults.insert(bit);
                        } else {
                            required.insert(bit);
                        }
                    }
                    RequiredValue::Absent => absent.insert(bit),
                }
            }

            let compiled = CompiledEntry {
                entry: Arc::clone(entry),
                position,
                required_count: exact.len() + any.len(),
                exact,
                any,
                satisfied_by_defaults,
            };

            let index = *group_index
                .entry((required.clone(), absent.clone()))
                .or_insert_with(|| {
                    groups.push(Group {
                        required,
                        absent,
                        entries: Vec::new(),
                    });
                    groups.len() - 1
                });
            groups[index].entries.push(compiled);
        }

        Self { keys, groups }
    }

    /// Candidates for `context`, best first.
    ///
    /// An explicit value wins over the ambient one for the same key; an
    /// explicit empty value means the key is not supplied. Candidates with
    /// more required keys sort first; among equals, those satisfied by
    /// explicit values come before ambient fallbacks, then higher generation
    /// precedence wins.
    pub fn get_matches(&self, context: &VirtualPathContext) -> Vec<LinkGenerationMatch> {
        let mut present = KeySet::with_capacity(self.keys.len());
        let mut explicit = KeySet::with_capacity(self.keys.len());
        let supplied: Vec<Supplied<'_>> = self
            .keys
            .iter()
            .enumerate()
            .map(|(bit, key)| match context.values().get(key) {
                Some(value) if !value.is_empty() => {
                    present.insert(bit);
                    explicit.insert(bit);
                    Supplied::Explicit(value)
                }
                Some(_) => Supplied::Missing,
                None => match context.ambient_values().get_non_empty(key) {
                    Some(value) => {
                        present.insert(bit);
                        Supplied::Ambient(value)
                    }
                    None => Supplied::Missing,
                },
            })
            .collect();

        let mut matches: Vec<(&CompiledEntry, bool)> = Vec::new();
        for group in &self.groups {
            if !group.required.is_subset(&present) || !group.absent.is_disjoint(&explicit) {
                continue;
            }
            for compiled in &group.entries {
                if let Some(is_fallback) = evaluate(compiled, &supplied) {
                    matches.push((compiled, is_fallback));
                }
            }
        }

        matches.sort_by(|(a, a_fallback), (b, b_fallback)| {
            b.required_count
                .cmp(&a.required_count)
                .then_with(|| a_fallback.cmp(b_fallback))
                .then_with(|| {
                    b.entry
                        .generation_precedence
                        .cmp(&a.entry.generation_precedence)
                })
                .then_with(|| compare_text(a, b))
                .then_with(|| a.position.cmp(&b.position))
        });

        matches
            .into_iter()
            .map(|(compiled, is_fallback)| LinkGenerationMatch {
                entry: Arc::clone(&compiled.entry),
                is_fallback,
            })
            .collect()
    }
}

/// `Some(is_fallback)` when the entry's values agree with what was supplied.
fn evaluate(compiled: &CompiledEntry, supplied: &[Supplied<'_>]) -> Option<bool> {
    let mut is_fallback = false;

    for (bit, expected) in &compiled.exact {
        match supplied[*bit] {
            Supplied::Explicit(value) if eq_ignore_case(value, expected) => {}
            Supplied::Ambient(value) if eq_ignore_case(value, expected) => is_fallback = true,
            Supplied::Missing if compiled.satisfied_by_defaults.contains(*bit) => {}
            _ => return None,
        }
    }
    for bit in &compiled.any {
        match supplied[*bit] {
            Supplied::Explicit(_) => {}
            Supplied::Ambient(_) => is_fallback = true,
            Supplied::Missing if compiled.satisfied_by_defaults.contains(*bit) => {}
            Supplied::Missing => return None,
        }
    }

    Some(is_fallback)
}

fn compare_text(a: &CompiledEntry, b: &CompiledEntry) -> Ordering {
    fold_case(a.entry.template_text()).cmp(&fold_case(b.entry.template_text()))
}
