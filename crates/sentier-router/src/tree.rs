//! Matching tree: one prefix trie per route order.
//!
//! Nodes live in an arena and refer to each other by index. Entries are
//! stored once per tree and nodes keep indices into that list.

use std::collections::HashMap;
use std::fmt;

use sentier_template::{fold_case, PathTokens, TemplatePart};

use crate::entry::MatchingEntry;

/// Index of a node in its tree's arena.
pub type NodeId = usize;

const ROOT: NodeId = 0;

/// A position in the trie.
#[derive(Debug, Clone, Default)]
pub struct UrlMatchingNode {
    /// Number of segments consumed to reach this node.
    pub depth: usize,
    /// Reached through a catch-all segment; matches any number of remaining tokens.
    pub is_catch_all: bool,
    /// Entries that may end here, in precedence order.
    pub matches: Vec<usize>,
    /// Literal children keyed by case-folded text.
    pub literals: HashMap<String, NodeId>,
    pub constrained_parameters: Option<NodeId>,
    pub parameters: Option<NodeId>,
    pub constrained_catch_alls: Option<NodeId>,
    pub catch_alls: Option<NodeId>,
}

/// Which child a segment descends into.
enum Branch<'a> {
    Literal(&'a str),
    ConstrainedParameter,
    Parameter,
    ConstrainedCatchAll,
    CatchAll,
}

/// The trie for one route order.
#[derive(Debug, Clone)]
pub struct UrlMatchingTree {
    order: i32,
    nodes: Vec<UrlMatchingNode>,
    entries: Vec<MatchingEntry>,
}

impl UrlMatchingTree {
    pub fn new(order: i32) -> Self {
        Self {
            order,
            nodes: vec![UrlMatchingNode::default()],
            entries: Vec::new(),
        }
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn root(&self) -> &UrlMatchingNode {
        &self.nodes[ROOT]
    }

    pub fn node(&self, id: NodeId) -> &UrlMatchingNode {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn entries(&self) -> &[MatchingEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> &MatchingEntry {
        &self.entries[index]
    }

    /// Add an entry, creating the nodes along its segments.
    ///
    /// Trailing segments that can bind without a path token (optional,
    /// defaulted or catch-all parameters) also register the entry on the
    /// node before them, so shorter paths reach it.
    pub fn insert(&mut self, entry: MatchingEntry) {
        let index = self.entries.len();
        let segments = entry.template.segments();
        let mut current = ROOT;

        for (i, segment) in segments.iter().enumerate() {
            if segments[i..]
                .iter()
                .all(|s| entry.matcher.binds_without_token(s))
            {
                self.nodes[current].matches.push(index);
            }

            let branch = match segment.parts() {
                [TemplatePart::Literal(text)] => Branch::Literal(text),
                [TemplatePart::Parameter(p)] => match (p.is_catch_all, p.is_constrained()) {
                    (false, true) => Branch::ConstrainedParameter,
                    (false, false) => Branch::Parameter,
                    (true, true) => Branch::ConstrainedCatchAll,
                    (true, false) => Branch::CatchAll,
                },
                // Complex segments are treated as a constrained parameter.
                _ => Branch::ConstrainedParameter,
            };
            current = self.child(current, branch, i + 1);
        }

        self.nodes[current].matches.push(index);
        self.entries.push(entry);
    }

    fn child(&mut self, parent: NodeId, branch: Branch<'_>, depth: usize) -> NodeId {
        let existing = {
            let node = &self.nodes[parent];
            match &branch {
                Branch::Literal(text) => node.literals.get(&fold_case(text)).copied(),
                Branch::ConstrainedParameter => node.constrained_parameters,
                Branch::Parameter => node.parameters,
                Branch::ConstrainedCatchAll => node.constrained_catch_alls,
                Branch::CatchAll => node.catch_alls,
            }
        };
        if let Some(id) = existing {
            return id;
        }

        let id = self.nodes.len();
        self.nodes.push(UrlMatchingNode {
            depth,
            is_catch_all: matches!(branch, Branch::ConstrainedCatchAll | Branch::CatchAll),
            ..UrlMatchingNode::default()
        });

        let node = &mut self.nodes[parent];
        match branch {
            Branch::Literal(text) => {
                node.literals.insert(fold_case(text), id);
            }
            Branch::ConstrainedParameter => node.constrained_parameters = Some(id),
            Branch::Parameter => node.parameters = Some(id),
            Branch::ConstrainedCatchAll => node.constrained_catch_alls = Some(id),
            Branch::CatchAll => node.catch_alls = Some(id),
        }
        id
    }

    /// Order every node's matches by precedence, then template text.
    pub fn sort_matches(&mut self) {
        let entries = &self.entries;
        for node in &mut self.nodes {
            node.matches.sort_by(|&a, &b| {
                let (a, b) = (&entries[a], &entries[b]);
                a.precedence
                    .cmp(&b.precedence)
                    .then_with(|| fold_case(a.template.text()).cmp(&fold_case(b.template.text())))
            });
        }
    }

    /// Walk the tree against `tokens`, yielding candidate entries in order.
    pub fn matches<'a>(&'a self, tokens: &'a PathTokens) -> TreeMatches<'a> {
        TreeMatches {
            tree: self,
            tokens,
            stack: vec![(ROOT, 0)],
            pending: [].iter(),
        }
    }
}

/// Depth-first walk over a tree with an explicit stack of `(node, cursor)`.
///
/// Children are pushed in reverse precedence order so literals pop first.
/// A node yields its entries when all tokens were consumed; catch-all nodes
/// yield regardless of the tokens left.
pub struct TreeMatches<'a> {
    tree: &'a UrlMatchingTree,
    tokens: &'a PathTokens,
    stack: Vec<(NodeId, usize)>,
    pending: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for TreeMatches<'a> {
    type Item = &'a MatchingEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(&index) = self.pending.next() {
                return Some(self.tree.entry(index));
            }

            let (id, cursor) = self.stack.pop()?;
            let node = self.tree.node(id);

            if node.is_catch_all || cursor == self.tokens.len() {
                self.pending = node.matches.iter();
                if node.is_catch_all {
                    continue;
                }
            }

            let Some(token) = self.tokens.get(cursor) else {
                continue;
            };
            let next = cursor + 1;
            for child in [
                node.catch_alls,
                node.constrained_catch_alls,
                node.parameters,
                node.constrained_parameters,
                node.literals.get(&fold_case(token)).copied(),
            ]
            .into_iter()
            .flatten()
            {
                self.stack.push((child, next));
            }
        }
    }
}

impl fmt::Display for UrlMatchingTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "order {}", self.order)?;
        self.fmt_node(f, ROOT, "/", 1)
    }
}

impl UrlMatchingTree {
    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        label: &str,
        indent: usize,
    ) -> fmt::Result {
        let node = &self.nodes[id];
        write!(f, "{:width$}{}", "", label, width = indent * 2)?;
        if !node.matches.is_empty() {
            let templates: Vec<_> = node
                .matches
                .iter()
                .map(|&i| self.entries[i].template.text())
                .collect();
            write!(f, "  => {}", templates.join(", "))?;
        }
        writeln!(f)?;

        let mut literals: Vec<_> = node.literals.iter().collect();
        literals.sort();
        for (text, &child) in literals {
            self.fmt_node(f, child, text, indent + 1)?;
        }
        for (child, label) in [
            (node.constrained_parameters, "{:constrained}"),
            (node.parameters, "{param}"),
            (node.constrained_catch_alls, "{*:constrained}"),
            (node.catch_alls, "{*catch-all}"),
        ] {
            if let Some(child) = child {
                self.fmt_node(f, child, label, indent + 1)?;
            }
        }
        Ok(())
    }
}
