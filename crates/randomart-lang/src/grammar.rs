use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use smol_str::SmolStr;

use crate::{
    arena::{Arena, ArenaId},
    node::{Arity, NodeKind},
};

pub type RuleId = ArenaId<Rule>;

/// What a branch produces once it fires. `R` names the sub-rules: strings
/// while a grammar is being built, [`RuleId`]s once it is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Production<R> {
    /// A terminal node of the given kind.
    Leaf(NodeKind),
    /// The result of another rule, without building a node.
    Delegate(R),
    Unary(NodeKind, R),
    Binary(NodeKind, R, R),
    Ternary(NodeKind, R, R, R),
}

impl Production<SmolStr> {
    pub fn leaf(kind: NodeKind) -> Self {
        Production::Leaf(kind)
    }

    pub fn delegate(rule: impl Into<SmolStr>) -> Self {
        Production::Delegate(rule.into())
    }

    pub fn unary(kind: NodeKind, rule: impl Into<SmolStr>) -> Self {
        Production::Unary(kind, rule.into())
    }

    pub fn binary(kind: NodeKind, lhs: impl Into<SmolStr>, rhs: impl Into<SmolStr>) -> Self {
        Production::Binary(kind, lhs.into(), rhs.into())
    }

    pub fn ternary(
        kind: NodeKind,
        first: impl Into<SmolStr>,
        second: impl Into<SmolStr>,
        third: impl Into<SmolStr>,
    ) -> Self {
        Production::Ternary(kind, first.into(), second.into(), third.into())
    }
}

impl<R> Production<R> {
    /// Arity the produced node must have, or `None` for a delegation.
    fn arity(&self) -> Option<Arity> {
        match self {
            Production::Leaf(_) => Some(Arity::Terminal),
            Production::Delegate(_) => None,
            Production::Unary(..) => Some(Arity::Unary),
            Production::Binary(..) => Some(Arity::Binary),
            Production::Ternary(..) => Some(Arity::Ternary),
        }
    }

    fn node_kind(&self) -> Option<NodeKind> {
        match self {
            Production::Leaf(kind)
            | Production::Unary(kind, _)
            | Production::Binary(kind, _, _)
            | Production::Ternary(kind, _, _, _) => Some(*kind),
            Production::Delegate(_) => None,
        }
    }

    fn rules(&self) -> Vec<&R> {
        match self {
            Production::Leaf(_) => Vec::new(),
            Production::Delegate(r) | Production::Unary(_, r) => vec![r],
            Production::Binary(_, l, r) => vec![l, r],
            Production::Ternary(_, a, b, c) => vec![a, b, c],
        }
    }

    fn try_map<S, E>(self, mut f: impl FnMut(R) -> Result<S, E>) -> Result<Production<S>, E> {
        Ok(match self {
            Production::Leaf(kind) => Production::Leaf(kind),
            Production::Delegate(r) => Production::Delegate(f(r)?),
            Production::Unary(kind, r) => Production::Unary(kind, f(r)?),
            Production::Binary(kind, l, r) => Production::Binary(kind, f(l)?, f(r)?),
            Production::Ternary(kind, a, b, c) => Production::Ternary(kind, f(a)?, f(b)?, f(c)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub production: Production<RuleId>,
    pub weight: f32,
    /// Sum of the weights of this branch and every branch declared before it.
    pub cumulative: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: SmolStr,
    pub branches: Vec<Branch>,
}

impl Rule {
    /// Picks the first branch whose cumulative weight reaches `draw`. A draw
    /// past the total weight falls through to the last branch.
    pub fn choose(&self, draw: f32) -> &Branch {
        match self.branches.iter().find(|b| draw <= b.cumulative) {
            Some(branch) => branch,
            None => &self.branches[self.branches.len() - 1],
        }
    }
}

/// A stochastic context-free grammar over node kinds.
///
/// Built with [`GrammarBuilder`], which checks the whole table up front, so
/// generation never meets an undefined rule or a mis-shaped branch.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Arena<Rule>,
    entry: RuleId,
    terminal: RuleId,
    min_depth: u32,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    pub fn entry(&self) -> RuleId {
        self.entry
    }

    pub fn terminal(&self) -> RuleId {
        self.terminal
    }

    /// Smallest depth budget the entry rule is expanded with.
    pub fn min_depth(&self) -> u32 {
        self.min_depth
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }

    pub fn rule_by_name(&self, name: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .find_map(|(id, rule)| (rule.name == name).then_some(id))
    }

    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter()
    }

    /// `E ::= E(C, C, C)`, `A ::= number | x | y`, `C ::= A | add(C, C) | mult(C, C)`.
    pub fn paper() -> Self {
        Grammar::builder()
            .rule(
                "E",
                [(Production::ternary(NodeKind::Triple, "C", "C", "C"), 1.0)],
            )
            .rule("A", terminal_branches())
            .rule(
                "C",
                [
                    (Production::delegate("A"), 1.0 / 3.0),
                    (Production::binary(NodeKind::Add, "C", "C"), 3.0 / 8.0),
                    (Production::binary(NodeKind::Mult, "C", "C"), 3.0 / 8.0),
                ],
            )
            .entry("E")
            .terminal("A")
            .build()
    }

    /// A single rule picking `number`, `x` or `y`.
    pub fn simple() -> Self {
        Grammar::builder()
            .rule("A", terminal_branches())
            .entry("A")
            .terminal("A")
            .build()
    }

    /// Every node kind, with an `if` at the root. Both arms of the `if` are
    /// `E` triples, which needs one level of budget below the root.
    pub fn full() -> Self {
        Grammar::builder()
            .rule(
                "R",
                [
                    (Production::ternary(NodeKind::Triple, "C", "C", "C"), 3.0 / 4.0),
                    (
                        Production::ternary(NodeKind::IfThenElse, "C", "E", "E"),
                        1.0 / 4.0,
                    ),
                ],
            )
            .rule(
                "E",
                [(Production::ternary(NodeKind::Triple, "C", "C", "C"), 1.0)],
            )
            .rule("A", terminal_branches())
            .rule(
                "C",
                [
                    (Production::delegate("A"), 1.0 / 4.0),
                    (Production::binary(NodeKind::Add, "C", "C"), 1.0 / 8.0),
                    (Production::binary(NodeKind::Mult, "C", "C"), 1.0 / 8.0),
                    (Production::binary(NodeKind::Mod, "C", "C"), 1.0 / 16.0),
                    (Production::binary(NodeKind::Div, "C", "C"), 1.0 / 16.0),
                    (Production::binary(NodeKind::Geq, "C", "C"), 1.0 / 16.0),
                    (Production::unary(NodeKind::Sin, "C"), 1.0 / 8.0),
                    (Production::unary(NodeKind::Cos, "C"), 1.0 / 8.0),
                    (Production::unary(NodeKind::Exp, "C"), 1.0 / 16.0),
                ],
            )
            .entry("R")
            .terminal("A")
            .min_depth(1)
            .build()
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::full()
    }
}

fn terminal_branches() -> [(Production<SmolStr>, f32); 3] {
    [
        (Production::leaf(NodeKind::Number), 1.0 / 3.0),
        (Production::leaf(NodeKind::X), 1.0 / 3.0),
        (Production::leaf(NodeKind::Y), 1.0 / 3.0),
    ]
}

impl Display for Grammar {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        for (id, rule) in self.rules.iter() {
            let marker = match (id == self.entry, id == self.terminal) {
                (true, true) => " (entry, terminal)",
                (true, false) => " (entry)",
                (false, true) => " (terminal)",
                (false, false) => "",
            };
            let branches = rule
                .branches
                .iter()
                .map(|branch| format!("{} [{:.4}]", self.production(&branch.production), branch.weight))
                .join(" | ");

            writeln!(f, "{}{marker} ::= {branches}", rule.name)?;
        }

        Ok(())
    }
}

impl Grammar {
    fn production(&self, production: &Production<RuleId>) -> String {
        let name = |id: &RuleId| self.rules[*id].name.clone();
        match production {
            Production::Leaf(kind) => kind.to_string(),
            Production::Delegate(r) => name(r).to_string(),
            Production::Unary(kind, r) => format!("{kind}({})", name(r)),
            Production::Binary(kind, l, r) => format!("{kind}({}, {})", name(l), name(r)),
            Production::Ternary(NodeKind::IfThenElse, c, t, e) => {
                format!("if({}) {} else {}", name(c), name(t), name(e))
            }
            Production::Ternary(kind, a, b, c) => {
                format!("{kind}({}, {}, {})", name(a), name(b), name(c))
            }
        }
    }
}

type RuleSpec = (SmolStr, Vec<(Production<SmolStr>, f32)>);

#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    rules: Vec<RuleSpec>,
    entry: Option<SmolStr>,
    terminal: Option<SmolStr>,
    min_depth: u32,
}

impl GrammarBuilder {
    /// Adds a rule. Branches keep their declaration order.
    pub fn rule(
        mut self,
        name: impl Into<SmolStr>,
        branches: impl IntoIterator<Item = (Production<SmolStr>, f32)>,
    ) -> Self {
        self.rules
            .push((name.into(), branches.into_iter().collect()));
        self
    }

    pub fn entry(mut self, name: impl Into<SmolStr>) -> Self {
        self.entry = Some(name.into());
        self
    }

    pub fn terminal(mut self, name: impl Into<SmolStr>) -> Self {
        self.terminal = Some(name.into());
        self
    }

    pub fn min_depth(mut self, depth: u32) -> Self {
        self.min_depth = depth;
        self
    }

    /// Resolves rule names and validates the table.
    ///
    /// # Panics
    ///
    /// A grammar that fails validation is a configuration error, so this
    /// panics when a rule is undefined or defined twice, a rule has no
    /// branches, a weight is not a positive finite number, a branch's node
    /// kind has the wrong arity, the entry or terminal rule is missing, or
    /// the terminal rule produces anything but terminal nodes.
    pub fn build(self) -> Grammar {
        let names = self.rules.iter().map(|(name, _)| name.clone()).collect_vec();
        let resolve = |name: &SmolStr| -> Result<RuleId, SmolStr> {
            names
                .iter()
                .position(|n| n == name)
                .map(RuleId::from)
                .ok_or_else(|| name.clone())
        };

        if let Some(duplicate) = names.iter().duplicates().next() {
            panic!("Rule `{duplicate}` is defined more than once");
        }

        let entry_name = self.entry.expect("Grammar has no entry rule");
        let terminal_name = self.terminal.expect("Grammar has no terminal rule");
        let entry = resolve(&entry_name)
            .unwrap_or_else(|name| panic!("Entry rule `{name}` is not defined"));
        let terminal = resolve(&terminal_name)
            .unwrap_or_else(|name| panic!("Terminal rule `{name}` is not defined"));

        let mut rules = Arena::new(names.len().max(1));

        for (name, branches) in self.rules {
            assert!(!branches.is_empty(), "Rule `{name}` has no branches");

            let mut cumulative = 0.0;
            let branches = branches
                .into_iter()
                .map(|(production, weight)| {
                    assert!(
                        weight.is_finite() && weight > 0.0,
                        "Rule `{name}` has a branch with weight {weight}"
                    );
                    if let (Some(kind), Some(arity)) = (production.node_kind(), production.arity()) {
                        assert_eq!(
                            kind.arity(),
                            arity,
                            "Rule `{name}` builds {kind}, a {} node, from a {arity} branch",
                            kind.arity()
                        );
                    }
                    if name == terminal_name {
                        assert!(
                            matches!(production, Production::Leaf(_)),
                            "Terminal rule `{name}` may only produce terminal nodes"
                        );
                    }

                    let production = production.try_map(|r| resolve(&r)).unwrap_or_else(
                        |undefined| panic!("Rule `{name}` refers to undefined rule `{undefined}`"),
                    );
                    cumulative += weight;

                    Branch {
                        production,
                        weight,
                        cumulative,
                    }
                })
                .collect();

            rules.alloc(Rule { name, branches });
        }

        let grammar = Grammar {
            rules,
            entry,
            terminal,
            min_depth: self.min_depth,
        };
        log::debug!("Built grammar:\n{grammar}");
        grammar
    }
}
