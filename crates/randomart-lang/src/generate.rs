use crate::{
    grammar::{Grammar, Production, RuleId},
    node::{NodeId, NodeKind, Provenance},
    rng::RngStream,
    store::NodeStore,
};

/// Deepest tree the command surfaces let a user ask for.
pub const MAX_DEPTH: u32 = 16;

/// Expands grammar rules into random trees, writing every node into a
/// [`NodeStore`].
#[derive(Debug)]
pub struct Generator<'a> {
    grammar: &'a Grammar,
    rng: RngStream,
}

impl<'a> Generator<'a> {
    pub fn new(grammar: &'a Grammar, rng: RngStream) -> Self {
        Self { grammar, rng }
    }

    /// Hands back the random stream, advanced past every draw made so far.
    pub fn into_rng(self) -> RngStream {
        self.rng
    }

    /// Generates a tree from the grammar's entry rule, never with less than
    /// [`Grammar::min_depth`] budget.
    pub fn generate_entry(&mut self, store: &mut NodeStore, depth: u32) -> NodeId {
        // clamped so the cast below cannot wrap
        let depth = depth.max(self.grammar.min_depth()).min(i32::MAX as u32) as i32;
        self.generate(store, self.grammar.entry(), depth)
    }

    /// Generates a tree from `rule` with the given depth budget.
    ///
    /// Once the budget is negative, every rule but the terminal one is
    /// replaced by the terminal rule at budget 0, so expansion always stops.
    pub fn generate(&mut self, store: &mut NodeStore, rule: RuleId, depth: i32) -> NodeId {
        let terminal = self.grammar.terminal();
        if depth < 0 && rule != terminal {
            return self.generate(store, terminal, 0);
        }

        let draw = self.rng.uniform() as f32;
        let grammar = self.grammar;
        let branch = grammar.rule(rule).choose(draw);
        log::trace!(
            "{} at depth {depth}: drew {draw:.4}, expanding {:?}",
            grammar.rule(rule).name,
            branch.production
        );

        match &branch.production {
            Production::Leaf(NodeKind::Number) => {
                let value = self.rng.uniform_range(-1.0, 1.0) as f32;
                store.number_at(value, Provenance::caller())
            }
            Production::Leaf(kind) => store.node(*kind, &[], Provenance::caller()),
            Production::Delegate(next) => self.generate(store, *next, depth - 1),
            Production::Unary(kind, child) => {
                let child = self.generate(store, *child, depth - 1);
                store.node(*kind, &[child], Provenance::caller())
            }
            Production::Binary(kind, lhs, rhs) => {
                let lhs = self.generate(store, *lhs, depth - 1);
                let rhs = self.generate(store, *rhs, depth - 1);
                store.node(*kind, &[lhs, rhs], Provenance::caller())
            }
            Production::Ternary(kind, first, second, third) => {
                let first = self.generate(store, *first, depth - 1);
                let second = self.generate(store, *second, depth - 1);
                let third = self.generate(store, *third, depth - 1);
                store.node(*kind, &[first, second, third], Provenance::caller())
            }
        }
    }
}
