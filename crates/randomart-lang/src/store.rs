use std::{
    fmt::{self, Display, Formatter},
    ops::Index,
};

use crate::{
    arena::Arena,
    node::{BinaryOp, Expr, Node, NodeId, NodeKind, Provenance, TernaryOp, UnaryOp},
};

pub const DEFAULT_CAPACITY: usize = 20;
pub const DEFAULT_MARGIN: usize = 10;

/// Owns every node of one program and of its evaluation results.
///
/// Nodes are appended in construction order and refer to their children by
/// [`NodeId`], which is always lower than the id of the node holding it. The
/// first `size` nodes are the program. Everything after them is scratch space
/// written by the interpreter and discarded by [`NodeStore::reset`].
#[derive(Debug, Clone)]
pub struct NodeStore {
    nodes: Arena<Node>,
    size: Option<usize>,
    root: Option<NodeId>,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NodeStore {
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0,
            "Cannot initialise node store with capacity of {capacity}"
        );
        log::debug!("Allocated {capacity} slots for node store");

        Self {
            nodes: Arena::new(capacity),
            size: None,
            root: None,
        }
    }

    #[track_caller]
    pub fn x(&mut self) -> NodeId {
        self.push(Expr::X, Provenance::caller())
    }

    #[track_caller]
    pub fn y(&mut self) -> NodeId {
        self.push(Expr::Y, Provenance::caller())
    }

    #[track_caller]
    pub fn number(&mut self, value: f32) -> NodeId {
        self.number_at(value, Provenance::caller())
    }

    pub fn number_at(&mut self, value: f32, provenance: Provenance) -> NodeId {
        self.push(Expr::Number(value), provenance)
    }

    #[track_caller]
    pub fn sin(&mut self, child: NodeId) -> NodeId {
        self.push(Expr::Unary(UnaryOp::Sin, child), Provenance::caller())
    }

    #[track_caller]
    pub fn cos(&mut self, child: NodeId) -> NodeId {
        self.push(Expr::Unary(UnaryOp::Cos, child), Provenance::caller())
    }

    #[track_caller]
    pub fn exp(&mut self, child: NodeId) -> NodeId {
        self.push(Expr::Unary(UnaryOp::Exp, child), Provenance::caller())
    }

    #[track_caller]
    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(Expr::Binary(BinaryOp::Add, lhs, rhs), Provenance::caller())
    }

    #[track_caller]
    pub fn mult(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(Expr::Binary(BinaryOp::Mult, lhs, rhs), Provenance::caller())
    }

    #[track_caller]
    pub fn modulo(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(Expr::Binary(BinaryOp::Mod, lhs, rhs), Provenance::caller())
    }

    #[track_caller]
    pub fn div(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(Expr::Binary(BinaryOp::Div, lhs, rhs), Provenance::caller())
    }

    #[track_caller]
    pub fn geq(&mut self, lhs: NodeId, rhs: NodeId) -> NodeId {
        self.push(Expr::Binary(BinaryOp::Geq, lhs, rhs), Provenance::caller())
    }

    #[track_caller]
    pub fn triple(&mut self, first: NodeId, second: NodeId, third: NodeId) -> NodeId {
        self.push(
            Expr::Ternary(TernaryOp::Triple, first, second, third),
            Provenance::caller(),
        )
    }

    #[track_caller]
    pub fn if_then_else(&mut self, cond: NodeId, then: NodeId, otherwise: NodeId) -> NodeId {
        self.push(
            Expr::Ternary(TernaryOp::IfThenElse, cond, then, otherwise),
            Provenance::caller(),
        )
    }

    /// Builds a node of any kind but `Number` from a slice of children.
    ///
    /// # Panics
    ///
    /// Panics if `children` does not match the arity of `kind`, or if a child
    /// has not been built yet.
    #[track_caller]
    pub fn node(&mut self, kind: NodeKind, children: &[NodeId], provenance: Provenance) -> NodeId {
        self.push(Expr::from_kind(kind, children), provenance)
    }

    #[track_caller]
    fn push(&mut self, expr: Expr, provenance: Provenance) -> NodeId {
        let used = self.nodes.len();
        for child in expr.children() {
            assert!(
                child.index() < used,
                "{} node at {provenance} references {child:?}, but only {used} nodes exist",
                expr.kind()
            );
        }

        let id = self.nodes.alloc(Node { expr, provenance });
        self.root = Some(id);
        id
    }

    /// Marks everything built so far as the program.
    ///
    /// Capacity is grown once so that an evaluation pass, which appends at
    /// most one node per program node, never reallocates.
    pub fn seal(&mut self, margin: usize) {
        let size = self.nodes.len();
        self.size = Some(size);
        self.nodes.reserve_total(2 * (size + margin));
        log::debug!(
            "Sealed program of {size} nodes, capacity {}",
            self.nodes.capacity()
        );
    }

    /// Discards every node appended after the program and points the root
    /// back at the program's last node.
    ///
    /// # Panics
    ///
    /// Panics if the store has not been sealed.
    pub fn reset(&mut self) {
        let size = self
            .size
            .expect("node store must be sealed before it is reset");
        self.nodes.truncate(size);
        self.root = size.checked_sub(1).map(NodeId::from);
    }

    /// Drops the program and every result so a new program can be built.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.size = None;
        self.root = None;
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Value of `id` if it is a number node.
    pub fn number_value(&self, id: NodeId) -> Option<f32> {
        self.get(id).and_then(|node| node.expr.as_number())
    }

    /// Channel values of `id` if it is a triple of number nodes.
    pub fn triple_values(&self, id: NodeId) -> Option<[f32; 3]> {
        match self.get(id)?.expr {
            Expr::Ternary(TernaryOp::Triple, a, b, c) => Some([
                self.number_value(a)?,
                self.number_value(b)?,
                self.number_value(c)?,
            ]),
            _ => None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes in the program, or of nodes built so far if not sealed.
    pub fn size(&self) -> usize {
        self.size.unwrap_or(self.nodes.len())
    }

    pub fn used(&self) -> usize {
        self.nodes.len()
    }

    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub fn is_sealed(&self) -> bool {
        self.size.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Displays the tree rooted at `id` in the textual syntax.
    pub fn display(&self, id: NodeId) -> TreeDisplay<'_> {
        TreeDisplay { store: self, id }
    }
}

impl Index<NodeId> for NodeStore {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

pub struct TreeDisplay<'a> {
    store: &'a NodeStore,
    id: NodeId,
}

impl Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let at = |id| self.store.display(id);

        match self.store[self.id].expr {
            Expr::X => write!(f, "x"),
            Expr::Y => write!(f, "y"),
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Unary(_, child) => write!(f, "{}({})", self.store[self.id].kind(), at(child)),
            Expr::Binary(_, lhs, rhs) => {
                write!(f, "{}({}, {})", self.store[self.id].kind(), at(lhs), at(rhs))
            }
            Expr::Ternary(TernaryOp::Triple, a, b, c) => {
                write!(f, "E({}, {}, {})", at(a), at(b), at(c))
            }
            Expr::Ternary(TernaryOp::IfThenElse, cond, then, otherwise) => {
                write!(f, "if({}) {} else {}", at(cond), at(then), at(otherwise))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_tree(store: &mut NodeStore) -> NodeId {
        let x = store.x();
        let y = store.y();
        let sum = store.add(x, y);
        let half = store.number(0.5);
        let sin = store.sin(half);
        store.triple(sum, sin, x)
    }

    #[test]
    fn test_construction_returns_ascending_ids() {
        let mut store = NodeStore::new(2);
        let x = store.x();
        let y = store.y();
        let product = store.mult(x, y);

        assert!(x < y && y < product);
        assert_eq!(store.root(), Some(product));
        assert_eq!(store.used(), 3);
    }

    #[test]
    fn test_display() {
        let mut store = NodeStore::default();
        let root = sample_tree(&mut store);

        assert_eq!(store.display(root).to_string(), "E(add(x, y), sin(0.5), x)");
    }

    #[test]
    fn test_display_if_then_else() {
        let mut store = NodeStore::default();
        let x = store.x();
        let zero = store.number(0.0);
        let cond = store.geq(x, zero);
        let one = store.number(1.0);
        let then = store.triple(x, x, one);
        let neg = store.number(-0.25);
        let otherwise = store.triple(neg, neg, neg);
        let root = store.if_then_else(cond, then, otherwise);

        assert_eq!(
            store.display(root).to_string(),
            "if(geq(x, 0)) E(x, x, 1) else E(-0.25, -0.25, -0.25)"
        );
    }

    #[test]
    fn test_growth_preserves_tree() {
        let mut store = NodeStore::new(1);
        let root = sample_tree(&mut store);
        let before = store.display(root).to_string();
        let snapshot = store.iter().map(|(_, n)| *n).collect::<Vec<_>>();

        for i in 0..100 {
            store.number(i as f32);
        }

        assert!(store.capacity() >= 106);
        assert_eq!(store.display(root).to_string(), before);
        for (i, node) in snapshot.iter().enumerate() {
            assert_eq!(&store[NodeId::from(i)], node);
        }
    }

    #[test]
    fn test_seal_reserves_for_evaluation() {
        let mut store = NodeStore::new(1);
        sample_tree(&mut store);
        store.seal(DEFAULT_MARGIN);

        assert_eq!(store.size(), 6);
        assert!(store.capacity() >= 2 * (6 + DEFAULT_MARGIN));
        assert!(store.is_sealed());
    }

    #[test]
    fn test_reset_discards_appended_nodes() {
        let mut store = NodeStore::default();
        let root = sample_tree(&mut store);
        store.seal(DEFAULT_MARGIN);

        store.number(1.0);
        store.number(2.0);
        assert_eq!(store.used(), 8);
        assert_ne!(store.root(), Some(root));

        store.reset();
        assert_eq!(store.used(), 6);
        assert_eq!(store.root(), Some(root));
    }

    #[test]
    #[should_panic(expected = "must be sealed")]
    fn test_reset_requires_seal() {
        let mut store = NodeStore::default();
        store.x();
        store.reset();
    }

    #[test]
    fn test_clear() {
        let mut store = NodeStore::default();
        sample_tree(&mut store);
        store.seal(DEFAULT_MARGIN);
        store.clear();

        assert_eq!(store.used(), 0);
        assert_eq!(store.root(), None);
        assert!(!store.is_sealed());
    }

    #[rstest]
    #[case::terminal_with_child(NodeKind::X, 1)]
    #[case::number_with_child(NodeKind::Number, 1)]
    #[case::unary_without_child(NodeKind::Sin, 0)]
    #[case::unary_with_two(NodeKind::Cos, 2)]
    #[case::binary_with_one(NodeKind::Div, 1)]
    #[case::binary_with_three(NodeKind::Mod, 3)]
    #[case::ternary_with_two(NodeKind::Triple, 2)]
    #[case::if_with_one(NodeKind::IfThenElse, 1)]
    #[should_panic]
    fn test_node_rejects_wrong_arity(#[case] kind: NodeKind, #[case] children: usize) {
        let mut store = NodeStore::default();
        let ids = (0..3).map(|_| store.x()).collect::<Vec<_>>();
        store.node(kind, &ids[..children], Provenance::caller());
    }

    #[test]
    #[should_panic(expected = "number nodes must be built with a value")]
    fn test_node_rejects_number_kind() {
        let mut store = NodeStore::default();
        store.node(NodeKind::Number, &[], Provenance::caller());
    }

    #[test]
    #[should_panic(expected = "only 1 nodes exist")]
    fn test_node_rejects_forward_reference() {
        let mut store = NodeStore::default();
        let x = store.x();
        store.add(x, NodeId::new(5));
    }

    #[test]
    #[should_panic(expected = "capacity of 0")]
    fn test_zero_capacity() {
        NodeStore::new(0);
    }

    #[test]
    fn test_provenance_is_recorded() {
        let mut store = NodeStore::default();
        let x = store.x();
        let line = line!() - 1;

        assert_eq!(store[x].provenance.line, line);
        assert!(store[x].provenance.file.ends_with("store.rs"));
    }
}
