//! A Treap, or Cartesian Tree, is a BST that is also a heap for randomized priorities.
//! It is expected to be balanced and have logarithmic time complexity for all operations.

use std::fmt::{Debug, Formatter};

use debug_tree::{add_branch_to, add_leaf_to, AsTree, TreeBuilder};
use derivative::Derivative;
use rand::{rngs, Rng, SeedableRng};

use super::{AggregatedData, Idx, Lists, SearchData, SearchDirection};

fn node_fmt(u: &Idx, f: &mut Formatter) -> std::fmt::Result {
    if *u == usize::MAX {
        write!(f, "∅")
    } else {
        write!(f, "{u}")
    }
}
fn node2_fmt([u, v]: &[Idx; 2], f: &mut Formatter) -> std::fmt::Result {
    write!(f, "[")?;
    node_fmt(u, f)?;
    write!(f, ", ")?;
    node_fmt(v, f)?;
    write!(f, "]")
}

#[derive(Derivative)]
#[derivative(Debug)]
struct Node<Ag: AggregatedData> {
    #[derivative(Debug(format_with = "node_fmt"))]
    parent: Idx,
    /// Left and right child
    #[derivative(Debug(format_with = "node2_fmt"))]
    child: [Idx; 2],
    /// Data for this node
    data: Ag::Data,
    /// Aggregated data for this node's subtree
    ag_data: Ag,
    /// Zero iff the slot was destroyed and is waiting for reuse.
    size: usize,
    #[derivative(Debug = "ignore")]
    priority: u32,
}

impl<Ag: AggregatedData> Node<Ag> {
    fn new(data: Ag::Data, priority: u32) -> Self {
        Self {
            ag_data: Ag::from(&data),
            data,
            child: [Treaps::<Ag>::EMPTY; 2],
            parent: Treaps::<Ag>::EMPTY,
            size: 1,
            priority,
        }
    }
}

/// Data structure that maintains multiple treaps.
pub struct Treaps<Ag: AggregatedData = ()> {
    nodes: Vec<Node<Ag>>,
    free: Vec<Idx>,
    rng: rngs::StdRng,
}

impl<Ag: AggregatedData> Debug for Treaps<Ag> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let builder = TreeBuilder::new();
        add_branch_to!(builder, "Treaps");
        for u in 0..self.nodes.len() {
            if self.nodes[u].size > 0 && self.nodes[u].parent == Self::EMPTY {
                self.tree_inorder_dbg(u, &builder);
            }
        }
        writeln!(f, "{}", builder.string())
    }
}

impl<Ag: AggregatedData> Treaps<Ag> {
    #[allow(dead_code)]
    fn tree_preorder_dbg<T: AsTree>(&self, u: Idx, tree: &T) {
        let nu = &self.nodes[u];
        add_branch_to!(*tree, "[{u}] {nu:?}");
        if nu.child == [Self::EMPTY, Self::EMPTY] {
            return;
        }
        for c in nu.child {
            if c != Self::EMPTY {
                self.tree_preorder_dbg(c, tree);
            } else {
                add_leaf_to!(*tree, "<no edge>");
            }
        }
    }
    fn tree_inorder_dbg<T: AsTree>(&self, u: Idx, tree: &T) {
        let nu = &self.nodes[u];
        if nu.child[0] != Self::EMPTY {
            add_branch_to!(*tree, "left child of {u}");
            self.tree_inorder_dbg(nu.child[0], tree);
        }
        add_branch_to!(*tree, "[{u}] {nu:?}");
        if nu.child[1] != Self::EMPTY {
            self.tree_inorder_dbg(nu.child[1], tree);
        }
    }
    fn n(&self, u: Idx) -> Option<&Node<Ag>> {
        // Even safer than just self.nodes.get(u)
        if u == Self::EMPTY {
            None
        } else {
            Some(&self.nodes[u])
        }
    }
    /// Panics if u is empty. Returns old value.
    fn change_left(&mut self, u: Idx, new_l: Idx) -> Idx {
        let old_l = std::mem::replace(&mut self.nodes[u].child[0], new_l);
        if old_l != Self::EMPTY {
            self.nodes[old_l].parent = Self::EMPTY;
        }
        if new_l != Self::EMPTY {
            self.nodes[new_l].parent = u;
        }
        self.recalc(u);
        old_l
    }
    fn change_right(&mut self, u: Idx, new_r: Idx) -> Idx {
        let old_r = std::mem::replace(&mut self.nodes[u].child[1], new_r);
        if old_r != Self::EMPTY {
            self.nodes[old_r].parent = Self::EMPTY;
        }
        if new_r != Self::EMPTY {
            self.nodes[new_r].parent = u;
        }
        self.recalc(u);
        old_r
    }
    fn size(&self, u: Idx) -> usize {
        self.n(u).map_or(0, |n| n.size)
    }
    fn parent(&self, u: Idx) -> Idx {
        self.n(u).map_or(Self::EMPTY, |n| n.parent)
    }
    fn ag_data(&self, u: Idx) -> Ag {
        self.n(u).map_or_else(Ag::default, |n| n.ag_data.clone())
    }
    /// Call when children are changed.
    fn recalc(&mut self, u: Idx) -> Idx {
        if u == Self::EMPTY {
            return Self::EMPTY;
        }
        let [l, r] = self.nodes[u].child;
        self.nodes[u].size = self.size(l) + 1 + self.size(r);
        let ag = self
            .ag_data(l)
            .merge(Ag::from(&self.nodes[u].data))
            .merge(self.ag_data(r));
        self.nodes[u].ag_data = ag;
        u
    }
    /// (First k, rest). Both arguments and results are roots.
    fn split_k(&mut self, u: Idx, k: usize) -> (Idx, Idx) {
        if u == Self::EMPTY || k == 0 {
            // If k == 0 the node is fully returned on the right
            return (Self::EMPTY, u);
        }
        let [l, r] = self.nodes[u].child;
        let szl = self.size(l);
        if k <= szl {
            self.change_left(u, Self::EMPTY);
            let (ll, lr) = self.split_k(l, k);
            (ll, self.concat_inner(lr, u))
        } else {
            self.change_right(u, Self::EMPTY);
            let (rl, rr) = self.split_k(r, k - szl - 1);
            (self.concat_inner(u, rl), rr)
        }
    }
    #[allow(dead_code)]
    fn dbg_node(&self, u: Idx) {
        if u == Self::EMPTY {
            log::trace!("Node ∅");
        } else {
            let t = TreeBuilder::new();
            self.tree_preorder_dbg(u, &t);
            log::trace!("\n{}", t.string());
        }
    }
    fn concat_inner(&mut self, u: Idx, v: Idx) -> Idx {
        if u == Self::EMPTY {
            return v;
        } else if v == Self::EMPTY {
            return u;
        }
        if self.nodes[u].priority > self.nodes[v].priority {
            let old_r = self.change_right(u, Self::EMPTY);
            let new_r = self.concat_inner(old_r, v);
            self.change_right(u, new_r);
            u
        } else {
            let old_l = self.change_left(v, Self::EMPTY);
            let new_l = self.concat_inner(u, old_l);
            self.change_left(v, new_l);
            v
        }
    }
}

impl<Ag: AggregatedData> Lists<Ag> for Treaps<Ag> {
    const EMPTY: Idx = usize::MAX;

    fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            rng: rand::rngs::StdRng::seed_from_u64(2012),
        }
    }

    fn create(&mut self, data: Ag::Data) -> Idx {
        let node = Node::new(data, self.rng.gen());
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = node;
            idx
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn destroy(&mut self, u: Idx) {
        let n = &mut self.nodes[u];
        debug_assert!(
            n.parent == Self::EMPTY && n.child == [Self::EMPTY; 2],
            "can only destroy singletons"
        );
        n.size = 0;
        self.free.push(u);
    }

    fn total_size(&self) -> usize {
        self.nodes.len()
    }

    fn root(&self, mut u: Idx) -> Idx {
        while self.parent(u) != Self::EMPTY {
            u = self.nodes[u].parent;
        }
        u
    }

    fn data(&self, u: Idx) -> &Ag::Data {
        &self.nodes[u].data
    }

    fn mutate_data(&mut self, mut u: Idx, f: impl FnOnce(&mut Ag::Data)) {
        f(&mut self.nodes[u].data);
        while u != Self::EMPTY {
            self.recalc(u);
            u = self.parent(u);
        }
    }

    fn order(&self, u: Idx) -> usize {
        if u == Self::EMPTY {
            return 0;
        }
        let mut ord = self.size(self.nodes[u].child[0]);
        let mut cur = u;
        let mut p = self.nodes[u].parent;
        while p != Self::EMPTY {
            if self.nodes[p].child[1] == cur {
                ord += self.size(self.nodes[p].child[0]) + 1;
            }
            cur = p;
            p = self.nodes[p].parent;
        }
        ord
    }

    fn find_element(
        &self,
        u: Idx,
        mut search_strategy: impl FnMut(SearchData<'_, Ag>) -> SearchDirection,
    ) -> Idx {
        let mut u = self.root(u);
        use SearchDirection::*;
        while u != Self::EMPTY {
            let [l, r] = self.nodes[u].child;
            let (left_agg, right_agg) = (self.ag_data(l), self.ag_data(r));
            match search_strategy(SearchData {
                current_data: self.data(u),
                left_agg: &left_agg,
                right_agg: &right_agg,
            }) {
                Found => return u,
                NotFound => return Self::EMPTY,
                Left => u = l,
                Right => u = r,
            }
        }
        Self::EMPTY
    }

    fn find_kth(&self, u: Idx, mut k: usize) -> Idx {
        let mut u = self.root(u);
        if self.size(u) <= k {
            return Self::EMPTY;
        }
        while u != Self::EMPTY {
            let [l, r] = self.nodes[u].child;
            let sl = self.size(l);
            if sl > k {
                u = l;
            } else if sl == k {
                return u;
            } else {
                k -= sl + 1;
                u = r;
            }
        }
        Self::EMPTY
    }

    fn len(&self, u: Idx) -> usize {
        if u == Self::EMPTY {
            0
        } else {
            self.size(self.root(u))
        }
    }

    fn total_agg(&self, u: Idx) -> Ag {
        if u == Self::EMPTY {
            Ag::default()
        } else {
            self.ag_data(self.root(u))
        }
    }

    fn concat(&mut self, u: Idx, v: Idx) -> Idx {
        let (u, v) = (self.root(u), self.root(v));
        if u == v {
            return u;
        }
        self.concat_inner(u, v)
    }

    fn split_lr(&mut self, u: Idx, ql: usize, qr: usize) -> (Idx, Idx, Idx) {
        let u = self.root(u);
        let (l, mr) = self.split_k(u, ql);
        let (m, r) = self.split_k(mr, qr - ql);
        (l, m, r)
    }
}
