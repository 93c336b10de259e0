//! Fully-dynamic graph connectivity through a hierarchy of spanning forests.
//!
//! [SpanningForest] keeps one Euler tour forest per level. The level-0 forest
//! spans the whole graph, so connectivity questions are answered there; each
//! level above holds a subforest of the one below, and edges migrate upwards
//! as deletions search for replacements. Amortized over a sequence of
//! operations, insertion and queries take O(lg n) and deletion O(lg² n).

use std::collections::BTreeSet;
use std::fmt::{Debug, Formatter};

use crate::euler_tour::{EulerForest, TourEdge};
use crate::lists::{AggregatedData, Idx, Lists, SearchDirection};

/// Handle to a node of a [SpanningForest].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef(usize);

/// Handle to an edge currently present in a [SpanningForest].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeRef(usize);

impl Debug for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl Debug for EdgeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Element of a level's Euler tour.
#[derive(Clone)]
pub enum Occurrence {
    Node {
        node: NodeRef,
        /// The node has a tree edge of exactly this level in its adjacency.
        has_tree: bool,
        /// The node has a non-tree edge of exactly this level in its adjacency.
        has_extra: bool,
    },
    Edge { edge: EdgeRef },
}

impl Debug for Occurrence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node {
                node,
                has_tree,
                has_extra,
            } => {
                write!(f, "{node:?}")?;
                if *has_tree {
                    write!(f, "t")?;
                }
                if *has_extra {
                    write!(f, "x")?;
                }
                Ok(())
            }
            Self::Edge { edge } => write!(f, "{edge:?}"),
        }
    }
}

/// Which adjacency a search is interested in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mark {
    Tree,
    Extra,
}

/// OR-aggregate of the node marks in a subtree of the tour.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccAgg {
    any_tree: bool,
    any_extra: bool,
}

impl OccAgg {
    fn channel(&self, mark: Mark) -> bool {
        match mark {
            Mark::Tree => self.any_tree,
            Mark::Extra => self.any_extra,
        }
    }
}

impl AggregatedData for OccAgg {
    type Data = Occurrence;
    fn from(data: &Occurrence) -> Self {
        match data {
            Occurrence::Node {
                has_tree,
                has_extra,
                ..
            } => Self {
                any_tree: *has_tree,
                any_extra: *has_extra,
            },
            Occurrence::Edge { .. } => Self::default(),
        }
    }
    fn merge(self, right: Self) -> Self {
        Self {
            any_tree: self.any_tree || right.any_tree,
            any_extra: self.any_extra || right.any_extra,
        }
    }
}

/// Bookkeeping of one node at one level it participates in.
#[derive(Debug)]
struct NodeLevel {
    /// The node's occurrence in this level's tour forest.
    occ: Idx,
    /// Tree edges of exactly this level incident to the node.
    tree_adj: BTreeSet<EdgeRef>,
    /// Non-tree edges of exactly this level incident to the node.
    extra_adj: BTreeSet<EdgeRef>,
}

struct NodeSlot<N> {
    payload: N,
    /// One record per level the node participates in, gap-free from level 0.
    levels: Vec<NodeLevel>,
}

struct EdgeSlot<E> {
    payload: E,
    ends: [NodeRef; 2],
    /// Level of the edge; only ever increases.
    level: usize,
    /// Tour splices for levels 0..=level if this is a tree edge.
    tour: Option<Vec<TourEdge>>,
}

/// Fully-dynamic connectivity over an undirected multigraph.
///
/// Nodes and edges carry caller payloads `N` and `E`, which the library never
/// looks at; they are reachable through the returned [NodeRef]/[EdgeRef]
/// handles. The list backend `L` stores the Euler tours of every level.
pub struct SpanningForest<L, N, E>
where
    L: Lists<OccAgg>,
{
    /// One tour forest per level; each is a subforest of the previous one.
    levels: Vec<EulerForest<L, OccAgg>>,
    nodes: Vec<NodeSlot<N>>,
    edges: Vec<Option<EdgeSlot<E>>>,
    free_edges: Vec<usize>,
}

impl<L: Lists<OccAgg>, N, E> Debug for SpanningForest<L, N, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (l, forest) in self.levels.iter().enumerate() {
            writeln!(f, "level {l}: {forest:?}")?;
        }
        Ok(())
    }
}

impl<L: Lists<OccAgg>, N, E> Default for SpanningForest<L, N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Lists<OccAgg>, N, E> SpanningForest<L, N, E> {
    pub fn new() -> Self {
        Self {
            levels: vec![EulerForest::new(0)],
            nodes: Vec::new(),
            edges: Vec::new(),
            free_edges: Vec::new(),
        }
    }

    /// Adds an isolated node carrying `payload` to the graph.
    pub fn add_node(&mut self, payload: N) -> NodeRef {
        let u = NodeRef(self.nodes.len());
        self.nodes.push(NodeSlot {
            payload,
            levels: Vec::new(),
        });
        self.ensure_node_level(u, 0);
        u
    }

    /// Inserts an edge between u and v carrying `payload`. The second return
    /// is true iff the edge merged two separate clusters.
    ///
    /// Parallel edges are fine; self loops are not.
    pub fn create_edge(&mut self, u: NodeRef, v: NodeRef, payload: E) -> (EdgeRef, bool) {
        debug_assert_ne!(u, v, "self loops are not supported");
        let e = match self.free_edges.pop() {
            Some(i) => EdgeRef(i),
            None => {
                self.edges.push(None);
                EdgeRef(self.edges.len() - 1)
            }
        };
        let (ou, ov) = (self.occ(u, 0), self.occ(v, 0));
        let merged = !self.levels[0].is_connected(ou, ov);
        let tour = merged.then(|| {
            let t = self.levels[0]
                .connect(
                    ou,
                    ov,
                    Occurrence::Edge { edge: e },
                    Occurrence::Edge { edge: e },
                )
                .expect("endpoints are in separate tours");
            vec![t]
        });
        self.edges[e.0] = Some(EdgeSlot {
            payload,
            ends: [u, v],
            level: 0,
            tour,
        });
        let mark = if merged { Mark::Tree } else { Mark::Extra };
        self.adj_insert(u, 0, mark, e);
        self.adj_insert(v, 0, mark, e);
        log::trace!("created {e:?} between {u:?} and {v:?}, merged: {merged}");
        (e, merged)
    }

    /// Removes the edge, handing its payload back. The second return is true
    /// iff the removal split a cluster in two.
    pub fn delete_edge(&mut self, e: EdgeRef) -> (E, bool) {
        let slot = self.edges[e.0].take().expect("edge is not in the graph");
        self.free_edges.push(e.0);
        let EdgeSlot {
            payload,
            ends: [u, v],
            level,
            tour,
        } = slot;
        log::trace!("deleting {e:?} between {u:?} and {v:?} at level {level}");
        let Some(tour) = tour else {
            self.adj_remove(u, level, Mark::Extra, e);
            self.adj_remove(v, level, Mark::Extra, e);
            return (payload, false);
        };
        self.adj_remove(u, level, Mark::Tree, e);
        self.adj_remove(v, level, Mark::Tree, e);
        // Cut everywhere before searching: a replacement may only be linked
        // at levels where the endpoints are already separated.
        for (l, t) in tour.into_iter().enumerate().rev() {
            self.levels[l].disconnect(t);
        }
        for l in (0..=level).rev() {
            if let Some(r) = self.find_replacement(u, v, l) {
                self.attach_replacement(r, l);
                return (payload, false);
            }
        }
        (payload, true)
    }

    /// Is there a path between u and v in the current graph?
    pub fn has_path(&self, u: NodeRef, v: NodeRef) -> bool {
        self.levels[0].is_connected(self.occ(u, 0), self.occ(v, 0))
    }

    /// Number of nodes in u's cluster.
    pub fn cluster_size(&self, u: NodeRef) -> usize {
        self.levels[0].tree_size(self.occ(u, 0))
    }

    /// The canonical node of u's cluster: the one whose occurrence currently
    /// leads the cluster's tour. Consistent for every node of the cluster, but
    /// not stable across graph mutations.
    pub fn cluster_rep(&self, u: NodeRef) -> NodeRef {
        let first = self.levels[0].root(self.occ(u, 0));
        match self.levels[0].data(first) {
            Occurrence::Node { node, .. } => *node,
            Occurrence::Edge { .. } => unreachable!("tours always start at a node occurrence"),
        }
    }

    pub fn is_cluster_rep(&self, u: NodeRef) -> bool {
        self.levels[0].inner_lists().is_first(self.occ(u, 0))
    }

    /// Iterates the nodes of u's cluster in tour order, each exactly once.
    /// Borrows the forest, so the graph cannot change mid-iteration.
    pub fn cluster(&self, u: NodeRef) -> Cluster<'_, L> {
        let lists = self.levels[0].inner_lists();
        let occ = self.occ(u, 0);
        Cluster {
            lists,
            cur: lists.first(occ),
            remaining: self.levels[0].tree_size(occ),
        }
    }

    /// Payload of the node.
    pub fn node(&self, u: NodeRef) -> &N {
        &self.nodes[u.0].payload
    }

    pub fn node_mut(&mut self, u: NodeRef) -> &mut N {
        &mut self.nodes[u.0].payload
    }

    /// Payload of the edge. Panics if the edge is not in the graph.
    pub fn edge(&self, e: EdgeRef) -> &E {
        &self.edge_slot(e).payload
    }

    pub fn edge_mut(&mut self, e: EdgeRef) -> &mut E {
        &mut self.edges[e.0].as_mut().expect("edge is not in the graph").payload
    }

    pub fn ends(&self, e: EdgeRef) -> (NodeRef, NodeRef) {
        let [u, v] = self.edge_slot(e).ends;
        (u, v)
    }

    /// Is the edge part of the spanning forest? Deleting a tree edge may
    /// split a cluster, deleting a non-tree edge never does.
    pub fn is_tree_edge(&self, e: EdgeRef) -> bool {
        self.edge_slot(e).tour.is_some()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len() - self.free_edges.len()
    }

    /// Levels currently in use; stays within O(lg n).
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    fn edge_slot(&self, e: EdgeRef) -> &EdgeSlot<E> {
        self.edges[e.0].as_ref().expect("edge is not in the graph")
    }

    fn occ(&self, u: NodeRef, level: usize) -> Idx {
        self.nodes[u.0].levels[level].occ
    }

    /// Makes sure the node has occurrence and adjacency records up to `level`.
    fn ensure_node_level(&mut self, u: NodeRef, level: usize) {
        while self.levels.len() <= level {
            self.levels.push(EulerForest::new(0));
        }
        while self.nodes[u.0].levels.len() <= level {
            let l = self.nodes[u.0].levels.len();
            let occ = self.levels[l].create_node(Occurrence::Node {
                node: u,
                has_tree: false,
                has_extra: false,
            });
            self.nodes[u.0].levels.push(NodeLevel {
                occ,
                tree_adj: BTreeSet::new(),
                extra_adj: BTreeSet::new(),
            });
        }
    }

    fn adj_insert(&mut self, u: NodeRef, level: usize, mark: Mark, e: EdgeRef) {
        self.ensure_node_level(u, level);
        let nl = &mut self.nodes[u.0].levels[level];
        let inserted = match mark {
            Mark::Tree => nl.tree_adj.insert(e),
            Mark::Extra => nl.extra_adj.insert(e),
        };
        debug_assert!(inserted, "{e:?} was already adjacent to {u:?}");
        self.refresh_marks(u, level);
    }

    fn adj_remove(&mut self, u: NodeRef, level: usize, mark: Mark, e: EdgeRef) {
        let nl = &mut self.nodes[u.0].levels[level];
        let removed = match mark {
            Mark::Tree => nl.tree_adj.remove(&e),
            Mark::Extra => nl.extra_adj.remove(&e),
        };
        debug_assert!(removed, "{e:?} was not adjacent to {u:?}");
        self.refresh_marks(u, level);
    }

    /// Mirrors the emptiness of the adjacency sets into the node's occurrence,
    /// so tour aggregates know where incident edges of this level are.
    fn refresh_marks(&mut self, u: NodeRef, level: usize) {
        let nl = &self.nodes[u.0].levels[level];
        let (t, x) = (!nl.tree_adj.is_empty(), !nl.extra_adj.is_empty());
        let occ = nl.occ;
        self.levels[level].mutate_data(occ, |d| {
            if let Occurrence::Node {
                has_tree,
                has_extra,
                ..
            } = d
            {
                *has_tree = t;
                *has_extra = x;
            }
        });
    }

    /// Some node of `at`'s tour with the given mark set, if any.
    fn find_marked(&self, level: usize, at: Idx, mark: Mark) -> Option<NodeRef> {
        let found = self.levels[level].find_element(at, |s| {
            if let Occurrence::Node {
                has_tree,
                has_extra,
                ..
            } = s.current_data
            {
                let marked = match mark {
                    Mark::Tree => *has_tree,
                    Mark::Extra => *has_extra,
                };
                if marked {
                    return SearchDirection::Found;
                }
            }
            if s.left_agg.channel(mark) {
                SearchDirection::Left
            } else if s.right_agg.channel(mark) {
                SearchDirection::Right
            } else {
                SearchDirection::NotFound
            }
        });
        (found != L::EMPTY).then(|| match self.levels[level].data(found) {
            Occurrence::Node { node, .. } => *node,
            Occurrence::Edge { .. } => unreachable!("only node occurrences carry marks"),
        })
    }

    /// Re-registers the edge one level up. Tree edges are also linked into the
    /// tour forest of the level above, extending their splice stack.
    fn raise_edge(&mut self, e: EdgeRef, mark: Mark) {
        let slot = self.edge_slot(e);
        let ([a, b], level) = (slot.ends, slot.level);
        log::trace!("raising {mark:?} edge {e:?} from level {level}");
        self.adj_remove(a, level, mark, e);
        self.adj_remove(b, level, mark, e);
        self.adj_insert(a, level + 1, mark, e);
        self.adj_insert(b, level + 1, mark, e);
        self.edges[e.0]
            .as_mut()
            .expect("edge is not in the graph")
            .level = level + 1;
        if mark == Mark::Tree {
            let (oa, ob) = (self.occ(a, level + 1), self.occ(b, level + 1));
            let t = self.levels[level + 1]
                .connect(
                    oa,
                    ob,
                    Occurrence::Edge { edge: e },
                    Occurrence::Edge { edge: e },
                )
                .expect("endpoints of a raised tree edge must be separated one level up");
            self.edges[e.0]
                .as_mut()
                .expect("edge is not in the graph")
                .tour
                .as_mut()
                .expect("tree edge must already have a tour")
                .push(t);
        }
    }

    /// Looks for a level-`level` non-tree edge reconnecting the two tours the
    /// cut between u and v left behind, raising edges of the smaller side as
    /// it goes. The smaller side fits in the level above, which is what keeps
    /// deletions cheap in the amortized sense.
    fn find_replacement(&mut self, u: NodeRef, v: NodeRef, level: usize) -> Option<EdgeRef> {
        let (ou, ov) = (self.occ(u, level), self.occ(v, level));
        let small = if self.levels[level].tree_size(ou) <= self.levels[level].tree_size(ov) {
            ou
        } else {
            ov
        };
        // All tree edges of this level inside the smaller side move up first.
        while let Some(x) = self.find_marked(level, small, Mark::Tree) {
            loop {
                let Some(&e) = self.nodes[x.0].levels[level].tree_adj.first() else {
                    break;
                };
                self.raise_edge(e, Mark::Tree);
            }
        }
        // Probe the non-tree edges of the smaller side. An edge whose far
        // endpoint stays inside moves up; one that leaves the side reconnects
        // the two halves and is the replacement.
        while let Some(x) = self.find_marked(level, small, Mark::Extra) {
            loop {
                let Some(&e) = self.nodes[x.0].levels[level].extra_adj.first() else {
                    break;
                };
                let [a, b] = self.edge_slot(e).ends;
                if self.levels[level]
                    .is_connected(self.occ(a, level), self.occ(b, level))
                {
                    self.raise_edge(e, Mark::Extra);
                } else {
                    return Some(e);
                }
            }
        }
        None
    }

    /// Turns the found non-tree edge into a tree edge, linking it at its own
    /// level and every level below.
    fn attach_replacement(&mut self, e: EdgeRef, level: usize) {
        let [a, b] = self.edge_slot(e).ends;
        log::trace!("{e:?} replaces the deleted edge at level {level}");
        self.adj_remove(a, level, Mark::Extra, e);
        self.adj_remove(b, level, Mark::Extra, e);
        self.adj_insert(a, level, Mark::Tree, e);
        self.adj_insert(b, level, Mark::Tree, e);
        let tour = (0..=level)
            .map(|l| {
                let (oa, ob) = (self.occ(a, l), self.occ(b, l));
                self.levels[l]
                    .connect(
                        oa,
                        ob,
                        Occurrence::Edge { edge: e },
                        Occurrence::Edge { edge: e },
                    )
                    .expect("replacement endpoints must be separated at and below its level")
            })
            .collect();
        self.edges[e.0]
            .as_mut()
            .expect("edge is not in the graph")
            .tour = Some(tour);
    }
}

/// Lazy iterator over the nodes of one cluster, in Euler tour order.
pub struct Cluster<'a, L: Lists<OccAgg>> {
    lists: &'a L,
    cur: Idx,
    remaining: usize,
}

impl<'a, L: Lists<OccAgg>> Iterator for Cluster<'a, L> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let lists = self.lists;
        while self.cur != L::EMPTY {
            let data = lists.data(self.cur);
            self.cur = lists.next(self.cur);
            if let Occurrence::Node { node, .. } = data {
                self.remaining -= 1;
                return Some(*node);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, L: Lists<OccAgg>> ExactSizeIterator for Cluster<'a, L> {}
