//! Euler tour forests, with custom aggregated data.

use std::{fmt::Debug, marker::PhantomData};

use crate::lists::{AggregatedData, Idx, Lists, SearchData, SearchDirection};

/// The two directed occurrences a tree edge leaves inside its tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourEdge(Idx, Idx);

impl TourEdge {
    /// Inner indices for the two directions of the edge
    pub fn occurrences(&self) -> [Idx; 2] {
        [self.0, self.1]
    }
}

/// Maintains the Euler tours of a forest of trees inside a single [Lists]
/// arena. Each node and edge occurrence has associated data, which can be
/// aggregated over whole tours.
///
/// A tree with k nodes takes 3k-2 elements in its tour: every node appears
/// exactly once and every tree edge twice, once per direction. The first
/// element of a tour is always a node occurrence.
pub struct EulerForest<L, Ag>
where
    L: Lists<Ag>,
    Ag: AggregatedData,
{
    l: L,
    _phantom: PhantomData<Ag>,
}

impl<L, Ag> Debug for EulerForest<L, Ag>
where
    L: Lists<Ag>,
    Ag: AggregatedData,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tours: ")?;
        for u in 0..self.l.total_size() {
            if self.l.root(u) == u && self.l.len(u) > 0 {
                write!(f, "<")?;
                for i in 0..self.l.len(u) {
                    let j = self.l.find_kth(u, i);
                    write!(f, "{j}{d:?} ", d = self.l.data(j))?;
                }
                write!(f, "> ")?;
            }
        }
        Ok(())
    }
}

impl<L, Ag> EulerForest<L, Ag>
where
    L: Lists<Ag>,
    Ag: AggregatedData,
{
    pub const EMPTY: Idx = L::EMPTY;

    pub fn new(capacity: usize) -> Self {
        Self {
            l: L::new(capacity),
            _phantom: PhantomData,
        }
    }

    /// Creates a new node in its own singleton tour.
    pub fn create_node(&mut self, data: Ag::Data) -> Idx {
        self.l.create(data)
    }

    /// Makes the given node the root of its tree, i.e. the first of its tour.
    pub fn reroot(&mut self, u: Idx) {
        if !self.l.is_first(u) {
            let (before_u, u_and_after, _) = self.l.split(u, self.l.order(u)..);
            self.l.concat(u_and_after, before_u);
        }
    }

    /// Returns the root of the tree containing u, i.e. its first occurrence.
    pub fn root(&self, u: Idx) -> Idx {
        self.l.first(u)
    }

    pub fn is_connected(&self, u: Idx, v: Idx) -> bool {
        self.l.on_same_list(u, v)
    }

    /// Adds an edge between the root of self and the root of other. Panics if they are on the same tree.
    fn link_root(&mut self, u: Idx, root_w: Idx, uw_data: Ag::Data, wu_data: Ag::Data) -> TourEdge {
        debug_assert!(!self.l.on_same_list(u, root_w));
        debug_assert!(self.l.is_first(root_w));
        let uw = self.l.create(uw_data);
        let wu = self.l.create(wu_data);

        // "AAA u BBB" and "w CCC" (it is root) becomes
        // AAA u uw w CCC wu BBB
        let (_, until_u, after_u) = self.l.split(u, 0..=self.l.order(u));
        self.l.concat_all([until_u, uw, root_w, wu, after_u]);
        TourEdge(uw, wu)
    }

    /// Connects the two nodes with an edge. The root of the first tree remains
    /// the root. Returns None if they are already connected.
    pub fn connect(
        &mut self,
        u: Idx,
        w: Idx,
        uw_data: Ag::Data,
        wu_data: Ag::Data,
    ) -> Option<TourEdge> {
        if self.l.on_same_list(u, w) {
            // Already connected
            None
        } else {
            self.reroot(w);
            Some(self.link_root(u, w, uw_data, wu_data))
        }
    }

    /// Remove the edge, releasing its two occurrences, and return the root of
    /// the current tree and then the root of the new tree the removal created.
    pub fn disconnect(&mut self, edge: TourEdge) -> (Idx, Idx) {
        let [e, oe] = edge.occurrences();
        debug_assert!(self.l.on_same_list(e, oe));
        let (a, b) = (self.l.order(e), self.l.order(oe));
        let (left, middle, right) = self.l.split(e, a.min(b)..=a.max(b));
        // Strip the first and last items, the occurrences of the edge which no longer exists
        let (x, middle, y) = self.l.split(middle, 1..self.l.len(middle) - 1);
        debug_assert_eq!(self.l.len(x), 1);
        debug_assert_eq!(self.l.len(y), 1);
        self.l.destroy(x);
        self.l.destroy(y);
        let rest = self.l.concat(left, right);
        (self.l.first(rest), self.l.first(middle))
    }

    /// Number of nodes in the whole tree this node is contained in.
    pub fn tree_size(&self, u: Idx) -> usize {
        (self.l.len(u) + 2) / 3
    }

    /// Finds an element in the tree containing this node and return it. It may be a node or an edge occurrence.
    pub fn find_element(
        &self,
        u: Idx,
        search_strategy: impl FnMut(SearchData<'_, Ag>) -> SearchDirection,
    ) -> Idx {
        self.l.find_element(u, search_strategy)
    }

    /// Returns data of the occurrence. Can be used for node occurrences, or for Idx of edges returned by find_element.
    pub fn data(&self, u: Idx) -> &Ag::Data {
        self.l.data(u)
    }

    /// Modifies the data on a given occurrence, keeping aggregates current.
    pub fn mutate_data(&mut self, u: Idx, f: impl FnOnce(&mut Ag::Data)) {
        self.l.mutate_data(u, f)
    }

    pub fn inner_lists(&self) -> &L {
        &self.l
    }
}
