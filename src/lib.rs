//! This crate implements fully-dynamic connectivity for undirected graphs: it maintains the connected components of a graph while edges are inserted and deleted, using the Holm–Lichtenberg–Thorup (HDT) algorithm. See [SpanningForest].
//!
//! Queries and insertions take O(lg n) amortized time, and `delete_edge` takes O(lg² n).
//!
//! ## Usage
//!
//! Create a forest with [FastSpanningForest::new], add nodes and edges, and query away. Nodes and edges carry arbitrary caller payloads which the library never touches.
//!
//! ```
//! use dynamic_connectivity::FastSpanningForest;
//!
//! let mut g = FastSpanningForest::new();
//! let (a, b, c) = (g.add_node("a"), g.add_node("b"), g.add_node("c"));
//! let (ab, _) = g.create_edge(a, b, ());
//! g.create_edge(b, c, ());
//! assert!(g.has_path(a, c));
//! assert_eq!(g.cluster_size(a), 3);
//! let (_, split) = g.delete_edge(ab);
//! assert!(split && !g.has_path(a, c));
//! ```
//!
//! You can see example usage at `src/bin/example.rs` and run it with `cargo run`.
//!
//! ## Implementation
//!
//! Each level of the HDT hierarchy is a forest of Euler tours, stored as ordered lists in a balanced search tree with subtree aggregates. The layers can be used independently of the connectivity structure:
//! - Treaps: see `impl Lists for Treaps` in `src/lists/treap.rs`.
//! - Euler tour forests: see `EulerForest` in `src/euler_tour.rs`.
//! - The HDT core: see `SpanningForest` in `src/spanning_forest.rs`.
//!
//! ## Testing
//!
//! Run the tests using:
//!
//! ```skip
//! cargo test
//! ```
//!
//! Add `-- --ignored` to run the stress tests (which run indefinitely with random data until they fail). And use `cargo bench` to see the benchmarks.
pub mod euler_tour;
pub mod lists;
pub mod spanning_forest;
pub use spanning_forest::{EdgeRef, NodeRef, SpanningForest};

use lists::treap::Treaps;
use spanning_forest::OccAgg;

/// [SpanningForest] over the treap list backend, the configuration you want
/// unless you are plugging in your own `Lists` implementation.
pub type FastSpanningForest<N, E> = SpanningForest<Treaps<OccAgg>, N, E>;
