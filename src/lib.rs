//! An online streaming clustering engine: a CluStream micro-cluster pool
//! that maintains a bounded summary of an unbounded point stream, and an
//! offline coreset-tree reducer that turns that summary into a refined
//! k-clustering on demand.

mod constants;
mod coreset_tree;
mod error;
mod helpers;
mod micro_cluster;
mod point;
mod reducer;
mod rng;

pub mod clu_stream;

pub use clu_stream::{CluStream, Config};
pub use coreset_tree::union_tree_coreset;
pub use error::{ClustreamError, Result};
pub use micro_cluster::MicroCluster;
pub use point::Point;
pub use rng::{ChaChaStreamRng, ScriptedRng, StreamRng};

pub mod prelude {
    //! Common imports for consumers of this crate.
    pub use crate::clu_stream::{CluStream, Config};
    pub use crate::error::{ClustreamError, Result};
    pub use crate::micro_cluster::MicroCluster;
    pub use crate::point::Point;
    pub use crate::rng::{ChaChaStreamRng, ScriptedRng, StreamRng};
}
