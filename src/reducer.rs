//! The reducer façade: turns the maintainer's current micro-cluster
//! centroids into a coreset and reduces it to `k` representative centres.

use crate::clu_stream::CluStream;
use crate::coreset_tree::union_tree_coreset;
use crate::error::{ClustreamError, Result};
use crate::point::Point;
use crate::rng::StreamRng;

impl CluStream {
    /// Materializes the pool's micro-cluster centroids as weighted points
    /// (`weight = n`, `feature = ls`, matching the Point convention that a
    /// feature holds a weighted coordinate sum), splits them into two
    /// roughly equal halves, and reduces them to `k` centres via the
    /// coreset tree.
    pub fn reduce(&self, k: usize, rng: &mut dyn StreamRng) -> Result<Vec<Point>> {
        let pool_size = self.clusters().len();
        if !(2..=pool_size).contains(&k) {
            return Err(ClustreamError::Configuration(format!(
                "k must be within 2..={pool_size}, got {k}"
            )));
        }

        let weighted: Vec<Point> = self
            .clusters()
            .iter()
            .enumerate()
            .map(|(i, mc)| Point::new(mc.ls().to_vec(), mc.n() as f64, i as i64))
            .collect();

        let mid = weighted.len() / 2;
        let (set_a, set_b) = weighted.split_at(mid);
        Ok(union_tree_coreset(k, set_a, set_b, rng))
    }
}
