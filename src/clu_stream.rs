//! The CluStream maintainer: a bounded pool of micro-clusters updated
//! point-by-point under a time-window relevance policy.

use serde::{Deserialize, Serialize};

use crate::error::{ClustreamError, Result};
use crate::helpers;
use crate::micro_cluster::MicroCluster;
use crate::point::Point;

/// The maintainer's configuration surface: time window, relevance quantile
/// parameter, radius multiplier, pool size, and point dimensionality.
/// Validated once at construction so every later call can assume it's
/// sound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub h: i64,
    pub m: u64,
    pub t: f64,
    pub q: usize,
    pub dim: usize,
}

impl Config {
    pub fn new(h: i64, m: u64, t: f64, q: usize, dim: usize) -> Result<Self> {
        if h <= 0 {
            return Err(ClustreamError::Configuration(format!(
                "time window h must be > 0, got {h}"
            )));
        }
        if t <= 0.0 {
            return Err(ClustreamError::Configuration(format!(
                "radius multiplier t must be > 0, got {t}"
            )));
        }
        if q < 2 {
            return Err(ClustreamError::Configuration(format!(
                "pool size q must be >= 2, got {q}"
            )));
        }
        if dim == 0 {
            return Err(ClustreamError::Configuration(
                "point dimension dim must be >= 1".to_string(),
            ));
        }
        Ok(Config { h, m, t, q, dim })
    }
}

/// Holds the bounded pool of micro-clusters and routes each arriving point
/// through the absorb/forget/merge/spawn decision. Single logical owner of
/// the pool, not re-entrant.
#[derive(Debug)]
pub struct CluStream {
    config: Config,
    clusters: Vec<MicroCluster>,
    last_ts: Option<i64>,
}

impl CluStream {
    pub fn new(config: Config) -> Self {
        CluStream {
            clusters: Vec::with_capacity(config.q),
            config,
            last_ts: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clusters(&self) -> &[MicroCluster] {
        &self.clusters
    }

    /// Executes exactly one of bootstrap / absorb / forget / merge for the
    /// incoming point, in that priority order.
    pub fn offline_cluster(&mut self, p: &Point, ts: i64) -> Result<()> {
        if p.dimension() != self.config.dim {
            return Err(ClustreamError::Configuration(format!(
                "point dimension {} does not match configured dimension {}",
                p.dimension(),
                self.config.dim
            )));
        }
        if p.weight() == 0.0 {
            return Err(ClustreamError::Precondition(
                "cannot absorb a zero-weight point into the stream".to_string(),
            ));
        }
        if let Some(prev) = self.last_ts {
            if ts < prev {
                return Err(ClustreamError::Precondition(format!(
                    "timestamp {ts} is earlier than the previous timestamp {prev}"
                )));
            }
        }
        self.last_ts = Some(ts);

        // 1. Bootstrap.
        if self.clusters.len() < self.config.q {
            log::debug!("{ts} bootstrapped micro-cluster {}", self.clusters.len());
            self.clusters
                .push(MicroCluster::create(p, ts, self.config.t, self.config.m));
            return Ok(());
        }

        // 2. Absorb.
        let distances: Vec<f64> = self
            .clusters
            .iter()
            .map(|c| euclidean(p, c.centroid()))
            .collect();
        let (closest, min_distance) = helpers::arg_min(&distances);
        let radius = if self.clusters[closest].n() > 1 {
            self.clusters[closest].radius()
        } else {
            self.nearest_other_centroid_distance(closest)
        };
        if min_distance < radius {
            log::debug!("{ts} absorbed into micro-cluster {closest}");
            self.clusters[closest].insert(p, ts);
            return Ok(());
        }

        // 3. Forget.
        let threshold = (ts - self.config.h) as f64;
        if let Some(stale) = self
            .clusters
            .iter()
            .position(|c| c.relevance_stamp() < threshold)
        {
            log::debug!("{ts} forgot micro-cluster {stale}");
            self.clusters[stale] = MicroCluster::create(p, ts, self.config.t, self.config.m);
            return Ok(());
        }

        // 4. Merge the closest pair, then spawn a fresh micro-cluster for `p`
        // in the freed slot.
        let (i, j) = self.closest_pair();
        log::debug!("{ts} merged micro-clusters {i} and {j}");
        let absorbed = self.clusters[j].clone();
        self.clusters[i].merge(&absorbed);
        self.clusters[j] = MicroCluster::create(p, ts, self.config.t, self.config.m);
        Ok(())
    }

    fn nearest_other_centroid_distance(&self, idx: usize) -> f64 {
        let centroid = self.clusters[idx].centroid();
        self.clusters
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != idx)
            .map(|(_, c)| euclidean(centroid, c.centroid()))
            .fold(f64::INFINITY, f64::min)
    }

    /// `(i, j)` with `i < j` minimizing the distance between centroids.
    /// Ties keep the lowest `(i, j)` pair encountered.
    fn closest_pair(&self) -> (usize, usize) {
        let mut best = (0usize, 1usize, f64::INFINITY);
        for i in 0..self.clusters.len() {
            for j in (i + 1)..self.clusters.len() {
                let d = euclidean(self.clusters[i].centroid(), self.clusters[j].centroid());
                if d < best.2 {
                    best = (i, j, d);
                }
            }
        }
        (best.0, best.1)
    }
}

fn euclidean(a: &Point, b: &Point) -> f64 {
    (0..a.dimension())
        .map(|l| {
            let d = a.feature(l) - b.feature(l);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    fn p(features: Vec<f64>, index: i64) -> Point {
        Point::new(features, 1.0, index)
    }

    #[test]
    fn config_rejects_undersized_pool() {
        assert!(Config::new(100, 1, 2.0, 1, 2).is_err());
    }

    #[test]
    fn config_rejects_zero_dimension() {
        assert!(Config::new(100, 1, 2.0, 3, 0).is_err());
    }

    /// Three points into an empty q=3 pool each spawn their own
    /// micro-cluster.
    #[test]
    fn bootstrap_spawns_one_cluster_per_point() {
        let config = Config::new(100, 1, 2.0, 3, 2).unwrap();
        let mut cs = CluStream::new(config);
        cs.offline_cluster(&p(vec![0.0, 0.0], 1), 1).unwrap();
        cs.offline_cluster(&p(vec![10.0, 0.0], 2), 2).unwrap();
        cs.offline_cluster(&p(vec![0.0, 10.0], 3), 3).unwrap();

        assert_eq!(cs.clusters().len(), 3);
        for c in cs.clusters() {
            assert_eq!(c.n(), 1);
        }
    }

    /// A point close to cluster 0's centroid is absorbed because its n==1
    /// radius estimate (distance to the nearest other centroid) dwarfs the
    /// actual distance.
    #[test]
    fn absorb_into_nearest_cluster() {
        let config = Config::new(100, 1, 2.0, 3, 2).unwrap();
        let mut cs = CluStream::new(config);
        cs.offline_cluster(&p(vec![0.0, 0.0], 1), 1).unwrap();
        cs.offline_cluster(&p(vec![10.0, 0.0], 2), 2).unwrap();
        cs.offline_cluster(&p(vec![0.0, 10.0], 3), 3).unwrap();

        cs.offline_cluster(&p(vec![0.1, 0.0], 4), 4).unwrap();

        assert_eq!(cs.clusters().len(), 3);
        assert_eq!(cs.clusters()[0].n(), 2);
        assert!(approx_eq!(f64, cs.clusters()[0].ls()[0], 0.1));
        assert!(approx_eq!(f64, cs.clusters()[0].centroid().feature(0), 0.05));
    }

    /// At ts=100 with h=5, both existing q=2 clusters are stale (relevance
    /// stamp <= 2 < 95), so the first one is replaced.
    #[test]
    fn forget_replaces_first_stale_cluster() {
        let config = Config::new(5, 1, 2.0, 2, 2).unwrap();
        let mut cs = CluStream::new(config);
        cs.offline_cluster(&p(vec![0.0, 0.0], 1), 1).unwrap();
        cs.offline_cluster(&p(vec![10.0, 0.0], 2), 2).unwrap();

        cs.offline_cluster(&p(vec![20.0, 0.0], 3), 100).unwrap();

        assert_eq!(cs.clusters().len(), 2);
        assert_eq!(cs.clusters()[0].n(), 1);
        assert!(approx_eq!(f64, cs.clusters()[0].centroid().feature(0), 20.0));
        assert!(approx_eq!(f64, cs.clusters()[1].centroid().feature(0), 10.0));
    }

    /// With h large enough that nothing is forgotten and the third point too
    /// far from either centroid to be absorbed, the closest pair (0, 1)
    /// merges and cluster 1's slot is reused for the new point.
    #[test]
    fn merge_closest_pair_then_spawns_in_freed_slot() {
        let config = Config::new(1000, 1, 2.0, 2, 2).unwrap();
        let mut cs = CluStream::new(config);
        cs.offline_cluster(&p(vec![0.0, 0.0], 1), 1).unwrap();
        cs.offline_cluster(&p(vec![10.0, 0.0], 2), 2).unwrap();

        cs.offline_cluster(&p(vec![100.0, 0.0], 3), 3).unwrap();

        assert_eq!(cs.clusters().len(), 2);
        assert_eq!(cs.clusters()[0].n(), 2);
        assert!(approx_eq!(f64, cs.clusters()[0].ls()[0], 10.0));
        assert_eq!(cs.clusters()[1].n(), 1);
        assert!(approx_eq!(f64, cs.clusters()[1].centroid().feature(0), 100.0));
    }

    /// A stream of identical points into q=5 yields four singleton
    /// micro-clusters and one with the rest, all centred at the same point.
    #[test]
    fn all_identical_points_collapse_radius_to_zero() {
        let config = Config::new(1000, 1, 2.0, 5, 2).unwrap();
        let mut cs = CluStream::new(config);
        for i in 0..100 {
            cs.offline_cluster(&p(vec![5.0, 5.0], i), i).unwrap();
        }

        assert_eq!(cs.clusters().len(), 5);
        let total: u64 = cs.clusters().iter().map(|c| c.n()).sum();
        assert_eq!(total, 100);
        for c in cs.clusters() {
            assert!(approx_eq!(f64, c.centroid().feature(0), 5.0));
            assert!(approx_eq!(f64, c.centroid().feature(1), 5.0));
        }
    }

    #[test]
    fn rejects_decreasing_timestamps() {
        let config = Config::new(100, 1, 2.0, 2, 1).unwrap();
        let mut cs = CluStream::new(config);
        cs.offline_cluster(&p(vec![0.0], 1), 10).unwrap();
        let err = cs.offline_cluster(&p(vec![1.0], 2), 5).unwrap_err();
        assert!(matches!(err, ClustreamError::Precondition(_)));
    }

    #[test]
    fn rejects_zero_weight_points() {
        let config = Config::new(100, 1, 2.0, 2, 1).unwrap();
        let mut cs = CluStream::new(config);
        let mut zero = p(vec![0.0], 1);
        zero.set_weight(0.0);
        let err = cs.offline_cluster(&zero, 1).unwrap_err();
        assert!(matches!(err, ClustreamError::Precondition(_)));
    }
}
