//! CluStream micro-cluster: online sufficient statistics over a substream
//! of absorbed points, from which a centroid, radius, and relevance stamp
//! are derived.

use serde::{Deserialize, Serialize};

use crate::helpers;
use crate::point::Point;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MicroCluster {
    dim: usize,
    n: u64,
    ls: Vec<f64>,
    ss: Vec<f64>,
    lst: f64,
    sst: f64,
    t: f64,
    m: u64,
    centroid: Point,
}

impl MicroCluster {
    /// Seeds a new micro-cluster with a single absorbed point.
    pub fn create(seed: &Point, ts: i64, t: f64, m: u64) -> Self {
        let ts_f = ts as f64;
        let ls: Vec<f64> = seed.features().to_vec();
        let ss: Vec<f64> = ls.iter().map(|&f| f * f).collect();
        MicroCluster {
            dim: seed.dimension(),
            n: 1,
            ls,
            ss,
            lst: ts_f,
            sst: ts_f * ts_f,
            t,
            m,
            centroid: seed.copy(),
        }
    }

    /// Accumulates `p`'s contribution into the five sufficient statistics
    /// and recomputes the centroid.
    pub fn insert(&mut self, p: &Point, ts: i64) {
        self.n += 1;
        for l in 0..self.dim {
            self.ls[l] += p.feature(l);
            self.ss[l] += p.feature(l) * p.feature(l);
        }
        let ts_f = ts as f64;
        self.lst += ts_f;
        self.sst += ts_f * ts_f;
        self.recompute_centroid();
    }

    /// Component-wise addition of sufficient statistics. Commutative:
    /// `a.merge(&b)` and `b.merge(&a)` land on the same statistics (up to
    /// argument order, which callers must account for separately).
    pub fn merge(&mut self, other: &MicroCluster) {
        debug_assert_eq!(self.dim, other.dim, "cannot merge micro-clusters of different dimension");
        self.n += other.n;
        for l in 0..self.dim {
            self.ls[l] += other.ls[l];
            self.ss[l] += other.ss[l];
        }
        self.lst += other.lst;
        self.sst += other.sst;
        self.recompute_centroid();
    }

    fn recompute_centroid(&mut self) {
        if self.n == 1 {
            return;
        }
        let n = self.n as f64;
        let features: Vec<f64> = self.ls.iter().map(|&s| s / n).collect();
        self.centroid = Point::new(features, 1.0, self.centroid.index());
    }

    pub fn centroid(&self) -> &Point {
        &self.centroid
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    /// The raw linear sum of absorbed coordinates, i.e. `centroid * n`
    /// without the division-then-multiplication round trip.
    pub fn ls(&self) -> &[f64] {
        &self.ls
    }

    /// `t * sigma`, aggregating variance across dimensions by the mean
    /// (rather than the max). Returns `+inf` for `n == 1`, the sentinel
    /// callers substitute with a nearest-other-centroid distance estimate.
    pub fn radius(&self) -> f64 {
        if self.n <= 1 {
            return f64::INFINITY;
        }
        let n = self.n as f64;
        let mean_variance: f64 = (0..self.dim)
            .map(|l| {
                let mean = self.ls[l] / n;
                helpers::clamp_non_negative(self.ss[l] / n - mean * mean)
            })
            .sum::<f64>()
            / self.dim as f64;
        self.t * mean_variance.sqrt()
    }

    /// The estimated age beyond which this micro-cluster should be
    /// considered stale.
    pub fn relevance_stamp(&self) -> f64 {
        let n = self.n;
        let mean_t = self.lst / n as f64;
        if n <= 2 * self.m {
            return mean_t;
        }
        let variance_t = helpers::clamp_non_negative(self.sst / n as f64 - mean_t * mean_t);
        let sigma_t = variance_t.sqrt();
        let quantile = self.m as f64 / (2.0 * n as f64);
        mean_t + sigma_t * helpers::inverse_normal_cdf(quantile)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    fn p(features: Vec<f64>, index: i64) -> Point {
        Point::new(features, 1.0, index)
    }

    #[test]
    fn create_with_no_inserts_has_centroid_equal_to_seed() {
        let seed = p(vec![1.0, 2.0], 7);
        let mc = MicroCluster::create(&seed, 100, 2.0, 1);
        assert_eq!(mc.centroid(), &seed);
        assert!(approx_eq!(f64, mc.relevance_stamp(), 100.0));
        assert_eq!(mc.n(), 1);
        assert!(mc.radius().is_infinite());
    }

    #[test]
    fn insert_accumulates_statistics_and_moves_centroid() {
        let seed = p(vec![0.0, 0.0], 1);
        let mut mc = MicroCluster::create(&seed, 1, 2.0, 1);
        mc.insert(&p(vec![10.0, 0.0], 2), 2);
        assert_eq!(mc.n(), 2);
        assert!(approx_eq!(f64, mc.centroid().feature(0), 5.0));
        assert!(approx_eq!(f64, mc.centroid().feature(1), 0.0));
    }

    #[test]
    fn merge_is_commutative_on_sufficient_statistics() {
        let mut a = MicroCluster::create(&p(vec![0.0, 0.0], 1), 1, 2.0, 1);
        a.insert(&p(vec![2.0, 0.0], 2), 2);
        let mut b = MicroCluster::create(&p(vec![10.0, 10.0], 3), 3, 2.0, 1);

        let mut a_merge_b = a.clone();
        a_merge_b.merge(&b);
        let mut b_merge_a = b.clone();
        b_merge_a.merge(&a);

        assert_eq!(a_merge_b.n(), b_merge_a.n());
        assert!(approx_eq!(f64, a_merge_b.ls()[0], b_merge_a.ls()[0]));
        assert!(approx_eq!(f64, a_merge_b.ls()[1], b_merge_a.ls()[1]));
    }

    #[test]
    fn variance_is_clamped_non_negative_after_many_inserts() {
        let mut mc = MicroCluster::create(&p(vec![5.0, 5.0], 1), 0, 2.0, 1);
        for i in 1..20 {
            mc.insert(&p(vec![5.0, 5.0], i), i);
        }
        assert!(mc.radius() >= 0.0);
        assert!(approx_eq!(f64, mc.radius(), 0.0, epsilon = 1e-9));
    }

    #[test]
    fn relevance_stamp_uses_mean_timestamp_while_n_is_at_most_2m() {
        let mut mc = MicroCluster::create(&p(vec![0.0], 1), 10, 1.0, 5);
        mc.insert(&p(vec![0.0], 2), 20);
        // n == 2 <= 2*m == 10, so relevance stamp is just the mean timestamp.
        assert!(approx_eq!(f64, mc.relevance_stamp(), 15.0));
    }
}
