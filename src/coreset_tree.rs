//! The offline coreset-tree reducer: a randomized k-means++-style binary
//! partition tree that selects `k` representative centres from the union of
//! two weighted point sets.
//!
//! Nodes live in an arena (`CoresetTree::nodes`) addressed by index rather
//! than owned pointers, so the parent/child/parent-back-reference cycle never
//! needs breaking by hand. The whole tree is dropped in one shot when
//! `union_tree_coreset` returns, on every exit path, without a manual
//! teardown call.

use std::collections::HashMap;

use crate::constants::{CHOOSE_CENTRE_TRIALS, DUMMY_FEATURE_VALUE, DUMMY_INDEX};
use crate::point::Point;
use crate::rng::StreamRng;

#[derive(Debug)]
struct TreeNode {
    points: Vec<Point>,
    centre_idx: usize,
    cost: f64,
    parent: Option<usize>,
    lc: Option<usize>,
    rc: Option<usize>,
}

impl TreeNode {
    fn is_leaf(&self) -> bool {
        self.lc.is_none() && self.rc.is_none()
    }
}

struct CoresetTree {
    nodes: Vec<TreeNode>,
}

const ROOT: usize = 0;

impl CoresetTree {
    fn cost_of_point(p: &Point, centre: &Point) -> f64 {
        if p.weight() == 0.0 {
            return 0.0;
        }
        squared_distance(p, centre) * p.weight()
    }

    fn node_cost(points: &[Point], centre: &Point) -> f64 {
        points.iter().map(|p| Self::cost_of_point(p, centre)).sum()
    }

    /// Hypothetical cost of splitting `points` between two candidate
    /// centres, without actually partitioning anything.
    fn split_cost(points: &[Point], centre_a: &Point, centre_b: &Point) -> f64 {
        points
            .iter()
            .map(|p| {
                let da = squared_distance(p, centre_a);
                let db = squared_distance(p, centre_b);
                da.min(db) * p.weight()
            })
            .sum()
    }

    /// Descends from the root to a leaf, recursing left with probability
    /// `lc.cost / node.cost` at each internal node.
    fn select_node(&self, rng: &mut dyn StreamRng) -> usize {
        let mut cur = ROOT;
        loop {
            let node = &self.nodes[cur];
            if node.is_leaf() {
                return cur;
            }
            let lc = node.lc.unwrap();
            let rc = node.rc.unwrap();
            let lc_cost = self.nodes[lc].cost;
            let rc_cost = self.nodes[rc].cost;

            let go_left = if lc_cost == 0.0 && rc_cost == 0.0 {
                let lc_empty = self.nodes[lc].points.is_empty();
                let rc_empty = self.nodes[rc].points.is_empty();
                if lc_empty && !rc_empty {
                    false
                } else if rc_empty && !lc_empty {
                    true
                } else {
                    rng.next_open01() < 0.5
                }
            } else {
                rng.next_open01() < lc_cost / node.cost
            };

            cur = if go_left { lc } else { rc };
        }
    }

    /// k-means++ weighted sampling at a leaf: up to `CHOOSE_CENTRE_TRIALS`
    /// independent draws, keeping the candidate whose hypothetical split
    /// cost is lowest. Falls back to `leaf.points[0]` if no trial improves
    /// on the leaf's current cost, so the return value is always
    /// well-defined.
    fn choose_centre(&self, leaf_idx: usize, centres: &[Point], rng: &mut dyn StreamRng) -> Point {
        let leaf = &self.nodes[leaf_idx];
        let centre = &centres[leaf.centre_idx];
        let mut min_cost = leaf.cost;
        let mut best: Option<Point> = None;

        for _ in 0..CHOOSE_CENTRE_TRIALS {
            let u = rng.next_open01();
            let mut running = 0.0;
            let mut picked: Option<&Point> = None;
            for p in &leaf.points {
                running += Self::cost_of_point(p, centre) / leaf.cost;
                if running >= u {
                    picked = Some(p);
                    break;
                }
            }
            let Some(p) = picked else { continue };

            if p.weight() == 0.0 {
                log::warn!(
                    "chooseCentre sampled a zero-weight point though non-dummy points were available"
                );
                return best.unwrap_or_else(|| leaf.points[0].copy());
            }

            let candidate_cost = Self::split_cost(&leaf.points, centre, p);
            if candidate_cost < min_cost {
                min_cost = candidate_cost;
                best = Some(p.copy());
            }
        }

        best.unwrap_or_else(|| leaf.points[0].copy())
    }

    /// Partitions `leaf`'s points by nearest of `(old_centre, new_centre)`,
    /// replacing it with two child leaves and propagating the cost change
    /// up to the root.
    fn split(&mut self, leaf_idx: usize, old_centre: &Point, new_centre: &Point, new_centre_idx: usize) {
        let parent_points = std::mem::take(&mut self.nodes[leaf_idx].points);
        let mut old_points = Vec::new();
        let mut new_points = Vec::new();

        for p in parent_points {
            let da = squared_distance(&p, old_centre);
            let db = squared_distance(&p, new_centre);
            if da.is_nan() || db.is_nan() {
                log::warn!(
                    "point {} has no nearest centre (non-finite distance); dropping it from the split",
                    p.index()
                );
                continue;
            }
            if da < db {
                old_points.push(p);
            } else {
                let mut np = p;
                np.set_assigned_centre(new_centre_idx);
                new_points.push(np);
            }
        }

        let old_cost = Self::node_cost(&old_points, old_centre);
        let new_cost = Self::node_cost(&new_points, new_centre);
        let parent_centre_idx = self.nodes[leaf_idx].centre_idx;

        let lc_idx = self.nodes.len();
        self.nodes.push(TreeNode {
            points: old_points,
            centre_idx: parent_centre_idx,
            cost: old_cost,
            parent: Some(leaf_idx),
            lc: None,
            rc: None,
        });
        let rc_idx = self.nodes.len();
        self.nodes.push(TreeNode {
            points: new_points,
            centre_idx: new_centre_idx,
            cost: new_cost,
            parent: Some(leaf_idx),
            lc: None,
            rc: None,
        });

        self.nodes[leaf_idx].lc = Some(lc_idx);
        self.nodes[leaf_idx].rc = Some(rc_idx);

        let mut cur = Some(leaf_idx);
        while let Some(idx) = cur {
            if let (Some(l), Some(r)) = (self.nodes[idx].lc, self.nodes[idx].rc) {
                self.nodes[idx].cost = self.nodes[l].cost + self.nodes[r].cost;
            }
            cur = self.nodes[idx].parent;
        }
    }
}

fn squared_distance(p: &Point, centre: &Point) -> f64 {
    (0..p.dimension())
        .map(|l| {
            let d = p.coord(l) - centre.coord(l);
            d * d
        })
        .sum()
}

/// Selects `k` representative centres from `set_a ∪ set_b` by randomized
/// k-means++-style binary partitioning.
///
/// Precondition: `1 <= k <= set_a.len() + set_b.len()`; this is a
/// lower-level operation and assumes its caller (the reducer façade's `k ∈
/// 2..=q` validation) has already checked the bound.
pub fn union_tree_coreset(
    k: usize,
    set_a: &[Point],
    set_b: &[Point],
    rng: &mut dyn StreamRng,
) -> Vec<Point> {
    let n1 = set_a.len();
    let n2 = set_b.len();
    let n = n1 + n2;
    debug_assert!(k >= 1, "k must be at least 1");
    debug_assert!(k <= n, "k must not exceed the number of input points");

    let j = (rng.next_u31() % n as u32) as usize;
    let seed = if j < n1 { set_a[j].copy() } else { set_b[j - n1].copy() };

    let mut centres = Vec::with_capacity(k);
    centres.push(seed);

    let mut root_points = Vec::with_capacity(n);
    for p in set_a.iter().chain(set_b.iter()) {
        let mut owned = p.copy();
        owned.set_assigned_centre(0);
        root_points.push(owned);
    }
    let root_cost = CoresetTree::node_cost(&root_points, &centres[0]);
    let mut tree = CoresetTree {
        nodes: vec![TreeNode {
            points: root_points,
            centre_idx: 0,
            cost: root_cost,
            parent: None,
            lc: None,
            rc: None,
        }],
    };

    let mut chosen = 1;
    while chosen < k {
        if tree.nodes[ROOT].cost == 0.0 {
            let mut dummy = centres[0].copy();
            for l in 0..dummy.dimension() {
                dummy.set_feature(l, DUMMY_FEATURE_VALUE);
            }
            dummy.set_index(DUMMY_INDEX);
            dummy.set_weight(0.0);
            centres.push(dummy);
        } else {
            let leaf_idx = tree.select_node(rng);
            let old_centre = centres[tree.nodes[leaf_idx].centre_idx].copy();
            let new_centre = tree.choose_centre(leaf_idx, &centres, rng);
            tree.split(leaf_idx, &old_centre, &new_centre, chosen);
            centres.push(new_centre);
        }
        chosen += 1;
    }

    // Post-pass reweighting: every point ends up in exactly one leaf by
    // construction, so map original index -> final assigned centre from the
    // leaves, then fold each non-seed point's weight and weighted features
    // into its centre.
    let mut assignment: HashMap<i64, usize> = HashMap::with_capacity(n);
    for node in &tree.nodes {
        if node.is_leaf() {
            for p in &node.points {
                assignment.insert(p.index(), p.assigned_centre());
            }
        }
    }

    for p in set_a.iter().chain(set_b.iter()) {
        let Some(&centre_idx) = assignment.get(&p.index()) else {
            continue;
        };
        if centres[centre_idx].index() != p.index() {
            let c = &mut centres[centre_idx];
            c.set_weight(c.weight() + p.weight());
            for l in 0..p.dimension() {
                let updated = c.feature(l) + p.feature(l);
                c.set_feature(l, updated);
            }
        }
    }

    centres
}
