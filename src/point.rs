//! A weighted vector with a stable identity and a transient cluster
//! assignment slot, used both as a raw stream point (`weight == 1`) and,
//! inside the coreset tree, as a weighted point whose `feature` holds a
//! weighted coordinate *sum* rather than a coordinate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    features: Vec<f64>,
    weight: f64,
    index: i64,
    assigned_centre: usize,
}

impl Point {
    pub fn new(features: Vec<f64>, weight: f64, index: i64) -> Self {
        Point {
            features,
            weight,
            index,
            assigned_centre: 0,
        }
    }

    /// A deep duplicate preserving `index`, per the data model's copy
    /// invariant.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn dimension(&self) -> usize {
        self.features.len()
    }

    pub fn feature(&self, l: usize) -> f64 {
        self.features[l]
    }

    pub fn set_feature(&mut self, l: usize, v: f64) {
        self.features[l] = v;
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, w: f64) {
        self.weight = w;
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn set_index(&mut self, index: i64) {
        self.index = index;
    }

    pub fn assigned_centre(&self) -> usize {
        self.assigned_centre
    }

    pub fn set_assigned_centre(&mut self, i: usize) {
        self.assigned_centre = i;
    }

    /// The true coordinate at dimension `l`, undoing the weighted-sum
    /// convention (`feature == weight * coordinate`) when the point carries
    /// a nonzero weight.
    pub fn coord(&self, l: usize) -> f64 {
        if self.weight != 0.0 {
            self.features[l] / self.weight
        } else {
            self.features[l]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_preserves_index_and_deep_duplicates_features() {
        let mut a = Point::new(vec![1.0, 2.0], 1.0, 42);
        let b = a.copy();
        a.set_feature(0, 99.0);
        assert_eq!(b.index(), 42);
        assert_eq!(b.feature(0), 1.0);
        assert_eq!(a.feature(0), 99.0);
    }

    #[test]
    fn coord_divides_by_weight_unless_zero() {
        let weighted = Point::new(vec![4.0, 6.0], 2.0, 1);
        assert_eq!(weighted.coord(0), 2.0);
        assert_eq!(weighted.coord(1), 3.0);

        let dummy = Point::new(vec![4.0, 6.0], 0.0, 2);
        assert_eq!(dummy.coord(0), 4.0);
    }
}
