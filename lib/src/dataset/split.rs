//! Stratified train/evaluation partitioning.

use super::{DatasetError, LabeledDataset};
use crate::features::Diagnosis;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Ordering;

impl LabeledDataset {
    /// Split into `(train, test)` while preserving the class proportions.
    ///
    /// The evaluation partition receives `ceil(n * test_size)` rows, shared
    /// between the classes in proportion to their frequency (floor of each share,
    /// leftover rows going to the classes with the largest fractional part).
    /// Every class keeps at least one row on the training side.
    ///
    /// Row order inside each partition is shuffled by a `StdRng` seeded with
    /// `seed`, so equal inputs always produce equal partitions.
    pub fn stratified_split(
        &self,
        test_size: f64,
        seed: u64,
    ) -> Result<(LabeledDataset, LabeledDataset), DatasetError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(DatasetError::InvalidTestSize(test_size));
        }

        let classes = [Diagnosis::Benign, Diagnosis::Malignant];
        let mut members: Vec<Vec<usize>> = classes
            .iter()
            .map(|&class| {
                self.labels()
                    .iter()
                    .enumerate()
                    .filter(|(_, &label)| label == class)
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        for (class, indices) in classes.iter().zip(&members) {
            if indices.len() < 2 {
                return Err(DatasetError::ClassTooSmall {
                    class: *class,
                    count: indices.len(),
                });
            }
        }

        let n = self.len();
        let n_test = (n as f64 * test_size).ceil() as usize;
        let allocation = allocate(n, n_test, &members);

        let mut rng = StdRng::seed_from_u64(seed);
        let mut train = Vec::with_capacity(n - n_test);
        let mut test = Vec::with_capacity(n_test);
        for (indices, &take) in members.iter_mut().zip(&allocation) {
            indices.shuffle(&mut rng);
            test.extend_from_slice(&indices[..take]);
            train.extend_from_slice(&indices[take..]);
        }
        train.shuffle(&mut rng);
        test.shuffle(&mut rng);

        Ok((self.select(&train), self.select(&test)))
    }
}

/// Per-class evaluation counts for a total of `n_test` rows.
fn allocate(n: usize, n_test: usize, members: &[Vec<usize>]) -> Vec<usize> {
    let shares: Vec<f64> = members
        .iter()
        .map(|m| n_test as f64 * m.len() as f64 / n as f64)
        .collect();
    let mut allocation: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();

    let mut order: Vec<usize> = (0..members.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = shares[a] - shares[a].floor();
        let fb = shares[b] - shares[b].floor();
        fb.partial_cmp(&fa).unwrap_or(Ordering::Equal)
    });

    let mut remaining = n_test.saturating_sub(allocation.iter().sum());
    for &class in order.iter().cycle().take(members.len() * 2) {
        if remaining == 0 {
            break;
        }
        if allocation[class] + 1 < members[class].len() {
            allocation[class] += 1;
            remaining -= 1;
        }
    }

    for (take, m) in allocation.iter_mut().zip(members) {
        *take = (*take).min(m.len() - 1);
    }
    allocation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::N_FEATURES;
    use ndarray::Array2;

    fn dataset(benign: usize, malignant: usize) -> LabeledDataset {
        let n = benign + malignant;
        let x = Array2::from_shape_fn((n, N_FEATURES), |(r, _)| r as f64);
        let mut labels = vec![Diagnosis::Benign; benign];
        labels.extend(vec![Diagnosis::Malignant; malignant]);
        LabeledDataset::new(x, labels).unwrap()
    }

    #[test]
    fn test_split_sizes_reference_proportions() {
        // Same class balance as the reference corpus.
        let ds = dataset(357, 212);
        let (train, test) = ds.stratified_split(0.2, 42).unwrap();

        assert_eq!(test.len(), 114);
        assert_eq!(train.len(), 455);
        assert_eq!(test.class_counts(), (72, 42));
        assert_eq!(train.class_counts(), (285, 170));
    }

    #[test]
    fn test_split_is_deterministic() {
        let ds = dataset(50, 30);
        let (a_train, a_test) = ds.stratified_split(0.25, 7).unwrap();
        let (b_train, b_test) = ds.stratified_split(0.25, 7).unwrap();
        assert_eq!(a_train, b_train);
        assert_eq!(a_test, b_test);
    }

    #[test]
    fn test_split_seed_changes_partition() {
        let ds = dataset(50, 30);
        let (_, a_test) = ds.stratified_split(0.25, 1).unwrap();
        let (_, b_test) = ds.stratified_split(0.25, 2).unwrap();
        assert_ne!(a_test, b_test);
    }

    #[test]
    fn test_split_partitions_are_disjoint_and_complete() {
        let ds = dataset(40, 20);
        let (train, test) = ds.stratified_split(0.3, 11).unwrap();

        // Column 0 holds the original row index.
        let mut seen: Vec<usize> = train
            .features()
            .column(0)
            .iter()
            .chain(test.features().column(0).iter())
            .map(|&v| v as usize)
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..60).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_rejects_bad_test_size() {
        let ds = dataset(10, 10);
        for bad in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                ds.stratified_split(bad, 0),
                Err(DatasetError::InvalidTestSize(_))
            ));
        }
    }

    #[test]
    fn test_split_rejects_tiny_class() {
        let ds = dataset(10, 1);
        assert!(matches!(
            ds.stratified_split(0.2, 0),
            Err(DatasetError::ClassTooSmall {
                class: Diagnosis::Malignant,
                count: 1
            })
        ));
    }

    #[test]
    fn test_split_keeps_training_rows_per_class() {
        let ds = dataset(2, 2);
        let (train, test) = ds.stratified_split(0.9, 3).unwrap();
        let (tb, tm) = train.class_counts();
        assert!(tb >= 1 && tm >= 1);
        assert_eq!(train.len() + test.len(), 4);
    }
}
