//! Brute-force nearest-neighbour classification.
//!
//! Training stores the examples as-is. Prediction measures the distance from the query to
//! every stored example (`O(N * D)`) and returns the label of the closest one. There is no
//! index structure: the result is always the exact nearest neighbour.
//!
//! Ties go to the example found first during the linear scan, i.e. the lowest training index
//! for the single nearest neighbour.

use log::info;

use crate::classifier::Classifier;
use crate::data::label_class;
use crate::{Dataset, Error, Matrix, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distance {
    /// Manhattan distance: sum of absolute differences.
    #[default]
    L1,
    /// Squared Euclidean distance: sum of squared differences.
    L2,
}

impl Distance {
    #[inline]
    pub fn between(self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Distance::L1 => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            Distance::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = x - y;
                    d * d
                })
                .sum(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NearestNeighbour {
    distance: Distance,
    k: usize,
    data: Option<Dataset>,
}

impl NearestNeighbour {
    /// A classifier voting among the `k` nearest examples. `k` must be > 0.
    pub fn new(distance: Distance, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig("k must be > 0".to_owned()));
        }
        Ok(Self {
            distance,
            k,
            data: None,
        })
    }

    #[inline]
    pub fn distance(&self) -> Distance {
        self.distance
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Indices of the `k` nearest stored examples, nearest first.
    ///
    /// After each minimum is found it is swapped with the last candidate and the pool shrinks,
    /// so the search is `O(k * N)` without sorting. Returns fewer than `k` indices when fewer
    /// examples are stored.
    pub fn nearest(&self, input: &[f64], k: usize) -> Result<Vec<usize>> {
        let data = self.stored(input)?;

        let mut candidates: Vec<(usize, f64)> = (0..data.len())
            .map(|i| (i, self.distance.between(input, data.input(i))))
            .collect();

        let mut found = Vec::with_capacity(k.min(candidates.len()));
        while found.len() < k && !candidates.is_empty() {
            let mut best = 0;
            for (pos, &(_, d)) in candidates.iter().enumerate().skip(1) {
                if d < candidates[best].1 {
                    best = pos;
                }
            }
            found.push(candidates.swap_remove(best).0);
        }
        Ok(found)
    }

    /// Raw label row of the single nearest example.
    pub fn predict_label(&self, input: &[f64]) -> Result<&[f64]> {
        let nearest = self.nearest(input, 1)?;
        let data = self.stored(input)?;
        Ok(data.target(nearest[0]))
    }

    /// Predict every row of `inputs`, logging progress every 1/40 of the rows.
    pub fn predict_batch(&self, inputs: &Matrix) -> Result<Vec<usize>> {
        let total = inputs.rows();
        let report_every = (total / 40).max(1);
        let mut out = Vec::with_capacity(total);
        for (i, row) in inputs.iter_rows().enumerate() {
            out.push(self.predict(row)?);
            if (i + 1) % report_every == 0 {
                info!(
                    "{:7.3}% - {} out of {total} done",
                    100.0 * (i + 1) as f64 / total as f64,
                    i + 1
                );
            }
        }
        Ok(out)
    }

    fn stored(&self, input: &[f64]) -> Result<&Dataset> {
        let data = self.data.as_ref().ok_or_else(|| {
            Error::NotTrained("call train before predicting with NearestNeighbour".to_owned())
        })?;
        if input.len() != data.input_dim() {
            return Err(Error::InvalidData(format!(
                "input len {} does not match stored input_dim {}",
                input.len(),
                data.input_dim()
            )));
        }
        Ok(data)
    }
}

impl Classifier for NearestNeighbour {
    fn train(&mut self, data: &Dataset) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidData("train dataset must not be empty".to_owned()));
        }
        self.data = Some(data.clone());
        Ok(())
    }

    /// Majority class among the `k` nearest examples; ties go to the class seen first.
    fn predict(&self, input: &[f64]) -> Result<usize> {
        let data = self.stored(input)?;
        let classes = self
            .nearest(input, self.k)?
            .into_iter()
            .map(|i| label_class(data.target(i)))
            .collect::<Result<Vec<usize>>>()?;

        let votes = |c: usize| classes.iter().filter(|&&x| x == c).count();
        let mut winner = classes[0];
        let mut winner_votes = votes(winner);
        for &c in &classes[1..] {
            let v = votes(c);
            if v > winner_votes {
                winner = c;
                winner_votes = v;
            }
        }
        Ok(winner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_data(n: usize, dim: usize, seed: u64) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        let xs: Vec<Vec<f64>> = (0..n)
            .map(|_| (0..dim).map(|_| rng.gen_range(0..255) as f64).collect())
            .collect();
        let ys: Vec<Vec<f64>> = (0..n).map(|_| vec![rng.gen_range(0..10) as f64]).collect();
        Dataset::from_rows(&xs, &ys).unwrap()
    }

    #[test]
    fn recalls_every_training_label() {
        let data = random_data(30, 32, 99);
        for distance in [Distance::L1, Distance::L2] {
            let mut knn = NearestNeighbour::new(distance, 1).unwrap();
            knn.train(&data).unwrap();
            for i in 0..data.len() {
                assert_eq!(knn.predict_label(data.input(i)).unwrap(), data.target(i));
                assert_eq!(
                    knn.predict(data.input(i)).unwrap(),
                    data.target(i)[0] as usize
                );
            }
        }
    }

    #[test]
    fn distances() {
        let a = [1.0, -2.0, 3.0];
        let b = [0.0, 2.0, 3.0];
        assert_eq!(Distance::L1.between(&a, &b), 5.0);
        assert_eq!(Distance::L2.between(&a, &b), 17.0);
    }

    #[test]
    fn ties_go_to_lowest_training_index() {
        let data = Dataset::from_rows(
            &[vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.0, 1.0]],
            &[vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]],
        )
        .unwrap();
        let mut knn = NearestNeighbour::new(Distance::L2, 1).unwrap();
        knn.train(&data).unwrap();

        // Equidistant from all three examples.
        assert_eq!(knn.nearest(&[0.0, 0.0], 1).unwrap(), vec![0]);
        assert_eq!(knn.predict(&[0.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn nearest_returns_neighbours_in_distance_order() {
        let xs: Vec<Vec<f64>> = [5.0, 1.0, 4.0, 2.0, 3.0].iter().map(|&v| vec![v]).collect();
        let ys: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let data = Dataset::from_rows(&xs, &ys).unwrap();

        let mut knn = NearestNeighbour::new(Distance::L1, 1).unwrap();
        knn.train(&data).unwrap();
        assert_eq!(knn.nearest(&[0.0], 5).unwrap(), vec![1, 3, 4, 2, 0]);
        assert_eq!(knn.nearest(&[0.0], 10).unwrap().len(), 5);
    }

    #[test]
    fn k_nearest_takes_a_majority_vote() {
        let xs: Vec<Vec<f64>> = [0.0, 0.1, 0.2, 5.0].iter().map(|&v| vec![v]).collect();
        let ys = vec![vec![2.0], vec![7.0], vec![7.0], vec![2.0]];
        let data = Dataset::from_rows(&xs, &ys).unwrap();

        let mut knn = NearestNeighbour::new(Distance::L1, 3).unwrap();
        knn.train(&data).unwrap();
        assert_eq!(knn.predict(&[0.0]).unwrap(), 7);

        // Two-way tie: the class of the nearer neighbour wins.
        let mut knn2 = NearestNeighbour::new(Distance::L1, 2).unwrap();
        knn2.train(&data).unwrap();
        assert_eq!(knn2.predict(&[0.0]).unwrap(), 2);
    }

    #[test]
    fn errors_before_training_and_on_bad_input() {
        assert!(NearestNeighbour::new(Distance::L1, 0).is_err());

        let mut knn = NearestNeighbour::new(Distance::L1, 1).unwrap();
        assert!(matches!(knn.predict(&[0.0]), Err(Error::NotTrained(_))));

        knn.train(&random_data(3, 4, 1)).unwrap();
        assert!(matches!(knn.predict(&[0.0]), Err(Error::InvalidData(_))));
    }

    #[test]
    fn predict_batch_matches_row_by_row() {
        let data = random_data(12, 3, 4);
        let mut knn = NearestNeighbour::new(Distance::L2, 1).unwrap();
        knn.train(&data).unwrap();
        let batch = knn.predict_batch(data.features()).unwrap();
        let expected: Vec<usize> = (0..12).map(|i| data.target(i)[0] as usize).collect();
        assert_eq!(batch, expected);
    }
}
