use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rust_classifier::{Classifier, Dataset, Distance, NearestNeighbour, evaluate};

/// Random byte-valued images with scalar class labels.
fn random_images(n: usize, dim: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let xs: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..dim).map(|_| f64::from(rng.gen_range(0u8..=255))).collect())
        .collect();
    let ys: Vec<Vec<f64>> = (0..n)
        .map(|_| vec![f64::from(rng.gen_range(0u8..10))])
        .collect();
    Dataset::from_rows(&xs, &ys).unwrap()
}

#[test]
fn recalls_its_own_training_set_exactly() {
    let data = random_images(100, 3 * 8 * 8, 2024);
    for distance in [Distance::L1, Distance::L2] {
        let mut knn = NearestNeighbour::new(distance, 1).unwrap();
        knn.train(&data).unwrap();

        let predicted = knn.predict_batch(data.features()).unwrap();
        for (i, &p) in predicted.iter().enumerate() {
            assert_eq!(p, data.target(i)[0] as usize, "row {i} with {distance:?}");
            assert_eq!(knn.predict_label(data.input(i)).unwrap(), data.target(i));
        }
    }
}

#[test]
fn one_hot_labels_work_with_evaluate() {
    let xs = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![0.0, 10.0]];
    let ys = vec![
        vec![1.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0],
    ];
    let data = Dataset::from_rows(&xs, &ys).unwrap();
    let mut knn = NearestNeighbour::new(Distance::L2, 1).unwrap();
    knn.train(&data).unwrap();

    assert_eq!(evaluate(&knn, &data).unwrap(), 1.0);
    assert_eq!(knn.predict(&[9.0, 8.0]).unwrap(), 1);
}

#[test]
fn scalar_labels_score_the_same_as_predictions() {
    let xs = vec![vec![0.0], vec![10.0], vec![20.0]];
    let mut knn = NearestNeighbour::new(Distance::L1, 1).unwrap();

    for ys in [
        vec![vec![3.0], vec![7.0], vec![5.0]],
        vec![vec![0.0], vec![1.0], vec![2.0]],
    ] {
        let data = Dataset::from_rows(&xs, &ys).unwrap();
        knn.train(&data).unwrap();
        assert_eq!(knn.predict_all(data.features()).unwrap(), data.classes());
        assert_eq!(evaluate(&knn, &data).unwrap(), 1.0);
    }

    // A wrong scalar prediction counts as a miss.
    let data = Dataset::from_rows(&xs, &[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
    let shifted = Dataset::from_rows(&xs, &[vec![0.0], vec![2.0], vec![2.0]]).unwrap();
    knn.train(&shifted).unwrap();
    assert!((evaluate(&knn, &data).unwrap() - 2.0 / 3.0).abs() < 1e-12);
}
