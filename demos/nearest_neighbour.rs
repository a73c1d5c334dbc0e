use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rust_classifier::{Classifier, Dataset, Distance, NearestNeighbour, accuracy};

fn main() -> rust_classifier::Result<()> {
    // Random "images" with scalar labels; held-out queries are noisy copies of training rows.
    let mut rng = StdRng::seed_from_u64(0);
    let n = 200;
    let dim = 48;

    let xs: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(0.0..255.0)).collect())
        .collect();
    let ys: Vec<Vec<f64>> = (0..n)
        .map(|_| vec![f64::from(rng.gen_range(0u8..10))])
        .collect();
    let train = Dataset::from_rows(&xs, &ys)?;

    let queries: Vec<Vec<f64>> = xs
        .iter()
        .map(|x| x.iter().map(|v| v + rng.gen_range(-10.0..10.0)).collect())
        .collect();
    let expected: Vec<usize> = ys.iter().map(|y| y[0] as usize).collect();
    let queries = rust_classifier::Matrix::from_rows(&queries)?;

    for (distance, k) in [(Distance::L1, 1), (Distance::L2, 1), (Distance::L2, 3)] {
        let mut knn = NearestNeighbour::new(distance, k)?;
        knn.train(&train)?;
        let predicted = knn.predict_batch(&queries)?;
        println!(
            "{distance:?} k={k}: accuracy {:.3}",
            accuracy(&predicted, &expected)
        );
    }
    Ok(())
}
