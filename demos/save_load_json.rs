#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example save_load_json --features serde");
}

#[cfg(feature = "serde")]
fn main() -> rust_classifier::Result<()> {
    use rust_classifier::{Classifier, Dataset, NeuralNet, TrainConfig};

    let xs = vec![
        vec![0.0, 1.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 0.0],
    ];
    let ys = vec![
        vec![1.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
    ];
    let train = Dataset::from_rows(&xs, &ys)?;

    let mut net = NeuralNet::new(TrainConfig {
        epochs: 500,
        hidden: 8,
        init_scale: 0.1,
        seed: Some(0),
        ..TrainConfig::default()
    });
    net.fit(&train, None)?;

    let path = "target/tmp_net.json";
    net.save_json(path)?;

    let loaded = NeuralNet::load_json(path)?;
    println!(
        "saved and loaded model: {path}; prediction for [1, 0]: {}",
        loaded.predict(&[1.0, 0.0])?
    );
    Ok(())
}
