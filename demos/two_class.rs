use rust_classifier::{Classifier, Dataset, NeuralNet, TrainConfig};

fn main() -> rust_classifier::Result<()> {
    // Two classes, each sample repeated once.
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
        epochs: 1000,
        hidden: 8,
        init_scale: 0.1,
        seed: Some(42),
        log_every: 100,
        ..TrainConfig::default()
    });
    let report = net.fit(&train, None)?;

    for e in &report.epochs {
        println!(
            "epoch {:4}: loss={:.6} accuracy={:.2}",
            e.epoch, e.train_loss, e.train_accuracy
        );
    }

    for x in &xs {
        println!("{x:?} -> class {}", net.predict(x)?);
    }
    Ok(())
}
