use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rust_classifier::{Activation, Classifier, Dataset, Error, NeuralNet, TrainConfig};

fn two_class() -> Dataset {
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
    Dataset::from_rows(&xs, &ys).unwrap()
}

fn config(seed: u64) -> TrainConfig {
    TrainConfig {
        epochs: 1000,
        batches: 1,
        hidden: 8,
        learning_rate: 0.5,
        lambda: 1e-3,
        init_scale: 0.1,
        seed: Some(seed),
        log_every: 100,
        ..TrainConfig::default()
    }
}

/// Three separated blobs in 2D, shuffled so the validation split sees every class.
fn blobs(n_per_class: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let centers = [[-1.0, -1.0], [1.0, -1.0], [0.0, 1.0]];
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (class, center) in centers.iter().enumerate() {
        for _ in 0..n_per_class {
            xs.push(vec![
                center[0] + rng.gen_range(-0.3..0.3),
                center[1] + rng.gen_range(-0.3..0.3),
            ]);
            let mut one_hot = vec![0.0; 3];
            one_hot[class] = 1.0;
            ys.push(one_hot);
        }
    }
    let mut data = Dataset::from_rows(&xs, &ys).unwrap();
    data.shuffle(&mut rng);
    data
}

#[test]
fn two_class_network_learns_the_training_set() {
    let data = two_class();
    let mut net = NeuralNet::new(config(42));
    let report = net.fit(&data, None).unwrap();

    let first = report.epochs.first().unwrap();
    assert!(report.train_loss < first.train_loss);
    assert!(report.train_loss < 2.0_f64.ln());

    let (_, acc) = net.evaluate(&data).unwrap();
    assert!(acc >= 0.75, "accuracy {acc}");
    assert_eq!(net.predict(&[0.0, 1.0]).unwrap(), 0);
    assert_eq!(net.predict(&[1.0, 0.0]).unwrap(), 1);
}

#[test]
fn sigmoid_hidden_layer_and_multiple_batches_also_train() {
    let data = two_class();
    let mut net = NeuralNet::new(TrainConfig {
        hidden_activation: Activation::Sigmoid,
        batches: 2,
        ..config(7)
    });
    let report = net.fit(&data, None).unwrap();
    assert!(report.train_loss < 2.0_f64.ln());
    assert!(net.evaluate(&data).unwrap().1 >= 0.75);
}

#[test]
fn training_is_reproducible_with_a_seed() {
    let data = two_class();
    let mut a = NeuralNet::new(config(3));
    let mut b = NeuralNet::new(config(3));
    let ra = a.fit(&data, None).unwrap();
    let rb = b.fit(&data, None).unwrap();
    assert_eq!(ra, rb);
    assert_eq!(a.params(), b.params());
}

#[test]
fn validation_split_is_tracked_per_logged_epoch() {
    let (train, validation) = blobs(40, 11).split_validation();
    assert_eq!(train.len(), 60);
    assert_eq!(validation.len(), 60);

    let mut net = NeuralNet::new(TrainConfig {
        epochs: 300,
        batches: 4,
        hidden: 16,
        learning_rate: 0.2,
        init_scale: 0.1,
        seed: Some(5),
        log_every: 50,
        ..TrainConfig::default()
    });
    let report = net.fit(&train, Some(&validation)).unwrap();

    assert_eq!(report.epochs.len(), 6);
    assert!(report.epochs.iter().all(|e| e.validation_loss.is_some()));
    let last = report.epochs.last().unwrap();
    assert!(last.validation_accuracy.unwrap() >= 0.9);
    assert_eq!(report.validation_loss, last.validation_loss);
}

#[test]
fn predicting_before_training_fails() {
    let net = NeuralNet::new(TrainConfig::default());
    assert!(matches!(net.predict(&[0.0, 1.0]), Err(Error::NotTrained(_))));
    assert!(matches!(
        net.evaluate(&two_class()),
        Err(Error::NotTrained(_))
    ));
}
