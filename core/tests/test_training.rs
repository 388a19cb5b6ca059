// End-to-end training driver: unrolled sequences, per-epoch SGD updates,
// and the empty-sequence no-op.

use videopred_core::model::{error_init_shapes, PredNetConfig, PredNetParams};
use videopred_core::tensor::{SimpleRng, Tensor};
use videopred_core::training::{fit, train, train_epoch, TrainOptions};

const H: usize = 8;
const W: usize = 12;

fn build(layers: usize) -> PredNetConfig {
    let shapes = error_init_shapes(1, H, W, layers).unwrap();
    PredNetConfig::build(&shapes).unwrap()
}

/// A smooth moving-gradient sequence: frame t is frame t-1 shifted in value,
/// so there is structure to predict.
fn make_sequence(t: usize) -> (Vec<Tensor>, Vec<Tensor>) {
    let frames = (0..t)
        .map(|ti| {
            let mut data = vec![0.0f32; 3 * H * W];
            for (i, v) in data.iter_mut().enumerate() {
                let x = (i % W) as f32;
                *v = ((x + ti as f32) * 0.3).sin() * 0.5;
            }
            Tensor::from_vec(data, &[1, 3, H, W])
        })
        .collect();
    let targets = (0..t).map(|_| Tensor::zeros(&[1, 6, H, W])).collect();
    (frames, targets)
}

#[test]
fn six_step_epoch_produces_finite_loss() {
    let cfg = build(2);
    let mut params = PredNetParams::init(&cfg, 0);
    let (frames, targets) = make_sequence(6);
    let loss = train_epoch(&mut params, &cfg, &frames, &targets, 0.1).unwrap();
    assert!(loss.is_finite());
    assert!(loss >= 0.0);
}

#[test]
fn every_epoch_loss_is_finite_and_params_move() {
    let cfg = build(1);
    let mut params = PredNetParams::init(&cfg, 0);
    let norm0 = params.norm();
    let (frames, targets) = make_sequence(4);
    let opts = TrainOptions { epochs: 3, lr: 0.1, seed: 0 };
    let losses = train(&mut params, &cfg, &frames, &targets, &opts).unwrap();
    assert_eq!(losses.len(), 3);
    for l in &losses {
        assert!(l.is_finite() && *l >= 0.0);
    }
    assert_ne!(params.norm(), norm0);
}

#[test]
fn consecutive_epochs_update_between_them() {
    let cfg = build(1);
    let mut params = PredNetParams::init(&cfg, 7);
    let (frames, targets) = make_sequence(3);
    let before = params.clone();
    train_epoch(&mut params, &cfg, &frames, &targets, 0.05).unwrap();
    let after_one = params.clone();
    assert_ne!(before, after_one);
    train_epoch(&mut params, &cfg, &frames, &targets, 0.05).unwrap();
    assert_ne!(after_one, params);
}

#[test]
fn zero_length_sequence_is_a_noop() {
    let cfg = build(2);
    let mut params = PredNetParams::init(&cfg, 3);
    let before = params.clone();
    let loss = train_epoch(&mut params, &cfg, &[], &[], 0.1).unwrap();
    assert_eq!(loss, 0.0);
    assert_eq!(params, before);

    let opts = TrainOptions { epochs: 2, lr: 0.1, seed: 0 };
    let losses = train(&mut params, &cfg, &[], &[], &opts).unwrap();
    assert_eq!(losses, vec![0.0, 0.0]);
    assert_eq!(params, before);
}

#[test]
fn zero_lr_leaves_params_unchanged() {
    let cfg = build(1);
    let mut params = PredNetParams::init(&cfg, 5);
    let before = params.clone();
    let (frames, targets) = make_sequence(2);
    train_epoch(&mut params, &cfg, &frames, &targets, 0.0).unwrap();
    assert_eq!(params, before);
}

#[test]
fn training_is_seed_deterministic() {
    let cfg = build(1);
    let (frames, targets) = make_sequence(3);
    let opts = TrainOptions { epochs: 2, lr: 0.1, seed: 11 };

    let (a, losses_a) = fit(&cfg, &frames, &targets, &opts).unwrap();
    let (b, losses_b) = fit(&cfg, &frames, &targets, &opts).unwrap();
    assert_eq!(losses_a, losses_b);
    assert_eq!(a, b);

    let other = TrainOptions { seed: 12, ..opts };
    let (c, _) = fit(&cfg, &frames, &targets, &other).unwrap();
    assert_ne!(a, c);
}

#[test]
fn random_sequence_trains_without_nan() {
    let cfg = build(2);
    let mut params = PredNetParams::init(&cfg, 1);
    let mut rng = SimpleRng::new(9);
    let frames: Vec<Tensor> = (0..4)
        .map(|_| {
            let mut data = vec![0.0f32; 3 * H * W];
            rng.fill_uniform(&mut data, 1.0);
            Tensor::from_vec(data, &[1, 3, H, W])
        })
        .collect();
    let targets: Vec<Tensor> = (0..4).map(|_| Tensor::zeros(&[1, 6, H, W])).collect();
    let opts = TrainOptions { epochs: 2, lr: 0.01, seed: 0 };
    let losses = train(&mut params, &cfg, &frames, &targets, &opts).unwrap();
    assert!(losses.iter().all(|l| l.is_finite()));
    assert!(params.norm().is_finite());
}
