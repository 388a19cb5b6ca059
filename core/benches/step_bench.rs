// Benchmarks for the single-step composer at increasing stack depths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use videopred_core::forward::step;
use videopred_core::model::{error_init_shapes, PredNetConfig, PredNetParams};
use videopred_core::tape::Tape;
use videopred_core::tensor::SimpleRng;

const H: usize = 16;
const W: usize = 24;

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("composer_step");

    for layers in [1usize, 2, 3] {
        let shapes = error_init_shapes(1, H, W, layers).unwrap();
        let cfg = PredNetConfig::build(&shapes).unwrap();
        let params = PredNetParams::init(&cfg, 0);

        let mut rng = SimpleRng::new(1);
        let mut frame_data = vec![0.0f32; 3 * H * W];
        rng.fill_uniform(&mut frame_data, 1.0);

        group.bench_with_input(BenchmarkId::new("layers", layers), &layers, |b, &l| {
            b.iter(|| {
                let mut tape = Tape::new();
                let wires = params.register(&mut tape, &cfg);
                let frame = tape.register_input(&frame_data, vec![1, 3, H, W]);
                let (errs, states) =
                    step(&mut tape, &wires, &cfg, frame, vec![None; l], vec![None; l]).unwrap();
                std::hint::black_box((errs, states));
            })
        });
    }

    group.finish();
}

fn bench_step_backward(c: &mut Criterion) {
    let mut group = c.benchmark_group("composer_step_backward");
    group.sample_size(20);

    let shapes = error_init_shapes(1, H, W, 2).unwrap();
    let cfg = PredNetConfig::build(&shapes).unwrap();
    let params = PredNetParams::init(&cfg, 0);

    let mut rng = SimpleRng::new(2);
    let mut frame_data = vec![0.0f32; 3 * H * W];
    rng.fill_uniform(&mut frame_data, 1.0);

    group.bench_function("two_layers", |b| {
        b.iter(|| {
            let mut tape = Tape::new();
            let wires = params.register(&mut tape, &cfg);
            let frame = tape.register_input(&frame_data, vec![1, 3, H, W]);
            let (errs, _) =
                step(&mut tape, &wires, &cfg, frame, vec![None; 2], vec![None; 2]).unwrap();
            let target = tape.zeros(&[1, 6, H, W]);
            let loss = tape.mse_loss(errs[0], target);
            tape.backward(loss);
            std::hint::black_box(wires.collect_grads(&tape));
        })
    });

    group.finish();
}

criterion_group!(benches, bench_step, bench_step_backward);
criterion_main!(benches);
