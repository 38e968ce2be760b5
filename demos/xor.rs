use backprop::{Dataset, MaxEpochs, Network, TrainConfig, TrainControl};

fn main() -> backprop::Result<()> {
    // Classic XOR dataset.
    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
    let train = Dataset::from_rows(&xs, &ys)?;

    // 2 -> 2 -> 1 network, the smallest topology that can separate XOR.
    let mut net = Network::new(&[2, 2, 1])?;
    net.randomize_with_seed(42);

    let cfg = TrainConfig {
        learning_rate: 0.5,
        max_error: 0.01,
        max_epochs: MaxEpochs::Bounded(20_000),
    };

    let report = net.train_observed(&train, &cfg, |stats| {
        if stats.epoch % 1_000 == 0 {
            println!("epoch {}: error = {:.6}", stats.epoch, stats.error);
        }
        TrainControl::Continue
    })?;

    println!(
        "epochs={} final_error={:.6} converged={}",
        report.epochs, report.final_error, report.converged
    );

    for x in &xs {
        let y = net.predict(x)?;
        println!("x={x:?} y={:.4}", y[0]);
    }

    Ok(())
}
