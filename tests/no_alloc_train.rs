use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

use backprop::{Dataset, MaxEpochs, Network, TrainConfig};

struct CountingAlloc {
    allocs: AtomicUsize,
    reallocs: AtomicUsize,
    deallocs: AtomicUsize,
    bytes: AtomicUsize,
}

impl CountingAlloc {
    const fn new() -> Self {
        Self {
            allocs: AtomicUsize::new(0),
            reallocs: AtomicUsize::new(0),
            deallocs: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
        }
    }

    fn reset(&self) {
        self.allocs.store(0, Ordering::Relaxed);
        self.reallocs.store(0, Ordering::Relaxed);
        self.deallocs.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self) -> AllocSnapshot {
        AllocSnapshot {
            allocs: self.allocs.load(Ordering::Relaxed),
            reallocs: self.reallocs.load(Ordering::Relaxed),
            deallocs: self.deallocs.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }

    fn alloc_events(&self) -> usize {
        self.allocs.load(Ordering::Relaxed) + self.reallocs.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AllocSnapshot {
    allocs: usize,
    reallocs: usize,
    deallocs: usize,
    bytes: usize,
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(layout.size(), Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        self.allocs.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(layout.size(), Ordering::Relaxed);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.deallocs.fetch_add(1, Ordering::Relaxed);
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        self.reallocs.fetch_add(1, Ordering::Relaxed);
        // Approximate accounting: record the new size.
        self.bytes.fetch_add(new_size, Ordering::Relaxed);
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static ALLOC: CountingAlloc = CountingAlloc::new();

fn make_dataset(len: usize, input_dim: usize, target_dim: usize) -> Dataset {
    let inputs = vec![0.1_f64; len * input_dim];
    let targets = vec![0.9_f64; len * target_dim];
    Dataset::from_flat(inputs, targets, input_dim, target_dim).unwrap()
}

fn make_network(input_dim: usize, hidden: usize, output_dim: usize) -> Network {
    let mut net = Network::new(&[input_dim, hidden, output_dim]).unwrap();
    net.randomize_with_seed(0);
    net
}

#[test]
fn train_does_not_allocate_per_step() {
    let input_dim = 16;
    let hidden = 32;
    let output_dim = 4;

    let data = make_dataset(64, input_dim, output_dim);

    let cfg_short = TrainConfig {
        learning_rate: 1e-3,
        max_error: 1e-9,
        max_epochs: MaxEpochs::Bounded(1),
    };
    let cfg_long = TrainConfig {
        max_epochs: MaxEpochs::Bounded(64),
        ..cfg_short
    };

    // Warm up the train path once so one-time lazy initialization is not
    // attributed to the measured run (mirrors predict_does_not_allocate).
    {
        let mut warm = make_network(input_dim, hidden, output_dim);
        warm.train(&data, &cfg_short).unwrap();
    }

    let mut net_short = make_network(input_dim, hidden, output_dim);
    ALLOC.reset();
    let before_short = ALLOC.snapshot();
    net_short.train(&data, &cfg_short).unwrap();
    let alloc_short = ALLOC.alloc_events();
    let after_short = ALLOC.snapshot();

    let mut net_long = make_network(input_dim, hidden, output_dim);
    ALLOC.reset();
    let before_long = ALLOC.snapshot();
    net_long.train(&data, &cfg_long).unwrap();
    let alloc_long = ALLOC.alloc_events();
    let after_long = ALLOC.snapshot();

    assert_eq!(
        alloc_short, alloc_long,
        "expected allocation event count to be independent of epochs.\n\
short: before={before_short:?} after={after_short:?}\n\
long: before={before_long:?} after={after_long:?}"
    );
}

#[test]
fn predict_does_not_allocate() {
    let mut net = make_network(8, 16, 2);
    let input = vec![0.5_f64; 8];

    // Warm up, then count.
    net.predict(&input).unwrap();
    ALLOC.reset();
    for _ in 0..100 {
        net.predict(&input).unwrap();
    }
    assert_eq!(ALLOC.alloc_events(), 0);
}
