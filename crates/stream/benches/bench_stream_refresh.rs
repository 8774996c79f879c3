use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;
use std::time::{Duration, Instant};

use cellstream_stream::{
    ActiveSet, CellCoord, PartitionError, PartitionSource, StreamConfig, StreamingCache,
    window_around,
};
use glam::Vec3;

struct EverywhereSource;

impl PartitionSource for EverywhereSource {
    type Data = CellCoord;

    fn load(&mut self, coord: CellCoord, _namespace: &str) -> Result<CellCoord, PartitionError> {
        Ok(coord)
    }
}

fn bench_window(radius: u32, iterations: usize) {
    let start = Instant::now();
    for i in 0..iterations {
        let center = CellCoord::new(i as i32 % 10, 0);
        let _ = black_box(window_around(black_box(center), black_box(radius)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  window (r={radius}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_walk(radius: u32, iterations: usize) {
    let config = StreamConfig {
        load_radius_cells: radius,
        refresh_interval_seconds: 0.0,
        ..StreamConfig::default()
    };
    let pos = Rc::new(Cell::new(Vec3::ZERO));
    let reader = pos.clone();
    let Ok(mut cache) = StreamingCache::start(
        config,
        EverywhereSource,
        ActiveSet::new(50.0),
        Some(move || reader.get()),
    ) else {
        println!("  walk (r={radius}): failed to start");
        return;
    };

    let start = Instant::now();
    for i in 0..iterations {
        // Crosses a cell boundary every five ticks.
        pos.set(Vec3::new(i as f32 * 10.0, 0.0, 0.0));
        let _ = black_box(cache.tick(Duration::from_millis(16)).is_some());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  walk (r={radius}, {iterations} ticks): {per_iter:?}/tick, total {elapsed:?}, avg refresh {:?}",
        cache.timer().average()
    );
}

fn main() {
    println!("=== Stream Refresh Benchmarks ===\n");

    println!("Window computation:");
    bench_window(1, 10000);
    bench_window(4, 10000);
    bench_window(16, 1000);

    println!("\nWalking tracker (tick + diff + load/unload):");
    bench_walk(1, 10000);
    bench_walk(4, 10000);
    bench_walk(16, 1000);

    println!("\n=== Done ===");
}
