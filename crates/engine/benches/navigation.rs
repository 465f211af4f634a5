//! Benchmarks for network navigation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::LineString;
use hydronav_core::network::TraversalRequest;
use hydronav_core::{NavigationMode, Segment, SegmentId};
use hydronav_engine::{EngineConfig, MemoryNetwork, NavigationEngine};
use std::sync::Arc;

/// Mainstem of `size` unit segments, each receiving a one-segment tributary.
///
/// Segment `i` on the mainstem has id `i + 1`; its tributary has id
/// `size + i + 1`. The outlet is the last mainstem segment.
fn create_network(size: u64) -> MemoryNetwork {
    let mut segments = Vec::with_capacity(2 * size as usize);
    for i in 0..size {
        let seq = 2 * (size - i);
        let x = i as f64;
        let path_length = (size - i - 1) as f64;

        let mut main = Segment::new(i + 1, seq, LineString::from(vec![(x, 0.0), (x + 1.0, 0.0)]));
        main.down_sequence = if i + 1 == size { 0 } else { seq - 2 };
        main.up_sequence = if i == 0 { 0 } else { seq + 2 };
        main.mainstem_path_id = 1;
        main.terminal_path_id = 1;
        main.length = 1.0;
        main.path_length = path_length;
        main.is_network_start = i == 0;
        main.is_network_terminal = i + 1 == size;
        segments.push(main);

        let mut trib = Segment::new(
            size + i + 1,
            seq + 1,
            LineString::from(vec![(x, 1.0), (x, 0.0)]),
        );
        trib.down_sequence = seq;
        trib.mainstem_path_id = size + i + 1;
        trib.terminal_path_id = 1;
        trib.length = 1.0;
        trib.path_length = path_length + 1.0;
        trib.is_network_start = true;
        segments.push(trib);
    }
    MemoryNetwork::new(segments)
}

fn bench_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation/walk");
    for size in [1_000u64, 10_000, 100_000] {
        let net = create_network(size);
        let outlet = net.get(SegmentId(size)).cloned().unwrap();
        let request = TraversalRequest::for_mode(&outlet, NavigationMode::UpstreamTributaries, None);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| net.walk(black_box(&request)))
        });
    }
    group.finish();
}

fn bench_navigate(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("navigation/navigate");
    for distance in [10.0, 100.0, 1_000.0] {
        let net = Arc::new(create_network(10_000));
        let engine = NavigationEngine::new(net.clone(), net, &EngineConfig::default());
        group.bench_with_input(
            BenchmarkId::from_parameter(distance),
            &distance,
            |b, &distance| {
                b.to_async(&runtime).iter(|| {
                    engine.navigate(
                        black_box(SegmentId(1)),
                        NavigationMode::DownstreamMain,
                        distance,
                    )
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_walk, bench_navigate);
criterion_main!(benches);
