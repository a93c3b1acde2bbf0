// benches/bench_wire_encoding.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

use crossroad_sim::communication::messages::{
    decode_direction_record, encode_direction_record, encode_snapshot, DirectionSnapshot, Snapshot,
};
use crossroad_sim::simulation_engine::directions::Direction;
use crossroad_sim::simulation_engine::lights::LightColor;
use crossroad_sim::simulation_engine::vehicles::{Vehicle, VehicleKind};

fn snapshot_with_queue_depth(depth: usize) -> Snapshot {
    let directions = Direction::ALL
        .into_iter()
        .map(|direction| {
            let destination = direction.opposite();
            let vehicles = (0..depth)
                .map(|i| {
                    let kind = if i == 0 {
                        VehicleKind::Priority
                    } else {
                        VehicleKind::Normal
                    };
                    Vehicle::new(kind, direction, destination).unwrap()
                })
                .collect();
            DirectionSnapshot {
                direction,
                light: LightColor::Red,
                vehicles,
            }
        })
        .collect();
    Snapshot {
        tick: 42,
        directions,
        crossings: vec![],
    }
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_snapshot");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));

    for &depth in [0, 5, 20].iter() {
        let snapshot = snapshot_with_queue_depth(depth);
        group.bench_function(format!("queue_depth_{}", depth), |b| {
            b.iter(|| black_box(encode_snapshot(black_box(&snapshot))));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_direction_record");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));

    for &depth in [0, 5, 20].iter() {
        let snapshot = snapshot_with_queue_depth(depth);
        let record = encode_direction_record(&snapshot.directions[0]);
        group.bench_function(format!("queue_depth_{}", depth), |b| {
            b.iter(|| black_box(decode_direction_record(black_box(&record))).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
