// ─────────────────────────────────────────────────────────────────────
// SCPN Radiant Core — Optical-Depth Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use criterion::{criterion_group, criterion_main, Criterion};
use radiant_core::comm::SerialComm;
use radiant_core::grid::CartesianGrid;
use radiant_core::materials::DustMix;
use radiant_core::medium::{DensityProfile, GeometricMedium};
use radiant_core::MediumSystem;
use radiant_types::config::MediumSystemOptions;
use radiant_types::geometry::Vec3;
use radiant_types::packet::PhotonPacket;
use std::hint::black_box;
use std::sync::Arc;

fn bench_system(velocity: Vec3) -> MediumSystem {
    let n = 32;
    let grid = Arc::new(
        CartesianGrid::new(Vec3::ZERO, Vec3::new(n as f64, n as f64, n as f64), n, n, n)
            .expect("grid"),
    );
    let mix = DustMix::new(1e-9, 5.5e-7, 1.0, 0.5, 0.4, 3e-17).expect("mix");
    let medium = GeometricMedium::new(
        Arc::new(mix),
        DensityProfile::ExponentialSphere {
            central_density: 1e3,
            scale_length: 16.0,
        },
    )
    .expect("medium")
    .with_velocity(velocity)
    .expect("velocity");
    MediumSystem::new(
        grid,
        vec![Arc::new(medium)],
        MediumSystemOptions::default(),
        Arc::new(SerialComm),
    )
    .expect("setup")
}

fn crossing_packet() -> PhotonPacket {
    PhotonPacket::launch(
        Vec3::new(-1.0, 11.3, 17.9),
        Vec3::new(1.0, 0.05, -0.02),
        5.5e-7,
        1.0,
    )
    .expect("packet")
}

fn bench_set_optical_depths(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_optical_depths");

    let constant = bench_system(Vec3::ZERO);
    group.bench_function("constant_sections_32cube", |b| {
        let mut pp = crossing_packet();
        b.iter(|| {
            constant.set_optical_depths(&mut pp);
            black_box(pp.path.total_optical_depth());
        })
    });

    let moving = bench_system(Vec3::new(1e5, 0.0, 0.0));
    group.bench_function("moving_medium_32cube", |b| {
        let mut pp = crossing_packet();
        b.iter(|| {
            moving.set_optical_depths(&mut pp);
            black_box(pp.path.total_optical_depth());
        })
    });

    group.finish();
}

fn bench_peel_off_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("optical_depth_to_distance");

    let system = bench_system(Vec3::ZERO);
    group.bench_function("half_domain_32cube", |b| {
        let pp = crossing_packet();
        b.iter(|| {
            black_box(system.optical_depth_to_distance(&pp, 16.0));
        })
    });

    group.finish();
}

criterion_group!(benches, bench_set_optical_depths, bench_peel_off_depth);
criterion_main!(benches);
