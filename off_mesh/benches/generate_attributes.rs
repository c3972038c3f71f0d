//! Benchmark for the attribute generation passes.
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use off_mesh::{attributes, MeshData};

/// Build a lat-long sphere out of quads, the worst case for shared-vertex
/// accumulation (every interior vertex touches 8 triangles).
fn make_sphere(rings: u32, segments: u32) -> MeshData {
    let mut positions = vec![];
    for ring in 0..=rings {
        let theta = std::f32::consts::PI * ring as f32 / rings as f32;
        for segment in 0..segments {
            let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
            positions.push(glam::Vec4::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
                1.0,
            ));
        }
    }

    let mut indices = vec![];
    for ring in 0..rings {
        for segment in 0..segments {
            let next = (segment + 1) % segments;
            let quad = [
                ring * segments + segment,
                ring * segments + next,
                (ring + 1) * segments + next,
                (ring + 1) * segments + segment,
            ];
            // Same fan triangulation the parser applies to quads.
            indices.extend([quad[0], quad[1], quad[2]]);
            indices.extend([quad[0], quad[2], quad[3]]);
        }
    }

    MeshData { positions, indices }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mesh = make_sphere(256, 512);

    println!("vertices: {:?}", mesh.vertex_count());
    println!("triangles: {:?}", mesh.triangle_count());

    c.bench_function("generate_normals", |b| {
        b.iter(|| {
            black_box(attributes::generate_normals(
                &mesh.positions,
                &mesh.indices,
            ));
        });
    });

    c.bench_function("generate_attributes", |b| {
        b.iter(|| {
            black_box(attributes::generate_attributes(&mesh));
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
