//! Load an OFF file and print the derived attribute summary.
//!
//! Usage: `cargo run --example demo -- path/to/mesh.off`

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .expect("usage: demo <mesh.off>");

    let mesh = match off_mesh::load_off(&path) {
        Ok(mesh) => mesh,
        Err(error) => {
            log::error!("Could not load {path}: {error}");
            std::process::exit(1);
        }
    };

    println!(
        "{path}: {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    let attributes = off_mesh::generate_attributes(&mesh);

    let unit_normals = attributes
        .normals
        .iter()
        .filter(|n| n.length() > 0.5)
        .count();
    let flipped_tangents = attributes
        .tangents
        .iter()
        .filter(|t| t.w < 0.0)
        .count();

    println!("normals: {unit_normals}/{} unit length", mesh.vertex_count());
    println!(
        "tangents: {flipped_tangents}/{} with flipped handedness",
        mesh.vertex_count()
    );
}
