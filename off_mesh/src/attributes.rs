//! Per-vertex shading attribute derivation.
//!
//! All three generators work purely from vertex positions and the
//! triangulated index list. Per-triangle accumulation is sequential (it
//! scatters into shared per-vertex accumulators); the per-vertex finishing
//! passes are parallelized with rayon and are order-preserving, so the output
//! is deterministic: re-running on the same input is bit-identical.

use itertools::{Itertools, MinMaxResult};
use rayon::prelude::*;

use crate::MeshData;

/// UV-area determinants below this are treated as collapsed and skipped in
/// tangent accumulation.
const DEGENERATE_UV_AREA: f32 = f32::EPSILON;

/// Derived per-vertex shading attributes, all indexed like the positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexAttributes {
    /// Unit smooth normals; zero for vertices adjacent to no triangle.
    pub normals: Vec<glam::Vec3>,
    /// Cylindrical projection coordinates, approximately in `[0,1]x[0,1]`.
    pub tex_coords: Vec<glam::Vec2>,
    /// Tangent frames: xyz is the tangent orthonormalized against the
    /// normal, w is the bitangent handedness (`+1` or `-1`).
    pub tangents: Vec<glam::Vec4>,
}

/// Derive all shading attributes for a mesh.
///
/// Tangent construction consumes the freshly generated normals and texture
/// coordinates, so the three passes run in that order.
pub fn generate_attributes(mesh: &MeshData) -> VertexAttributes {
    let normals = generate_normals(&mesh.positions, &mesh.indices);
    let tex_coords = generate_tex_coords(&mesh.positions);
    let tangents = generate_tangents(&mesh.positions, &mesh.indices, &normals, &tex_coords);
    VertexAttributes {
        normals,
        tex_coords,
        tangents,
    }
}

/// Accumulate un-normalized face normals into every vertex of each triangle,
/// then renormalize.
///
/// The cross product `(v2 - v1) x (v3 - v1)` is left un-normalized during
/// accumulation: its magnitude is twice the triangle area, so large faces
/// weigh more in the shared-vertex average. A vertex touched by no triangle
/// (or only zero-area ones) keeps a zero normal.
pub fn generate_normals(positions: &[glam::Vec4], indices: &[u32]) -> Vec<glam::Vec3> {
    let mut normals = vec![glam::Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let (i1, i2, i3) = (
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        );
        let v1 = positions[i1].truncate();
        let v2 = positions[i2].truncate();
        let v3 = positions[i3].truncate();

        let face_normal = (v2 - v1).cross(v3 - v1);
        normals[i1] += face_normal;
        normals[i2] += face_normal;
        normals[i3] += face_normal;
    }

    normals
        .par_iter_mut()
        .for_each(|normal| *normal = normal.normalize_or_zero());

    normals
}

/// Project each vertex's `(x, y)` onto a cylinder wrapped around the mesh.
///
/// `u = acos(x') / pi` where `x'` is x remapped into `[-1, 1]` over the
/// bounding box (clamped before the `acos` against floating-point overshoot,
/// folding at the seam where x reaches its extremes); `v` is y remapped
/// linearly into `[0, 1]`. A degenerate box extent maps that coordinate to 0.
pub fn generate_tex_coords(positions: &[glam::Vec4]) -> Vec<glam::Vec2> {
    let xbounds = positions.iter().map(|p| p.x).minmax();
    let ybounds = positions.iter().map(|p| p.y).minmax();

    let (MinMaxResult::MinMax(x_min, x_max), MinMaxResult::MinMax(y_min, y_max)) =
        (xbounds, ybounds)
    else {
        // Fewer than two vertices: no box to project against.
        return vec![glam::Vec2::ZERO; positions.len()];
    };

    let width = x_max - x_min;
    let height = y_max - y_min;

    positions
        .par_iter()
        .map(|position| {
            let u = if width > 0.0 {
                let x = 2.0 * (position.x - x_min) / width - 1.0;
                x.clamp(-1.0, 1.0).acos() / std::f32::consts::PI
            } else {
                0.0
            };
            let v = if height > 0.0 {
                (position.y - y_min) / height
            } else {
                0.0
            };
            glam::Vec2::new(u, v)
        })
        .collect()
}

/// Build per-vertex tangent frames from positions and texture coordinates.
///
/// For each triangle, the 2x2 system relating edge vectors to UV deltas is
/// solved for a raw tangent and bitangent, accumulated per vertex like the
/// normals (the bitangent into a scratch accumulator that is not returned).
/// Triangles with a collapsed UV area are skipped. Each accumulated tangent
/// is then Gram-Schmidt-orthogonalized against the vertex normal and
/// renormalized; w receives the handedness: the sign of
/// `(normal x tangent) . bitangent`.
pub fn generate_tangents(
    positions: &[glam::Vec4],
    indices: &[u32],
    normals: &[glam::Vec3],
    tex_coords: &[glam::Vec2],
) -> Vec<glam::Vec4> {
    let mut tangents = vec![glam::Vec3::ZERO; positions.len()];
    let mut bitangents = vec![glam::Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let (i1, i2, i3) = (
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        );

        let p = positions[i2].truncate() - positions[i1].truncate();
        let q = positions[i3].truncate() - positions[i1].truncate();

        let st1 = tex_coords[i2] - tex_coords[i1];
        let st2 = tex_coords[i3] - tex_coords[i1];

        let det = st1.x * st2.y - st2.x * st1.y;
        if det.abs() <= DEGENERATE_UV_AREA {
            continue;
        }
        let inv_det = 1.0 / det;

        let tangent = (p * st2.y - q * st1.y) * inv_det;
        let bitangent = (q * st1.x - p * st2.x) * inv_det;

        tangents[i1] += tangent;
        tangents[i2] += tangent;
        tangents[i3] += tangent;
        bitangents[i1] += bitangent;
        bitangents[i2] += bitangent;
        bitangents[i3] += bitangent;
    }

    (0..positions.len())
        .into_par_iter()
        .map(|i| {
            let normal = normals[i];
            let tangent = tangents[i];

            let tangent = (tangent - normal * normal.dot(tangent)).normalize_or_zero();
            let handedness = if normal.cross(tangent).dot(bitangents[i]) < 0.0 {
                -1.0
            } else {
                1.0
            };
            tangent.extend(handedness)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::off::parse_off;

    /// Single quad in the z = 0 plane, counter-clockwise from -x/-y.
    const QUAD_OFF: &str = "OFF 4 1 4  0 0 0  1 0 0  1 1 0  0 1 0  4 0 1 2 3";

    fn cube() -> MeshData {
        parse_off(crate::off::CUBE_OFF).unwrap()
    }

    #[test]
    fn test_quad_normals_axis_aligned() {
        let mesh = parse_off(QUAD_OFF).unwrap();
        let normals = generate_normals(&mesh.positions, &mesh.indices);
        for normal in normals {
            assert!(normal.abs_diff_eq(glam::Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn test_cube_normals_outward_unit() {
        let mesh = cube();
        let normals = generate_normals(&mesh.positions, &mesh.indices);
        assert_eq!(normals.len(), 8);

        for (position, normal) in mesh.positions.iter().zip(&normals) {
            assert!(float_cmp::approx_eq!(
                f32,
                normal.length(),
                1.0,
                epsilon = 1e-5
            ));
            // Outward: along the corner direction, every component of the
            // averaged normal matches the corner's octant.
            assert!(normal.dot(position.truncate()) > 0.0);
            assert!(normal.x * position.x > 0.0);
            assert!(normal.y * position.y > 0.0);
            assert!(normal.z * position.z > 0.0);
        }
    }

    #[test]
    fn test_unreferenced_vertex_keeps_zero_normal() {
        // A triangle plus a vertex no face touches.
        let mesh = parse_off("OFF 4 1 0  0 0 0  1 0 0  0 1 0  5 5 5  3 0 1 2").unwrap();
        let normals = generate_normals(&mesh.positions, &mesh.indices);
        assert_eq!(normals[3], glam::Vec3::ZERO);
        assert!(float_cmp::approx_eq!(
            f32,
            normals[0].length(),
            1.0,
            epsilon = 1e-6
        ));
    }

    #[test]
    fn test_tex_coords_in_unit_square() {
        let mesh = cube();
        let tex_coords = generate_tex_coords(&mesh.positions);
        for uv in &tex_coords {
            assert!((0.0..=1.0).contains(&uv.x), "u out of range: {uv}");
            assert!((0.0..=1.0).contains(&uv.y), "v out of range: {uv}");
        }
    }

    #[test]
    fn test_tex_coords_seam_folds() {
        let mesh = cube();
        let tex_coords = generate_tex_coords(&mesh.positions);
        for (position, uv) in mesh.positions.iter().zip(&tex_coords) {
            // acos maps the x extremes to the seam: min x -> u = 1, max x -> u = 0.
            if position.x < 0.0 {
                assert!(float_cmp::approx_eq!(f32, uv.x, 1.0, epsilon = 1e-5));
            } else {
                assert!(float_cmp::approx_eq!(f32, uv.x, 0.0, epsilon = 1e-5));
            }
        }
    }

    #[test]
    fn test_tex_coords_degenerate_extents() {
        // All vertices share x and y: both box extents collapse.
        let positions = vec![
            glam::Vec4::new(1.0, 2.0, 0.0, 1.0),
            glam::Vec4::new(1.0, 2.0, 5.0, 1.0),
            glam::Vec4::new(1.0, 2.0, 9.0, 1.0),
        ];
        let tex_coords = generate_tex_coords(&positions);
        assert!(tex_coords.iter().all(|uv| *uv == glam::Vec2::ZERO));
    }

    #[test]
    fn test_tex_coords_below_two_vertices() {
        assert!(generate_tex_coords(&[]).is_empty());
        let single = [glam::Vec4::new(3.0, 4.0, 5.0, 1.0)];
        assert_eq!(generate_tex_coords(&single), vec![glam::Vec2::ZERO]);
    }

    #[test]
    fn test_tangents_orthogonal_to_normals() {
        let mesh = cube();
        let attributes = generate_attributes(&mesh);

        for (normal, tangent) in attributes.normals.iter().zip(&attributes.tangents) {
            let t = tangent.truncate();
            if t == glam::Vec3::ZERO {
                continue;
            }
            assert!(float_cmp::approx_eq!(f32, t.length(), 1.0, epsilon = 1e-5));
            assert!(
                normal.dot(t).abs() < 1e-5,
                "tangent not orthogonal to normal: {normal} . {t}"
            );
            assert!(tangent.w == 1.0 || tangent.w == -1.0);
        }
    }

    #[test]
    fn test_tangents_skip_collapsed_uv_triangles() {
        let mesh = parse_off("OFF 3 1 0  0 0 0  1 0 0  0 1 0  3 0 1 2").unwrap();
        let normals = generate_normals(&mesh.positions, &mesh.indices);
        // Identical texture coordinates: zero UV area everywhere.
        let tex_coords = vec![glam::Vec2::splat(0.5); 3];
        let tangents = generate_tangents(&mesh.positions, &mesh.indices, &normals, &tex_coords);

        for tangent in tangents {
            assert_eq!(tangent, glam::Vec4::new(0.0, 0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mesh = cube();
        let first = generate_attributes(&mesh);
        let second = generate_attributes(&mesh);
        // Bit-identical, not merely within tolerance.
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshData::default();
        let attributes = generate_attributes(&mesh);
        assert!(attributes.normals.is_empty());
        assert!(attributes.tex_coords.is_empty());
        assert!(attributes.tangents.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        prop_compose! {
            /// A random triangle soup over a random vertex pool.
            fn arb_mesh()(
                points in prop::collection::vec(
                    [-10.0_f32..10.0, -10.0_f32..10.0, -10.0_f32..10.0],
                    3..24,
                ),
                triangles in prop::collection::vec([0_usize..24, 0_usize..24, 0_usize..24], 0..32),
            ) -> MeshData {
                let positions: Vec<glam::Vec4> = points
                    .iter()
                    .map(|p| glam::Vec4::new(p[0], p[1], p[2], 1.0))
                    .collect();
                let count = positions.len();
                let indices = triangles
                    .iter()
                    .flat_map(|t| [(t[0] % count) as u32, (t[1] % count) as u32, (t[2] % count) as u32])
                    .collect();
                MeshData { positions, indices }
            }
        }

        proptest! {
            /// Every generated normal is unit length or exactly zero.
            #[test]
            fn test_normals_unit_or_zero(mesh in arb_mesh()) {
                let normals = generate_normals(&mesh.positions, &mesh.indices);
                for normal in normals {
                    let length = normal.length();
                    prop_assert!(
                        length == 0.0 || float_cmp::approx_eq!(f32, length, 1.0, epsilon = 1e-4),
                        "normal length: {length}"
                    );
                }
            }

            /// Tangents carry a valid handedness sign and stay finite
            /// whatever the input, degenerate triangles included.
            #[test]
            fn test_tangents_well_formed(mesh in arb_mesh()) {
                let attributes = generate_attributes(&mesh);
                for tangent in &attributes.tangents {
                    prop_assert!(tangent.is_finite());
                    prop_assert!(tangent.w == 1.0 || tangent.w == -1.0);
                }
            }

            /// Texture coordinates never leave the unit square.
            #[test]
            fn test_tex_coords_bounded(mesh in arb_mesh()) {
                let tex_coords = generate_tex_coords(&mesh.positions);
                for uv in tex_coords {
                    prop_assert!((0.0..=1.0).contains(&uv.x));
                    prop_assert!((0.0..=1.0).contains(&uv.y));
                }
            }
        }
    }
}
