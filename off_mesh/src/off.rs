//! OFF file parsing.
//!
//! The format is whitespace-delimited text:
//! a header token (`OFF`), a counts line `V F E` (edge count ignored),
//! `V` lines of `x y z` coordinates, then `F` face records
//! `k i0 ... i(k-1)` with 0-based vertex indices.
//!
//! Faces of arbitrary degree are fan-triangulated from their first vertex,
//! unconditionally: non-convex or non-planar polygons are trusted input and
//! may produce overlapping or inverted triangles. Callers that need a
//! stronger contract must triangulate upstream.

use std::fmt;
use std::path::Path;

use crate::MeshData;

/// Error type for OFF loading.
#[derive(Debug)]
pub enum OffError {
    /// Failed to read the file.
    Io(std::io::Error),
    /// The stream ended before the declared counts were satisfied.
    UnexpectedEof {
        /// What the parser was reading when the stream ran out.
        expected: &'static str,
    },
    /// A token could not be parsed as the expected number.
    InvalidToken {
        /// What the parser was reading.
        expected: &'static str,
        /// The offending token.
        found: String,
    },
    /// A face references a vertex past the declared vertex count.
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices declared by the file.
        vertex_count: usize,
    },
}

impl fmt::Display for OffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read file: {e}"),
            Self::UnexpectedEof { expected } => {
                write!(f, "stream ended while reading {expected}")
            }
            Self::InvalidToken { expected, found } => {
                write!(f, "expected {expected}, found `{found}`")
            }
            Self::IndexOutOfRange {
                index,
                vertex_count,
            } => {
                write!(
                    f,
                    "face references vertex {index} but the file declares {vertex_count} vertices"
                )
            }
        }
    }
}

impl std::error::Error for OffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::UnexpectedEof { .. }
            | Self::InvalidToken { .. }
            | Self::IndexOutOfRange { .. } => None,
        }
    }
}

impl From<std::io::Error> for OffError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Read and parse an OFF file.
///
/// On failure nothing is produced: the caller keeps whatever mesh it already
/// had and decides how to surface the error.
pub fn load_off<P: AsRef<Path>>(path: P) -> Result<MeshData, OffError> {
    let source = std::fs::read_to_string(path)?;
    parse_off(&source)
}

/// Parse an OFF description from memory.
///
/// Returns the normalized vertex array and the fan-triangulated index list.
/// A face with `k >= 3` vertices contributes `k - 2` triangles
/// `(i0, ij, i(j+1))`; degenerate records with fewer vertices contribute
/// nothing.
pub fn parse_off(source: &str) -> Result<MeshData, OffError> {
    let mut tokens = source.split_ascii_whitespace();

    // The format tag is checked for presence only; OFF variants (COFF,
    // NOFF, ...) and sloppy exporters all get the same treatment.
    let header = tokens.next().ok_or(OffError::UnexpectedEof {
        expected: "OFF header",
    })?;
    if !header.to_ascii_uppercase().ends_with("OFF") {
        log::warn!("unexpected header token `{header}`, reading the file anyway");
    }

    let vertex_count: usize = parse_token(&mut tokens, "vertex count")?;
    let face_count: usize = parse_token(&mut tokens, "face count")?;
    // The edge count is declared by the format but never used.
    let _edge_count: u64 = parse_token(&mut tokens, "edge count")?;

    let mut positions = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let x: f32 = parse_token(&mut tokens, "vertex coordinate")?;
        let y: f32 = parse_token(&mut tokens, "vertex coordinate")?;
        let z: f32 = parse_token(&mut tokens, "vertex coordinate")?;
        positions.push(glam::Vec4::new(x, y, z, 1.0));
    }

    normalize_positions(&mut positions);

    let mut indices = Vec::new();
    let mut face = Vec::new();
    for _ in 0..face_count {
        let arity: usize = parse_token(&mut tokens, "face vertex count")?;

        face.clear();
        for _ in 0..arity {
            let index: u32 = parse_token(&mut tokens, "face vertex index")?;
            if index as usize >= positions.len() {
                return Err(OffError::IndexOutOfRange {
                    index,
                    vertex_count: positions.len(),
                });
            }
            face.push(index);
        }

        // Fan triangulation from the first vertex. Insertion order defines
        // the winding and the authoritative triangle count downstream.
        for j in 1..face.len().saturating_sub(1) {
            indices.push(face[0]);
            indices.push(face[j]);
            indices.push(face[j + 1]);
        }
    }

    log::debug!(
        "parsed OFF mesh: {} vertices, {} faces -> {} triangles",
        positions.len(),
        face_count,
        indices.len() / 3
    );

    Ok(MeshData { positions, indices })
}

fn parse_token<'a, T, I>(tokens: &mut I, expected: &'static str) -> Result<T, OffError>
where
    T: std::str::FromStr,
    I: Iterator<Item = &'a str>,
{
    let token = tokens.next().ok_or(OffError::UnexpectedEof { expected })?;
    token.parse().map_err(|_| OffError::InvalidToken {
        expected,
        found: token.to_owned(),
    })
}

/// Rescale positions into a unit-diagonal cube centered at the origin:
/// translate by the negative bounding-box midpoint, scale by the reciprocal
/// diagonal length, reset `w` to 1.
///
/// Skipped for fewer than two vertices (no extent to rescale) and for fully
/// coincident vertices (zero diagonal).
fn normalize_positions(positions: &mut [glam::Vec4]) {
    if positions.len() < 2 {
        return;
    }

    let (min, max) = positions.iter().fold(
        (glam::Vec3::splat(f32::MAX), glam::Vec3::splat(f32::MIN)),
        |(min, max), p| (min.min(p.truncate()), max.max(p.truncate())),
    );

    let diagonal = (max - min).length();
    if diagonal == 0.0 {
        return;
    }

    let midpoint = (min + max) * 0.5;
    let inv_diagonal = 1.0 / diagonal;
    for position in positions.iter_mut() {
        *position = ((position.truncate() - midpoint) * inv_diagonal).extend(1.0);
    }
}

/// Unit cube with outward-facing quads: 8 vertices, 6 faces.
#[cfg(test)]
pub(crate) const CUBE_OFF: &str = "\
OFF
8 6 12
-1 -1 -1
 1 -1 -1
 1  1 -1
-1  1 -1
-1 -1  1
 1 -1  1
 1  1  1
-1  1  1
4 0 3 2 1
4 4 5 6 7
4 0 1 5 4
4 1 2 6 5
4 2 3 7 6
4 3 0 4 7
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cube() {
        let mesh = parse_off(CUBE_OFF).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        // 6 quads fan into 2 triangles each.
        assert_eq!(mesh.triangle_count(), 12);
        // First quad 0 3 2 1 fans into (0 3 2) and (0 2 1).
        assert_eq!(&mesh.indices[..6], &[0, 3, 2, 0, 2, 1]);
    }

    #[test]
    fn test_fan_triangulation_order() {
        let source = "OFF 5 1 5  0 0 0  1 0 0  1 1 0  0.5 1.5 0  0 1 0  5 0 1 2 3 4";
        let mesh = parse_off(source).unwrap();
        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
    }

    #[test]
    fn test_degenerate_faces_contribute_nothing() {
        let source = "OFF 3 3 0  0 0 0  1 0 0  0 1 0  1 0  2 0 1  3 0 1 2";
        let mesh = parse_off(source).unwrap();
        // Only the last face has enough vertices to triangulate.
        assert_eq!(mesh.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_normalization_unit_diagonal() {
        let mesh = parse_off(CUBE_OFF).unwrap();
        let (min, max) = mesh.positions.iter().fold(
            (glam::Vec3::splat(f32::MAX), glam::Vec3::splat(f32::MIN)),
            |(min, max), p| (min.min(p.truncate()), max.max(p.truncate())),
        );
        let diagonal = (max - min).length();
        assert!(float_cmp::approx_eq!(f32, diagonal, 1.0, epsilon = 1e-6));
        // Centered at the origin.
        let midpoint = (min + max) * 0.5;
        assert!(midpoint.length() < 1e-6);
        // Homogeneous coordinate reset after the rescale.
        assert!(mesh.positions.iter().all(|p| p.w == 1.0));
    }

    #[test]
    fn test_normalization_skipped_below_two_vertices() {
        let mesh = parse_off("OFF 1 0 0  3 4 5").unwrap();
        assert_eq!(mesh.positions, vec![glam::Vec4::new(3.0, 4.0, 5.0, 1.0)]);
    }

    #[test]
    fn test_normalization_skipped_for_coincident_vertices() {
        let mesh = parse_off("OFF 2 0 0  1 2 3  1 2 3").unwrap();
        // Zero diagonal: positions are left as read.
        assert_eq!(mesh.positions[0], glam::Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert!(mesh.positions[0].is_finite());
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = parse_off("OFF 0 0 0").unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_header_checked_for_presence_only() {
        // Format variants and unknown tags are tolerated.
        let mesh = parse_off("COFF 3 1 0  0 0 0  1 0 0  0 1 0  3 0 1 2").unwrap();
        assert_eq!(mesh.triangle_count(), 1);

        let result = parse_off("");
        assert!(matches!(
            result,
            Err(OffError::UnexpectedEof {
                expected: "OFF header"
            })
        ));
    }

    #[test]
    fn test_truncated_vertex_data() {
        let result = parse_off("OFF 2 0 0  0 0 0  1 1");
        assert!(matches!(
            result,
            Err(OffError::UnexpectedEof {
                expected: "vertex coordinate"
            })
        ));
    }

    #[test]
    fn test_truncated_face_data() {
        let result = parse_off("OFF 3 1 0  0 0 0  1 0 0  0 1 0  3 0 1");
        assert!(matches!(result, Err(OffError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_invalid_token() {
        let result = parse_off("OFF 1 0 0  0 zero 0");
        assert!(matches!(
            result,
            Err(OffError::InvalidToken { found, .. }) if found == "zero"
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let result = parse_off("OFF 3 1 0  0 0 0  1 0 0  0 1 0  3 0 1 7");
        assert!(matches!(
            result,
            Err(OffError::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            })
        ));
    }

    #[test]
    fn test_load_off_missing_file() {
        let result = load_off("does/not/exist.off");
        assert!(matches!(result, Err(OffError::Io(_))));
    }

    #[test]
    fn test_load_off_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CUBE_OFF.as_bytes()).unwrap();
        let mesh = load_off(file.path()).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The triangle count is the sum of `k - 2` over faces with
            /// `k >= 3`, whatever the face degrees are.
            #[test]
            fn test_triangle_count(arities in prop::collection::vec(1_usize..8, 0..16)) {
                // A fixed vertex pool; faces index into it cyclically.
                let mut source = String::from("OFF 4 ");
                source.push_str(&format!("{} 0 ", arities.len()));
                source.push_str("0 0 0  1 0 0  0 1 0  0 0 1 ");
                for (face, arity) in arities.iter().enumerate() {
                    source.push_str(&format!("{arity} "));
                    for j in 0..*arity {
                        source.push_str(&format!("{} ", (face + j) % 4));
                    }
                }

                let mesh = parse_off(&source).unwrap();
                let expected: usize = arities
                    .iter()
                    .map(|&arity| arity.saturating_sub(2))
                    .sum();
                prop_assert_eq!(mesh.triangle_count(), expected);
            }

            /// Normalization always produces a unit-diagonal bounding box
            /// when at least two vertices are distinct.
            #[test]
            fn test_normalized_diagonal(
                points in prop::collection::vec([-100.0_f32..100.0, -100.0_f32..100.0, -100.0_f32..100.0], 2..32)
            ) {
                let mut positions: Vec<glam::Vec4> = points
                    .iter()
                    .map(|p| glam::Vec4::new(p[0], p[1], p[2], 1.0))
                    .collect();
                let distinct = positions.iter().any(|p| *p != positions[0]);

                normalize_positions(&mut positions);

                if distinct {
                    let (min, max) = positions.iter().fold(
                        (glam::Vec3::splat(f32::MAX), glam::Vec3::splat(f32::MIN)),
                        |(min, max), p| (min.min(p.truncate()), max.max(p.truncate())),
                    );
                    let diagonal = (max - min).length();
                    prop_assert!(float_cmp::approx_eq!(f32, diagonal, 1.0, epsilon = 1e-4));
                }
                prop_assert!(positions.iter().all(|p| p.w == 1.0));
            }
        }
    }
}
