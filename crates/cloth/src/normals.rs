//! Vertex normal recomputation after deformation.

use glam::Vec3;

/// Recompute area-weighted vertex normals for an indexed triangle list.
///
/// Unnormalized face cross products are summed into each corner, so larger
/// faces weigh more. Vertices touched by no (non-degenerate) face, and every
/// vertex of a point cloud without topology, get +Y. `out` is resized to
/// match `positions`.
pub fn compute_vertex_normals(positions: &[Vec3], indices: &[u32], out: &mut Vec<Vec3>) {
    out.clear();
    out.resize(positions.len(), Vec3::ZERO);

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(&v0), Some(&v1), Some(&v2)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };

        let face = (v1 - v0).cross(v2 - v0);
        out[a] += face;
        out[b] += face;
        out[c] += face;
    }

    for normal in out.iter_mut() {
        *normal = normal.try_normalize().unwrap_or(Vec3::Y);
    }
}
