// Regular grid mesh for the liquify brush.
//
// Pipeline: GridMesh::build(n) → (positions, uvs, triangle + line indices) → GPU.
// Positions are the only buffer that changes after build (the brush mutates
// them in place); UVs and both index buffers are immutable until a rebuild.

// ============================================================================
// GRID MESH
// ============================================================================

/// CPU-side grid mesh, GPU-upload ready.
///
/// `resolution` is the number of vertices per side (≥ 2). Positions and UVs
/// are row-major (y outer, x inner), one `[f32; 2]` per vertex, so
/// `bytemuck::cast_slice` hands them to wgpu without repacking.
///
/// Layout contract with the renderer:
///   positions — VERTEX | COPY_DST, rewritten after each brush step
///   uvs       — VERTEX, written once per build
///   triangle_indices / line_indices — INDEX (u32), written once per build
pub struct GridMesh {
    resolution: usize,
    pub positions: Vec<[f32; 2]>,
    pub uvs: Vec<[f32; 2]>,
    pub triangle_indices: Vec<u32>,
    pub line_indices: Vec<u32>,
}

impl GridMesh {
    /// Build an evenly spaced `n` × `n` vertex grid covering [-1, 1]².
    ///
    /// Vertex (x, y) maps to NDC ((x/(n-1))·2 - 1, (y/(n-1))·2 - 1), so the
    /// corner vertices land exactly on (±1, ±1). UVs reuse the same fractions
    /// with v flipped (image origin top-left vs NDC origin bottom-left).
    ///
    /// Each of the (n-1)² cells emits two triangles and four wireframe edges
    /// (adjacent cells re-emit shared edges), giving 6·(n-1)² triangle
    /// indices and 8·(n-1)² line indices.
    ///
    /// Callers validate `n` ≥ 2 before invoking; the builder itself assumes it.
    pub fn build(resolution: usize) -> Self {
        debug_assert!(resolution >= 2, "grid needs at least 2 vertices per side");

        let n = resolution;
        let side = (n - 1) as f32;

        let mut positions = Vec::with_capacity(n * n);
        let mut uvs = Vec::with_capacity(n * n);

        for y in 0..n {
            for x in 0..n {
                // x/(n-1) divides equal values at the far edge, keeping the
                // corner vertices exactly on ±1.
                let fx = x as f32 / side;
                let fy = y as f32 / side;
                positions.push([fx * 2.0 - 1.0, fy * 2.0 - 1.0]);
                uvs.push([fx, 1.0 - fy]);
            }
        }

        let cells = n - 1;
        let mut triangle_indices = Vec::with_capacity(cells * cells * 6);
        let mut line_indices = Vec::with_capacity(cells * cells * 8);

        // v walks the linear vertex index: +1 per column, one extra skip at
        // each row end (the last column of a row starts no cell).
        let row_stride = n as u32;
        let mut v = 0u32;
        for _y in 0..cells {
            for _x in 0..cells {
                triangle_indices.extend_from_slice(&[
                    v, v + 1, v + row_stride,
                    v + 1, v + 1 + row_stride, v + row_stride,
                ]);

                // Cell outline: top, right, bottom, left.
                line_indices.extend_from_slice(&[
                    v, v + 1,
                    v + 1, v + 1 + row_stride,
                    v + 1 + row_stride, v + row_stride,
                    v + row_stride, v,
                ]);

                v += 1;
            }
            v += 1;
        }

        Self {
            resolution,
            positions,
            uvs,
            triangle_indices,
            line_indices,
        }
    }

    pub fn resolution(&self) -> usize { self.resolution }

    pub fn vertex_count(&self) -> usize { self.positions.len() }

    /// Cast the position slice to raw bytes for wgpu buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn triangle_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangle_indices)
    }

    pub fn line_index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.line_indices)
    }

    pub fn triangle_index_count(&self) -> usize { self.triangle_indices.len() }

    pub fn line_index_count(&self) -> usize { self.line_indices.len() }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_and_index_counts() {
        for n in [2usize, 4, 32] {
            let mesh = GridMesh::build(n);
            let cells = (n - 1) * (n - 1);
            assert_eq!(mesh.vertex_count(), n * n);
            assert_eq!(mesh.uvs.len(), n * n);
            assert_eq!(mesh.triangle_index_count(), cells * 6);
            assert_eq!(mesh.line_index_count(), cells * 8);
        }
    }

    #[test]
    fn corners_cover_ndc_extremes() {
        let n = 5;
        let mesh = GridMesh::build(n);
        assert_eq!(mesh.positions[0], [-1.0, -1.0]);
        assert_eq!(mesh.positions[n - 1], [1.0, -1.0]);
        assert_eq!(mesh.positions[n * (n - 1)], [-1.0, 1.0]);
        assert_eq!(mesh.positions[n * n - 1], [1.0, 1.0]);
    }

    #[test]
    fn uv_corners_are_y_flipped() {
        let n = 5;
        let mesh = GridMesh::build(n);
        assert_eq!(mesh.uvs[0], [0.0, 1.0]);
        assert_eq!(mesh.uvs[n - 1], [1.0, 1.0]);
        assert_eq!(mesh.uvs[n * (n - 1)], [0.0, 0.0]);
        assert_eq!(mesh.uvs[n * n - 1], [1.0, 0.0]);
    }

    #[test]
    fn first_cell_indices() {
        // 3×3 grid, cell at the origin corner: first vertex 0, row stride 3.
        let mesh = GridMesh::build(3);
        assert_eq!(&mesh.triangle_indices[..6], &[0, 1, 3, 1, 4, 3]);
        assert_eq!(&mesh.line_indices[..8], &[0, 1, 1, 4, 4, 3, 3, 0]);
    }

    #[test]
    fn second_row_skips_the_seam_vertex() {
        // 3×3 grid: the second cell row starts at vertex 3, not 2.
        let mesh = GridMesh::build(3);
        assert_eq!(&mesh.triangle_indices[12..18], &[3, 4, 6, 4, 7, 6]);
    }

    #[test]
    fn build_is_deterministic() {
        let a = GridMesh::build(7);
        let b = GridMesh::build(7);
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.uvs, b.uvs);
        assert_eq!(a.triangle_indices, b.triangle_indices);
        assert_eq!(a.line_indices, b.line_indices);
    }
}
