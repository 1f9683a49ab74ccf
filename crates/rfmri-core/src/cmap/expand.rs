//! Extrapolation of coordinate mappings beyond their assigned region.

use crate::cmap::CoordinateMapping;

const NEIGHBOURS: [[i64; 3]; 6] = [
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
];

impl CoordinateMapping {
    /// Fill unassigned voxels from their assigned neighbours.
    ///
    /// Registration tools leave the mapping zero outside the field they
    /// computed, which produces hard borders when the mapping is applied.
    /// This grows the assigned region outward one shell per sweep: an
    /// unassigned voxel next to assigned ones receives, per component, the
    /// linear extrapolation `2 * near - far` where two collinear assigned
    /// neighbours exist, and the plain neighbour mean otherwise. Sweeps
    /// repeat until every voxel is assigned or no progress is made.
    pub fn expanded(&self) -> CoordinateMapping {
        let dims = self.grid_shape();
        let mut data = self.data().clone();
        let mut assigned = ndarray::Array3::<bool>::from_elem((dims[0], dims[1], dims[2]), false);
        for i in 0..dims[0] {
            for j in 0..dims[1] {
                for k in 0..dims[2] {
                    assigned[[i, j, k]] = self.is_assigned([i, j, k]);
                }
            }
        }

        loop {
            let mut updates: Vec<([usize; 3], [f32; 3])> = Vec::new();

            for i in 0..dims[0] {
                for j in 0..dims[1] {
                    for k in 0..dims[2] {
                        if assigned[[i, j, k]] {
                            continue;
                        }
                        if let Some(value) = extrapolate(&data, &assigned, dims, [i, j, k]) {
                            updates.push(([i, j, k], value));
                        }
                    }
                }
            }

            if updates.is_empty() {
                break;
            }
            for (v, value) in updates {
                for c in 0..3 {
                    data[[v[0], v[1], v[2], c]] = value[c];
                }
                assigned[[v[0], v[1], v[2]]] = true;
            }
        }

        CoordinateMapping::new(data, *self.affine())
            .expect("expansion preserves the component axis")
    }
}

/// Extrapolated value for one unassigned voxel, or None without assigned
/// neighbours.
fn extrapolate(
    data: &ndarray::Array4<f32>,
    assigned: &ndarray::Array3<bool>,
    dims: [usize; 3],
    voxel: [usize; 3],
) -> Option<[f32; 3]> {
    let at = |v: [i64; 3]| -> Option<[usize; 3]> {
        let inside = v
            .iter()
            .zip(dims.iter())
            .all(|(&x, &d)| x >= 0 && (x as usize) < d);
        if inside {
            let v = [v[0] as usize, v[1] as usize, v[2] as usize];
            assigned[[v[0], v[1], v[2]]].then(|| v)
        } else {
            None
        }
    };

    let mut linear: Vec<[f32; 3]> = Vec::new();
    let mut nearest: Vec<[f32; 3]> = Vec::new();

    for step in NEIGHBOURS {
        let near = [
            voxel[0] as i64 + step[0],
            voxel[1] as i64 + step[1],
            voxel[2] as i64 + step[2],
        ];
        let far = [
            voxel[0] as i64 + 2 * step[0],
            voxel[1] as i64 + 2 * step[1],
            voxel[2] as i64 + 2 * step[2],
        ];
        let Some(n1) = at(near) else { continue };
        let v1 = [
            data[[n1[0], n1[1], n1[2], 0]],
            data[[n1[0], n1[1], n1[2], 1]],
            data[[n1[0], n1[1], n1[2], 2]],
        ];
        if let Some(n2) = at(far) {
            let v2 = [
                data[[n2[0], n2[1], n2[2], 0]],
                data[[n2[0], n2[1], n2[2], 1]],
                data[[n2[0], n2[1], n2[2], 2]],
            ];
            linear.push([
                2.0 * v1[0] - v2[0],
                2.0 * v1[1] - v2[1],
                2.0 * v1[2] - v2[2],
            ]);
        } else {
            nearest.push(v1);
        }
    }

    let pool = if !linear.is_empty() { linear } else { nearest };
    if pool.is_empty() {
        return None;
    }
    let n = pool.len() as f32;
    let mut value = [0.0f32; 3];
    for v in &pool {
        for c in 0..3 {
            value[c] += v[c] / n;
        }
    }
    Some(value)
}
