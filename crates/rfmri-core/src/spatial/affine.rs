//! Affine transform type for voxel-to-world geometry.
//!
//! Every volume carries a 4x4 homogeneous affine that maps voxel indices
//! to world (scanner RAS) coordinates.

use nalgebra::{Matrix4, Vector3, Vector4};

use crate::error::{CoreError, Result};

/// A 4x4 homogeneous voxel-to-world transform.
///
/// This is a thin wrapper around nalgebra's Matrix4 to provide
/// domain-specific functionality while maintaining all nalgebra operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine(pub Matrix4<f64>);

impl Affine {
    /// Create an identity affine.
    pub fn identity() -> Self {
        Self(Matrix4::identity())
    }

    /// Create an affine from a nalgebra matrix.
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self(matrix)
    }

    /// Create an affine from four rows.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut m = Matrix4::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, val) in row.iter().enumerate() {
                m[(r, c)] = *val;
            }
        }
        Self(m)
    }

    /// Return the four rows of the matrix.
    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, val) in row.iter_mut().enumerate() {
                *val = self.0[(r, c)];
            }
        }
        rows
    }

    /// Map a voxel index to a world coordinate.
    pub fn apply(&self, index: [f64; 3]) -> [f64; 3] {
        let v = self.0 * Vector4::new(index[0], index[1], index[2], 1.0);
        [v[0], v[1], v[2]]
    }

    /// Compose with a translation in index space.
    ///
    /// The returned affine maps voxel (0, 0, 0) to the world coordinate
    /// that voxel `shift` had under `self`. Used when a grid is padded or
    /// cropped so that world coordinates stay put.
    pub fn translated_by_voxels(&self, shift: [f64; 3]) -> Self {
        let t = Matrix4::new_translation(&Vector3::new(shift[0], shift[1], shift[2]));
        Self(self.0 * t)
    }

    /// Invert the affine.
    pub fn try_inverse(&self) -> Result<Self> {
        self.0
            .try_inverse()
            .map(Self)
            .ok_or_else(|| CoreError::singular_affine("affine matrix is not invertible"))
    }

    /// Get the inner nalgebra matrix.
    pub fn inner(&self) -> &Matrix4<f64> {
        &self.0
    }

    /// Get mutable reference to the inner nalgebra matrix.
    pub fn inner_mut(&mut self) -> &mut Matrix4<f64> {
        &mut self.0
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Index<(usize, usize)> for Affine {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Affine {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl std::ops::Mul for Affine {
    type Output = Self;

    fn mul(self, other: Self) -> Self::Output {
        Self(self.0 * other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_apply() {
        let affine = Affine::identity();
        let world = affine.apply([3.0, 4.0, 5.0]);
        assert_eq!(world, [3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_from_rows_roundtrip() {
        let rows = [
            [2.0, 0.0, 0.0, 10.0],
            [0.0, 2.0, 0.0, 20.0],
            [0.0, 0.0, 2.0, 30.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let affine = Affine::from_rows(rows);
        assert_eq!(affine.to_rows(), rows);
    }

    #[test]
    fn test_scaling_and_translation() {
        let affine = Affine::from_rows([
            [2.0, 0.0, 0.0, 10.0],
            [0.0, 2.0, 0.0, 20.0],
            [0.0, 0.0, 2.0, 30.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let world = affine.apply([1.0, 2.0, 3.0]);
        assert_eq!(world, [12.0, 24.0, 36.0]);
    }

    #[test]
    fn test_translated_by_voxels() {
        let affine = Affine::from_rows([
            [2.0, 0.0, 0.0, 10.0],
            [0.0, 2.0, 0.0, 20.0],
            [0.0, 0.0, 2.0, 30.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let shifted = affine.translated_by_voxels([-1.0, -1.0, -1.0]);
        // Voxel (1,1,1) of the shifted grid lands where voxel (0,0,0) did.
        let a = affine.apply([0.0, 0.0, 0.0]);
        let b = shifted.apply([1.0, 1.0, 1.0]);
        assert!((a[0] - b[0]).abs() < 1e-12);
        assert!((a[1] - b[1]).abs() < 1e-12);
        assert!((a[2] - b[2]).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let affine = Affine::from_rows([
            [0.7, 0.0, 0.0, -64.0],
            [0.0, 0.7, 0.0, -64.0],
            [0.0, 0.0, 0.7, -40.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let inv = affine.try_inverse().unwrap();
        let world = affine.apply([10.0, 20.0, 30.0]);
        let index = inv.apply(world);
        assert!((index[0] - 10.0).abs() < 1e-9);
        assert!((index[1] - 20.0).abs() < 1e-9);
        assert!((index[2] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_singular_affine_fails() {
        let affine = Affine::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert!(affine.try_inverse().is_err());
    }
}
