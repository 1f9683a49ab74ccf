//! Volume type combining voxel data with physical metadata.

use ndarray::ArrayD;

use crate::spatial::Affine;
use crate::volume::VolumeHeader;

/// An image volume.
///
/// Combines an N-dimensional voxel array with a voxel-to-world affine and
/// a geometry header. When a file format carries no affine or header, the
/// identity affine and the empty header are substituted.
#[derive(Debug, Clone)]
pub struct Volume {
    /// The voxel data.
    data: ArrayD<f32>,
    /// Voxel-to-world transform.
    affine: Affine,
    /// Geometry header.
    header: VolumeHeader,
}

impl Volume {
    /// Create a volume with the identity affine and an empty header.
    pub fn new(data: ArrayD<f32>) -> Self {
        Self {
            data,
            affine: Affine::identity(),
            header: VolumeHeader::empty(),
        }
    }

    /// Create a volume from data, affine and header.
    pub fn from_parts(data: ArrayD<f32>, affine: Affine, header: VolumeHeader) -> Self {
        Self {
            data,
            affine,
            header,
        }
    }

    /// Replace the affine.
    pub fn with_affine(mut self, affine: Affine) -> Self {
        self.affine = affine;
        self
    }

    /// Replace the header.
    pub fn with_header(mut self, header: VolumeHeader) -> Self {
        self.header = header;
        self
    }

    /// Get the voxel data.
    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Get mutable voxel data.
    pub fn data_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.data
    }

    /// Consume the volume, returning the voxel data.
    pub fn into_data(self) -> ArrayD<f32> {
        self.data
    }

    /// Get the affine.
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// Get the header.
    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    /// Get the volume shape.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Get the number of dimensions.
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }
}
