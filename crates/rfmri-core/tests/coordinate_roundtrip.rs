use ndarray::ArrayD;
use proptest::prelude::*;
use rfmri_core::resample::{apply_coordinate_mapping, Interpolation, Padding};
use rfmri_core::{Affine, CoordinateMapping, Volume};

fn scaling_affine(sx: f64, sy: f64, sz: f64, tx: f64, ty: f64, tz: f64) -> Affine {
    Affine::from_rows([
        [sx, 0.0, 0.0, tx],
        [0.0, sy, 0.0, ty],
        [0.0, 0.0, sz, tz],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

proptest! {
    #[test]
    fn test_affine_roundtrip(
        sx in 0.1f64..5.0, sy in 0.1f64..5.0, sz in 0.1f64..5.0,
        tx in -100.0f64..100.0, ty in -100.0f64..100.0, tz in -100.0f64..100.0,
        px in -50.0f64..50.0, py in -50.0f64..50.0, pz in -50.0f64..50.0
    ) {
        let affine = scaling_affine(sx, sy, sz, tx, ty, tz);
        let inv = affine.try_inverse().unwrap();

        let world = affine.apply([px, py, pz]);
        let index = inv.apply(world);

        prop_assert!((index[0] - px).abs() < 1e-6, "X mismatch: {} vs {}", index[0], px);
        prop_assert!((index[1] - py).abs() < 1e-6, "Y mismatch: {} vs {}", index[1], py);
        prop_assert!((index[2] - pz).abs() < 1e-6, "Z mismatch: {} vs {}", index[2], pz);
    }

    #[test]
    fn test_identity_resample_preserves_volume(
        seed in 0u64..1000,
        nx in 2usize..6, ny in 2usize..6, nz in 2usize..6
    ) {
        // Cheap deterministic pseudo-random voxel data.
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let data = ArrayD::from_shape_fn(vec![nx, ny, nz], |_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as f32 / (1u64 << 31) as f32
        });
        let volume = Volume::new(data);
        let cmap = CoordinateMapping::identity([nx, ny, nz], 0, &Affine::identity());

        for interpolation in [Interpolation::Linear, Interpolation::Nearest] {
            let out = apply_coordinate_mapping(&volume, &cmap, interpolation, Padding::Zero).unwrap();
            prop_assert_eq!(out.shape(), volume.shape());
            for (a, b) in out.data().iter().zip(volume.data().iter()) {
                prop_assert!((a - b).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_padded_identity_interior_matches(
        pad in 1usize..3,
        nx in 2usize..5, ny in 2usize..5, nz in 2usize..5
    ) {
        let data = ArrayD::from_shape_fn(vec![nx, ny, nz], |ix| {
            (ix[0] * 100 + ix[1] * 10 + ix[2]) as f32
        });
        let volume = Volume::new(data);
        let cmap = CoordinateMapping::identity([nx, ny, nz], pad, &Affine::identity());
        let out = apply_coordinate_mapping(&volume, &cmap, Interpolation::Linear, Padding::Zero).unwrap();

        prop_assert_eq!(out.shape(), &[nx + 2 * pad, ny + 2 * pad, nz + 2 * pad]);
        for i in 0..nx {
            for j in 0..ny {
                for k in 0..nz {
                    let warped = out.data()[[i + pad, j + pad, k + pad]];
                    let original = volume.data()[[i, j, k]];
                    prop_assert!((warped - original).abs() < 1e-5);
                }
            }
        }
    }
}
