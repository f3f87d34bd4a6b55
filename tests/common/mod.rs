//! Shared utilities for integration tests

#![allow(dead_code)]

pub use approx::assert_relative_eq;

use sim_tally::Image3D;

pub const EPSILON: f64 = 1e-12;

/// Image whose voxel `i` holds `f(i)`
pub fn ramp_image(size: [usize; 3], f: impl Fn(usize) -> f64) -> Image3D {
    let len = size.iter().product();
    Image3D::new(size, [1.0, 1.0, 2.5], (0..len).map(f).collect()).unwrap()
}

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
