//! Matrix product kernels used by [`crate::Matrix::dot`].
//!
//! This module provides a single entry point over three kernels:
//! - default: a safe row-by-row loop, run serially for small products
//! - row-parallel: the same per-row loop spread over the rayon pool for large products
//! - optional: the `matrixmultiply` backend via the `matrixmultiply` feature
//!
//! All buffers are row-major and contiguous. Each output row is written by exactly one
//! task, so the parallel kernel needs no locking and produces bit-identical results to the
//! serial one.

use rayon::prelude::*;

/// `m * n * k` above which the row-parallel kernel is used.
#[cfg_attr(feature = "matrixmultiply", allow(dead_code))]
pub(crate) const PARALLEL_THRESHOLD: usize = 1 << 16;

/// `c (m x n) = a (m x k) * b (k x n)`, overwriting `c`.
#[inline]
pub(crate) fn gemm(m: usize, n: usize, k: usize, a: &[f64], b: &[f64], c: &mut [f64]) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    debug_assert_eq!(c.len(), m * n);

    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        c.fill(0.0);
        return;
    }

    #[cfg(feature = "matrixmultiply")]
    {
        // matrixmultiply supports arbitrary strides; ours are plain row-major.
        unsafe {
            matrixmultiply::dgemm(
                m,
                k,
                n,
                1.0,
                a.as_ptr(),
                k as isize,
                1,
                b.as_ptr(),
                n as isize,
                1,
                0.0,
                c.as_mut_ptr(),
                n as isize,
                1,
            );
        }
    }

    #[cfg(not(feature = "matrixmultiply"))]
    if m > 1 && m * n * k >= PARALLEL_THRESHOLD {
        gemm_parallel(n, k, a, b, c);
    } else {
        gemm_serial(n, k, a, b, c);
    }
}

#[cfg_attr(feature = "matrixmultiply", allow(dead_code))]
pub(crate) fn gemm_serial(n: usize, k: usize, a: &[f64], b: &[f64], c: &mut [f64]) {
    for (i, out) in c.chunks_mut(n).enumerate() {
        gemm_row(&a[i * k..(i + 1) * k], b, out);
    }
}

#[cfg_attr(feature = "matrixmultiply", allow(dead_code))]
pub(crate) fn gemm_parallel(n: usize, k: usize, a: &[f64], b: &[f64], c: &mut [f64]) {
    c.par_chunks_mut(n).enumerate().for_each(|(i, out)| {
        gemm_row(&a[i * k..(i + 1) * k], b, out);
    });
}

/// One output row: `out = a_row * b`.
///
/// Accumulation order is fixed (`p = 0..k`) so every kernel built on top of it agrees bit for bit.
#[cfg_attr(feature = "matrixmultiply", allow(dead_code))]
#[inline]
fn gemm_row(a_row: &[f64], b: &[f64], out: &mut [f64]) {
    let n = out.len();
    out.fill(0.0);
    for (p, &av) in a_row.iter().enumerate() {
        let b_row = &b[p * n..(p + 1) * n];
        for (o, &bv) in out.iter_mut().zip(b_row) {
            *o = av.mul_add(bv, *o);
        }
    }
}
