//! Symmetric Toeplitz solver (Levinson recursion).
//!
//! A symmetric Toeplitz matrix is fully described by its first column
//! `cols`, with `T[i][j] = cols[|i - j|]`. The recursion grows a backward
//! vector `b` that solves `T_n b = e_{n-1}` one order at a time and folds each
//! new order into the solution, for O(n²) work instead of O(n³).
//!
//! ## Degenerate input
//!
//! A zero or non-finite leading coefficient, or a reflection step whose
//! denominator vanishes, yields [`Error::SingularToeplitz`] instead of
//! infinities in the output.

use crate::error::{Error, Result};

/// Levinson solver with pre-allocated scratch for a maximum order.
#[derive(Debug, Clone)]
pub struct ToeplitzSolver {
    backward: Vec<f32>,
    forward: Vec<f32>,
}

impl ToeplitzSolver {
    /// Scratch for systems of up to `max_len` unknowns.
    pub fn new(max_len: usize) -> Self {
        Self {
            backward: Vec::with_capacity(max_len),
            forward: Vec::with_capacity(max_len),
        }
    }

    /// Solve `Toeplitz(cols) · x = y` into `out`.
    ///
    /// `cols`, `y` and `out` must have the same length. Allocates only if that
    /// length exceeds the capacity given to [`ToeplitzSolver::new`].
    pub fn solve(&mut self, cols: &[f32], y: &[f32], out: &mut [f32]) -> Result<()> {
        let len = cols.len();
        if y.len() != len {
            return Err(Error::LengthMismatch {
                expected: len,
                actual: y.len(),
            });
        }
        if out.len() != len {
            return Err(Error::LengthMismatch {
                expected: len,
                actual: out.len(),
            });
        }
        if len == 0 {
            return Ok(());
        }

        let pivot = cols[0];
        if pivot == 0.0 || !pivot.is_finite() {
            return Err(Error::SingularToeplitz { order: 0 });
        }

        let backward = &mut self.backward;
        let forward = &mut self.forward;
        backward.clear();
        forward.clear();
        backward.push(1.0 / pivot);
        out[0] = y[0] / pivot;

        for n in 1..len {
            // Reflection against the order-n backward vector.
            let error: f32 = cols[1..=n].iter().zip(backward.iter()).map(|(c, b)| c * b).sum();
            let denom = 1.0 / (1.0 - error * error);
            if !denom.is_finite() {
                return Err(Error::SingularToeplitz { order: n });
            }

            // For symmetric systems the forward vector is the reversed backward vector.
            forward.clear();
            forward.extend(backward.iter().rev());

            // b' = denom·[0; b] - error·denom·[f; 0]
            backward.push(0.0);
            for i in (1..=n).rev() {
                backward[i] = backward[i - 1] * denom;
            }
            backward[0] = 0.0;
            for (b, f) in backward.iter_mut().zip(forward.iter()) {
                *b -= error * denom * f;
            }

            let solution_error: f32 = (0..n).map(|i| cols[n - i] * out[i]).sum();
            let gain = y[n] - solution_error;
            out[n] = 0.0;
            for (x, b) in out[..=n].iter_mut().zip(backward.iter()) {
                *x += gain * b;
            }
        }

        if out.iter().all(|x| x.is_finite()) {
            Ok(())
        } else {
            Err(Error::SingularToeplitz { order: len - 1 })
        }
    }
}

/// Solve `Toeplitz(cols) · x = y` for a symmetric Toeplitz matrix.
///
/// Convenience wrapper that allocates. Hot paths should keep a
/// [`ToeplitzSolver`] around instead.
pub fn solve_sym_toeplitz(cols: &[f32], y: &[f32]) -> Result<Vec<f32>> {
    let mut out = vec![0.0; cols.len()];
    ToeplitzSolver::new(cols.len()).solve(cols, y, &mut out)?;
    Ok(out)
}
