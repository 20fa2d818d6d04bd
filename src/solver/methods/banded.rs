//! Banded LU factorization with partial pivoting
//!
//! The collocation system of a two-point problem is banded once the boundary
//! rows are placed next to the node they pin. A dense LU would cost O(N³);
//! the banded one costs O(N·kl·(kl + ku)).
//!
//! Storage follows the LAPACK `gbtrf` layout: element A(i, j) lives in row
//! `kl + ku + i − j` of column j, and the first `kl` storage rows hold the
//! fill-in created by row interchanges. U ends with upper bandwidth kl + ku.

/// Square band matrix
#[derive(Debug, Clone)]
pub(crate) struct BandMatrix {
    size: usize,
    kl: usize,
    ku: usize,
    /// Column-major band storage, `2·kl + ku + 1` rows per column
    data: Vec<f64>,
}

/// Zero pivot met while factorizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SingularMatrix {
    pub column: usize,
}

impl BandMatrix {
    /// Zero matrix with `kl` sub-diagonals and `ku` super-diagonals
    pub fn zeros(size: usize, kl: usize, ku: usize) -> Self {
        Self {
            size,
            kl,
            ku,
            data: vec![0.0; (2 * kl + ku + 1) * size],
        }
    }

    fn stride(&self) -> usize {
        2 * self.kl + self.ku + 1
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        (self.kl + self.ku + row - col) + col * self.stride()
    }

    /// True when (row, col) is inside the declared band
    pub fn in_band(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size && col <= row + self.ku && row <= col + self.kl
    }

    /// A(row, col) += value; (row, col) must be inside the band
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(self.in_band(row, col), "({}, {}) outside the band", row, col);
        let index = self.index(row, col);
        self.data[index] += value;
    }

    /// Factorize in place
    pub fn factorize(mut self) -> Result<BandLu, SingularMatrix> {
        let n = self.size;
        let kl = self.kl;
        let mut pivots = vec![0usize; n];
        // last column touched by the pivot rows so far
        let mut ju = 0usize;

        for j in 0..n {
            let km = kl.min(n - 1 - j);

            let mut p = 0;
            let mut largest = self.data[self.index(j, j)].abs();
            for offset in 1..=km {
                let value = self.data[self.index(j + offset, j)].abs();
                if value > largest {
                    largest = value;
                    p = offset;
                }
            }
            pivots[j] = j + p;
            if largest == 0.0 || !largest.is_finite() {
                return Err(SingularMatrix { column: j });
            }

            ju = ju.max((j + self.ku + p).min(n - 1));

            if p != 0 {
                for col in j..=ju {
                    let a = self.index(j, col);
                    let b = self.index(j + p, col);
                    self.data.swap(a, b);
                }
            }

            if km > 0 {
                let pivot = self.data[self.index(j, j)];
                for row in j + 1..=j + km {
                    let index = self.index(row, j);
                    self.data[index] /= pivot;
                }
                for col in j + 1..=ju {
                    let u = self.data[self.index(j, col)];
                    if u == 0.0 {
                        continue;
                    }
                    for row in j + 1..=j + km {
                        let l = self.data[self.index(row, j)];
                        let index = self.index(row, col);
                        self.data[index] -= l * u;
                    }
                }
            }
        }

        Ok(BandLu {
            matrix: self,
            pivots,
        })
    }
}

/// LU factors of a [`BandMatrix`]
#[derive(Debug, Clone)]
pub(crate) struct BandLu {
    matrix: BandMatrix,
    pivots: Vec<usize>,
}

impl BandLu {
    /// Solve A·x = b in place
    pub fn solve_in_place(&self, b: &mut [f64]) {
        let a = &self.matrix;
        let n = a.size;
        debug_assert_eq!(b.len(), n);

        // L with the row interchanges applied in factorization order
        for j in 0..n {
            b.swap(j, self.pivots[j]);
            let bj = b[j];
            if bj != 0.0 {
                for row in j + 1..=(j + a.kl).min(n - 1) {
                    b[row] -= a.data[a.index(row, j)] * bj;
                }
            }
        }

        // U, upper bandwidth kl + ku
        let kv = a.kl + a.ku;
        for j in (0..n).rev() {
            b[j] /= a.data[a.index(j, j)];
            let bj = b[j];
            if bj != 0.0 {
                for row in j.saturating_sub(kv)..j {
                    b[row] -= a.data[a.index(row, j)] * bj;
                }
            }
        }
    }

    pub fn solve(&self, b: &[f64]) -> Vec<f64> {
        let mut x = b.to_vec();
        self.solve_in_place(&mut x);
        x
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    fn band_and_dense(n: usize, kl: usize, ku: usize, entry: impl Fn(usize, usize) -> f64) -> (BandMatrix, DMatrix<f64>) {
        let mut band = BandMatrix::zeros(n, kl, ku);
        let mut dense = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                if band.in_band(i, j) {
                    let value = entry(i, j);
                    band.add(i, j, value);
                    dense[(i, j)] = value;
                }
            }
        }
        (band, dense)
    }

    #[test]
    fn test_matches_dense_solution_with_pivoting() {
        // small diagonal forces row interchanges
        let (band, dense) = band_and_dense(9, 2, 3, |i, j| {
            if i == j {
                1e-3 * (i as f64 + 1.0)
            } else {
                ((i * 7 + j * 3) % 5) as f64 - 1.5
            }
        });
        let b: Vec<f64> = (0..9).map(|i| (i as f64).sin() + 2.0).collect();

        let x = band.factorize().unwrap().solve(&b);
        let expected = dense.lu().solve(&DVector::from_vec(b)).unwrap();

        for (xi, ei) in x.iter().zip(expected.iter()) {
            assert_relative_eq!(*xi, *ei, max_relative = 1e-9, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tridiagonal() {
        let (band, dense) = band_and_dense(6, 1, 1, |i, j| if i == j { 4.0 } else { -1.0 });
        let b = vec![1.0; 6];
        let x = band.factorize().unwrap().solve(&b);
        let residual = &dense * DVector::from_vec(x) - DVector::from_vec(b);
        assert!(residual.amax() < 1e-12);
    }

    #[test]
    fn test_singular_matrix_is_reported() {
        let mut band = BandMatrix::zeros(3, 1, 1);
        band.add(0, 0, 1.0);
        band.add(2, 2, 1.0);
        let result = band.factorize();
        assert_eq!(result.unwrap_err(), SingularMatrix { column: 1 });
    }
}
