use num::traits::{One, Zero};
use std::ops::{Add, Div, Mul, Sub};

/// Fixed-size row-major `M x N` matrix used by the filter code.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix<T, const M: usize, const N: usize> {
    pub(crate) data: [[T; N]; M],
}

impl<T, const M: usize, const N: usize> Matrix<T, M, N>
where T: Copy
{
    pub const fn new(data: [[T; N]; M]) -> Self { Matrix { data } }

    pub fn get(&self, row: usize, col: usize) -> T { self.data[row][col] }

    pub fn set(&mut self, row: usize, col: usize, value: T) { self.data[row][col] = value; }
}

impl<T, const M: usize, const N: usize> Matrix<T, M, N>
where T: Copy + Zero
{
    pub fn zero() -> Self {
        Self {
            data: [[T::zero(); N]; M],
        }
    }
}

impl<T, const N: usize> Matrix<T, N, N>
where T: Copy + Zero + One
{
    pub fn identity() -> Self {
        let mut result = Self::zero();
        for i in 0..N {
            result.data[i][i] = T::one();
        }
        result
    }

    /// Builds a square matrix with `diag` on the main diagonal.
    pub fn diagonal(diag: [T; N]) -> Self {
        let mut result = Self::zero();
        for (i, d) in diag.into_iter().enumerate() {
            result.data[i][i] = d;
        }
        result
    }
}

impl<T, const M: usize, const N: usize> Matrix<T, M, N>
where T: Copy + Zero
{
    pub fn transpose(&self) -> Matrix<T, N, M> {
        let mut result = Matrix::<T, N, M>::zero();
        for i in 0..M {
            for j in 0..N {
                result.data[j][i] = self.data[i][j];
            }
        }
        result
    }

    /// `true` if no entry is NaN or infinite.
    pub fn is_finite(&self) -> bool
    where T: Into<f64> {
        self.data.iter().flatten().all(|v| (*v).into().is_finite())
    }
}

impl<T, const M: usize, const N: usize> Add for Matrix<T, M, N>
where T: Copy + Zero + Add<Output = T>
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        let mut result = Self::zero();
        for i in 0..M {
            for j in 0..N {
                result.data[i][j] = self.data[i][j] + rhs.data[i][j];
            }
        }
        result
    }
}

impl<T, const M: usize, const N: usize> Sub for Matrix<T, M, N>
where T: Copy + Zero + Sub<Output = T>
{
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut result = Self::zero();
        for i in 0..M {
            for j in 0..N {
                result.data[i][j] = self.data[i][j] - rhs.data[i][j];
            }
        }
        result
    }
}

impl<T, const M: usize, const N: usize, const P: usize> Mul<Matrix<T, N, P>> for Matrix<T, M, N>
where T: Copy + Zero + Add<Output = T> + Mul<Output = T>
{
    type Output = Matrix<T, M, P>;

    fn mul(self, rhs: Matrix<T, N, P>) -> Self::Output {
        let mut result = Matrix::<T, M, P>::zero();
        for i in 0..M {
            for j in 0..P {
                let mut sum = T::zero();
                for k in 0..N {
                    sum = sum + self.data[i][k] * rhs.data[k][j];
                }
                result.data[i][j] = sum;
            }
        }
        result
    }
}

impl<T, const M: usize, const N: usize> Mul<T> for Matrix<T, M, N>
where T: Copy + Zero + Mul<Output = T>
{
    type Output = Self;

    fn mul(self, rhs: T) -> Self::Output {
        let mut result = self;
        for row in &mut result.data {
            for v in row.iter_mut() {
                *v = *v * rhs;
            }
        }
        result
    }
}

impl<T, const N: usize> Matrix<T, N, N>
where T: Copy
        + Zero
        + One
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Div<Output = T>
        + PartialEq
{
    /// Gauss-Jordan inverse. `None` if a zero pivot is hit.
    pub fn try_inverse(&self) -> Option<Self> {
        let mut left = *self;
        let mut right = Self::identity();

        for i in 0..N {
            let pivot = left.data[i][i];
            if pivot == T::zero() {
                return None;
            }

            for j in 0..N {
                left.data[i][j] = left.data[i][j] / pivot;
                right.data[i][j] = right.data[i][j] / pivot;
            }

            for k in 0..N {
                if k != i {
                    let factor = left.data[k][i];
                    for j in 0..N {
                        left.data[k][j] = left.data[k][j] - factor * left.data[i][j];
                        right.data[k][j] = right.data[k][j] - factor * right.data[i][j];
                    }
                }
            }
        }

        Some(right)
    }
}
