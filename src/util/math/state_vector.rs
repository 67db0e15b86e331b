use super::matrix::Matrix;
use num::traits::Zero;
use std::ops::{Add, Index, IndexMut, Sub};

/// A fixed-size state vector for the Kalman filters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StateVector<T, const N: usize> {
    pub data: [T; N],
}

impl<T: Copy + Zero, const N: usize> StateVector<T, N> {
    pub fn zero() -> Self {
        Self {
            data: [T::zero(); N],
        }
    }

    pub const fn from_array(data: [T; N]) -> Self { Self { data } }

    pub fn from_matrix(matrix: Matrix<T, N, 1>) -> Self {
        let mut vec = Self::zero();
        for i in 0..N {
            vec.data[i] = matrix.get(i, 0);
        }
        vec
    }

    pub fn to_matrix(self) -> Matrix<T, N, 1> {
        let mut mat = Matrix::<T, N, 1>::zero();
        for i in 0..N {
            mat.set(i, 0, self.data[i]);
        }
        mat
    }
}

impl<T: Copy + Add<Output = T>, const N: usize> Add for StateVector<T, N> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        let mut result = self;
        for i in 0..N {
            result.data[i] = self.data[i] + rhs.data[i];
        }
        result
    }
}

impl<T: Copy + Sub<Output = T>, const N: usize> Sub for StateVector<T, N> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        let mut result = self;
        for i in 0..N {
            result.data[i] = self.data[i] - rhs.data[i];
        }
        result
    }
}

impl<T: Copy, const N: usize> Index<usize> for StateVector<T, N> {
    type Output = T;

    fn index(&self, idx: usize) -> &Self::Output { &self.data[idx] }
}

impl<T: Copy, const N: usize> IndexMut<usize> for StateVector<T, N> {
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output { &mut self.data[idx] }
}
