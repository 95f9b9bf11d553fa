use rand::Rng;
use serde::{Serialize, Deserialize};
use std::ops::{Add, Sub, Mul};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f32>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Glorot (Xavier) uniform initialization: samples from U(-limit, limit)
    /// with limit = sqrt(6 / (fan_in + fan_out)).
    ///
    /// Shape: (rows, cols). `rows` is the fan-in, `cols` the fan-out, which
    /// matches the (input_dim, units) kernel layout of a dense layer.
    pub fn glorot_uniform<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let limit = (6.0 / (rows + cols) as f32).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = rng.gen_range(-limit..limit);
            }
        }
        res
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f32) -> f32,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Adds the single-row matrix `row` to every row of `self`.
    pub fn add_row(&self, row: &Matrix) -> Matrix {
        assert_eq!(row.rows, 1, "broadcast operand must have exactly one row");
        assert_eq!(self.cols, row.cols, "Matrices are of incorrect sizes");
        let data = self.data.iter()
            .map(|r| r.iter().zip(row.data[0].iter()).map(|(a, b)| a + b).collect())
            .collect();
        Matrix { rows: self.rows, cols: self.cols, data }
    }

    /// Sums each column, producing a (1, cols) matrix.
    pub fn sum_rows(&self) -> Matrix {
        let mut res = Matrix::zeros(1, self.cols);
        for row in &self.data {
            for (acc, x) in res.data[0].iter_mut().zip(row.iter()) {
                *acc += x;
            }
        }
        res
    }

    /// Builds a matrix from row-major data. An empty `data` yields a 0×0 matrix.
    pub fn from_data(data: Vec<Vec<f32>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data
        }
    }

    /// Builds a (rows, cols) matrix from a flat row-major slice.
    pub fn from_flat(rows: usize, cols: usize, flat: &[f32]) -> Matrix {
        assert_eq!(flat.len(), rows * cols, "flat data does not match ({rows}, {cols})");
        let data = if cols == 0 {
            vec![vec![]; rows]
        } else {
            flat.chunks(cols).map(|c| c.to_vec()).collect()
        };
        Matrix { rows, cols, data }
    }

    /// Row-major copy of the contents.
    pub fn to_flat(&self) -> Vec<f32> {
        self.data.iter().flatten().copied().collect()
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] + rhs.data[i][j];
            }
        }

        res
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] - rhs.data[i][j];
            }
        }

        res
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res =  Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }

                res.data[i][j] = sum;
            }
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn glorot_uniform_stays_within_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = Matrix::glorot_uniform(1, 1, &mut rng);
        let limit = 3.0_f32.sqrt();
        assert_eq!((m.rows, m.cols), (1, 1));
        assert!(m.data[0][0].abs() < limit);
    }

    #[test]
    fn product_and_transpose() {
        let a = Matrix::from_data(vec![vec![1.0], vec![2.0], vec![3.0]]);
        let gram = a.transpose() * a.clone();
        assert_eq!(gram.data, vec![vec![14.0]]);
    }

    #[test]
    fn add_row_broadcasts_over_rows() {
        let a = Matrix::from_flat(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::from_flat(1, 2, &[10.0, 20.0]);
        assert_eq!(a.add_row(&b).to_flat(), vec![11.0, 22.0, 13.0, 24.0]);
    }

    #[test]
    fn sum_rows_collapses_to_single_row() {
        let a = Matrix::from_flat(3, 1, &[1.0, -2.0, 4.0]);
        assert_eq!(a.sum_rows().data, vec![vec![3.0]]);
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn mismatched_add_panics() {
        let _ = Matrix::zeros(1, 2) + Matrix::zeros(2, 1);
    }
}
