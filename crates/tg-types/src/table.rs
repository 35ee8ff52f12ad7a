//! Dense row-major numeric tables for features and targets.

use serde::{Deserialize, Serialize};

use crate::errors::TableError;

/// A dense `rows x cols` table of `f64`, stored row-major.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Table {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, TableError> {
        let expected = rows * cols;
        if data.len() != expected {
            return Err(TableError::ShapeMismatch {
                rows,
                cols,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, TableError> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(TableError::RaggedRows {
                    row: i,
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Single-column table, the usual shape for targets.
    pub fn column(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size; zero-width tables hold no data
        self.data.chunks_exact(self.cols.max(1))
    }

    /// Overwrite `self` with the rows of `source` named by `indices`, in the
    /// given order. The existing allocation is reused when large enough.
    ///
    /// Panics if an index is out of bounds; callers validate indices first.
    pub fn gather_rows_from(&mut self, source: &Table, indices: &[usize]) {
        self.rows = indices.len();
        self.cols = source.cols;
        self.data.clear();
        self.data.reserve(indices.len() * source.cols);
        for &i in indices {
            self.data.extend_from_slice(source.row(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_checks_shape() {
        assert!(Table::from_vec(2, 3, vec![0.0; 6]).is_ok());
        assert_eq!(
            Table::from_vec(2, 3, vec![0.0; 5]),
            Err(TableError::ShapeMismatch {
                rows: 2,
                cols: 3,
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = Table::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            TableError::RaggedRows {
                row: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn gather_preserves_index_order() {
        let source = Table::from_rows(&[[0.0, 0.5], [1.0, 1.5], [2.0, 2.5], [3.0, 3.5]]).unwrap();
        let mut scratch = Table::default();

        scratch.gather_rows_from(&source, &[3, 0, 2]);
        assert_eq!(scratch.dims(), (3, 2));
        assert_eq!(scratch.row(0), &[3.0, 3.5]);
        assert_eq!(scratch.row(1), &[0.0, 0.5]);
        assert_eq!(scratch.row(2), &[2.0, 2.5]);
    }

    #[test]
    fn gather_reuses_allocation() {
        let source = Table::column((0..100).map(f64::from).collect());
        let mut scratch = Table::default();
        scratch.gather_rows_from(&source, &(0..80).collect::<Vec<_>>());
        let capacity = scratch.data.capacity();

        scratch.gather_rows_from(&source, &[5, 6]);
        assert_eq!(scratch.as_slice(), &[5.0, 6.0]);
        assert_eq!(scratch.data.capacity(), capacity);
    }

    #[test]
    fn iter_rows_walks_every_row() {
        let table = Table::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let rows: Vec<&[f64]> = table.iter_rows().collect();
        assert_eq!(rows, vec![&[1.0, 2.0][..], &[3.0, 4.0][..]]);
        assert_eq!(Table::zeros(3, 0).iter_rows().count(), 0);
    }
}
