//! Dense cost matrix.

/// A dense n×n cost matrix stored in row-major order.
///
/// Location keys are plain indices `0..size`. Entries may be asymmetric.
/// A non-finite entry means "no connection" and is rejected when a
/// [`Problem`](crate::models::Problem) referencing it is built.
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::CostMatrix;
///
/// let cm = CostMatrix::from_rows(vec![
///     vec![0.0, 2.0, 3.0],
///     vec![2.0, 0.0, 2.0],
///     vec![3.0, 2.0, 0.0],
/// ])
/// .unwrap();
/// assert_eq!(cm.get(0, 2), 3.0);
/// assert_eq!(cm.size(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    data: Vec<f64>,
    size: usize,
}

impl CostMatrix {
    /// Creates a cost matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Creates a cost matrix from an explicit row-major grid.
    ///
    /// Returns `None` if the data length doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Creates a cost matrix from nested rows.
    ///
    /// Returns `None` unless every row has exactly `rows.len()` entries.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|row| row.len() != size) {
            return None;
        }
        Some(Self {
            data: rows.into_iter().flatten().collect(),
            size,
        })
    }

    /// Returns the cost of travelling from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either key is out of bounds. Keys held by a validated
    /// `Problem` are always in bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the cost from location `from` to location `to`.
    pub fn set(&mut self, from: usize, to: usize, cost: f64) {
        self.data[from * self.size + to] = cost;
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if `location` is a valid key.
    pub fn contains(&self, location: usize) -> bool {
        location < self.size
    }
}
