//! Boundary trait for cost-matrix collaborators.

use super::CostMatrix;

/// Supplies a cost matrix for an ordered list of locations.
///
/// The returned matrix is indexed by the position of each location in the
/// input slice, so `locations[k]` becomes location key `k`. The solver only
/// sees the numbers.
///
/// # Examples
///
/// ```
/// use u_lastmile::distance::{CostMatrix, CostMatrixProvider};
///
/// struct Manhattan;
///
/// impl CostMatrixProvider for Manhattan {
///     type Location = (i64, i64);
///     type Error = std::convert::Infallible;
///
///     fn matrix_for(&self, locations: &[(i64, i64)]) -> Result<CostMatrix, Self::Error> {
///         let mut cm = CostMatrix::new(locations.len());
///         for (i, a) in locations.iter().enumerate() {
///             for (j, b) in locations.iter().enumerate() {
///                 cm.set(i, j, ((a.0 - b.0).abs() + (a.1 - b.1).abs()) as f64);
///             }
///         }
///         Ok(cm)
///     }
/// }
///
/// let cm = Manhattan.matrix_for(&[(0, 0), (3, 4)]).unwrap();
/// assert_eq!(cm.get(0, 1), 7.0);
/// ```
pub trait CostMatrixProvider {
    /// Location representation understood by this provider.
    type Location;
    /// Failure raised when the matrix cannot be produced.
    type Error;

    /// Builds the matrix for `locations`, in order.
    fn matrix_for(&self, locations: &[Self::Location]) -> Result<CostMatrix, Self::Error>;
}
