#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("value of `from` ({from}) should be lower than or equal to `to` ({to})")]
    Inverted { from: i64, to: i64 },
}

/// Returns the values from `from` up to (but not including) `to`.
///
/// ```
/// assert_eq!(mongocrud::utils::range(3, 6).unwrap(), vec![3, 4, 5]);
/// ```
pub fn range(from: i64, to: i64) -> Result<Vec<i64>, RangeError> {
    if from > to {
        return Err(RangeError::Inverted { from, to });
    }
    Ok((from..to).collect())
}
