#[derive(thiserror::Error, Debug, PartialEq)]
pub enum BatchingError {
    #[error("batch size must be a positive number of rows, got {0}")]
    InvalidBatchSize(usize),
}

/// Splits a slice into contiguous, order-preserving batches of at most
/// `batch_size` items. The final batch may be shorter. An empty input yields
/// no batches at all.
pub fn split_into_batches<T>(items: &[T], batch_size: usize) -> Result<Vec<&[T]>, BatchingError> {
    if batch_size == 0 {
        return Err(BatchingError::InvalidBatchSize(batch_size));
    }

    Ok(items.chunks(batch_size).collect())
}

/// Mutable twin of [`split_into_batches`], used when generated keys are
/// written back onto the entities batch by batch.
pub fn split_into_batches_mut<T>(
    items: &mut [T],
    batch_size: usize,
) -> Result<Vec<&mut [T]>, BatchingError> {
    if batch_size == 0 {
        return Err(BatchingError::InvalidBatchSize(batch_size));
    }

    Ok(items.chunks_mut(batch_size).collect())
}
