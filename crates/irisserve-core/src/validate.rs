//! Feature validation
//!
//! The only place where request values are checked against the feature
//! domain. Downstream code receives [`FeatureVector`]s and does not re-check.

use crate::error::ValidationError;
use crate::types::{FeatureVector, RawFeatures, FEATURE_COUNT};
use tracing::debug;

/// Validate a single raw payload.
///
/// Fields are checked in model column order and the first problem is
/// reported. Values are never clamped or coerced.
pub fn validate(raw: &RawFeatures) -> Result<FeatureVector, ValidationError> {
    let mut values = [0.0; FEATURE_COUNT];

    for (slot, (field, value)) in values.iter_mut().zip(raw.fields()) {
        let value = value.ok_or(ValidationError::MissingField { field })?;

        if !value.is_finite() || value < 0.0 {
            debug!(field, value, "Rejected out-of-domain feature");
            return Err(ValidationError::OutOfDomain { field, value });
        }

        *slot = value;
    }

    Ok(FeatureVector::from_validated(values))
}

/// Validate every item of a batch, all-or-nothing.
///
/// The first invalid item fails the whole batch, wrapped with its position.
pub fn validate_batch(
    raws: &[RawFeatures],
    max_batch_size: usize,
) -> Result<Vec<FeatureVector>, ValidationError> {
    if raws.len() > max_batch_size {
        return Err(ValidationError::BatchTooLarge {
            size: raws.len(),
            max: max_batch_size,
        });
    }

    raws.iter()
        .enumerate()
        .map(|(index, raw)| {
            validate(raw).map_err(|source| ValidationError::InBatch {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}
