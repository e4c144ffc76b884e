//! Validated parameter bundle for repetition searches.

use serde::Deserialize;

use crate::errors::{DupscanError, DupscanResult};

/// Bounds for a repetition search.
///
/// Invalid combinations are a configuration error caught at construction;
/// the finder itself never sees an invalid bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRepetitionParameters")]
pub struct RepetitionParameters {
    min_length: usize,
    min_motif_length: usize,
    max_motif_length: usize,
    min_motif_instances: usize,
}

#[derive(Deserialize)]
struct RawRepetitionParameters {
    min_length: usize,
    min_motif_length: usize,
    max_motif_length: usize,
    min_motif_instances: usize,
}

impl TryFrom<RawRepetitionParameters> for RepetitionParameters {
    type Error = DupscanError;

    fn try_from(raw: RawRepetitionParameters) -> DupscanResult<Self> {
        RepetitionParameters::new(
            raw.min_length,
            raw.min_motif_length,
            raw.max_motif_length,
            raw.min_motif_instances,
        )
    }
}

impl RepetitionParameters {
    pub fn new(
        min_length: usize,
        min_motif_length: usize,
        max_motif_length: usize,
        min_motif_instances: usize,
    ) -> DupscanResult<Self> {
        if min_length < 1 {
            return Err(DupscanError::Config("min_length must be positive".to_string()));
        }
        if min_motif_length < 1 {
            return Err(DupscanError::Config(
                "min_motif_length must be positive".to_string(),
            ));
        }
        if max_motif_length < min_motif_length {
            return Err(DupscanError::Config(format!(
                "max_motif_length ({max_motif_length}) must not be smaller than min_motif_length ({min_motif_length})"
            )));
        }
        if min_motif_instances < 2 {
            return Err(DupscanError::Config(
                "min_motif_instances must be at least 2".to_string(),
            ));
        }
        Ok(Self {
            min_length,
            min_motif_length,
            max_motif_length,
            min_motif_instances,
        })
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn min_motif_length(&self) -> usize {
        self.min_motif_length
    }

    pub fn max_motif_length(&self) -> usize {
        self.max_motif_length
    }

    pub fn min_motif_instances(&self) -> usize {
        self.min_motif_instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_parameters() {
        let params = RepetitionParameters::new(3, 1, 5, 2).unwrap();
        assert_eq!(params.min_length(), 3);
        assert_eq!(params.max_motif_length(), 5);
    }

    #[test]
    fn test_invalid_combinations_fail() {
        assert!(RepetitionParameters::new(0, 1, 5, 2).is_err());
        assert!(RepetitionParameters::new(3, 0, 5, 2).is_err());
        assert!(RepetitionParameters::new(3, 6, 5, 2).is_err());
        assert!(RepetitionParameters::new(3, 1, 5, 1).is_err());
        assert!(RepetitionParameters::new(3, 1, 5, 0).is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let ok: Result<RepetitionParameters, _> = serde_json::from_str(
            r#"{"min_length":3,"min_motif_length":1,"max_motif_length":4,"min_motif_instances":2}"#,
        );
        assert!(ok.is_ok());
        let bad: Result<RepetitionParameters, _> = serde_json::from_str(
            r#"{"min_length":3,"min_motif_length":9,"max_motif_length":4,"min_motif_instances":2}"#,
        );
        assert!(bad.is_err());
    }
}
