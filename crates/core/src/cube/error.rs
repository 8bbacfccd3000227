//! Errors from the cube maintenance engine's pure logic.

use thiserror::Error;

/// Errors the cube engine's pure decision logic can raise. Missing-tenant
/// and storage failures belong to the `db` crate's repositories.
#[derive(Debug, Error)]
pub enum CubeError {
    /// `validate_consistency` found the cube and ledger sums disagree by
    /// more than the epsilon for some period type.
    #[error("cube is inconsistent with the ledger for the checked range")]
    Inconsistent,

    /// A query asked to group or filter by a dimension list that was empty.
    #[error("group_by must name at least one dimension")]
    EmptyGroupBy,
}

impl CubeError {
    /// Stable machine-readable code, matching section 7's `CubeInconsistency`
    /// kind.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Inconsistent => "CUBE_INCONSISTENCY",
            Self::EmptyGroupBy => "EMPTY_GROUP_BY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CubeError::Inconsistent.error_code(), "CUBE_INCONSISTENCY");
        assert_eq!(CubeError::EmptyGroupBy.error_code(), "EMPTY_GROUP_BY");
    }
}
