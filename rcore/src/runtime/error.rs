//! Error handling for the RCore runtime

use thiserror::Error;
use tracing::warn;

use crate::config::WarnLevel;

pub type RResult<T> = Result<T, RError>;

/// User-visible R conditions. The `Display` text is the exact R message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RError {
    #[error("subscript out of bounds")]
    SubscriptBounds,

    #[error("[[ ]] subscript out of bounds")]
    SubscriptBoundsSub,

    #[error("attempt to select less than one element")]
    SelectLess1,

    #[error("attempt to select more than one element")]
    SelectMore1,

    #[error("replacement has length zero")]
    Replacement0,

    /// Warning in the flat case, error in the multi-dimensional case.
    #[error("number of items to replace is not a multiple of replacement length")]
    NotMultipleReplacement,

    #[error("more elements supplied than there are to replace")]
    MoreSuppliedReplace,

    #[error("NAs are not allowed in subscripted assignments")]
    NaSubscripted,

    #[error("incorrect number of subscripts")]
    IncorrectSubscripts,

    #[error("incorrect number of subscripts on matrix")]
    IncorrectSubscriptsMatrix,

    #[error("[[ ]] improper number of subscripts")]
    ImproperSubscript,

    #[error("no such index at level {0}")]
    NoSuchIndex(usize),

    #[error("recursive indexing failed at level {0}")]
    RecursiveIndexingFailed(usize),

    #[error("invalid subscript type '{0}'")]
    InvalidSubscriptType(String),

    #[error("object of type '{0}' is not subsettable")]
    ObjectNotSubsettable(String),

    #[error("incompatible types (from {from} to {to}) in subassignment type fix")]
    SubassignTypeFix { from: String, to: String },

    #[error("incompatible types (from {from} to {to}) in [[ assignment")]
    SubscriptTypes { from: String, to: String },

    #[error("only 0's may be mixed with negative subscripts")]
    Only0Mixed,

    #[error("dims [product {product}] do not match the length of object [{length}]")]
    DimsDontMatchLength { product: usize, length: usize },

    #[error("cannot allocate vector of length {0}")]
    VectorTooLarge(usize),

    #[error("NAs introduced by coercion")]
    NaIntroducedCoercion,

    /// Message declared by a cast pipeline (filter, find-first or not-NA step).
    #[error("{0}")]
    Custom(String),
}

impl RError {
    pub fn subassign_type_fix(from: &str, to: &str) -> Self {
        RError::SubassignTypeFix {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn invalid_subscript_type(name: &str) -> Self {
        RError::InvalidSubscriptType(name.to_string())
    }
}

/// Signals a programming error in a pipeline declaration or the engine itself.
/// These are never surfaced as R conditions.
#[track_caller]
pub fn internal_error(msg: impl std::fmt::Display) -> ! {
    panic!("internal error: {}", msg)
}

/// Warning sink handed to operations that may warn without failing.
#[derive(Debug, Clone, Default)]
pub struct Warnings {
    level: WarnLevel,
    entries: Vec<RError>,
}

impl Warnings {
    pub fn new(level: WarnLevel) -> Self {
        Self {
            level,
            entries: Vec::new(),
        }
    }

    /// Registers a warning. Only fails when the level promotes warnings to errors.
    pub fn warn(&mut self, warning: RError) -> RResult<()> {
        match self.level {
            WarnLevel::Ignore => Ok(()),
            WarnLevel::Deferred => {
                self.entries.push(warning);
                Ok(())
            }
            WarnLevel::Immediate => {
                warn!("Warning message: {}", warning);
                self.entries.push(warning);
                Ok(())
            }
            WarnLevel::Error => Err(warning),
        }
    }

    pub fn entries(&self) -> &[RError] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn take(&mut self) -> Vec<RError> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_r() {
        assert_eq!(
            RError::NoSuchIndex(2).to_string(),
            "no such index at level 2"
        );
        assert_eq!(
            RError::subassign_type_fix("raw", "double").to_string(),
            "incompatible types (from raw to double) in subassignment type fix"
        );
        assert_eq!(
            RError::invalid_subscript_type("list").to_string(),
            "invalid subscript type 'list'"
        );
    }

    #[test]
    fn test_warning_levels() {
        let mut deferred = Warnings::new(WarnLevel::Deferred);
        assert!(deferred.warn(RError::NotMultipleReplacement).is_ok());
        assert_eq!(deferred.len(), 1);

        let mut ignored = Warnings::new(WarnLevel::Ignore);
        assert!(ignored.warn(RError::NotMultipleReplacement).is_ok());
        assert!(ignored.is_empty());

        let mut strict = Warnings::new(WarnLevel::Error);
        assert_eq!(
            strict.warn(RError::NotMultipleReplacement),
            Err(RError::NotMultipleReplacement)
        );
    }
}
