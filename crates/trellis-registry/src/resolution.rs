//! Resolution cache keys and results.

use serde::{Deserialize, Serialize};

use trellis_bindings::QualifierSet;
use trellis_types::Type;

use crate::bean::{BeanId, InterceptionKind};

/// Cache key for type-safe bean resolution: the required type plus the
/// normalized qualifier set. Value equality and hashing are structural over
/// the type and qualifier-equivalence over the set, which is what makes the
/// resolution cache sound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub required: Type,
    pub qualifiers: QualifierSet,
}

/// Cache key for interceptor resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterceptorKey {
    pub kind: InterceptionKind,
    pub bindings: QualifierSet,
}

/// The outcome of a resolution request. Never a null bean: failure is data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Resolved(BeanId),
    Unsatisfied,
    /// Sorted by id for determinism.
    Ambiguous(Vec<BeanId>),
}

impl Resolution {
    pub fn from_candidates(mut candidates: Vec<BeanId>) -> Self {
        match candidates.len() {
            0 => Resolution::Unsatisfied,
            1 => Resolution::Resolved(candidates[0]),
            _ => {
                candidates.sort_unstable();
                candidates.dedup();
                if candidates.len() == 1 {
                    Resolution::Resolved(candidates[0])
                } else {
                    Resolution::Ambiguous(candidates)
                }
            }
        }
    }

    pub fn resolved(&self) -> Option<BeanId> {
        match self {
            Resolution::Resolved(id) => Some(*id),
            _ => None,
        }
    }
}
