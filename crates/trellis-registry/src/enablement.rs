//! Which alternatives are enabled for a deployment.
//!
//! Enabled-ness is supplied by the surrounding bootstrap (beans.xml or
//! priority annotations); the resolver only consumes it.

use std::collections::{HashMap, HashSet};

use trellis_bindings::AnnotationTypeId;
use trellis_types::ClassId;

use crate::bean::Bean;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enablement {
    alternative_classes: HashMap<ClassId, Option<i32>>,
    alternative_stereotypes: HashSet<AnnotationTypeId>,
}

impl Enablement {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn enable_class(mut self, class: ClassId, priority: Option<i32>) -> Self {
        self.alternative_classes.insert(class, priority);
        self
    }

    pub fn enable_stereotype(mut self, stereotype: AnnotationTypeId) -> Self {
        self.alternative_stereotypes.insert(stereotype);
        self
    }

    /// Non-alternatives are always enabled; alternatives only when their
    /// class or one of their stereotypes is enabled.
    pub fn is_enabled(&self, bean: &Bean) -> bool {
        if !bean.alternative {
            return true;
        }
        self.alternative_classes.contains_key(&bean.bean_class)
            || bean
                .stereotypes
                .iter()
                .any(|s| self.alternative_stereotypes.contains(s))
    }

    /// The priority used to disambiguate between enabled alternatives: an
    /// explicit bean priority wins over the enablement-listed one.
    pub fn alternative_priority(&self, bean: &Bean) -> Option<i32> {
        bean.priority
            .or_else(|| self.alternative_classes.get(&bean.bean_class).copied().flatten())
    }
}
