use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

/// A span-free diagnostic record.
///
/// Bean metadata carries no source positions at this layer; the scanner that
/// feeds the container owns spans and can re-attach them by error code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl Problem {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }
}

/// An error detected while processing a single bean or class in isolation.
///
/// Definition errors are accumulated and reported at the end of boot; one bad
/// bean never aborts processing of its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("{bean} declares an illegal bean type {ty}")]
    IllegalBeanType { bean: String, ty: String },

    #[error("{class} declares conflicting interceptor bindings of type {binding}")]
    ConflictingInterceptorBindings { class: String, binding: String },

    #[error("injection point {injection_point} declares duplicate qualifier {qualifier}")]
    DuplicateQualifiers {
        injection_point: String,
        qualifier: String,
    },

    #[error("cannot read member {member} of qualifier {qualifier}")]
    QualifierValueUnreadable { qualifier: String, member: String },

    #[error("{class} is parameterized with {actual} type argument(s), expected {expected}")]
    TypeArgumentArity {
        class: String,
        expected: usize,
        actual: usize,
    },

    #[error("interceptor bindings requested without any binding annotation")]
    EmptyInterceptorBindings,

    #[error("injection point {injection_point} has an illegal required type {ty}")]
    IllegalRequiredType { injection_point: String, ty: String },
}

/// An error that only becomes visible when relating multiple beans or
/// archives, detected during deployment validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeploymentError {
    #[error("{class} inherits conflicting interceptor bindings of type {binding}")]
    ConflictingInheritedBindings { class: String, binding: String },

    #[error("specialization cycle involving {bean}")]
    SpecializationCycle { bean: String },

    #[error("{bean} declares specialization but no bean of the specialized class exists")]
    UnresolvableSpecialization { bean: String },

    #[error("{bean} is specialized by more than one enabled bean")]
    SpecializedTwice { bean: String },

    #[error("unsatisfied dependency at {injection_point}")]
    UnsatisfiedDependency { injection_point: String },

    #[error("ambiguous dependency at {injection_point}: {candidates:?}")]
    AmbiguousDependency {
        injection_point: String,
        candidates: Vec<String>,
    },
}

/// The typed runtime fault raised by dynamic lookups.
///
/// Unlike the boot-time variants above, these are surfaced immediately at the
/// call site instead of being deferred to a validation report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no bean matches the requested type and qualifiers")]
    Unsatisfied,

    #[error("multiple beans match the requested type and qualifiers: {candidates:?}")]
    Ambiguous { candidates: Vec<String> },

    #[error("deployment context already disposed")]
    ContextDisposed,
}

impl DefinitionError {
    /// Stable diagnostic code, used by reporting channels to re-attach
    /// source positions.
    pub fn code(&self) -> &'static str {
        match self {
            DefinitionError::IllegalBeanType { .. } => "illegal-bean-type",
            DefinitionError::ConflictingInterceptorBindings { .. } => {
                "conflicting-interceptor-bindings"
            }
            DefinitionError::DuplicateQualifiers { .. } => "duplicate-qualifiers",
            DefinitionError::QualifierValueUnreadable { .. } => "qualifier-value-unreadable",
            DefinitionError::TypeArgumentArity { .. } => "type-argument-arity",
            DefinitionError::EmptyInterceptorBindings => "empty-interceptor-bindings",
            DefinitionError::IllegalRequiredType { .. } => "illegal-required-type",
        }
    }
}

impl DeploymentError {
    pub fn code(&self) -> &'static str {
        match self {
            DeploymentError::ConflictingInheritedBindings { .. } => {
                "conflicting-inherited-bindings"
            }
            DeploymentError::SpecializationCycle { .. } => "specialization-cycle",
            DeploymentError::UnresolvableSpecialization { .. } => "unresolvable-specialization",
            DeploymentError::SpecializedTwice { .. } => "specialized-twice",
            DeploymentError::UnsatisfiedDependency { .. } => "unsatisfied-dependency",
            DeploymentError::AmbiguousDependency { .. } => "ambiguous-dependency",
        }
    }
}

/// Accumulate-then-report sink for definition and deployment errors.
#[derive(Debug, Default)]
pub struct Problems {
    definition: Vec<DefinitionError>,
    deployment: Vec<DeploymentError>,
}

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_definition(&mut self, error: DefinitionError) {
        tracing::debug!(%error, "definition error");
        self.definition.push(error);
    }

    pub fn push_deployment(&mut self, error: DeploymentError) {
        tracing::debug!(%error, "deployment error");
        self.deployment.push(error);
    }

    pub fn definition_errors(&self) -> &[DefinitionError] {
        &self.definition
    }

    pub fn deployment_errors(&self) -> &[DeploymentError] {
        &self.deployment
    }

    pub fn is_fatal(&self) -> bool {
        !self.definition.is_empty() || !self.deployment.is_empty()
    }

    /// Render the accumulated errors as diagnostic records for the
    /// reporting channel.
    pub fn to_problems(&self) -> Vec<Problem> {
        self.definition
            .iter()
            .map(|e| Problem::error(e.code(), e.to_string()))
            .chain(
                self.deployment
                    .iter()
                    .map(|e| Problem::error(e.code(), e.to_string())),
            )
            .collect()
    }

    /// Consume the sink, yielding `Err` if any error was recorded.
    pub fn into_report(self) -> Result<(), ProblemReport> {
        if self.is_fatal() {
            Err(ProblemReport {
                definition: self.definition,
                deployment: self.deployment,
            })
        } else {
            Ok(())
        }
    }
}

/// The batched failure produced by [`Problems::into_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemReport {
    pub definition: Vec<DefinitionError>,
    pub deployment: Vec<DeploymentError>,
}

impl std::error::Error for ProblemReport {}

impl fmt::Display for ProblemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "deployment failed: {} definition error(s), {} deployment error(s)",
            self.definition.len(),
            self.deployment.len()
        )?;
        for e in &self.definition {
            writeln!(f, "  - {e}")?;
        }
        for e in &self.deployment {
            writeln!(f, "  - {e}")?;
        }
        Ok(())
    }
}
