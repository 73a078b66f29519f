//! Traits: typed annotations attached to shapes.

use crate::model::ShapeId;
use std::fmt;

/// Key of a trait. A shape carries at most one trait of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TraitKind {
    Documentation,
    Deprecated,
    Error,
    Retryable,
    Required,
    Length,
    Range,
    Pattern,
    UniqueItems,
    Streaming,
    EventHeader,
    EventPayload,
    Protocol,
    Refactored,
}

impl TraitKind {
    /// Constraint traits are the ones lifted by constrained-member extraction.
    pub fn is_constraint(self) -> bool {
        matches!(
            self,
            TraitKind::Length | TraitKind::Range | TraitKind::Pattern | TraitKind::UniqueItems
        )
    }
}

/// Which side of the wire is blamed for a modeled error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFault {
    Client,
    Server,
}

impl fmt::Display for ErrorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorFault::Client => f.write_str("client"),
            ErrorFault::Server => f.write_str("server"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trait {
    Documentation(String),
    Deprecated {
        message: Option<String>,
        since: Option<String>,
    },
    Error(ErrorFault),
    Retryable {
        throttling: bool,
    },
    Required,
    Length {
        min: Option<u64>,
        max: Option<u64>,
    },
    Range {
        min: Option<i64>,
        max: Option<i64>,
    },
    Pattern(String),
    UniqueItems,
    /// On unions: the union is an event stream.
    Streaming,
    EventHeader,
    EventPayload,
    /// On services: absolute id of the protocol trait, e.g. `aws.protocols#restJson1`.
    Protocol(String),
    /// Provenance marker left by constrained-member extraction.
    Refactored {
        original: ShapeId,
    },
}

impl Trait {
    pub fn kind(&self) -> TraitKind {
        match self {
            Trait::Documentation(_) => TraitKind::Documentation,
            Trait::Deprecated { .. } => TraitKind::Deprecated,
            Trait::Error(_) => TraitKind::Error,
            Trait::Retryable { .. } => TraitKind::Retryable,
            Trait::Required => TraitKind::Required,
            Trait::Length { .. } => TraitKind::Length,
            Trait::Range { .. } => TraitKind::Range,
            Trait::Pattern(_) => TraitKind::Pattern,
            Trait::UniqueItems => TraitKind::UniqueItems,
            Trait::Streaming => TraitKind::Streaming,
            Trait::EventHeader => TraitKind::EventHeader,
            Trait::EventPayload => TraitKind::EventPayload,
            Trait::Protocol(_) => TraitKind::Protocol,
            Trait::Refactored { .. } => TraitKind::Refactored,
        }
    }

    pub fn is_constraint(&self) -> bool {
        self.kind().is_constraint()
    }
}
