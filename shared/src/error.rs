use std::fmt;

use thiserror::Error;

use crate::types::Identifier;

/// Which identifier namespace an operation touched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Shape,
    Actor,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Shape => f.write_str("shape"),
            IdentifierKind::Actor => f.write_str("actor"),
        }
    }
}

/// Failures raised while resolving or registering identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// A live engine object reached the boundary without an assigned identifier.
    #[error("no {kind} identifier assigned for {handle}")]
    UnresolvedIdentifier { kind: IdentifierKind, handle: String },

    #[error("{kind} identifier {id} is already assigned to another object")]
    DuplicateIdentifier { kind: IdentifierKind, id: Identifier },

    #[error("unknown {kind} identifier {id}")]
    UnknownIdentifier { kind: IdentifierKind, id: Identifier },
}

impl MarshalError {
    pub fn unresolved(kind: IdentifierKind, handle: impl fmt::Debug) -> Self {
        Self::UnresolvedIdentifier {
            kind,
            handle: format!("{handle:?}"),
        }
    }
}
