//! Caller-assigned identifiers for shapes and actors.
//!
//! The registry maps engine handles (arena indices) to opaque [`Identifier`]s and back. It
//! never owns the engine objects: releasing an object releases its identifier and nothing
//! else.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{IdentifierKind, MarshalError};
use crate::types::Identifier;

/// What to do when a record or hit references an object without an identifier.
///
/// A missing identifier is a caller contract violation. `Reject` surfaces it as an error and
/// delivers nothing for the affected flush or query; `Drop` skips the offending record and
/// logs a warning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnresolvedPolicy {
    Reject,
    Drop,
}

impl Default for UnresolvedPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            UnresolvedPolicy::Reject
        } else {
            UnresolvedPolicy::Drop
        }
    }
}

/// Bidirectional handle <-> identifier map for one namespace (shapes or actors).
#[derive(Debug, Clone)]
pub struct IdentifierRegistry<H> {
    kind: IdentifierKind,
    by_handle: HashMap<H, Identifier>,
    by_id: HashMap<Identifier, H>,
}

impl<H: Copy + Eq + Hash + Debug> IdentifierRegistry<H> {
    pub fn new(kind: IdentifierKind) -> Self {
        Self {
            kind,
            by_handle: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// Associate `id` with `handle`.
    ///
    /// Re-assigning a handle replaces its previous identifier. Fails if `id` is held by a
    /// different live handle.
    pub fn assign(&mut self, handle: H, id: Identifier) -> Result<(), MarshalError> {
        if let Some(&holder) = self.by_id.get(&id) {
            if holder == handle {
                return Ok(());
            }
            return Err(MarshalError::DuplicateIdentifier {
                kind: self.kind,
                id,
            });
        }
        if let Some(previous) = self.by_handle.insert(handle, id) {
            self.by_id.remove(&previous);
        }
        self.by_id.insert(id, handle);
        Ok(())
    }

    /// Identifier of `handle`, or `UnresolvedIdentifier`.
    pub fn resolve(&self, handle: H) -> Result<Identifier, MarshalError> {
        self.get(handle)
            .ok_or_else(|| MarshalError::unresolved(self.kind, handle))
    }

    pub fn get(&self, handle: H) -> Option<Identifier> {
        self.by_handle.get(&handle).copied()
    }

    /// Handle currently holding `id`, or `UnknownIdentifier`.
    pub fn handle_of(&self, id: Identifier) -> Result<H, MarshalError> {
        self.by_id
            .get(&id)
            .copied()
            .ok_or(MarshalError::UnknownIdentifier {
                kind: self.kind,
                id,
            })
    }

    /// Forget `handle`, returning the identifier it held.
    pub fn release(&mut self, handle: H) -> Option<Identifier> {
        let id = self.by_handle.remove(&handle)?;
        self.by_id.remove(&id);
        Some(id)
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }
}

/// Read-only identifier resolution used by the aggregator and the query marshaler.
///
/// Implemented by the scene over its two registries so that the shared crate never needs to
/// know the engine's handle types.
pub trait IdentifierLookup {
    type Shape: Copy + Debug;
    type Actor: Copy + Debug;

    fn shape_identifier(&self, shape: Self::Shape) -> Option<Identifier>;
    fn actor_identifier(&self, actor: Self::Actor) -> Option<Identifier>;

    fn resolve_shape(&self, shape: Self::Shape) -> Result<Identifier, MarshalError> {
        self.shape_identifier(shape)
            .ok_or_else(|| MarshalError::unresolved(IdentifierKind::Shape, shape))
    }

    fn resolve_actor(&self, actor: Self::Actor) -> Result<Identifier, MarshalError> {
        self.actor_identifier(actor)
            .ok_or_else(|| MarshalError::unresolved(IdentifierKind::Actor, actor))
    }
}
