//! Transformation registry
//!
//! An explicitly constructed, passed-in store of registered
//! transformations. There is deliberately no ambient module-level
//! registry; every consumer receives a `TransformationRegistry` (or a
//! reference to one) from its caller.

use crate::transformation::Transformation;
use crate::types::TransformationId;
use std::collections::HashMap;
use std::sync::Arc;

/// Errors raised by registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A transformation with this id is already registered
    #[error("duplicate transformation id: {0}")]
    DuplicateTransformation(TransformationId),
}

/// Store of registered transformations, keyed by id
#[derive(Default, Clone)]
pub struct TransformationRegistry {
    entries: HashMap<TransformationId, Arc<dyn Transformation>>,
}

impl TransformationRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformation under its spec id
    ///
    /// # Errors
    /// `RegistryError::DuplicateTransformation` if the id is taken;
    /// registered transformations are immutable and never replaced.
    pub fn register(
        &mut self,
        transformation: Arc<dyn Transformation>,
    ) -> Result<(), RegistryError> {
        let id = transformation.spec().id.clone();
        if self.entries.contains_key(&id) {
            return Err(RegistryError::DuplicateTransformation(id));
        }
        self.entries.insert(id, transformation);
        Ok(())
    }

    /// Look up a transformation by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &TransformationId) -> Option<Arc<dyn Transformation>> {
        self.entries.get(id).cloned()
    }

    /// Check whether an id is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &TransformationId) -> bool {
        self.entries.contains_key(id)
    }

    /// All registered ids (unordered)
    #[must_use]
    pub fn ids(&self) -> Vec<TransformationId> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered transformations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for TransformationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformationRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}
