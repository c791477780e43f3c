//! Trait definitions for opdrift-core
//!
//! The engine itself never runs the deployer. Regenerating a deployment
//! artifact from a merged intent and state is delegated to an implementation
//! of [`ArtifactGenerator`], which the caller supplies.

use crate::error::GeneratorError;
use crate::tree::Tree;

/// Trait for regenerating a deployment artifact from an intent and a state
///
/// Typical implementations write both trees to a scratch directory, invoke
/// the op-deployer binary matching the record's schema version and parse the
/// artifact it produces.
///
/// # Examples
///
/// ```rust
/// use opdrift_core::{ArtifactGenerator, GeneratorError, Tree};
///
/// /// Echoes the state back as the artifact
/// struct Echo;
///
/// impl ArtifactGenerator for Echo {
///     fn generate(&self, _intent: &Tree, state: &Tree) -> Result<Tree, GeneratorError> {
///         Ok(state.clone())
///     }
/// }
/// ```
pub trait ArtifactGenerator {
    /// Produce the artifact for a merged deployment configuration
    ///
    /// # Arguments
    ///
    /// * `intent` - The merged intent
    /// * `state` - The merged state
    ///
    /// # Returns
    ///
    /// * `Ok(Tree)` - The regenerated artifact
    /// * `Err(GeneratorError)` - Generation failed with error details
    fn generate(&self, intent: &Tree, state: &Tree) -> Result<Tree, GeneratorError>;
}

impl<G: ArtifactGenerator + ?Sized> ArtifactGenerator for &G {
    fn generate(&self, intent: &Tree, state: &Tree) -> Result<Tree, GeneratorError> {
        (**self).generate(intent, state)
    }
}

impl<G: ArtifactGenerator + ?Sized> ArtifactGenerator for Box<G> {
    fn generate(&self, intent: &Tree, state: &Tree) -> Result<Tree, GeneratorError> {
        (**self).generate(intent, state)
    }
}
