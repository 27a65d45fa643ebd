//! Scene instantiation errors

use crate::assets::DataError;
use thiserror::Error;

/// Errors and reportable conditions raised by the instantiation engine
///
/// During a full-scene build, `DataResolutionFailed` and
/// `UnsupportedNodeType` abort only the node that raised them; the traversal
/// records the condition on the scene and continues with siblings.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A node carried a type tag outside the supported set
    #[error("unsupported node type for '{name}'")]
    UnsupportedNodeType {
        /// Name of the offending node
        name: String,
    },

    /// The data resolver failed to produce asset data for a reference
    #[error("data resolution failed for '{reference}'")]
    DataResolutionFailed {
        /// The reference that failed to resolve
        reference: String,
        /// Underlying resolver error
        #[source]
        source: DataError,
    },

    /// No node with the requested name exists in the loaded descriptor
    #[error("no node named '{name}' in the scene descriptor")]
    NodeNotFound {
        /// The requested node name
        name: String,
    },

    /// The node needs a capability that is disabled in this configuration
    #[error("'{name}' requires the {capability} capability")]
    CapabilityDisabled {
        /// Name of the skipped node
        name: String,
        /// The capability that would enable it
        capability: &'static str,
    },
}
