//! Error types for code generation.

use thiserror::Error;

/// Error type for code generation operations.
///
/// Every variant except `Parse`, `Schema`, `Io` and `InvalidConfig` is a
/// contract violation between the schema provider and the resolution
/// engine; none of them is recovered from.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Schema parsing error.
    #[error("schema parse error: {0}")]
    Parse(#[from] ironts_schema::ParseError),

    /// Schema validation error.
    #[error("schema error: {0}")]
    Schema(#[from] ironts_schema::SchemaError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A node of a kind the engine does not handle reached the dispatcher.
    #[error("could not resolve node of kind '{kind}'")]
    UnsupportedKind {
        /// Provider-side kind name.
        kind: String,
    },

    /// A resolver was handed a node of the wrong kind.
    #[error("resolver for {expected} was given a {found} node ({node})")]
    KindMismatch {
        /// Kind the resolver handles.
        expected: String,
        /// Kind of the node it received.
        found: String,
        /// Node id, for diagnostics.
        node: String,
    },

    /// An indexed model is not named `Array`/`Record` or lacks an indexer.
    #[error("malformed indexed model '{name}': {reason}")]
    MalformedIndexedModel {
        /// Model name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An enum member reference names a member its enum does not have.
    #[error("enum '{enum_name}' has no member '{member}'")]
    UnknownEnumMember {
        /// Enum name.
        enum_name: String,
        /// Member name.
        member: String,
    },

    /// A node without a registered identity references itself.
    #[error("cycle through unregistered node '{name}' cannot be referenced by name")]
    UnresolvableCycle {
        /// Name of the node, or its id when anonymous.
        name: String,
    },

    /// A node id does not belong to the schema.
    #[error("node {node} does not exist in the schema")]
    DanglingNode {
        /// Node id.
        node: String,
    },

    /// Invalid generator configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },
}

impl CodegenError {
    /// Creates a configuration error with the given message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true for errors that indicate a provider/engine contract
    /// violation rather than bad input.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedKind { .. }
                | Self::KindMismatch { .. }
                | Self::MalformedIndexedModel { .. }
                | Self::UnknownEnumMember { .. }
                | Self::UnresolvableCycle { .. }
                | Self::DanglingNode { .. }
        )
    }
}
