//! HTTP operation definitions.

use std::fmt;

use crate::types::NodeId;

/// HTTP verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpVerb {
    /// GET.
    Get,
    /// HEAD.
    Head,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
}

impl HttpVerb {
    /// Parses a verb case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Upper-case verb name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One routed operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDef {
    /// Operation name.
    pub name: String,
    /// Namespace path the operation is declared in.
    pub namespace: Vec<String>,
    /// Route path.
    pub path: String,
    /// HTTP verb.
    pub verb: HttpVerb,
    /// Request body type.
    pub request: Option<NodeId>,
    /// Possible responses in declaration order.
    pub responses: Vec<ResponseDef>,
    /// Documentation comment.
    pub doc: Option<String>,
}

impl OperationDef {
    /// Creates an operation with no request body and no responses.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: Vec<String>,
        path: impl Into<String>,
        verb: HttpVerb,
    ) -> Self {
        Self {
            name: name.into(),
            namespace,
            path: path.into(),
            verb,
            request: None,
            responses: Vec::new(),
            doc: None,
        }
    }

    /// Returns the outermost namespace the operation lives under.
    #[must_use]
    pub fn root_namespace(&self) -> Option<&str> {
        self.namespace.first().map(String::as_str)
    }
}

/// One response of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDef {
    /// Status code, when known.
    pub status: Option<u16>,
    /// Response body type; `None` for an empty body.
    pub body: Option<NodeId>,
}
