//! Generator configuration.

use std::collections::{BTreeMap, HashMap};

use ironts_schema::{HttpVerb, Lifecycle, LifecycleSet};

use crate::error::CodegenError;

/// Options controlling what is generated and how.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Render date/time and byte scalars in their transport encoding
    /// (`string`/`number`) instead of `Date`/`Uint8Array`.
    pub serializable_date_types: bool,
    /// Give every enum member its own name as a string value.
    pub string_nominal_enums: bool,
    /// Emit documentation comments.
    pub emit_docs: bool,
    /// Emit type declarations.
    pub enable_types: bool,
    /// Emit `is<Name>` predicate functions.
    pub enable_typeguards: bool,
    /// Emit one routed typemap file per root namespace.
    pub enable_routed_typemap: bool,
    /// Append `.js` to relative import paths.
    pub import_file_extensions: bool,
    /// Scalar name -> emitted type text.
    pub type_mappings: HashMap<String, String>,
    /// Scalar name -> predicate template; `{}` is replaced by the accessor.
    pub typeguard_mappings: HashMap<String, String>,
    /// Lifecycle states applied to request and response bodies.
    pub lifecycle_mapping: LifecycleMapping,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            serializable_date_types: false,
            string_nominal_enums: false,
            emit_docs: true,
            enable_types: true,
            enable_typeguards: false,
            enable_routed_typemap: false,
            import_file_extensions: false,
            type_mappings: HashMap::new(),
            typeguard_mappings: HashMap::new(),
            lifecycle_mapping: LifecycleMapping::default(),
        }
    }
}

impl GeneratorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `serializable_date_types`.
    #[must_use]
    pub fn with_serializable_date_types(mut self, enabled: bool) -> Self {
        self.serializable_date_types = enabled;
        self
    }

    /// Sets `string_nominal_enums`.
    #[must_use]
    pub fn with_string_nominal_enums(mut self, enabled: bool) -> Self {
        self.string_nominal_enums = enabled;
        self
    }

    /// Sets `emit_docs`.
    #[must_use]
    pub fn with_docs(mut self, enabled: bool) -> Self {
        self.emit_docs = enabled;
        self
    }

    /// Sets `enable_types`.
    #[must_use]
    pub fn with_types(mut self, enabled: bool) -> Self {
        self.enable_types = enabled;
        self
    }

    /// Sets `enable_typeguards`.
    #[must_use]
    pub fn with_typeguards(mut self, enabled: bool) -> Self {
        self.enable_typeguards = enabled;
        self
    }

    /// Sets `enable_routed_typemap`.
    #[must_use]
    pub fn with_routed_typemap(mut self, enabled: bool) -> Self {
        self.enable_routed_typemap = enabled;
        self
    }

    /// Sets `import_file_extensions`.
    #[must_use]
    pub fn with_import_file_extensions(mut self, enabled: bool) -> Self {
        self.import_file_extensions = enabled;
        self
    }

    /// Overrides the type text emitted for a scalar.
    #[must_use]
    pub fn with_type_mapping(mut self, scalar: impl Into<String>, ts: impl Into<String>) -> Self {
        self.type_mappings.insert(scalar.into(), ts.into());
        self
    }

    /// Overrides the predicate emitted for a scalar.
    #[must_use]
    pub fn with_typeguard_mapping(
        mut self,
        scalar: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.typeguard_mappings
            .insert(scalar.into(), template.into());
        self
    }

    /// Replaces the lifecycle mapping.
    #[must_use]
    pub fn with_lifecycle_mapping(mut self, mapping: LifecycleMapping) -> Self {
        self.lifecycle_mapping = mapping;
        self
    }

    /// Checks option dependencies.
    ///
    /// # Errors
    /// Returns `CodegenError::InvalidConfig` if typeguards or the routed
    /// typemap are enabled while types are disabled.
    pub fn validate(&self) -> Result<(), CodegenError> {
        if self.enable_typeguards && !self.enable_types {
            return Err(CodegenError::config(
                "enable_typeguards requires enable_types",
            ));
        }
        if self.enable_routed_typemap && !self.enable_types {
            return Err(CodegenError::config(
                "enable_routed_typemap requires enable_types",
            ));
        }
        Ok(())
    }
}

/// HTTP verb -> lifecycle states table used by the routed typemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleMapping {
    /// States applied to every response body.
    pub response: LifecycleSet,
    /// States applied to request bodies, per verb.
    pub request: BTreeMap<HttpVerb, LifecycleSet>,
}

impl Default for LifecycleMapping {
    fn default() -> Self {
        let set = |states: &[Lifecycle]| states.iter().copied().collect::<LifecycleSet>();
        let request = BTreeMap::from([
            (HttpVerb::Post, set(&[Lifecycle::Create])),
            (HttpVerb::Put, set(&[Lifecycle::Create, Lifecycle::Update])),
            (HttpVerb::Patch, set(&[Lifecycle::Update])),
            (HttpVerb::Delete, set(&[Lifecycle::Delete])),
            (HttpVerb::Get, set(&[Lifecycle::Query])),
            (HttpVerb::Head, set(&[Lifecycle::Query])),
        ]);
        Self {
            response: set(&[Lifecycle::Read]),
            request,
        }
    }
}

impl LifecycleMapping {
    /// States for a request sent with the given verb.
    #[must_use]
    pub fn request_states(&self, verb: HttpVerb) -> Option<&LifecycleSet> {
        self.request.get(&verb)
    }

    /// Sets the states for one verb.
    #[must_use]
    pub fn with_request(
        mut self,
        verb: HttpVerb,
        states: impl IntoIterator<Item = Lifecycle>,
    ) -> Self {
        self.request.insert(verb, states.into_iter().collect());
        self
    }

    /// Removes the entry for one verb.
    #[must_use]
    pub fn without_request(mut self, verb: HttpVerb) -> Self {
        self.request.remove(&verb);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GeneratorConfig::default();
        assert!(config.enable_types);
        assert!(config.emit_docs);
        assert!(!config.enable_typeguards);
        assert!(!config.serializable_date_types);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_dependencies() {
        let config = GeneratorConfig::new().with_types(false).with_typeguards(true);
        assert!(matches!(
            config.validate(),
            Err(CodegenError::InvalidConfig { .. })
        ));

        let config = GeneratorConfig::new()
            .with_types(false)
            .with_routed_typemap(true);
        assert!(config.validate().is_err());

        let config = GeneratorConfig::new().with_typeguards(true).with_routed_typemap(true);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_lifecycle_mapping() {
        let mapping = LifecycleMapping::default();
        assert_eq!(
            mapping.response.iter().copied().collect::<Vec<_>>(),
            vec![Lifecycle::Read]
        );
        let put = mapping.request_states(HttpVerb::Put).expect("PUT mapped");
        assert!(put.contains(&Lifecycle::Create) && put.contains(&Lifecycle::Update));
        assert_eq!(mapping.request_states(HttpVerb::Head).map(|s| s.len()), Some(1));

        let custom = mapping
            .without_request(HttpVerb::Patch)
            .with_request(HttpVerb::Get, [Lifecycle::Read]);
        assert!(custom.request_states(HttpVerb::Patch).is_none());
        assert!(custom.request_states(HttpVerb::Get).expect("GET").contains(&Lifecycle::Read));
    }
}
