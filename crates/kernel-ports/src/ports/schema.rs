//! Token and schema capabilities.

use std::fmt;
use std::sync::Arc;

use crate::entities::TokenKind;
use crate::errors::PortError;

/// Renders token ids as names for messages.
pub trait TokenNameLookup: Send + Sync {
    fn label_name(&self, id: u32) -> String;

    fn relationship_type_name(&self, id: u32) -> String;

    fn property_key_name(&self, id: u32) -> String;
}

/// Name-to-id registry for one kind of token.
pub trait TokenHolder: Send + Sync {
    fn kind(&self) -> TokenKind;

    fn get_or_create_id(&self, name: &str) -> Result<u32, PortError>;

    fn name_of(&self, id: u32) -> Option<String>;

    fn size(&self) -> usize;
}

/// The three token holders the runtime needs.
#[derive(Clone)]
pub struct TokenHolders {
    labels: Arc<dyn TokenHolder>,
    relationship_types: Arc<dyn TokenHolder>,
    property_keys: Arc<dyn TokenHolder>,
}

impl TokenHolders {
    pub fn new(
        property_keys: Arc<dyn TokenHolder>,
        labels: Arc<dyn TokenHolder>,
        relationship_types: Arc<dyn TokenHolder>,
    ) -> Self {
        Self {
            labels,
            relationship_types,
            property_keys,
        }
    }

    pub fn property_keys(&self) -> &Arc<dyn TokenHolder> {
        &self.property_keys
    }

    pub fn labels(&self) -> &Arc<dyn TokenHolder> {
        &self.labels
    }

    pub fn relationship_types(&self) -> &Arc<dyn TokenHolder> {
        &self.relationship_types
    }
}

/// Rejects schema modification where the runtime forbids it.
pub trait SchemaWriteGuard: Send + Sync {
    fn assert_schema_writes_allowed(&self, database: &str) -> Result<(), PortError>;
}

/// Which constraint kinds the edition supports.
pub trait ConstraintSemantics: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports_existence_constraints(&self) -> bool;

    fn supports_node_key_constraints(&self) -> bool;
}

/// Identity of an index provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexProviderDescriptor {
    key: String,
    version: String,
}

impl IndexProviderDescriptor {
    pub fn new(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: version.into(),
        }
    }

    /// `key-version`, the form used in settings.
    pub fn name(&self) -> String {
        format!("{}-{}", self.key, self.version)
    }
}

impl fmt::Display for IndexProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Schema index implementation.
pub trait IndexProvider: Send + Sync {
    fn descriptor(&self) -> IndexProviderDescriptor;
}
