//! Token and schema stand-ins.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::entities::TokenKind;
use crate::errors::PortError;
use crate::ports::{
    ConstraintSemantics, IndexProvider, IndexProviderDescriptor, SchemaWriteGuard, TokenHolder,
    TokenHolders, TokenNameLookup,
};

/// Renders ids as `label[3]`, `relationshipType[1]`, `propertyKey[0]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormattingTokenNameLookup;

impl TokenNameLookup for FormattingTokenNameLookup {
    fn label_name(&self, id: u32) -> String {
        format!("label[{id}]")
    }

    fn relationship_type_name(&self, id: u32) -> String {
        format!("relationshipType[{id}]")
    }

    fn property_key_name(&self, id: u32) -> String {
        format!("propertyKey[{id}]")
    }
}

/// Token holder assigning ids in creation order.
#[derive(Debug)]
pub struct InMemoryTokenHolder {
    kind: TokenKind,
    names: RwLock<Vec<String>>,
}

impl InMemoryTokenHolder {
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            names: RwLock::new(Vec::new()),
        }
    }
}

impl TokenHolder for InMemoryTokenHolder {
    fn kind(&self) -> TokenKind {
        self.kind
    }

    fn get_or_create_id(&self, name: &str) -> Result<u32, PortError> {
        if name.is_empty() {
            return Err(PortError::EmptyTokenName);
        }

        let mut names = self.names.write();
        let id = match names.iter().position(|n| n == name) {
            Some(existing) => existing,
            None => {
                names.push(name.to_string());
                names.len() - 1
            }
        };
        u32::try_from(id).map_err(|_| PortError::InvalidSetting {
            setting: "token id".to_string(),
            value: id.to_string(),
        })
    }

    fn name_of(&self, id: u32) -> Option<String> {
        self.names.read().get(id as usize).cloned()
    }

    fn size(&self) -> usize {
        self.names.read().len()
    }
}

/// Fresh in-memory holders for property keys, labels and relationship types.
pub fn stand_in_token_holders() -> TokenHolders {
    TokenHolders::new(
        Arc::new(InMemoryTokenHolder::new(TokenKind::PropertyKey)),
        Arc::new(InMemoryTokenHolder::new(TokenKind::Label)),
        Arc::new(InMemoryTokenHolder::new(TokenKind::RelationshipType)),
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllSchemaWriteGuard;

impl SchemaWriteGuard for AllowAllSchemaWriteGuard {
    fn assert_schema_writes_allowed(&self, _database: &str) -> Result<(), PortError> {
        Ok(())
    }
}

/// Community semantics: uniqueness constraints only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardConstraintSemantics;

impl ConstraintSemantics for StandardConstraintSemantics {
    fn name(&self) -> &'static str {
        "standardConstraints"
    }

    fn supports_existence_constraints(&self) -> bool {
        false
    }

    fn supports_node_key_constraints(&self) -> bool {
        false
    }
}

/// Index provider that indexes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyIndexProvider;

impl EmptyIndexProvider {
    pub const KEY: &'static str = "no-index-provider";
    pub const VERSION: &'static str = "1.0";
}

impl IndexProvider for EmptyIndexProvider {
    fn descriptor(&self) -> IndexProviderDescriptor {
        IndexProviderDescriptor::new(Self::KEY, Self::VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_holder_reuses_existing_ids() {
        let holder = InMemoryTokenHolder::new(TokenKind::Label);

        let person = holder.get_or_create_id("Person").unwrap();
        let movie = holder.get_or_create_id("Movie").unwrap();

        assert_eq!(holder.get_or_create_id("Person").unwrap(), person);
        assert_ne!(person, movie);
        assert_eq!(holder.name_of(movie).as_deref(), Some("Movie"));
        assert_eq!(holder.size(), 2);
    }

    #[test]
    fn test_token_holder_rejects_empty_name() {
        let holder = InMemoryTokenHolder::new(TokenKind::PropertyKey);

        assert_eq!(holder.get_or_create_id(""), Err(PortError::EmptyTokenName));
    }

    #[test]
    fn test_stand_in_holders_have_matching_kinds() {
        let holders = stand_in_token_holders();

        assert_eq!(holders.labels().kind(), TokenKind::Label);
        assert_eq!(holders.property_keys().kind(), TokenKind::PropertyKey);
        assert_eq!(holders.relationship_types().kind(), TokenKind::RelationshipType);
    }

    #[test]
    fn test_empty_index_provider_name() {
        assert_eq!(EmptyIndexProvider.descriptor().name(), "no-index-provider-1.0");
    }

    #[test]
    fn test_lookup_formats_ids() {
        assert_eq!(FormattingTokenNameLookup.label_name(3), "label[3]");
    }
}
