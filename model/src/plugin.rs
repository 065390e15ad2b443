//! Transaction plugin registry.
//!
//! Each transaction kind registers one plugin describing its wire attributes
//! and publishing its type-specific notifications. The registry is the
//! dispatch table the publisher consults per entity type.

use crate::error::ModelError;
use crate::notifications::NotificationSubscriber;
use crate::transaction::{EntityType, Transaction, TRANSACTION_HEADER_SIZE};
use ember_types::{Hash256, PublicKey};
use std::collections::HashMap;

/// Version window and deadline bound of a transaction kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionAttributes {
    pub min_version: u8,
    pub max_version: u8,
    /// Maximum allowed distance between a transaction's deadline and the
    /// current network time; `None` leaves the bound to the default rule.
    pub max_lifetime_millis: Option<u64>,
}

impl TransactionAttributes {
    pub fn new(min_version: u8, max_version: u8) -> Self {
        Self {
            min_version,
            max_version,
            max_lifetime_millis: None,
        }
    }

    pub fn with_max_lifetime(mut self, millis: u64) -> Self {
        self.max_lifetime_millis = Some(millis);
        self
    }
}

/// Capability surface of one transaction kind.
pub trait TransactionPlugin {
    /// The entity type this plugin handles.
    fn entity_type(&self) -> EntityType;

    /// Version window and lifetime bound.
    fn attributes(&self) -> TransactionAttributes;

    /// The true wire size of `transaction`, including type-specific data.
    fn calculate_real_size(&self, transaction: &Transaction) -> u64 {
        u64::from(TRANSACTION_HEADER_SIZE) + transaction.payload.len() as u64
    }

    /// Publish the type-specific notifications of `transaction`.
    fn publish(
        &self,
        transaction: &Transaction,
        transaction_hash: &Hash256,
        subscriber: &mut dyn NotificationSubscriber,
    );

    /// Cosigners required beyond the signer.
    fn additional_required_cosigners(&self, _transaction: &Transaction) -> Vec<PublicKey> {
        Vec::new()
    }

    /// The byte range covered by the transaction signature.
    fn data_buffer<'a>(&self, transaction: &'a Transaction) -> &'a [u8] {
        &transaction.payload
    }

    /// Whether the transaction may appear directly in a block.
    fn supports_top_level(&self) -> bool {
        true
    }

    /// Whether the transaction may be embedded in an aggregate.
    fn supports_embedding(&self) -> bool {
        false
    }
}

/// Entity-type → plugin dispatch table.
#[derive(Default)]
pub struct TransactionRegistry {
    plugins: HashMap<EntityType, Box<dyn TransactionPlugin>>,
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing any existing plugin for its type.
    pub fn register(&mut self, plugin: Box<dyn TransactionPlugin>) {
        self.plugins.insert(plugin.entity_type(), plugin);
    }

    pub fn find(&self, entity_type: EntityType) -> Option<&dyn TransactionPlugin> {
        self.plugins.get(&entity_type).map(Box::as_ref)
    }

    /// Look up the plugin for `entity_type`, failing when none is registered.
    pub fn require(&self, entity_type: EntityType) -> Result<&dyn TransactionPlugin, ModelError> {
        self.find(entity_type)
            .ok_or(ModelError::UnknownEntityType(entity_type))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
