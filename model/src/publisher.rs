//! Notification publisher.
//!
//! Walks a block or transaction and emits its notifications to a subscriber
//! in a fixed, deterministic order.

use crate::block::{BlockElement, BLOCK_VERSION};
use crate::error::ModelError;
use crate::notifications::{
    Notification, NotificationSubscriber, ReplayProtectionMode, SourceChangeType,
};
use crate::plugin::TransactionRegistry;
use crate::transaction::Transaction;
use ember_types::{Amount, Hash256, MosaicId};

/// Which notification groups a publish call emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublicationMode {
    /// Basic and type-specific notifications.
    All,
    /// Only the entity-independent notifications.
    Basic,
    /// Only the transaction-plugin notifications.
    Custom,
}

impl PublicationMode {
    fn includes_basic(self) -> bool {
        !matches!(self, Self::Custom)
    }

    fn includes_custom(self) -> bool {
        !matches!(self, Self::Basic)
    }
}

/// The effective fee of `transaction` in a block with `fee_multiplier`, or
/// its max fee when published standalone.
fn calculate_fee(transaction: &Transaction, fee_multiplier: Option<u32>) -> Amount {
    match fee_multiplier {
        None => transaction.max_fee,
        Some(multiplier) => {
            let calculated = Amount::new(u64::from(multiplier) * u64::from(transaction.size()));
            calculated.min(transaction.max_fee)
        }
    }
}

/// Emits the typed notification stream of an entity.
pub struct NotificationPublisher<'a> {
    registry: &'a TransactionRegistry,
    currency_mosaic_id: MosaicId,
    mode: PublicationMode,
}

impl<'a> NotificationPublisher<'a> {
    pub fn new(
        registry: &'a TransactionRegistry,
        currency_mosaic_id: MosaicId,
        mode: PublicationMode,
    ) -> Self {
        Self {
            registry,
            currency_mosaic_id,
            mode,
        }
    }

    /// Publish a block's notifications.
    ///
    /// Order: SourceChange, harvester key, beneficiary key (suppressed when
    /// equal to the harvester), Entity, Block, Signature. Blocks have no
    /// type-specific notifications, so mode `Custom` emits nothing.
    pub fn publish_block(
        &self,
        element: &BlockElement,
        subscriber: &mut dyn NotificationSubscriber,
    ) -> Result<(), ModelError> {
        if !self.mode.includes_basic() {
            return Ok(());
        }

        let block = &element.block;

        subscriber.notify(Notification::SourceChange {
            primary_id: 0,
            secondary_id: 0,
            primary_change: SourceChangeType::Absolute,
            secondary_change: SourceChangeType::Absolute,
        });

        subscriber.notify(Notification::AccountPublicKey {
            public_key: block.signer_public_key,
        });
        if block.beneficiary_public_key != block.signer_public_key {
            subscriber.notify(Notification::AccountPublicKey {
                public_key: block.beneficiary_public_key,
            });
        }

        subscriber.notify(Notification::Entity {
            network: block.network,
            entity_version: block.version,
            min_version: BLOCK_VERSION,
            max_version: BLOCK_VERSION,
        });

        let total_fee = block
            .transactions
            .iter()
            .map(|transaction| calculate_fee(transaction, Some(block.fee_multiplier)))
            .fold(Amount::ZERO, |acc, fee| acc + fee);

        subscriber.notify(Notification::Block {
            harvester: block.signer_public_key,
            beneficiary: block.beneficiary_public_key,
            timestamp: block.timestamp,
            difficulty: block.difficulty,
            fee_multiplier: block.fee_multiplier,
            total_fee,
            num_transactions: block.transactions.len() as u32,
        });

        subscriber.notify(Notification::Signature {
            signer_public_key: block.signer_public_key,
            signature: block.signature,
            data: block.signed_data(),
            replay_protection: ReplayProtectionMode::Disabled,
        });

        Ok(())
    }

    /// Publish a transaction's notifications.
    ///
    /// `fee_multiplier` is the containing block's multiplier, absent when
    /// the transaction is published standalone.
    pub fn publish_transaction(
        &self,
        transaction: &Transaction,
        transaction_hash: &Hash256,
        fee_multiplier: Option<u32>,
        subscriber: &mut dyn NotificationSubscriber,
    ) -> Result<(), ModelError> {
        // resolve the plugin up front so an unknown type fails in every mode
        let plugin = self.registry.require(transaction.entity_type)?;
        if !plugin.supports_top_level() {
            return Err(ModelError::UnsupportedTopLevel(transaction.entity_type));
        }

        if self.mode.includes_basic() {
            subscriber.notify(Notification::SourceChange {
                primary_id: 1,
                secondary_id: 0,
                primary_change: SourceChangeType::Relative,
                secondary_change: SourceChangeType::Absolute,
            });

            subscriber.notify(Notification::AccountPublicKey {
                public_key: transaction.signer_public_key,
            });

            let attributes = plugin.attributes();
            subscriber.notify(Notification::Entity {
                network: transaction.network,
                entity_version: transaction.version,
                min_version: attributes.min_version,
                max_version: attributes.max_version,
            });

            subscriber.notify(Notification::Transaction {
                sender: transaction.signer_public_key,
                transaction_hash: *transaction_hash,
                transaction_type: transaction.entity_type,
                deadline: transaction.deadline,
            });

            subscriber.notify(Notification::TransactionDeadline {
                deadline: transaction.deadline,
                max_lifetime_millis: attributes.max_lifetime_millis,
            });

            let fee = calculate_fee(transaction, fee_multiplier);
            subscriber.notify(Notification::TransactionFee {
                sender: transaction.signer_public_key,
                transaction_size: transaction.size(),
                fee,
                max_fee: transaction.max_fee,
            });

            subscriber.notify(Notification::BalanceDebit {
                sender: transaction.signer_public_key,
                mosaic_id: self.currency_mosaic_id,
                amount: fee,
            });

            subscriber.notify(Notification::Signature {
                signer_public_key: transaction.signer_public_key,
                signature: transaction.signature,
                data: plugin.data_buffer(transaction).to_vec(),
                replay_protection: ReplayProtectionMode::Enabled,
            });
        }

        if self.mode.includes_custom() {
            plugin.publish(transaction, transaction_hash, subscriber);
        }

        Ok(())
    }
}
