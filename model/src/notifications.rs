//! Typed notifications emitted while walking an entity.
//!
//! A publisher walks a block or transaction and emits these records to a
//! subscriber in a fixed order; validators and observers consume them
//! without ever touching the raw entity.

use crate::transaction::EntityType;
use ember_types::{
    Amount, Difficulty, Hash256, MosaicId, NetworkId, PublicKey, Signature, Timestamp,
};

/// How a source-change notification adjusts the current source identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceChangeType {
    Absolute,
    Relative,
}

/// Whether the signed data must be prefixed for replay protection when
/// verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayProtectionMode {
    Enabled,
    Disabled,
}

/// A tagged notification record.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// The observation source moved to a new (primary, secondary) position.
    SourceChange {
        primary_id: u32,
        secondary_id: u32,
        primary_change: SourceChangeType,
        secondary_change: SourceChangeType,
    },
    /// An account was mentioned by public key.
    AccountPublicKey { public_key: PublicKey },
    /// An account was mentioned by address.
    AccountAddress { address: ember_types::Address },
    /// Header data common to every entity.
    Entity {
        network: NetworkId,
        entity_version: u8,
        min_version: u8,
        max_version: u8,
    },
    /// A block was observed.
    Block {
        harvester: PublicKey,
        beneficiary: PublicKey,
        timestamp: Timestamp,
        difficulty: Difficulty,
        fee_multiplier: u32,
        total_fee: Amount,
        num_transactions: u32,
    },
    /// A signature over a data range must be verified.
    Signature {
        signer_public_key: PublicKey,
        signature: Signature,
        data: Vec<u8>,
        replay_protection: ReplayProtectionMode,
    },
    /// A transaction was observed.
    Transaction {
        sender: PublicKey,
        transaction_hash: Hash256,
        transaction_type: EntityType,
        deadline: Timestamp,
    },
    /// A transaction deadline must be validated against its lifetime bound.
    TransactionDeadline {
        deadline: Timestamp,
        max_lifetime_millis: Option<u64>,
    },
    /// The effective fee of a transaction was determined.
    TransactionFee {
        sender: PublicKey,
        transaction_size: u32,
        fee: Amount,
        max_fee: Amount,
    },
    /// An account balance must be debited.
    BalanceDebit {
        sender: PublicKey,
        mosaic_id: MosaicId,
        amount: Amount,
    },
    /// A type-specific notification raised by a transaction plugin.
    Custom { entity_type: EntityType, tag: u16 },
}

/// Discriminant of a [`Notification`], used for ordering assertions and
/// subscriber filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    SourceChange,
    AccountPublicKey,
    AccountAddress,
    Entity,
    Block,
    Signature,
    Transaction,
    TransactionDeadline,
    TransactionFee,
    BalanceDebit,
    Custom,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::SourceChange { .. } => NotificationKind::SourceChange,
            Self::AccountPublicKey { .. } => NotificationKind::AccountPublicKey,
            Self::AccountAddress { .. } => NotificationKind::AccountAddress,
            Self::Entity { .. } => NotificationKind::Entity,
            Self::Block { .. } => NotificationKind::Block,
            Self::Signature { .. } => NotificationKind::Signature,
            Self::Transaction { .. } => NotificationKind::Transaction,
            Self::TransactionDeadline { .. } => NotificationKind::TransactionDeadline,
            Self::TransactionFee { .. } => NotificationKind::TransactionFee,
            Self::BalanceDebit { .. } => NotificationKind::BalanceDebit,
            Self::Custom { .. } => NotificationKind::Custom,
        }
    }
}

/// The sink a publisher emits to. One subscriber per publish call.
pub trait NotificationSubscriber {
    fn notify(&mut self, notification: Notification);
}

/// A subscriber that records everything it sees, for tests and diagnostics.
#[derive(Default)]
pub struct CapturingSubscriber {
    pub notifications: Vec<Notification>,
}

impl CapturingSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.notifications.iter().map(Notification::kind).collect()
    }

    /// Public keys mentioned by account notifications, in emission order.
    pub fn mentioned_keys(&self) -> Vec<PublicKey> {
        self.notifications
            .iter()
            .filter_map(|notification| match notification {
                Notification::AccountPublicKey { public_key } => Some(*public_key),
                _ => None,
            })
            .collect()
    }
}

impl NotificationSubscriber for CapturingSubscriber {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}
