//! Entity model for the ember chain-sync core.
//!
//! Blocks and transactions are opaque to the consumer except for the header
//! fields defined here and the notifications their plugins publish.

pub mod block;
pub mod error;
pub mod notifications;
pub mod plugin;
pub mod publisher;
pub mod resolvable;
pub mod transaction;

pub use block::{Block, BlockElement, BLOCK_VERSION};
pub use error::ModelError;
pub use notifications::{
    CapturingSubscriber, Notification, NotificationKind, NotificationSubscriber,
    ReplayProtectionMode, SourceChangeType,
};
pub use plugin::{TransactionAttributes, TransactionPlugin, TransactionRegistry};
pub use publisher::{NotificationPublisher, PublicationMode};
pub use resolvable::{
    Resolvable, ResolvableAddress, ResolvableMosaicId, UnresolvedAddress, UnresolvedMosaicId,
};
pub use transaction::{
    EntityType, Transaction, TransactionElement, TransactionInfo, TRANSACTION_HEADER_SIZE,
};
