pub mod transaction;
pub mod address_registry;
pub mod token_catalog;
pub mod webhook;
pub mod report;

pub use transaction::{
    format_ether, parse_u256, DecodedCall, TokenTransferDetails, TokenTransferFromDetails, Transaction,
    TransferType,
};
pub use address_registry::{normalize_address, validate_address, AddressRegistry};
pub use token_catalog::{TokenCatalog, TokenCatalogEntry, UNKNOWN_TOKEN};
pub use webhook::{Direction, NotificationKind, WebhookNotification, WebhookRecord, ADDRESS_EVENT};
pub use report::{ChainMatch, MatchReason, Report, WebhookReport};
