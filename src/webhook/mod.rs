pub mod ingestor;

pub use ingestor::{sample_notification, IngestOutcome, WebhookIngestor};
