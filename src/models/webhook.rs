use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only subscription type the ingestor recognizes
pub const ADDRESS_EVENT: &str = "ADDRESS_EVENT";

/// Whether the notified movement was the native coin or a token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Native,
    Token,
}

impl NotificationKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "native" => Some(NotificationKind::Native),
            "token" => Some(NotificationKind::Token),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationKind::Native => "NATIVE",
            NotificationKind::Token => "TOKEN",
        }
    }
}

/// An address-event notification pushed by the monitoring service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotification {
    pub address: String,
    /// Decimal string in whole units, e.g. "0.001"
    pub amount: String,
    pub asset: String,
    pub block_number: Option<u64>,
    pub counter_address: Option<String>,
    pub tx_id: String,
    #[serde(rename = "type")]
    pub kind: Option<NotificationKind>,
    #[serde(default)]
    pub chain: String,
    pub subscription_type: String,
}

impl WebhookNotification {
    /// Extract a notification from an untrusted payload.
    ///
    /// Returns None unless `subscriptionType` is "ADDRESS_EVENT" and `address`,
    /// `amount`, `asset` and `txId` are all strings. Other fields are optional
    /// and read leniently.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let text = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);

        let subscription_type = text("subscriptionType")?;
        if subscription_type != ADDRESS_EVENT {
            return None;
        }

        Some(Self {
            address: text("address")?,
            amount: text("amount")?,
            asset: text("asset")?,
            tx_id: text("txId")?,
            block_number: payload.get("blockNumber").and_then(parse_block_number),
            counter_address: text("counterAddress"),
            kind: text("type").as_deref().and_then(NotificationKind::parse),
            chain: text("chain").unwrap_or_default(),
            subscription_type,
        })
    }
}

fn parse_block_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    }
}

/// Direction of a notified movement relative to the watched address
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    /// Positive amounts are incoming. Only the leading number counts, so
    /// `"1 ETH"` is incoming; an amount with no leading number is outgoing.
    pub fn from_amount(amount: &str) -> Self {
        match leading_number(amount) {
            Some(value) if value > 0.0 => Direction::Incoming,
            _ => Direction::Outgoing,
        }
    }
}

/// Read the longest decimal literal at the start of `text`, ignoring the rest
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| bytes[start..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if text[end..].starts_with("Infinity") {
        let infinity = if text.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
        return Some(infinity);
    }

    let whole = digits_from(end);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if whole > 0 || fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole == 0 && fraction == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits_from(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }

    text[..end].parse().ok()
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Incoming => f.write_str("INCOMING"),
            Direction::Outgoing => f.write_str("OUTGOING"),
        }
    }
}

/// A validated, enriched webhook notification
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookRecord {
    pub notification: WebhookNotification,
    pub token_name: String,
    pub direction: Direction,
    pub explorer_url: String,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> Value {
        json!({
            "address": "0xff5ded1d122a0c2279fcf65b42f2ff6d1afebae4",
            "amount": "0.001",
            "asset": "ETH",
            "blockNumber": 2913059,
            "counterAddress": "0x690B9A9E9aa1C9dB991C7721a92d351Db4FaC990",
            "txId": "0x062d236ccc044f68194a04008e98c3823271dc26160a4db9ae9303f9ecfc7bf6",
            "type": "native",
            "chain": "ethereum-sepolia",
            "subscriptionType": "ADDRESS_EVENT"
        })
    }

    #[test]
    fn test_valid_payload_is_recognized() {
        let notification = WebhookNotification::from_payload(&sample_payload())
            .expect("Sample payload should be recognized");

        assert_eq!(notification.amount, "0.001");
        assert_eq!(notification.asset, "ETH");
        assert_eq!(notification.block_number, Some(2913059));
        assert_eq!(notification.kind, Some(NotificationKind::Native));
        assert_eq!(notification.chain, "ethereum-sepolia");
    }

    #[test]
    fn test_wrong_subscription_type_is_rejected() {
        let mut payload = sample_payload();
        payload["subscriptionType"] = json!("OTHER");
        assert!(WebhookNotification::from_payload(&payload).is_none());

        assert!(WebhookNotification::from_payload(&json!({ "subscriptionType": "OTHER" })).is_none());
    }

    #[test]
    fn test_required_fields_must_be_strings() {
        for key in ["address", "amount", "asset", "txId"] {
            let mut missing = sample_payload();
            missing.as_object_mut().unwrap().remove(key);
            assert!(WebhookNotification::from_payload(&missing).is_none(), "missing {}", key);

            let mut numeric = sample_payload();
            numeric[key] = json!(42);
            assert!(WebhookNotification::from_payload(&numeric).is_none(), "numeric {}", key);
        }
    }

    #[test]
    fn test_optional_fields_are_lenient() {
        let payload = json!({
            "address": "0xabc",
            "amount": "5",
            "asset": "0x5C95260eBD1dD21547528E73dc601d74B2793e0D",
            "txId": "0x01",
            "subscriptionType": "ADDRESS_EVENT",
            "blockNumber": "0x10",
            "type": "something-new"
        });

        let notification = WebhookNotification::from_payload(&payload).unwrap();
        assert_eq!(notification.block_number, Some(16));
        assert_eq!(notification.kind, None);
        assert_eq!(notification.chain, "");
        assert_eq!(notification.counter_address, None);
    }

    #[test]
    fn test_non_object_payloads_are_rejected() {
        assert!(WebhookNotification::from_payload(&json!(null)).is_none());
        assert!(WebhookNotification::from_payload(&json!([1, 2, 3])).is_none());
        assert!(WebhookNotification::from_payload(&json!("ADDRESS_EVENT")).is_none());
    }

    #[test]
    fn test_direction_from_amount() {
        assert_eq!(Direction::from_amount("0.001"), Direction::Incoming);
        assert_eq!(Direction::from_amount("12"), Direction::Incoming);
        assert_eq!(Direction::from_amount("0"), Direction::Outgoing);
        assert_eq!(Direction::from_amount("-3.5"), Direction::Outgoing);
        assert_eq!(Direction::from_amount("abc"), Direction::Outgoing);
        assert_eq!(Direction::from_amount(""), Direction::Outgoing);
    }

    #[test]
    fn test_direction_reads_leading_number_only() {
        assert_eq!(Direction::from_amount("1 ETH"), Direction::Incoming);
        assert_eq!(Direction::from_amount("5abc"), Direction::Incoming);
        assert_eq!(Direction::from_amount("  .5"), Direction::Incoming);
        assert_eq!(Direction::from_amount("2e-3 tokens"), Direction::Incoming);
        assert_eq!(Direction::from_amount("3e"), Direction::Incoming);
        assert_eq!(Direction::from_amount("Infinity"), Direction::Incoming);
        assert_eq!(Direction::from_amount("-1 ETH"), Direction::Outgoing);
        assert_eq!(Direction::from_amount("0.0001e-500"), Direction::Outgoing);
        assert_eq!(Direction::from_amount("."), Direction::Outgoing);
        assert_eq!(Direction::from_amount("ETH 1"), Direction::Outgoing);
        assert_eq!(Direction::Incoming.to_string(), "INCOMING");
    }

    #[test]
    fn test_notification_serializes_with_wire_names() {
        let notification = WebhookNotification::from_payload(&sample_payload()).unwrap();
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["txId"], "0x062d236ccc044f68194a04008e98c3823271dc26160a4db9ae9303f9ecfc7bf6");
        assert_eq!(json["type"], "native");
        assert_eq!(json["subscriptionType"], "ADDRESS_EVENT");
    }
}
