//! SMS CDR wire types.

use serde::Deserialize;

/// Raw DataTables-style response from the CDR endpoint. Rows are
/// positional arrays, not objects.
#[derive(Debug, Clone, Deserialize)]
pub struct CdrResponse {
    #[serde(rename = "aaData", default)]
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// One inbound SMS, parsed out of a CDR row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    /// Delivery timestamp as reported by the source.
    pub received_at: String,
    /// Source-side grouping label for the number range.
    pub range: String,
    /// Receiving phone number.
    pub number: String,
    /// Sender label (service name or short code).
    pub sender: String,
    /// Message body.
    pub text: String,
}

impl SmsMessage {
    /// Parse a CDR row into a message. Returns `None` for aggregate /
    /// summary rows, which the endpoint interleaves with real messages:
    /// their first column is a rate ("0.052") or a count list with
    /// commas rather than a timestamp.
    pub fn from_row(row: &[serde_json::Value]) -> Option<Self> {
        if row.len() < 6 {
            return None;
        }

        let first = cell_text(&row[0]);
        if first.starts_with("0.") || first.contains(',') || first.len() <= 10 {
            return None;
        }

        Some(Self {
            received_at: first,
            range: cell_text(&row[1]),
            number: cell_text(&row[2]),
            sender: cell_text(&row[3]),
            text: cell_text(&row[5]),
        })
    }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
