use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output stream an installer log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// One installer log line as forwarded to the log sink.
///
/// 转发给日志接收端的一行安装日志。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallLogEntry {
    pub kind: LogStream,
    pub data: String,
    pub timestamp: DateTime<Utc>,
}

impl InstallLogEntry {
    pub fn new(kind: LogStream, data: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            data: data.into(),
            timestamp,
        }
    }

    /// Build an entry from a millisecond epoch timestamp.
    ///
    /// Out-of-range timestamps fall back to the Unix epoch.
    pub fn at_millis(kind: LogStream, data: impl Into<String>, now_ms: i64) -> Self {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(now_ms).unwrap_or_default();
        Self::new(kind, data, timestamp)
    }
}
