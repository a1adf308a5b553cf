//! Builds the exact strings which are signed.
//!
//! Field order is fixed and numbers are written in plain decimal, so the same
//! inputs always give byte-identical output.

use serde_json::Value;

use crate::file::Timestamp;

/// `{"startTimestampMs":<ts>,"frameNumber":<n>,"frameHashSha256":"<digest>"}`
pub fn build_message(timestamp: Timestamp, frame_number: usize, digest: &str) -> String {
    format!(
        r#"{{"startTimestampMs":{},"frameNumber":{},"frameHashSha256":{}}}"#,
        timestamp.as_millis(),
        frame_number,
        Value::from(digest),
    )
}

/// `{"timestampMs":<ts>,"fileHashSha256":"<digest>"}`
pub fn build_file_message(timestamp: Timestamp, digest: &str) -> String {
    format!(
        r#"{{"timestampMs":{},"fileHashSha256":{}}}"#,
        timestamp.as_millis(),
        Value::from(digest),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_message_layout() {
        let digest = "aa".repeat(32);
        let msg = build_message(Timestamp::from_millis(1000), 1, &digest);
        assert_eq!(
            msg,
            format!(r#"{{"startTimestampMs":1000,"frameNumber":1,"frameHashSha256":"{digest}"}}"#)
        );

        let parsed: Value = serde_json::from_str(&msg).expect("Message is valid JSON");
        assert_eq!(parsed["frameNumber"], 1);
    }

    #[test]
    fn file_message_layout() {
        let msg = build_file_message(Timestamp::from_millis(1_700_000_000_000), "ff");
        assert_eq!(msg, r#"{"timestampMs":1700000000000,"fileHashSha256":"ff"}"#);
    }

    #[test]
    fn deterministic() {
        let a = build_message(Timestamp::from_millis(5), 7, "00");
        let b = build_message(Timestamp::from_millis(5), 7, "00");
        assert_eq!(a, b);
        assert_ne!(a, build_message(Timestamp::from_millis(6), 7, "00"));
    }
}
