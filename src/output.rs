//! Machine-readable command output
//!
//! In JSON mode every command prints exactly one object on stdout:
//! `{"ok": true, "command": ..., "data": ...}` on success, or
//! `{"ok": false, "command": ..., "code": ..., "error": ...}` when the
//! library refused the operation.

use serde::Serialize;

use crate::rejection::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json { OutputMode::Json } else { OutputMode::Human }
    }

    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

pub fn success_envelope<T: Serialize>(command: &str, data: &T) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::json!({
        "ok": true,
        "command": command,
        "data": serde_json::to_value(data)?,
    }))
}

pub fn rejection_envelope(command: &str, rejection: &Rejection) -> serde_json::Value {
    serde_json::json!({
        "ok": false,
        "command": command,
        "code": rejection.code,
        "error": rejection.message,
    })
}

/// Print the success envelope (JSON mode only)
pub fn emit_success<T: Serialize>(mode: OutputMode, command: &str, data: &T) -> anyhow::Result<()> {
    if !mode.is_human() {
        println!("{}", serde_json::to_string_pretty(&success_envelope(command, data)?)?);
    }
    Ok(())
}

/// Print the rejection envelope (JSON mode only)
pub fn emit_rejection(mode: OutputMode, command: &str, rejection: &Rejection) -> anyhow::Result<()> {
    if !mode.is_human() {
        println!("{}", serde_json::to_string_pretty(&rejection_envelope(command, rejection))?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rejection::RejectionCode;

    #[test]
    fn test_envelopes() {
        let ok = success_envelope("friends.add", &serde_json::json!({"id": 1})).unwrap();
        assert_eq!(ok["ok"], true);
        assert_eq!(ok["data"]["id"], 1);

        let rejection = Rejection::new(RejectionCode::BookOnLoan, "on loan");
        let failed = rejection_envelope("books.delete", &rejection);
        assert_eq!(failed["ok"], false);
        assert_eq!(failed["code"], "book_on_loan");
        assert_eq!(failed["error"], "on loan");
    }
}
