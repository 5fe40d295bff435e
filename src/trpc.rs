use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::http_client::http_client;

const DEFAULT_API_BASE: &str = "https://bestiaryarena.com";
const TRPC_PATH: &str = "/pt/api/trpc";

/// The fixed single-call batch envelope: one entry, null payload.
const NULL_INPUT: &str = r#"{"0":{"json":null,"meta":{"values":["undefined"]}}}"#;

pub fn api_base() -> String {
    std::env::var("ARENA_API_BASE")
        .ok()
        .filter(|base| !base.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

/// Fetch one batched method and return its decoded payload.
pub fn fetch_trpc(method: &str) -> Result<Value> {
    let client = http_client()?;
    let url = format!(
        "{}{TRPC_PATH}/{method}",
        api_base().trim_end_matches('/')
    );
    let resp = client
        .get(&url)
        .query(&[("batch", "1"), ("input", NULL_INPUT)])
        .send()
        .with_context(|| format!("requesting {method}"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("{method} → {}", status.as_u16()));
    }
    let body = resp
        .text()
        .with_context(|| format!("reading {method} body"))?;
    extract_payload(method, &body)
}

/// The response is a batch array; the single call's payload sits at
/// `[0].result.data.json`.
pub fn extract_payload(method: &str, raw: &str) -> Result<Value> {
    let root: Value = serde_json::from_str(raw)
        .with_context(|| format!("invalid {method} response json"))?;
    root.get(0)
        .and_then(|entry| entry.get("result"))
        .and_then(|result| result.get("data"))
        .and_then(|data| data.get("json"))
        .cloned()
        .ok_or_else(|| anyhow!("{method} response missing result payload"))
}
