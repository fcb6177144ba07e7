//! AWS SigV4 request signing
//!
//! The managed OpenSearch service authenticates requests with SigV4
//! signatures over the `es` service. No signing crate is pulled in;
//! the derivation is small and built directly on `sha2`, including the
//! HMAC construction.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Service name used in the credential scope
const SERVICE: &str = "es";

/// A point-in-time credential snapshot used to sign one request
#[derive(Clone)]
pub struct SigningCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Everything needed to sign one request
pub struct SigningRequest<'a> {
    pub credentials: &'a SigningCredentials,
    pub region: &'a str,
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    /// Canonical (sorted, AWS-encoded) query string, empty if none
    pub canonical_query: &'a str,
    pub payload: &'a [u8],
}

/// Sign a request, returning the headers to attach.
///
/// Produces `x-amz-date`, `x-amz-content-sha256`, `authorization` and,
/// for session credentials, `x-amz-security-token`.
pub fn sign(request: &SigningRequest<'_>) -> Vec<(String, String)> {
    sign_at(request, SystemTime::now())
}

fn sign_at(request: &SigningRequest<'_>, now: SystemTime) -> Vec<(String, String)> {
    let (date, amz_date) = format_timestamps(now);
    let payload_hash = hex(&Sha256::digest(request.payload));

    let mut canonical_headers = format!("host:{}\nx-amz-date:{}\n", request.host, amz_date);
    let mut signed_headers = String::from("host;x-amz-date");
    if let Some(token) = &request.credentials.session_token {
        canonical_headers.push_str(&format!("x-amz-security-token:{token}\n"));
        signed_headers.push_str(";x-amz-security-token");
    }

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method,
        request.path,
        request.canonical_query,
        canonical_headers,
        signed_headers,
        payload_hash,
    );

    let scope = format!("{}/{}/{}/aws4_request", date, request.region, SERVICE);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        scope,
        hex(&Sha256::digest(canonical_request.as_bytes())),
    );

    let secret = format!("AWS4{}", request.credentials.secret_access_key);
    let k_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, request.region.as_bytes());
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");
    let signature = hex(&hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        request.credentials.access_key_id, scope, signed_headers, signature,
    );

    let mut headers = vec![
        ("x-amz-date".to_string(), amz_date),
        ("x-amz-content-sha256".to_string(), payload_hash),
        ("authorization".to_string(), authorization),
    ];
    if let Some(token) = &request.credentials.session_token {
        headers.push(("x-amz-security-token".to_string(), token.clone()));
    }
    headers
}

/// AWS-style URI encoding: unreserved characters pass through,
/// everything else becomes `%XX`.
pub fn uri_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Build the canonical query string: pairs AWS-encoded and sorted.
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    const BLOCK: usize = 64;
    let mut padded = [0u8; BLOCK];
    if key.len() > BLOCK {
        let digest = Sha256::digest(key);
        padded[..digest.len()].copy_from_slice(&digest);
    } else {
        padded[..key.len()].copy_from_slice(key);
    }

    let mut ipad = [0x36u8; BLOCK];
    let mut opad = [0x5cu8; BLOCK];
    for i in 0..BLOCK {
        ipad[i] ^= padded[i];
        opad[i] ^= padded[i];
    }

    let inner = Sha256::new()
        .chain_update(ipad)
        .chain_update(data)
        .finalize();
    let outer = Sha256::new()
        .chain_update(opad)
        .chain_update(inner)
        .finalize();
    outer.into()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Render `(YYYYMMDD, YYYYMMDD'T'HHMMSS'Z')` for the given instant.
fn format_timestamps(now: SystemTime) -> (String, String) {
    let now: DateTime<Utc> = now.into();
    (
        now.format("%Y%m%d").to_string(),
        now.format("%Y%m%dT%H%M%SZ").to_string(),
    )
}
