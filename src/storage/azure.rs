//! Azure Blob SAS Generation
//! Mission: Delegate uploads to object storage with short-lived write URLs

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNED_VERSION: &str = "2020-12-06";

/// How long a delegated upload URL stays writable.
pub const UPLOAD_URL_VALIDITY_HOURS: i64 = 1;

/// Upload target classes, each mapped to its own container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    File,
    Video,
}

impl UploadKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(UploadKind::Image),
            "file" => Some(UploadKind::File),
            "video" => Some(UploadKind::Video),
            _ => None,
        }
    }

    pub fn container(&self) -> &'static str {
        match self {
            UploadKind::Image => "mindcare-thumbnail",
            UploadKind::File => "mindcare-pdf",
            UploadKind::Video => "mindcare-video",
        }
    }
}

/// Signs service SAS URLs with the storage account key.
pub struct SasGenerator {
    account_name: String,
    account_key: String, // base64, as issued by Azure
}

impl SasGenerator {
    pub fn new(account_name: String, account_key: String) -> Self {
        Self {
            account_name,
            account_key,
        }
    }

    /// Build a write-only SAS URL for one blob, valid for a fixed window
    /// starting at `now`.
    pub fn blob_upload_url(
        &self,
        kind: UploadKind,
        blob_name: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let container = kind.container();
        let expiry = (now + Duration::hours(UPLOAD_URL_VALIDITY_HOURS))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        let canonical = format!("/blob/{}/{}/{}", self.account_name, container, blob_name);

        // Service SAS string-to-sign for version 2020-12-06. Unused fields
        // keep their newline slots: permissions, start, expiry, resource,
        // identifier, IP, protocol, version, resource type, snapshot time,
        // encryption scope, then the five response-header overrides.
        let string_to_sign = format!(
            "w\n\n{expiry}\n{canonical}\n\n\nhttps\n{SIGNED_VERSION}\nb\n\n\n\n\n\n\n"
        );

        let key = STANDARD
            .decode(&self.account_key)
            .context("Failed to decode storage account key")?;
        let mut mac =
            HmacSha256::new_from_slice(&key).map_err(|e| anyhow!("HMAC key error: {}", e))?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let query = format!(
            "sv={}&spr=https&se={}&sr=b&sp=w&sig={}",
            SIGNED_VERSION,
            urlencoding::encode(&expiry),
            urlencoding::encode(&signature)
        );

        Ok(format!(
            "https://{}.blob.core.windows.net/{}/{}?{}",
            self.account_name, container, blob_name, query
        ))
    }
}
