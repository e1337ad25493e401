use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::body::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use sha2::{Digest, Sha256};

use super::info::SigningInfo;
use super::lead::{LEAD_SIZE, RpmLead};
use crate::error::SignError;
use crate::signing::KeySigner;

/// Request body as it arrives off the connection.
pub type BodyStream = BoxStream<'static, Result<Bytes, axum::Error>>;

/// Signs a package while it is being uploaded.
///
/// The body is consumed exactly once. Implementations know nothing about
/// who is calling: the identity fields of the returned [`SigningInfo`]
/// are left empty.
#[async_trait]
pub trait PackageSigner: Send + Sync {
    async fn sign(&self, body: BodyStream, key: &dyn KeySigner) -> Result<SigningInfo, SignError>;
}

/// Streams an RPM through SHA-256 and signs the resulting digest.
///
/// The lead is validated as soon as its 96 bytes have arrived so a
/// non-rpm upload is rejected without reading the rest of it.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpmStreamSigner;

#[async_trait]
impl PackageSigner for RpmStreamSigner {
    async fn sign(&self, mut body: BodyStream, key: &dyn KeySigner) -> Result<SigningInfo, SignError> {
        let mut lead_buf = [0u8; LEAD_SIZE];
        let mut filled = 0;
        let mut lead = None;
        let mut hasher = Sha256::new();
        let mut payload_size: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(SignError::from_body_error)?;
            if filled < LEAD_SIZE {
                let take = chunk.len().min(LEAD_SIZE - filled);
                lead_buf[filled..filled + take].copy_from_slice(&chunk[..take]);
                filled += take;
                if filled == LEAD_SIZE {
                    lead = Some(RpmLead::parse(&lead_buf)?);
                }
            }
            hasher.update(&chunk);
            payload_size += chunk.len() as u64;
        }

        let lead = lead.ok_or(SignError::TruncatedInput)?;
        // A lead with nothing behind it is a package cut off mid-upload.
        if payload_size == LEAD_SIZE as u64 {
            return Err(SignError::TruncatedInput);
        }

        let digest = hasher.finalize();
        let signature = key
            .sign_digest(&digest)
            .map_err(|e| eyre::eyre!("signing {} with {}: {e:#}", lead.name, key.algorithm()))?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Ok(SigningInfo {
            package: lead.name,
            lead_version: format!("{}.{}", lead.major, lead.minor),
            payload_size,
            digest_algorithm: "sha256".to_string(),
            digest: hex::encode(digest),
            signature_algorithm: key.algorithm().to_string(),
            signature_size: signature.len(),
            signature: hex::encode(&signature),
            public_key_fingerprint: hex::encode(Sha256::digest(key.public_key_bytes())),
            timestamp,
            ..Default::default()
        })
    }
}
