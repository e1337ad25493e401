/// Private key material derived from a key token, able to sign a
/// precomputed SHA-256 digest.
///
/// Implementations are sync — signing is CPU-bound.
pub trait KeySigner: Send + Sync {
    /// Sign a 32-byte SHA-256 digest. Returns raw signature bytes.
    fn sign_digest(&self, digest: &[u8]) -> anyhow::Result<Vec<u8>>;

    /// Encoded public key bytes (compressed point or DER SPKI).
    fn public_key_bytes(&self) -> Vec<u8>;

    /// Algorithm identifier string (e.g. "secp256k1").
    fn algorithm(&self) -> &str;
}
