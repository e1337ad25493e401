use anyhow::Result;
use k256::ecdsa::{Signature, SigningKey, signature::hazmat::PrehashSigner};

use super::signer::KeySigner;

/// ECDSA over secp256k1, signing the package digest directly.
///
/// The compressed public point is computed once since every signature
/// record carries its fingerprint.
pub struct Secp256k1Signer {
    signing_key: SigningKey,
    public_point: Vec<u8>,
}

impl Secp256k1Signer {
    pub fn new(signing_key: SigningKey) -> Self {
        let public_point = signing_key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        Self {
            signing_key,
            public_point,
        }
    }
}

impl KeySigner for Secp256k1Signer {
    fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>> {
        let signature: Signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| anyhow::anyhow!("secp256k1 prehash signing: {e}"))?;
        // Low-S keeps the encoding canonical for verifiers that insist on it.
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_bytes().to_vec())
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.public_point.clone()
    }

    fn algorithm(&self) -> &str {
        "secp256k1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::VerifyingKey;
    use k256::ecdsa::signature::hazmat::PrehashVerifier;
    use sha2::{Digest, Sha256};

    fn signer(scalar: u8) -> Secp256k1Signer {
        Secp256k1Signer::new(SigningKey::from_slice(&[scalar; 32]).unwrap())
    }

    #[test]
    fn signature_verifies_against_published_point() {
        let signer = signer(5);
        let digest = Sha256::digest(b"package payload");
        let sig = signer.sign_digest(&digest).unwrap();
        assert_eq!(sig.len(), 64);

        let verifying_key = VerifyingKey::from_sec1_bytes(&signer.public_key_bytes()).unwrap();
        let signature = Signature::from_slice(&sig).unwrap();
        verifying_key.verify_prehash(&digest, &signature).unwrap();
    }

    #[test]
    fn signatures_are_low_s() {
        let signer = signer(9);
        let sig = signer.sign_digest(&Sha256::digest(b"low-s")).unwrap();
        let signature = Signature::from_slice(&sig).unwrap();
        assert!(signature.normalize_s().is_none());
    }

    #[test]
    fn public_point_is_compressed() {
        let key = signer(5).public_key_bytes();
        assert_eq!(key.len(), 33);
        assert!(key[0] == 0x02 || key[0] == 0x03);
        assert_ne!(key, signer(6).public_key_bytes());
    }
}
