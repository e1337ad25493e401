use anyhow::{Context, Result};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::signature::SignatureEncoding;
use rsa::signature::hazmat::PrehashSigner;
use sha2::Sha256;

use super::signer::KeySigner;

/// RSA PKCS#1 v1.5 signer over SHA-256 digests.
pub struct RsaSigner {
    signing_key: SigningKey<Sha256>,
    public_key_der: Vec<u8>,
}

impl RsaSigner {
    pub fn new(private_key: RsaPrivateKey) -> Result<Self> {
        let public_key_der = private_key
            .to_public_key()
            .to_public_key_der()
            .context("encoding RSA public key to DER")?
            .into_vec();
        let signing_key = SigningKey::<Sha256>::new(private_key);
        Ok(Self { signing_key, public_key_der })
    }
}

impl KeySigner for RsaSigner {
    fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>> {
        let signature = self
            .signing_key
            .sign_prehash(digest)
            .map_err(|e| anyhow::anyhow!("rsa sign_prehash failed: {e}"))?;
        Ok(signature.to_vec())
    }

    fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key_der.clone()
    }

    fn algorithm(&self) -> &str {
        "rsa-pkcs1v15-sha256"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_chacha::rand_core::SeedableRng;
    use rsa::RsaPublicKey;
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::pkcs8::DecodePublicKey;
    use rsa::signature::hazmat::PrehashVerifier;
    use sha2::Digest;

    fn test_signer() -> RsaSigner {
        let mut rng = ChaCha20Rng::from_seed([11u8; 32]);
        RsaSigner::new(RsaPrivateKey::new(&mut rng, 2048).unwrap()).unwrap()
    }

    #[test]
    fn signature_is_modulus_sized() {
        let signer = test_signer();
        let digest = Sha256::digest(b"data");
        let sig = signer.sign_digest(&digest).unwrap();
        assert_eq!(sig.len(), 256);
        assert_eq!(signer.algorithm(), "rsa-pkcs1v15-sha256");
    }

    #[test]
    fn signature_verifies_against_public_key() {
        let signer = test_signer();
        let digest = Sha256::digest(b"verify me");
        let sig_bytes = signer.sign_digest(&digest).unwrap();

        let public_key = RsaPublicKey::from_public_key_der(&signer.public_key_bytes()).unwrap();
        let verifying_key = VerifyingKey::<Sha256>::new(public_key);
        let signature = Signature::try_from(sig_bytes.as_slice()).unwrap();
        verifying_key.verify_prehash(&digest, &signature).unwrap();
    }
}
