use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use eyre::{Result, WrapErr, eyre};
use k256::ecdsa::SigningKey;
use rand_chacha::ChaCha20Rng;
use rand_chacha::rand_core::SeedableRng;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};

use crate::config::{KeyAlgorithm, ServerConfig};
use crate::signing::{KeySigner, RsaSigner, Secp256k1Signer};

/// Where a key's seed comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyToken {
    Seed(String),
    Env(String),
}

impl fmt::Debug for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Seed(_) => f.write_str("Seed(<redacted>)"),
            KeyToken::Env(var) => f.debug_tuple("Env").field(var).finish(),
        }
    }
}

/// Reference to a configured signing key. Holds the token, not the
/// derived private key.
#[derive(Debug, Clone)]
pub struct KeyHandle {
    pub name: String,
    pub algorithm: KeyAlgorithm,
    pub token: KeyToken,
}

/// Keys available to the server, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    keys: HashMap<String, KeyHandle>,
}

impl KeyMap {
    pub fn from_config(config: &ServerConfig) -> Self {
        let keys = config
            .keys
            .iter()
            .filter_map(|(name, key)| {
                let token = match (&key.seed, &key.seed_env) {
                    (Some(seed), _) => KeyToken::Seed(seed.clone()),
                    (None, Some(var)) => KeyToken::Env(var.clone()),
                    (None, None) => return None,
                };
                let handle = KeyHandle {
                    name: name.clone(),
                    algorithm: key.algorithm,
                    token,
                };
                Some((name.clone(), handle))
            })
            .collect();
        Self { keys }
    }

    pub fn lookup(&self, name: &str) -> Option<&KeyHandle> {
        self.keys.get(name)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Turns a key token into usable key material.
pub trait TokenDecoder: Send + Sync {
    fn decode(&self, handle: &KeyHandle) -> Result<Arc<dyn KeySigner>>;
}

const RSA_KEY_BITS: usize = 2048;

/// Derives keys deterministically from their seed.
///
/// secp256k1 uses the SHA-256 of the seed as the private scalar; RSA keys
/// are generated from a ChaCha20 stream seeded with that same hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedTokenDecoder;

impl SeedTokenDecoder {
    fn seed(token: &KeyToken) -> Result<String> {
        match token {
            KeyToken::Seed(seed) => Ok(seed.clone()),
            KeyToken::Env(var) => match std::env::var(var) {
                Ok(seed) if !seed.is_empty() => Ok(seed),
                Ok(_) => Err(eyre!("environment variable {var} is empty")),
                Err(e) => Err(eyre!("reading environment variable {var}: {e}")),
            },
        }
    }
}

impl TokenDecoder for SeedTokenDecoder {
    fn decode(&self, handle: &KeyHandle) -> Result<Arc<dyn KeySigner>> {
        let seed = Self::seed(&handle.token)
            .wrap_err_with(|| format!("loading seed for key {}", handle.name))?;
        let hash = Sha256::digest(seed.as_bytes());
        let signer: Arc<dyn KeySigner> = match handle.algorithm {
            KeyAlgorithm::Secp256k1 => {
                let signing_key = SigningKey::from_bytes(&hash)
                    .map_err(|e| eyre!("seed for key {} is not a valid scalar: {e}", handle.name))?;
                Arc::new(Secp256k1Signer::new(signing_key))
            }
            KeyAlgorithm::Rsa => {
                let mut rng = ChaCha20Rng::from_seed(hash.into());
                let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
                    .wrap_err_with(|| format!("generating RSA key {}", handle.name))?;
                Arc::new(RsaSigner::new(private_key).map_err(|e| eyre!("{e:#}"))?)
            }
        };
        Ok(signer)
    }
}
