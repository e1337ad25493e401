mod signer;
mod secp256k1;
mod rsa;

pub use signer::KeySigner;
pub use secp256k1::Secp256k1Signer;
pub use self::rsa::RsaSigner;
