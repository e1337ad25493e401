pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod keys;
pub mod policy;
pub mod rpm;
pub mod server;
pub mod signing;

pub use audit::{AuditLog, AuditRecord, MemoryAuditLog, TracingAuditLog};
pub use auth::ClientIdentity;
pub use config::ServerConfig;
pub use error::{ServerError, SignError};
pub use rpm::{PackageSigner, RpmStreamSigner, SigningInfo};
pub use server::{AppState, router, run};
pub use signing::{KeySigner, RsaSigner, Secp256k1Signer};
