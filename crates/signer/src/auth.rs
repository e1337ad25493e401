//! Client authentication and connection details.
//!
//! Runs in front of the signing handler: it resolves the bearer token to a
//! configured client name and stores it in the request extensions.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::ServerError;

/// Name of an authenticated client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps bearer tokens to client names. Tokens are kept only as SHA-256
/// digests, and every configured digest is compared on each lookup.
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    clients: Vec<([u8; 32], String)>,
}

impl Authenticator {
    pub fn from_config(config: &ServerConfig) -> Self {
        let clients = config
            .clients
            .iter()
            .map(|(name, client)| (token_digest(&client.token), name.clone()))
            .collect();
        Self { clients }
    }

    pub fn identify(&self, token: &str) -> Option<ClientIdentity> {
        let presented = token_digest(token);
        let mut found = None;
        for (digest, name) in &self.clients {
            if digests_equal(digest, &presented) && found.is_none() {
                found = Some(name);
            }
        }
        found.map(|name| ClientIdentity(name.clone()))
    }
}

fn token_digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Compares every byte regardless of where the first mismatch is.
fn digests_equal(a: &[u8; 32], b: &[u8; 32]) -> bool {
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}

/// Middleware rejecting requests without a known bearer token.
pub async fn authenticate(
    State(auth): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(identity) = token.and_then(|token| auth.identify(token)) else {
        debug!(ip = %client_ip(&request), "rejecting unauthenticated request");
        return Err(ServerError::Unauthorized);
    };

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// IP address of the connected peer, without the port.
pub fn client_ip<B>(request: &axum::http::Request<B>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn authenticator() -> Authenticator {
        let config = ServerConfig::from_toml(
            r#"
            [clients.builder]
            token = "builder-token"
            "#,
        )
        .unwrap();
        Authenticator::from_config(&config)
    }

    #[test]
    fn known_token_identifies_client() {
        let identity = authenticator().identify("builder-token").unwrap();
        assert_eq!(identity.as_str(), "builder");
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert!(authenticator().identify("guess").is_none());
        assert!(authenticator().identify("").is_none());
    }

    #[test]
    fn digest_comparison_needs_every_byte() {
        let a = token_digest("builder-token");
        let mut b = a;
        assert!(digests_equal(&a, &b));
        b[31] ^= 1;
        assert!(!digests_equal(&a, &b));
        b = a;
        b[0] ^= 0x80;
        assert!(!digests_equal(&a, &b));
    }

    #[test]
    fn client_ip_strips_port() {
        let addr: SocketAddr = "192.0.2.10:51234".parse().unwrap();
        let request = axum::http::Request::builder()
            .extension(ConnectInfo(addr))
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), "192.0.2.10");
    }

    #[test]
    fn client_ip_without_connect_info() {
        let request = axum::http::Request::new(Body::empty());
        assert_eq!(client_ip(&request), "unknown");
    }
}
