use std::fmt;
use std::fmt::Write as _;

use serde::Serialize;

/// Outcome of signing one package.
///
/// The signer fills in the package and signature fields; the request
/// handler attaches the caller's identity afterwards. Nothing here is
/// secret: the record is both logged and returned to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SigningInfo {
    pub key_name: String,
    pub client_name: String,
    pub client_ip: String,
    pub package: String,
    pub lead_version: String,
    pub payload_size: u64,
    pub digest_algorithm: String,
    pub digest: String,
    pub signature_algorithm: String,
    pub signature_size: usize,
    pub signature: String,
    pub public_key_fingerprint: String,
    pub timestamp: u64,
}

impl SigningInfo {
    /// Attach the identity fields the signer has no knowledge of.
    pub fn with_identity(
        mut self,
        key_name: impl Into<String>,
        client_name: impl Into<String>,
        client_ip: impl Into<String>,
    ) -> Self {
        self.key_name = key_name.into();
        self.client_name = client_name.into();
        self.client_ip = client_ip.into();
        self
    }

    /// Human readable dump, one `name: value` pair per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let fields: [(&str, &dyn fmt::Display); 13] = [
            ("key", &self.key_name),
            ("client", &self.client_name),
            ("client_ip", &self.client_ip),
            ("package", &self.package),
            ("lead_version", &self.lead_version),
            ("payload_size", &self.payload_size),
            ("digest_algorithm", &self.digest_algorithm),
            ("digest", &self.digest),
            ("signature_algorithm", &self.signature_algorithm),
            ("signature_size", &self.signature_size),
            ("signature", &self.signature),
            ("public_key_fingerprint", &self.public_key_fingerprint),
            ("timestamp", &self.timestamp),
        ];
        for (name, value) in fields {
            // Writing to a String cannot fail.
            let _ = writeln!(out, "{name}: {value}");
        }
        out
    }
}

impl fmt::Display for SigningInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signed rpm: key={} client={} ip={} package={} {}={} size={}",
            self.key_name,
            self.client_name,
            self.client_ip,
            self.package,
            self.digest_algorithm,
            self.digest,
            self.payload_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SigningInfo {
        SigningInfo {
            package: "hello-1.0-1".into(),
            digest_algorithm: "sha256".into(),
            digest: "ab".repeat(32),
            payload_size: 128,
            ..Default::default()
        }
        .with_identity("release", "builder", "10.0.0.7")
    }

    #[test]
    fn dump_has_one_line_per_field() {
        let dump = sample().dump();
        assert_eq!(dump.lines().count(), 13);
        assert!(dump.contains("key: release\n"));
        assert!(dump.contains("client: builder\n"));
        assert!(dump.contains("client_ip: 10.0.0.7\n"));
    }

    #[test]
    fn display_is_a_single_line() {
        let line = sample().to_string();
        assert!(!line.contains('\n'));
        assert!(line.starts_with("Signed rpm: key=release client=builder ip=10.0.0.7"));
    }
}
