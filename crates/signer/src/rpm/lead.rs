use eyre::{Result, bail};

/// Size of the fixed RPM lead that starts every package.
pub const LEAD_SIZE: usize = 96;

const LEAD_MAGIC: [u8; 4] = [0xed, 0xab, 0xee, 0xdb];
const NAME_OFFSET: usize = 10;
const NAME_LEN: usize = 66;

/// The decoded fields of an RPM lead that end up in the signing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmLead {
    pub major: u8,
    pub minor: u8,
    pub name: String,
}

impl RpmLead {
    pub fn parse(bytes: &[u8; LEAD_SIZE]) -> Result<Self> {
        if bytes[..4] != LEAD_MAGIC {
            bail!("not an rpm package: bad lead magic {}", hex::encode(&bytes[..4]));
        }
        let (major, minor) = (bytes[4], bytes[5]);
        if major < 3 {
            bail!("unsupported rpm lead version {major}.{minor}");
        }

        let raw_name = &bytes[NAME_OFFSET..NAME_OFFSET + NAME_LEN];
        let end = raw_name.iter().position(|b| *b == 0).unwrap_or(NAME_LEN);
        let name = String::from_utf8_lossy(&raw_name[..end]).into_owned();

        Ok(Self { major, minor, name })
    }
}

#[cfg(test)]
pub(crate) fn test_lead(name: &str) -> [u8; LEAD_SIZE] {
    let mut lead = [0u8; LEAD_SIZE];
    lead[..4].copy_from_slice(&LEAD_MAGIC);
    lead[4] = 3;
    let name = name.as_bytes();
    lead[NAME_OFFSET..NAME_OFFSET + name.len()].copy_from_slice(name);
    lead
}
