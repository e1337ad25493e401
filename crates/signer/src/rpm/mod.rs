mod info;
mod lead;
mod stream;

pub use info::SigningInfo;
pub use lead::{LEAD_SIZE, RpmLead};
pub use stream::{BodyStream, PackageSigner, RpmStreamSigner};
