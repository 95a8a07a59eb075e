//! Template fingerprints: SHA-256 over (content, file name, model type).

use std::fmt;

use sha2::{Digest, Sha256};

use stencil_core::ModelType;

/// Printable digest identifying one (content, file name, model type) tuple.
///
/// Rendered as `tpl_<64 hex chars>` so it can double as a logical template
/// name. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub const PREFIX: &'static str = "tpl_";

    /// Compute the fingerprint of a compile request.
    ///
    /// Each field is length-prefixed, so moving text between fields changes
    /// the digest, and an absent file name differs from an empty one.
    pub fn compute(content: &str, file_name: Option<&str>, model_type: &ModelType) -> Self {
        let mut h = Sha256::new();
        for field in [Some(content), file_name, Some(model_type.name())] {
            match field {
                Some(text) => {
                    h.update([1u8]);
                    h.update((text.len() as u64).to_le_bytes());
                    h.update(text.as_bytes());
                }
                None => h.update([0u8]),
            }
        }
        Self(format!("{}{}", Self::PREFIX, hex::encode(h.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
