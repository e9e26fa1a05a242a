//! Key-pair generation port.

use crate::domain::AccessKeyPair;
use crate::error::Result;

/// Produces fresh access credentials. Stateless.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> Result<AccessKeyPair>;
}
