/*!
 * Encrypted provider credentials.
 *
 * - `vault`: sealing and opening individual API keys
 * - `store`: ordered per-provider slots of sealed keys
 */

pub mod store;
pub mod vault;

pub use store::{validate_key_format, CredentialStore};
pub use vault::{CredentialRecord, CredentialVault};
