/*!
 * Translation sessions.
 *
 * A session ties the credential store, key pool, cache and user settings
 * together and runs whole-document translations.
 */

pub mod manager;
pub mod models;

pub use manager::TranslationSession;
pub use models::{SessionSettings, TranslationOutcome, TranslationRequest};
