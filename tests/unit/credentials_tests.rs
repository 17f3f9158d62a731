/*!
 * Tests for the credential vault and per-provider slots
 */

use lingosub::credentials::vault::sanitize_secret;
use lingosub::credentials::{validate_key_format, CredentialRecord, CredentialStore, CredentialVault};
use lingosub::CredentialError;

use crate::common::{test_key, VAULT};

/// Test sealing the same key twice never yields the same record
#[test]
fn test_encrypt_sameKeyTwice_shouldUseFreshNonces() {
    let first = VAULT.encrypt(&test_key(1)).unwrap();
    let second = VAULT.encrypt(&test_key(1)).unwrap();

    assert_ne!(first.nonce, second.nonce);
    assert_ne!(first.ciphertext, second.ciphertext);
    assert_eq!(VAULT.decrypt(&first), VAULT.decrypt(&second));
}

/// Test control characters and padding are removed before sealing
#[test]
fn test_encrypt_withPaddedInput_shouldSealSanitizedKey() {
    let record = VAULT.encrypt(&format!("  {}\u{0007}\n", test_key(2))).unwrap();
    assert_eq!(VAULT.decrypt(&record), test_key(2));
    assert_eq!(sanitize_secret("\tabc\u{0000}def "), "abcdef");
}

/// Test every tampered field is caught before decryption
#[test]
fn test_try_decrypt_withTamperedRecord_shouldReportCause() {
    let record = VAULT.encrypt(&test_key(3)).unwrap();

    let mut wrong_mac = record.clone();
    wrong_mac.mac = "00".repeat(32);
    assert_eq!(VAULT.try_decrypt(&wrong_mac), Err(CredentialError::Integrity));

    let mut short_nonce = record.clone();
    short_nonce.nonce = "abcd".to_string();
    assert_eq!(VAULT.try_decrypt(&short_nonce), Err(CredentialError::InvalidNonce(2)));

    let mut flipped = record.clone();
    let last = flipped.ciphertext.pop().unwrap();
    flipped.ciphertext.push(if last == '0' { '1' } else { '0' });
    assert_eq!(VAULT.try_decrypt(&flipped), Err(CredentialError::Integrity));

    let missing = CredentialRecord {
        mac: String::new(),
        ..record
    };
    assert_eq!(VAULT.try_decrypt(&missing), Err(CredentialError::MissingField("mac")));
}

/// Test a record from another session's vault decrypts to nothing
#[test]
fn test_decrypt_withForeignVault_shouldReturnEmpty() {
    let other = CredentialVault::with_key_size(1024).unwrap();
    let record = other.encrypt(&test_key(4)).unwrap();

    assert_eq!(VAULT.decrypt(&record), "");
    assert_eq!(VAULT.decrypt(&CredentialRecord::blank()), "");
}

/// Test slots keep their order and the primary stays at position 0
#[test]
fn test_store_withSeveralSlots_shouldKeepPrimaryFirst() {
    let mut store = CredentialStore::new();
    for n in 0..3 {
        let slot = store.add_slot("gemini");
        store.update("gemini", slot, &test_key(n), &VAULT).unwrap();
    }

    let plain: Vec<String> = store.records("gemini").iter().map(|r| VAULT.decrypt(r)).collect();
    assert_eq!(plain, vec![test_key(0), test_key(1), test_key(2)]);

    store.remove_slot("gemini", 0).unwrap();
    assert_eq!(VAULT.decrypt(&store.records("gemini")[0]), test_key(1));
    assert!(matches!(
        store.remove_slot("grok", 0),
        Err(CredentialError::UnknownSlot { index: 0, .. })
    ));
}

/// Test export leaves out empty slots and imports back in the same session
#[test]
fn test_export_json_thenImport_shouldRestoreFilledSlots() {
    let mut store = CredentialStore::new();
    store.update("grok", 0, &test_key(5), &VAULT).unwrap();
    store.add_slot("grok");
    store.add_slot("deepseek");

    let json = store.export_json().unwrap();
    assert!(!json.contains(&test_key(5)));
    assert!(!json.contains("deepseek"));

    let restored = CredentialStore::import_json(&json).unwrap();
    assert_eq!(restored.records("grok").len(), 1);
    assert_eq!(restored.valid_records("grok", &VAULT).len(), 1);
    assert_eq!(restored.providers().collect::<Vec<_>>(), vec!["grok"]);
}

/// Test the accepted key shape boundaries
#[test]
fn test_validate_key_format_atLengthBounds_shouldAcceptTwentyToFifty() {
    assert!(validate_key_format(&"a".repeat(19)).is_err());
    assert!(validate_key_format(&"a".repeat(20)).is_ok());
    assert!(validate_key_format(&"a-_9".repeat(12)).is_ok());
    assert!(validate_key_format(&"a".repeat(51)).is_err());
    assert!(validate_key_format("sk-proj.with.dots.0000000").is_err());
}
