/*!
 * Per-provider ordered credential slots.
 *
 * Slot 0 of each provider is the primary key, the rest are backups. Slots
 * only ever hold encrypted records; a blank record is an empty slot.
 */

use std::collections::BTreeMap;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vault::{CredentialRecord, CredentialVault};
use crate::errors::CredentialError;

static KEY_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-_]{20,50}$").expect("key shape regex"));

/// Check a plaintext key against the accepted provider key shape
pub fn validate_key_format(key: &str) -> Result<(), CredentialError> {
    if KEY_SHAPE.is_match(key.trim()) {
        Ok(())
    } else {
        Err(CredentialError::InvalidFormat)
    }
}

/// Mapping from provider family name to its ordered credential slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialStore {
    slots: BTreeMap<String, Vec<CredentialRecord>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty slot and return its position
    pub fn add_slot(&mut self, provider: &str) -> usize {
        let slots = self.slots.entry(provider.to_string()).or_default();
        slots.push(CredentialRecord::blank());
        slots.len() - 1
    }

    /// Remove a slot, returning the record it held
    pub fn remove_slot(&mut self, provider: &str, index: usize) -> Result<CredentialRecord, CredentialError> {
        let slots = self.slots.get_mut(provider).filter(|s| index < s.len()).ok_or_else(|| {
            CredentialError::UnknownSlot {
                provider: provider.to_string(),
                index,
            }
        })?;
        let removed = slots.remove(index);
        if slots.is_empty() {
            self.slots.remove(provider);
        }
        debug!("Removed credential slot {} of {}", index, provider);
        Ok(removed)
    }

    /// Set the key held in a slot.
    ///
    /// A blank value removes the slot. Anything else must have the accepted
    /// key shape and is encrypted before it is stored. Writing one past the
    /// last slot appends.
    pub fn update(
        &mut self,
        provider: &str,
        index: usize,
        value: &str,
        vault: &CredentialVault,
    ) -> Result<(), CredentialError> {
        if value.trim().is_empty() {
            return self.remove_slot(provider, index).map(|_| ());
        }

        validate_key_format(value)?;

        let len = self.slots.get(provider).map_or(0, Vec::len);
        if index > len {
            return Err(CredentialError::UnknownSlot {
                provider: provider.to_string(),
                index,
            });
        }

        let record = vault.encrypt(value)?;
        let slots = self.slots.entry(provider.to_string()).or_default();
        if index == slots.len() {
            slots.push(record);
        } else {
            slots[index] = record;
        }
        Ok(())
    }

    /// All slots of a provider in order, including blank ones
    pub fn records(&self, provider: &str) -> &[CredentialRecord] {
        self.slots.get(provider).map_or(&[], Vec::as_slice)
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Filled records whose plaintext decrypts and has the key shape
    pub fn valid_records(&self, provider: &str, vault: &CredentialVault) -> Vec<CredentialRecord> {
        self.records(provider)
            .iter()
            .filter(|r| !r.is_blank())
            .filter(|r| {
                let plaintext = vault.decrypt(r);
                let valid = validate_key_format(&plaintext).is_ok();
                if !valid {
                    warn!("Ignoring unusable {} credential", provider);
                }
                valid
            })
            .cloned()
            .collect()
    }

    /// Session snapshot as JSON; empty slots are left out
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        let filled: BTreeMap<&str, Vec<&CredentialRecord>> = self
            .slots
            .iter()
            .map(|(provider, records)| (provider.as_str(), records.iter().filter(|r| !r.is_blank()).collect::<Vec<_>>()))
            .filter(|(_, records)| !records.is_empty())
            .collect();
        serde_json::to_string_pretty(&filled)
    }

    pub fn import_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
