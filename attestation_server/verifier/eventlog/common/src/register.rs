/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! Register bank: expected final register values reported by the platform.
//! # Examples
//! See [`RegisterBank::from_json`].
use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use crate::digest::HashAlgorithm;
use crate::error::VerifierError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValueEntry {
    pub index: u32,
    pub value: String, // hex
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterBank {
    pub registers: Vec<RegisterValueEntry>,
}

impl RegisterBank {
    /// Build a bank from raw digests, validating it
    pub fn new<I>(entries: I) -> Result<Self, VerifierError>
    where
        I: IntoIterator<Item = (u32, Vec<u8>)>,
    {
        let registers = entries
            .into_iter()
            .map(|(index, digest)| RegisterValueEntry { index, value: hex::encode(digest) })
            .collect();
        let bank = Self { registers };
        bank.validate()?;
        Ok(bank)
    }

    /// Create a new RegisterBank instance from JSON
    ///
    /// # Arguments
    /// * `json` - JSON representation of the register bank
    ///
    /// # Returns
    /// * `Result<Self, VerifierError>` - RegisterBank instance or error
    /// # Example
    /// ```
    /// use eventlog_common_verifier::RegisterBank;
    /// use serde_json::json;
    ///
    /// let json_value = json!({
    ///     "registers": [
    ///         {
    ///             "index": 0,
    ///             "value": "9d7504bb0d32f62d43310f38df37cdd5e42bdb83dd0c0592fd9b1c3b16770c35"
    ///         }
    ///     ]
    /// });
    /// let bank = RegisterBank::from_json(&json_value).unwrap();
    /// assert_eq!(bank.indices(), vec![0]);
    /// ```
    pub fn from_json(json: &serde_json::Value) -> Result<Self, VerifierError> {
        let bank: RegisterBank = serde_json::from_value(json.clone())
            .map_err(|e| VerifierError::InvalidBank(format!("Failed to parse register bank: {}", e)))?;
        bank.validate()?;
        log::debug!("Parsed register bank with {} entries", bank.registers.len());
        Ok(bank)
    }

    /// Reject duplicate indices, non-hex values and digest lengths no algorithm implies
    pub fn validate(&self) -> Result<(), VerifierError> {
        let mut seen = HashSet::new();
        for entry in &self.registers {
            if !seen.insert(entry.index) {
                log::warn!("Register bank lists index {} more than once", entry.index);
                return Err(VerifierError::InvalidBank(format!("Duplicate register index: {}", entry.index)));
            }
            let digest = hex::decode(&entry.value)
                .map_err(|e| VerifierError::InvalidBank(
                    format!("Invalid hex value for register {}: {}", entry.index, e)
                ))?;
            HashAlgorithm::from_digest_len(digest.len())
                .map_err(|e| VerifierError::InvalidBank(format!("register {}: {}", entry.index, e)))?;
        }
        Ok(())
    }

    /// Expected digest for `index`, `None` when the bank has no entry for it
    pub fn digest(&self, index: u32) -> Result<Option<Vec<u8>>, VerifierError> {
        self.registers
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| hex::decode(&entry.value)
                .map_err(|e| VerifierError::InvalidBank(
                    format!("Invalid hex value for register {}: {}", index, e)
                )))
            .transpose()
    }

    /// Bank indices, ascending
    pub fn indices(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self.registers.iter().map(|entry| entry.index).collect();
        indices.sort_unstable();
        indices
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}
