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

//! Digest verification helpers
//!
//! The hash algorithm of a measurement is never carried explicitly next to an event digest,
//! it is implied by the digest length. This module provides:
//! - Mapping digest lengths to SHA-1, SHA-256 and SHA-384
//! - Comparing event payloads against the recorded event digest
//! - The null-terminated payload fallback used for bootloader strings
//! - Register extension (`H(register || digest)`)

use std::fmt;
use openssl::hash::{Hasher, MessageDigest};
use serde::{Deserialize, Serialize};
use crate::error::VerifierError;
use crate::event::Event;

pub const SHA1_DIGEST_SIZE: usize = 20;
pub const SHA256_DIGEST_SIZE: usize = 32;
pub const SHA384_DIGEST_SIZE: usize = 48;

/// Hash algorithms a measurement register bank may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
}

impl HashAlgorithm {
    /// Select the algorithm implied by a digest length
    ///
    /// # Errors
    /// * `VerifierError::UnsupportedDigestLength` - For every length other than 20, 32 or 48 bytes
    pub fn from_digest_len(len: usize) -> Result<Self, VerifierError> {
        match len {
            SHA1_DIGEST_SIZE => Ok(Self::Sha1),
            SHA256_DIGEST_SIZE => Ok(Self::Sha256),
            SHA384_DIGEST_SIZE => Ok(Self::Sha384),
            other => Err(VerifierError::UnsupportedDigestLength(other)),
        }
    }

    pub fn digest_size(&self) -> usize {
        match self {
            Self::Sha1 => SHA1_DIGEST_SIZE,
            Self::Sha256 => SHA256_DIGEST_SIZE,
            Self::Sha384 => SHA384_DIGEST_SIZE,
        }
    }

    fn message_digest(&self) -> MessageDigest {
        match self {
            Self::Sha1 => MessageDigest::sha1(),
            Self::Sha256 => MessageDigest::sha256(),
            Self::Sha384 => MessageDigest::sha384(),
        }
    }

    /// Hash the concatenation of all `parts`
    pub fn hash(&self, parts: &[&[u8]]) -> Result<Vec<u8>, VerifierError> {
        let mut hasher = Hasher::new(self.message_digest())
            .map_err(|e| VerifierError::InternalError(format!("Failed to create hasher: {}", e)))?;
        for part in parts {
            hasher.update(part)
                .map_err(|e| VerifierError::InternalError(format!("Failed to update hasher: {}", e)))?;
        }
        let digest = hasher.finish()
            .map_err(|e| VerifierError::InternalError(format!("Failed to finish hasher: {}", e)))?;
        Ok(digest.to_vec())
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha384 => write!(f, "sha384"),
        }
    }
}

/// Check that `data` hashes to the digest recorded in `event`
///
/// # Errors
/// * `VerifierError::EmptyDigest` - The event carries no digest
/// * `VerifierError::UnsupportedDigestLength` - The digest length implies no known algorithm
/// * `VerifierError::DigestMismatch` - The hash of `data` differs from the recorded digest
pub fn digest_matches(event: &Event, data: &[u8]) -> Result<(), VerifierError> {
    digest_equals(&event.digest, data)
}

/// Same as [`digest_matches`] for a bare digest
pub fn digest_equals(digest: &[u8], data: &[u8]) -> Result<(), VerifierError> {
    if digest.is_empty() {
        return Err(VerifierError::EmptyDigest);
    }
    let algorithm = HashAlgorithm::from_digest_len(digest.len())?;
    if algorithm.hash(&[data])? == digest {
        Ok(())
    } else {
        Err(VerifierError::DigestMismatch(digest.len()))
    }
}

/// Check the digest of a NUL-terminated payload
///
/// Some firmware and bootloaders measure strings including their terminator, others
/// without it. The full buffer is tried first and the buffer without the trailing NUL
/// only when that fails.
///
/// # Errors
/// * `VerifierError::NotNullTerminated` - `data` is empty or its last byte is not NUL
/// * Any error of [`digest_equals`] for the stripped attempt
pub fn null_terminated_digest_matches(data: &[u8], digest: &[u8]) -> Result<(), VerifierError> {
    match data.last() {
        Some(0) => {}
        _ => return Err(VerifierError::NotNullTerminated),
    }
    match digest_equals(digest, data) {
        Ok(()) => Ok(()),
        Err(VerifierError::DigestMismatch(_)) => {
            digest_equals(digest, &data[..data.len() - 1])?;
            log::debug!("Digest of {} byte payload matched without its trailing NUL", data.len());
            Ok(())
        },
        Err(e) => Err(e),
    }
}

/// Extend a register value: `H(register || digest)`
pub fn extend(algorithm: HashAlgorithm, register: &[u8], digest: &[u8]) -> Result<Vec<u8>, VerifierError> {
    algorithm.hash(&[register, digest])
}
