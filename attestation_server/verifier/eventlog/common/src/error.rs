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

//! Verifier error definitions shared by the replay and extraction crates.

use thiserror::Error;

/// Coarse classification of a [`VerifierError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input handed to a verifier primitive
    Precondition,
    /// The event log does not reproduce the register bank
    ReplayIntegrity,
    /// A decoded role is missing, unsupported or carries unverifiable data
    ExtractionContent,
    /// Failure of the underlying crypto library
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("Input error: {0}")]
    InputError(String),

    #[error("no digests present")]
    EmptyDigest,

    #[error("cannot compare hash of length {0}")]
    UnsupportedDigestLength(usize),

    #[error("given data is not null-terminated")]
    NotNullTerminated,

    #[error("digest (len {0}) does not match")]
    DigestMismatch(usize),

    #[error("duplicate separator at event {sequence} in register {index}")]
    DuplicateSeparator { index: u32, sequence: u32 },

    #[error("register {index} replay mismatch after event {last_event}: expected {expected}, replayed {replayed}")]
    ReplayMismatch {
        index: u32,
        last_event: u32,
        expected: String,
        replayed: String,
    },

    #[error("register {index} is extended by the event log but has no entry in the register bank")]
    MissingBankEntry { index: u32 },

    #[error("register bank entry {index} is not extended by any event in the log")]
    UnusedBankEntry { index: u32 },

    #[error("Invalid register bank: {0}")]
    InvalidBank(String),

    #[error("unsupported loader: {0}")]
    UnsupportedLoader(String),

    #[error("no {role} events found: {reason}")]
    MissingEvents { role: String, reason: String },

    #[error("invalid {role} event {sequence}: {reason}")]
    InvalidEvent {
        role: String,
        sequence: u32,
        reason: String,
    },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl VerifierError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputError(_)
            | Self::EmptyDigest
            | Self::UnsupportedDigestLength(_)
            | Self::NotNullTerminated => ErrorKind::Precondition,
            Self::DuplicateSeparator { .. }
            | Self::ReplayMismatch { .. }
            | Self::MissingBankEntry { .. }
            | Self::UnusedBankEntry { .. }
            | Self::InvalidBank(_) => ErrorKind::ReplayIntegrity,
            Self::DigestMismatch(_)
            | Self::UnsupportedLoader(_)
            | Self::MissingEvents { .. }
            | Self::InvalidEvent { .. } => ErrorKind::ExtractionContent,
            Self::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Attach role and event context to an error raised while decoding a role
    pub fn in_event(self, role: &str, sequence: u32) -> Self {
        match self {
            Self::InvalidEvent { .. } | Self::MissingEvents { .. } | Self::InternalError(_) => self,
            other => Self::InvalidEvent {
                role: role.to_string(),
                sequence,
                reason: other.to_string(),
            },
        }
    }
}
