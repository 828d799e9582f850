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

//! Firmware state records handed to the policy layer
//!
//! Digests, hashes and certificates are hex encoded.

use serde::Serialize;
use serde_json::Value;
use eventlog_common_verifier::VerifierError;
use crate::register_config::{ConfidentialTechnology, LogType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FirmwareVersion {
    /// Version number of GCE virtual firmware
    GceVersion(u32),
    /// Raw S-CRTM version event data
    ScrtmVersionId(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<FirmwareVersion>,
    pub technology: ConfidentialTechnology,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    pub subject: String,
    pub der: String,
}

/// Content of a signature database or of a set of authority events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignatureDatabase {
    pub certs: Vec<Certificate>,
    pub hashes: Vec<String>,
}

impl SignatureDatabase {
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty() && self.hashes.is_empty()
    }
}

/// A UEFI variable measured into the secure boot register
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasuredVariable {
    pub guid: String,
    pub name: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecureBootState {
    pub enabled: bool,
    pub pk: SignatureDatabase,
    pub kek: SignatureDatabase,
    pub db: SignatureDatabase,
    pub dbx: SignatureDatabase,
    /// Authorities used to verify images before the separator, i.e. firmware drivers
    pub pre_separator_authority: SignatureDatabase,
    /// Authorities used to verify boot applications
    pub authority: SignatureDatabase,
    pub variables: Vec<MeasuredVariable>,
    pub debug_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrubFile {
    pub digest: String,
    /// File name as measured, not covered by the digest
    pub untrusted_filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GrubState {
    pub files: Vec<GrubFile>,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EfiApp {
    pub digest: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EfiState {
    pub apps: Vec<EfiApp>,
    pub boot_services_drivers: Vec<EfiApp>,
    pub runtime_services_drivers: Vec<EfiApp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinuxKernelState {
    pub command_line: String,
}

/// Everything extracted from one verified event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareLogState {
    pub platform: PlatformState,
    pub secure_boot: SecureBootState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efi: Option<EfiState>,
    pub grub: GrubState,
    pub linux_kernel: LinuxKernelState,
    pub log_type: LogType,
}

impl FirmwareLogState {
    pub fn to_json_value(&self) -> Result<Value, VerifierError> {
        serde_json::to_value(self)
            .map_err(|e| VerifierError::InternalError(format!("Failed to serialize firmware state: {}", e)))
    }
}
