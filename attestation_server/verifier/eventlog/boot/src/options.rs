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

use std::fmt;
use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use eventlog_common_verifier::VerifierError;

/// Bootloader the extraction expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    #[default]
    Unsupported,
    Grub,
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "unsupported"),
            Self::Grub => write!(f, "grub"),
        }
    }
}

/// Extraction options
///
/// Example YAML:
/// ```yaml
/// loader: grub
/// allow_empty_sb_var: true
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOpts {
    pub loader: Loader,
    /// Accept a log whose SecureBoot variable is missing or empty, secure boot is then
    /// reported as disabled
    pub allow_empty_sb_var: bool,
    /// Accept EFI applications measured before the boot option calling event
    pub allow_efi_app_before_calling_event: bool,
}

impl ExtractOpts {
    pub fn grub() -> Self {
        Self { loader: Loader::Grub, ..Self::default() }
    }

    pub fn from_json(json: &serde_json::Value) -> Result<Self, VerifierError> {
        serde_json::from_value(json.clone())
            .map_err(|e| VerifierError::InputError(format!("Failed to parse extract options: {}", e)))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, VerifierError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| VerifierError::InputError(format!("Failed to parse extract options: {}", e)))
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, VerifierError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| VerifierError::InputError(
                format!("Failed to read {}: {}", path.as_ref().display(), e)
            ))?;
        Self::from_yaml_str(&content)
    }
}
