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

//! Technology specific register layout
//!
//! Register indices below use the numbering found in the event log: PCR index for TCG2 logs,
//! CC MR index for CCEL logs. On TDX, CC MR `n` is RTMR `n - 1` and CC MR 0 is MRTD, which is
//! never part of the RTMR bank.
//!
//! | Role               | PCR | CC MR            |
//! |--------------------|-----|------------------|
//! | firmware driver    | 2   | 2 (RTMR1)        |
//! | secure boot        | 7   | 1 (RTMR0)        |
//! | EFI application    | 4   | 2 (RTMR1)        |
//! | exit boot services | 5   | 2 (RTMR1)        |
//! | GRUB command       | 8   | 3 (RTMR2)        |
//! | GRUB file          | 9   | 3 (RTMR2)        |

use std::fmt;
use serde::{Deserialize, Serialize};
use eventlog_common_verifier::{Event, EventType, VerifierError};

/// Measurement register technology of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Pcr,
    Rtmr,
}

impl Technology {
    pub fn register_config(&self) -> &'static RegisterConfig {
        match self {
            Self::Pcr => &TPM_REGISTER_CONFIG,
            Self::Rtmr => &RTMR_REGISTER_CONFIG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    Tcg2,
    Cc,
}

/// Confidential computing technology a platform reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidentialTechnology {
    #[default]
    None,
    AmdSev,
    AmdSevEs,
    IntelTdx,
    AmdSevSnp,
}

impl ConfidentialTechnology {
    /// Map the technology byte of a non-host info event
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::AmdSev),
            2 => Some(Self::AmdSevEs),
            3 => Some(Self::IntelTdx),
            4 => Some(Self::AmdSevSnp),
            _ => None,
        }
    }
}

impl fmt::Display for ConfidentialTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::AmdSev => "AMD_SEV",
            Self::AmdSevEs => "AMD_SEV_ES",
            Self::IntelTdx => "INTEL_TDX",
            Self::AmdSevSnp => "AMD_SEV_SNP",
        };
        f.write_str(name)
    }
}

/// Decodes the events of one role into a state record
///
/// Implemented by the plain-data decoder selectors carried in a [`RegisterConfig`], so the
/// decoder of each technology is picked by a `match` rather than a trait object.
pub trait RoleDecoder {
    type Output;

    /// # Arguments
    /// * `events` - Replay-verified events of the whole log, in log order
    /// * `config` - Register layout the events were measured with
    fn decode(&self, events: &[Event], config: &RegisterConfig) -> Result<Self::Output, VerifierError>;
}

/// Bootloader state decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrubDecoder {
    /// Commands and files measured into separate registers
    TpmLog,
    /// Commands and files share one register and are told apart by payload prefix
    RtmrLog,
}

/// Platform state decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformDecoder {
    /// Decode the firmware version and technology from the platform firmware events
    FirmwareEvents,
    /// The technology is implied by the log format
    Constant(ConfidentialTechnology),
}

/// How log register indices map onto register bank indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankNumbering {
    /// Bank index equals log index
    Identity,
    /// Bank index is log index - 1, log index 0 has no bank entry
    CcMeasurementRegister,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterConfig {
    pub name: &'static str,
    pub firmware_driver_index: u32,
    pub secure_boot_index: u32,
    pub efi_app_index: u32,
    pub exit_boot_services_index: u32,
    pub grub_cmd_index: u32,
    pub grub_file_index: u32,
    pub grub_decoder: GrubDecoder,
    pub platform_decoder: PlatformDecoder,
    /// Event types also accepted on the secure boot register, skipped without decoding
    pub additional_secure_boot_events: &'static [EventType],
    /// Event types accepted on the EFI application and exit boot services registers besides
    /// separators, actions and boot applications. Skipped unless the register is also the
    /// firmware driver register.
    pub additional_efi_events: &'static [EventType],
    pub log_type: LogType,
    pub bank_numbering: BankNumbering,
    /// Register whose initial value carries the TPM startup locality
    pub locality_index: Option<u32>,
}

/// Register layout of TPM event logs
pub const TPM_REGISTER_CONFIG: RegisterConfig = RegisterConfig {
    name: "PCR",
    firmware_driver_index: 2,
    secure_boot_index: 7,
    efi_app_index: 4,
    exit_boot_services_index: 5,
    grub_cmd_index: 8,
    grub_file_index: 9,
    grub_decoder: GrubDecoder::TpmLog,
    platform_decoder: PlatformDecoder::FirmwareEvents,
    // PCR 7 only carries types the secure boot decoder handles itself
    additional_secure_boot_events: &[],
    // PCR 5 carries the GPT of the boot disk
    additional_efi_events: &[EventType::EvEfiGptEvent, EventType::EvEfiGptEvent2],
    log_type: LogType::Tcg2,
    bank_numbering: BankNumbering::Identity,
    locality_index: Some(0),
};

/// Register layout of CCEL event logs on RTMR platforms
pub const RTMR_REGISTER_CONFIG: RegisterConfig = RegisterConfig {
    name: "RTMR",
    firmware_driver_index: 2,
    secure_boot_index: 1,
    efi_app_index: 2,
    exit_boot_services_index: 2,
    grub_cmd_index: 3,
    grub_file_index: 3,
    grub_decoder: GrubDecoder::RtmrLog,
    platform_decoder: PlatformDecoder::Constant(ConfidentialTechnology::IntelTdx),
    // RTMR0 folds PCR 1 into PCR 7, see "Table 27 Events" of the TCG PC Client
    // Platform Firmware Profile. EDK2 also measures firmware blob 2 events there.
    additional_secure_boot_events: &[
        EventType::EvCpuMicrocode,
        EventType::EvPlatformConfigFlags,
        EventType::EvTableOfDevices,
        EventType::EvNonhostConfig,
        EventType::EvEfiVariableDriverConfig,
        EventType::EvEfiVariableBoot,
        EventType::EvEfiAction,
        EventType::EvEfiHandoffTables2,
        EventType::EvEfiVariableBoot2,
        EventType::EvEfiPlatformFirmwareBlob2,
    ],
    // RTMR1 folds PCR 2 to 5
    additional_efi_events: &[
        EventType::EvEfiBootServicesDriver,
        EventType::EvEfiRuntimeServicesDriver,
        EventType::EvEfiPlatformFirmwareBlob,
        EventType::EvEfiPlatformFirmwareBlob2,
        EventType::EvEfiGptEvent,
        EventType::EvEfiGptEvent2,
    ],
    log_type: LogType::Cc,
    bank_numbering: BankNumbering::CcMeasurementRegister,
    locality_index: None,
};

impl RegisterConfig {
    /// Bank index holding the final value of log register `log_index`
    pub fn bank_index(&self, log_index: u32) -> Option<u32> {
        match self.bank_numbering {
            BankNumbering::Identity => Some(log_index),
            BankNumbering::CcMeasurementRegister => log_index.checked_sub(1),
        }
    }

    /// Log register index whose final value is stored at `bank_index`
    pub fn log_index(&self, bank_index: u32) -> Option<u32> {
        match self.bank_numbering {
            BankNumbering::Identity => Some(bank_index),
            BankNumbering::CcMeasurementRegister => bank_index.checked_add(1),
        }
    }

    pub fn is_additional_secure_boot_event(&self, event_type: EventType) -> bool {
        self.additional_secure_boot_events.contains(&event_type)
    }

    pub fn is_additional_efi_event(&self, event_type: EventType) -> bool {
        self.additional_efi_events.contains(&event_type)
    }

    /// Value a register holds before its first extend
    ///
    /// TPM PCR 17 to 22 reset to all ones, the locality register carries the startup
    /// locality in its last byte. Every other register starts at zero.
    pub fn initial_value(&self, log_index: u32, digest_size: usize, locality: u8) -> Vec<u8> {
        let fill = match self.bank_numbering {
            BankNumbering::Identity if (17..=22).contains(&log_index) => 0xffu8,
            _ => 0u8,
        };
        let mut value = vec![fill; digest_size];
        if self.locality_index == Some(log_index) {
            if let Some(last) = value.last_mut() {
                *last = locality;
            }
        }
        value
    }
}
