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

//! Parsed event log model
//!
//! Events are produced by an external TCG / CCEL deserializer. Only the fields needed for
//! replay and extraction are kept: sequence number, register index in log numbering,
//! event type, raw event data and the digest of the selected bank.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::digest::HashAlgorithm;
use crate::error::VerifierError;

/// TCG event types
///
/// Values from the TCG PC Client Platform Firmware Profile. Types the catalog does not know
/// are kept as `Unknown`, the raw value stays available on [`Event::raw_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum EventType {
    EvPrebootCert = 0x00000000,
    EvPostCode = 0x00000001,
    EvUnused = 0x00000002,
    EvNoAction = 0x00000003,
    EvSeparator = 0x00000004,
    EvAction = 0x00000005,
    EvEventTag = 0x00000006,
    EvSCrtmContents = 0x00000007,
    EvSCrtmVersion = 0x00000008,
    EvCpuMicrocode = 0x00000009,
    EvPlatformConfigFlags = 0x0000000A,
    EvTableOfDevices = 0x0000000B,
    EvCompactHash = 0x0000000C,
    EvIpl = 0x0000000D,
    EvIplPartitionData = 0x0000000E,
    EvNonhostCode = 0x0000000F,
    EvNonhostConfig = 0x00000010,
    EvNonhostInfo = 0x00000011,
    EvOmitBootDeviceEvents = 0x00000012,
    EvPostCode2 = 0x00000013,

    // EFI specific event types
    EvEfiEventBase = 0x80000000,
    EvEfiVariableDriverConfig = 0x80000001,
    EvEfiVariableBoot = 0x80000002,
    EvEfiBootServicesApplication = 0x80000003,
    EvEfiBootServicesDriver = 0x80000004,
    EvEfiRuntimeServicesDriver = 0x80000005,
    EvEfiGptEvent = 0x80000006,
    EvEfiAction = 0x80000007,
    EvEfiPlatformFirmwareBlob = 0x80000008,
    EvEfiHandoffTables = 0x80000009,
    EvEfiPlatformFirmwareBlob2 = 0x8000000A,
    EvEfiHandoffTables2 = 0x8000000B,
    EvEfiVariableBoot2 = 0x8000000C,
    EvEfiGptEvent2 = 0x8000000D,
    EvEfiHcrtmEvent = 0x80000010,

    EvEfiVariableAuthority = 0x800000E0,
    EvEfiSpdmFirmwareBlob = 0x800000E1,
    EvEfiSpdmFirmwareConfig = 0x800000E2,
    EvEfiSpdmDevicePolicy = 0x800000E3,
    EvEfiSpdmDeviceAuthority = 0x800000E4,
    Unknown = 0xFFFFFFFF,
}

const ALL_EVENT_TYPES: &[EventType] = &[
    EventType::EvPrebootCert,
    EventType::EvPostCode,
    EventType::EvUnused,
    EventType::EvNoAction,
    EventType::EvSeparator,
    EventType::EvAction,
    EventType::EvEventTag,
    EventType::EvSCrtmContents,
    EventType::EvSCrtmVersion,
    EventType::EvCpuMicrocode,
    EventType::EvPlatformConfigFlags,
    EventType::EvTableOfDevices,
    EventType::EvCompactHash,
    EventType::EvIpl,
    EventType::EvIplPartitionData,
    EventType::EvNonhostCode,
    EventType::EvNonhostConfig,
    EventType::EvNonhostInfo,
    EventType::EvOmitBootDeviceEvents,
    EventType::EvPostCode2,
    EventType::EvEfiEventBase,
    EventType::EvEfiVariableDriverConfig,
    EventType::EvEfiVariableBoot,
    EventType::EvEfiBootServicesApplication,
    EventType::EvEfiBootServicesDriver,
    EventType::EvEfiRuntimeServicesDriver,
    EventType::EvEfiGptEvent,
    EventType::EvEfiAction,
    EventType::EvEfiPlatformFirmwareBlob,
    EventType::EvEfiHandoffTables,
    EventType::EvEfiPlatformFirmwareBlob2,
    EventType::EvEfiHandoffTables2,
    EventType::EvEfiVariableBoot2,
    EventType::EvEfiGptEvent2,
    EventType::EvEfiHcrtmEvent,
    EventType::EvEfiVariableAuthority,
    EventType::EvEfiSpdmFirmwareBlob,
    EventType::EvEfiSpdmFirmwareConfig,
    EventType::EvEfiSpdmDevicePolicy,
    EventType::EvEfiSpdmDeviceAuthority,
];

impl EventType {
    pub fn from_u32(value: u32) -> Self {
        ALL_EVENT_TYPES
            .iter()
            .copied()
            .find(|t| *t as u32 == value)
            .unwrap_or(Self::Unknown)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::EvPrebootCert => "EV_PREBOOT_CERT",
            Self::EvPostCode => "EV_POST_CODE",
            Self::EvUnused => "EV_UNUSED",
            Self::EvNoAction => "EV_NO_ACTION",
            Self::EvSeparator => "EV_SEPARATOR",
            Self::EvAction => "EV_ACTION",
            Self::EvEventTag => "EV_EVENT_TAG",
            Self::EvSCrtmContents => "EV_S_CRTM_CONTENTS",
            Self::EvSCrtmVersion => "EV_S_CRTM_VERSION",
            Self::EvCpuMicrocode => "EV_CPU_MICROCODE",
            Self::EvPlatformConfigFlags => "EV_PLATFORM_CONFIG_FLAGS",
            Self::EvTableOfDevices => "EV_TABLE_OF_DEVICES",
            Self::EvCompactHash => "EV_COMPACT_HASH",
            Self::EvIpl => "EV_IPL",
            Self::EvIplPartitionData => "EV_IPL_PARTITION_DATA",
            Self::EvNonhostCode => "EV_NONHOST_CODE",
            Self::EvNonhostConfig => "EV_NONHOST_CONFIG",
            Self::EvNonhostInfo => "EV_NONHOST_INFO",
            Self::EvOmitBootDeviceEvents => "EV_OMIT_BOOT_DEVICE_EVENTS",
            Self::EvPostCode2 => "EV_POST_CODE2",
            Self::EvEfiEventBase => "EV_EFI_EVENT_BASE",
            Self::EvEfiVariableDriverConfig => "EV_EFI_VARIABLE_DRIVER_CONFIG",
            Self::EvEfiVariableBoot => "EV_EFI_VARIABLE_BOOT",
            Self::EvEfiBootServicesApplication => "EV_EFI_BOOT_SERVICES_APPLICATION",
            Self::EvEfiBootServicesDriver => "EV_EFI_BOOT_SERVICES_DRIVER",
            Self::EvEfiRuntimeServicesDriver => "EV_EFI_RUNTIME_SERVICES_DRIVER",
            Self::EvEfiGptEvent => "EV_EFI_GPT_EVENT",
            Self::EvEfiAction => "EV_EFI_ACTION",
            Self::EvEfiPlatformFirmwareBlob => "EV_EFI_PLATFORM_FIRMWARE_BLOB",
            Self::EvEfiHandoffTables => "EV_EFI_HANDOFF_TABLES",
            Self::EvEfiPlatformFirmwareBlob2 => "EV_EFI_PLATFORM_FIRMWARE_BLOB2",
            Self::EvEfiHandoffTables2 => "EV_EFI_HANDOFF_TABLES2",
            Self::EvEfiVariableBoot2 => "EV_EFI_VARIABLE_BOOT2",
            Self::EvEfiGptEvent2 => "EV_EFI_GPT_EVENT2",
            Self::EvEfiHcrtmEvent => "EV_EFI_HCRTM_EVENT",
            Self::EvEfiVariableAuthority => "EV_EFI_VARIABLE_AUTHORITY",
            Self::EvEfiSpdmFirmwareBlob => "EV_EFI_SPDM_FIRMWARE_BLOB",
            Self::EvEfiSpdmFirmwareConfig => "EV_EFI_SPDM_FIRMWARE_CONFIG",
            Self::EvEfiSpdmDevicePolicy => "EV_EFI_SPDM_DEVICE_POLICY",
            Self::EvEfiSpdmDeviceAuthority => "EV_EFI_SPDM_DEVICE_AUTHORITY",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single measured event
///
/// # Fields
/// * `sequence` - Position of the event in the log, as numbered by the log parser
/// * `index` - Register index in the log's own numbering (PCR index, or CC MR index for CCEL)
/// * `event_type` - Catalogued event type
/// * `raw_type` - Event type value as read from the log
/// * `data` - Raw event data
/// * `digest` - Digest of the selected bank, its length implies the hash algorithm
#[derive(Clone, PartialEq, Eq)]
pub struct Event {
    pub sequence: u32,
    pub index: u32,
    pub event_type: EventType,
    pub raw_type: u32,
    pub data: Vec<u8>,
    pub digest: Vec<u8>,
}

impl Event {
    pub fn new(sequence: u32, index: u32, raw_type: u32, data: Vec<u8>, digest: Vec<u8>) -> Self {
        Self {
            sequence,
            index,
            event_type: EventType::from_u32(raw_type),
            raw_type,
            data,
            digest,
        }
    }

    /// Hash algorithm implied by the recorded digest
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm, VerifierError> {
        if self.digest.is_empty() {
            return Err(VerifierError::EmptyDigest);
        }
        HashAlgorithm::from_digest_len(self.digest.len())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("sequence", &self.sequence)
            .field("index", &self.index)
            .field("event_type", &self.event_type)
            .field("raw_type", &format_args!("{:#010x}", self.raw_type))
            .field("digest", &hex::encode(&self.digest))
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}

/// Ordered events, measurement order is replay order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events extending `index`, in log order
    pub fn events_for_index(&self, index: u32) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.index == index)
    }

    /// Distinct register indices used by the log, ascending
    pub fn indices(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self.events.iter().map(|e| e.index).collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl From<Vec<Event>> for EventLog {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}
