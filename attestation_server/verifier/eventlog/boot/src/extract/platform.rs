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

//! Platform identity from the S-CRTM events
//!
//! Only events measured into the CRTM register before its separator are trusted.

use eventlog_common_verifier::{digest_matches, Event, EventType, VerifierError};
use crate::byte_reader::decode_ucs2;
use crate::extract::check_separator;
use crate::register_config::{ConfidentialTechnology, PlatformDecoder, RegisterConfig, RoleDecoder};
use crate::state::{FirmwareVersion, PlatformState};

pub const ROLE: &str = "platform";

/// Register holding the S-CRTM measurements
pub const CRTM_INDEX: u32 = 0;

const GCE_FIRMWARE_VERSION_PREFIX: &str = "GCE Virtual Firmware v";
const GCE_NON_HOST_INFO_SIGNATURE: &[u8] = b"GCE NonHostInfo\0";

impl RoleDecoder for PlatformDecoder {
    type Output = PlatformState;

    fn decode(&self, events: &[Event], _config: &RegisterConfig) -> Result<PlatformState, VerifierError> {
        match self {
            Self::FirmwareEvents => platform_state(events),
            Self::Constant(technology) => Ok(PlatformState { firmware: None, technology: *technology }),
        }
    }
}

fn platform_state(events: &[Event]) -> Result<PlatformState, VerifierError> {
    let mut version: Option<&[u8]> = None;
    let mut non_host_info: Option<&[u8]> = None;

    for event in events.iter().filter(|e| e.index == CRTM_INDEX) {
        match event.event_type {
            EventType::EvSeparator => {
                check_separator(event).map_err(|e| e.in_event(ROLE, event.sequence))?;
                break;
            },
            EventType::EvSCrtmVersion => {
                digest_matches(event, &event.data).map_err(|e| e.in_event(ROLE, event.sequence))?;
                version = Some(event.data.as_slice());
            },
            EventType::EvNonhostInfo => {
                digest_matches(event, &event.data).map_err(|e| e.in_event(ROLE, event.sequence))?;
                non_host_info = Some(event.data.as_slice());
            },
            _ => {},
        }
    }

    let firmware = version.map(|data| match gce_firmware_version(data) {
        Some(gce_version) => FirmwareVersion::GceVersion(gce_version),
        None => FirmwareVersion::ScrtmVersionId(hex::encode(data)),
    });
    let technology = non_host_info
        .and_then(gce_technology)
        .unwrap_or_default();
    Ok(PlatformState { firmware, technology })
}

/// Version number of a `GCE Virtual Firmware v<N>` UCS-2 S-CRTM version
pub fn gce_firmware_version(data: &[u8]) -> Option<u32> {
    decode_ucs2(data)
        .strip_prefix(GCE_FIRMWARE_VERSION_PREFIX)?
        .parse()
        .ok()
}

/// Technology byte following the GCE non-host info signature
pub fn gce_technology(data: &[u8]) -> Option<ConfidentialTechnology> {
    let technology = *data.strip_prefix(GCE_NON_HOST_INFO_SIGNATURE)?.first()?;
    let parsed = ConfidentialTechnology::from_u8(technology);
    if parsed.is_none() {
        log::warn!("Unknown confidential technology {} in non-host info", technology);
    }
    parsed
}
