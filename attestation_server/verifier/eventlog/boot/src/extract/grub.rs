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

//! GRUB measurements
//!
//! GRUB measures every executed command as an `EV_IPL` event whose data is a prefix followed
//! by the NUL-terminated command, the digest covers the command only. Loaded files are
//! measured by content, their `EV_IPL` data is the file name.

use eventlog_common_verifier::{null_terminated_digest_matches, Event, EventType, VerifierError};
use crate::register_config::{GrubDecoder, RegisterConfig, RoleDecoder};
use crate::state::{GrubFile, GrubState};

pub const ROLE: &str = "grub";

pub const GRUB_COMMAND_PREFIX: &[u8] = b"grub_cmd: ";
pub const KERNEL_CMDLINE_PREFIX: &[u8] = b"kernel_cmdline: ";
pub const GRUB_KERNEL_CMDLINE_PREFIX: &[u8] = b"grub_kernel_cmdline ";

const COMMAND_PREFIXES: [&[u8]; 3] = [GRUB_COMMAND_PREFIX, KERNEL_CMDLINE_PREFIX, GRUB_KERNEL_CMDLINE_PREFIX];

impl RoleDecoder for GrubDecoder {
    type Output = GrubState;

    fn decode(&self, events: &[Event], config: &RegisterConfig) -> Result<GrubState, VerifierError> {
        let mut state = GrubState::default();
        let registers = [config.grub_cmd_index, config.grub_file_index];
        for event in ipl_events(events, &registers, ROLE)? {
            match self {
                Self::TpmLog => {
                    if event.index == config.grub_cmd_index {
                        state.commands.push(verified_command(event)?);
                    } else if event.index == config.grub_file_index {
                        state.files.push(file(event));
                    }
                },
                Self::RtmrLog => {
                    if event.index != config.grub_cmd_index {
                        continue;
                    }
                    if command_prefix_len(&event.data).is_some() {
                        state.commands.push(verified_command(event)?);
                    } else {
                        state.files.push(file(event));
                    }
                },
            }
        }

        if state.commands.is_empty() && state.files.is_empty() {
            return Err(VerifierError::MissingEvents {
                role: ROLE.to_string(),
                reason: format!("no GRUB measurements in {} registers", config.name),
            });
        }
        Ok(state)
    }
}

/// `EV_IPL` events measured into `registers`, in log order
///
/// The event type is not covered by the digest. Any other extended type on a GRUB register
/// is an error.
pub(crate) fn ipl_events<'a>(
    events: &'a [Event],
    registers: &[u32],
    role: &str,
) -> Result<Vec<&'a Event>, VerifierError> {
    let mut ipl = Vec::new();
    for event in events.iter().filter(|e| registers.contains(&e.index)) {
        match event.event_type {
            EventType::EvIpl => ipl.push(event),
            // not extended, replay never covered it
            EventType::EvNoAction => {},
            other => {
                return Err(VerifierError::InvalidEvent {
                    role: role.to_string(),
                    sequence: event.sequence,
                    reason: format!(
                        "invalid event type {:#010x} ({}) on register {}, expected EV_IPL",
                        event.raw_type, other, event.index
                    ),
                });
            },
        }
    }
    Ok(ipl)
}

/// Length of the command prefix `data` starts with
pub fn command_prefix_len(data: &[u8]) -> Option<usize> {
    COMMAND_PREFIXES
        .iter()
        .find(|prefix| data.starts_with(prefix))
        .map(|prefix| prefix.len())
}

/// Verify a command event against its digest and return the command with its prefix
pub(crate) fn verified_command(event: &Event) -> Result<String, VerifierError> {
    let invalid = |reason: String| VerifierError::InvalidEvent {
        role: ROLE.to_string(),
        sequence: event.sequence,
        reason,
    };
    let prefix_len = command_prefix_len(&event.data)
        .ok_or_else(|| invalid(format!(
            "invalid prefix for register {} command: {}", event.index, String::from_utf8_lossy(&event.data)
        )))?;
    null_terminated_digest_matches(&event.data[prefix_len..], &event.digest)
        .map_err(|e| invalid(format!("invalid GRUB command (null-terminated): {}", e)))?;
    Ok(text(&event.data))
}

fn file(event: &Event) -> GrubFile {
    GrubFile {
        digest: hex::encode(&event.digest),
        untrusted_filename: text(&event.data),
    }
}

fn text(data: &[u8]) -> String {
    let end = data.iter().rposition(|b| *b != 0).map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&data[..end]).to_string()
}
