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

use std::collections::HashSet;
use uuid::Uuid;
use eventlog_common_verifier::{digest_matches, Event, EventType, VerifierError};
use crate::extract::check_separator;
use crate::options::ExtractOpts;
use crate::register_config::RegisterConfig;
use crate::state::{MeasuredVariable, SecureBootState, SignatureDatabase};
use crate::uefi::{
    parse_authority, parse_signature_lists, parse_variable_data, UefiVariableData,
    VAR_DB, VAR_DBX, VAR_KEK, VAR_PK, VAR_SECURE_BOOT,
};

pub const ROLE: &str = "secure boot";

const DEBUG_MODE_ACTION: &[u8] = b"UEFI Debug Mode";
// measured by shim as authorities, they carry no signature data
const SHIM_AUTHORITY_VARIABLES: &[&str] = &["SbatLevel", "MokListTrusted"];

/// Decode the secure boot register
///
/// # Errors
/// * `VerifierError::InvalidEvent` - An event of a type the register may not carry, a payload
///   that fails digest verification or decoding, a variable measured twice, a bad separator,
///   or a SecureBoot variable whose data is not one byte
/// * `VerifierError::MissingEvents` - The SecureBoot variable is missing or empty and
///   `opts.allow_empty_sb_var` is not set
pub fn secure_boot_state(
    events: &[Event],
    config: &RegisterConfig,
    opts: &ExtractOpts,
) -> Result<SecureBootState, VerifierError> {
    let mut state = SecureBootState::default();
    let mut seen_separator = false;
    let mut seen_variables: HashSet<(Uuid, String)> = HashSet::new();
    let mut secure_boot_var: Option<(u32, Vec<u8>)> = None;

    for event in events.iter().filter(|e| e.index == config.secure_boot_index) {
        let sequence = event.sequence;
        match event.event_type {
            EventType::EvSeparator => {
                // at most one, replay rejects a second separator
                check_separator(event).map_err(|e| e.in_event(ROLE, sequence))?;
                seen_separator = true;
            },
            EventType::EvEfiVariableDriverConfig => {
                let variable = verified_variable(event)?;
                if !seen_variables.insert((variable.guid, variable.name.clone())) {
                    return Err(invalid(sequence, format!("variable {} measured twice", variable.name)));
                }
                decode_driver_config(&variable, &mut state)
                    .map_err(|e| e.in_event(ROLE, sequence))?;
                if variable.is_global(VAR_SECURE_BOOT) {
                    secure_boot_var = Some((sequence, variable.data.clone()));
                }
                state.variables.push(measured(&variable));
            },
            EventType::EvEfiVariableAuthority => {
                let variable = verified_variable(event)?;
                if SHIM_AUTHORITY_VARIABLES.contains(&variable.name.as_str()) {
                    log::debug!("Authority variable {} at event {} is not decoded", variable.name, sequence);
                } else {
                    let authority = parse_authority(&variable.data)
                        .map_err(|e| e.in_event(ROLE, sequence))?;
                    let target = if seen_separator {
                        &mut state.authority
                    } else {
                        &mut state.pre_separator_authority
                    };
                    merge(target, authority);
                }
                state.variables.push(measured(&variable));
            },
            EventType::EvEfiAction => {
                digest_matches(event, &event.data).map_err(|e| e.in_event(ROLE, sequence))?;
                if event.data == DEBUG_MODE_ACTION {
                    state.debug_mode = true;
                }
            },
            other if config.is_additional_secure_boot_event(other) => {
                log::warn!("Skipping {} event {} on {} register {}", other, sequence, config.name, event.index);
            },
            other => {
                return Err(invalid(sequence, format!("unexpected event type {:#010x} ({})", event.raw_type, other)));
            },
        }
    }

    state.enabled = match secure_boot_var {
        Some((sequence, data)) if data.len() > 1 => {
            return Err(invalid(sequence, format!("SecureBoot variable data has {} bytes", data.len())));
        },
        Some((_, data)) if data.len() == 1 => data[0] == 1,
        Some(_) | None if opts.allow_empty_sb_var => false,
        Some(_) => {
            return Err(missing("SecureBoot variable is empty"));
        },
        None => {
            return Err(missing("SecureBoot variable was not measured"));
        },
    };
    Ok(state)
}

fn verified_variable(event: &Event) -> Result<UefiVariableData, VerifierError> {
    digest_matches(event, &event.data)
        .and_then(|_| parse_variable_data(&event.data))
        .map_err(|e| e.in_event(ROLE, event.sequence))
}

fn decode_driver_config(variable: &UefiVariableData, state: &mut SecureBootState) -> Result<(), VerifierError> {
    if variable.is_global(VAR_PK) {
        state.pk = parse_signature_lists(&variable.data)?;
    } else if variable.is_global(VAR_KEK) {
        state.kek = parse_signature_lists(&variable.data)?;
    } else if variable.is_image_security_database(VAR_DB) {
        state.db = parse_signature_lists(&variable.data)?;
    } else if variable.is_image_security_database(VAR_DBX) {
        state.dbx = parse_signature_lists(&variable.data)?;
    }
    Ok(())
}

fn merge(target: &mut SignatureDatabase, source: SignatureDatabase) {
    target.certs.extend(source.certs);
    target.hashes.extend(source.hashes);
}

fn measured(variable: &UefiVariableData) -> MeasuredVariable {
    MeasuredVariable {
        guid: variable.guid.to_string(),
        name: variable.name.clone(),
        data: hex::encode(&variable.data),
    }
}

fn invalid(sequence: u32, reason: String) -> VerifierError {
    VerifierError::InvalidEvent { role: ROLE.to_string(), sequence, reason }
}

fn missing(reason: &str) -> VerifierError {
    VerifierError::MissingEvents { role: ROLE.to_string(), reason: reason.to_string() }
}
