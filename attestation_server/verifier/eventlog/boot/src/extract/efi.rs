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

//! EFI drivers and boot applications
//!
//! Applications are trusted up to the ExitBootServices() request. The state is only reported
//! once the boot attempt, both separators and the exit boot services action were all seen.

use eventlog_common_verifier::{digest_matches, Event, EventType, VerifierError};
use crate::extract::check_separator;
use crate::options::ExtractOpts;
use crate::register_config::RegisterConfig;
use crate::state::{EfiApp, EfiState};

pub const ROLE: &str = "efi";

pub const CALLING_EFI_APPLICATION: &[u8] = b"Calling EFI Application from Boot Option";
pub const EXIT_BOOT_SERVICES_INVOCATION: &[u8] = b"Exit Boot Services Invocation";

#[derive(Default)]
struct Progress {
    app_separator: bool,
    exit_boot_services_separator: bool,
    calling_efi_application: bool,
    exit_boot_services: bool,
}

impl Progress {
    fn complete(&self) -> bool {
        self.app_separator
            && self.exit_boot_services_separator
            && self.calling_efi_application
            && self.exit_boot_services
    }
}

/// Collect EFI drivers and the applications of the boot attempt
///
/// Returns `None` when the log stops before boot services were exited.
pub fn efi_state(
    events: &[Event],
    config: &RegisterConfig,
    opts: &ExtractOpts,
) -> Result<Option<EfiState>, VerifierError> {
    let mut state = EfiState::default();
    let mut progress = Progress::default();

    for event in events {
        if event.index == config.firmware_driver_index {
            match event.event_type {
                EventType::EvEfiBootServicesDriver => state.boot_services_drivers.push(digest_of(event)),
                EventType::EvEfiRuntimeServicesDriver => state.runtime_services_drivers.push(digest_of(event)),
                _ => {},
            }
        }

        let on_app = event.index == config.efi_app_index;
        let on_exit_boot_services = event.index == config.exit_boot_services_index;
        if !on_app && !on_exit_boot_services {
            continue;
        }

        match event.event_type {
            EventType::EvSeparator => {
                // app and exit boot services roles may share one register and its separator.
                // Replay already rejected a second separator on any register.
                check_separator(event).map_err(|e| e.in_event(ROLE, event.sequence))?;
                progress.app_separator |= on_app;
                progress.exit_boot_services_separator |= on_exit_boot_services;
            },
            EventType::EvEfiAction => {
                digest_matches(event, &event.data).map_err(|e| e.in_event(ROLE, event.sequence))?;
                if on_app && event.data == CALLING_EFI_APPLICATION {
                    if progress.calling_efi_application {
                        return Err(invalid(event, "duplicate boot attempt"));
                    }
                    progress.calling_efi_application = true;
                }
                if on_exit_boot_services && event.data == EXIT_BOOT_SERVICES_INVOCATION {
                    progress.exit_boot_services = true;
                }
            },
            EventType::EvEfiBootServicesApplication if on_app => {
                if !progress.calling_efi_application && !opts.allow_efi_app_before_calling_event {
                    return Err(invalid(event, "EFI application measured before the boot option was called"));
                }
                state.apps.push(digest_of(event));
            },
            EventType::EvNoAction => {},
            other if config.is_additional_efi_event(other) => {},
            other => {
                return Err(invalid(event, &format!(
                    "unexpected event type {:#010x} ({}) on register {}", event.raw_type, other, event.index
                )));
            },
        }

        if progress.complete() {
            return Ok(Some(state));
        }
    }

    log::debug!("{} log ends before boot services were exited, no EFI state", config.name);
    Ok(None)
}

fn digest_of(event: &Event) -> EfiApp {
    EfiApp { digest: hex::encode(&event.digest) }
}

fn invalid(event: &Event, reason: &str) -> VerifierError {
    VerifierError::InvalidEvent {
        role: ROLE.to_string(),
        sequence: event.sequence,
        reason: reason.to_string(),
    }
}
