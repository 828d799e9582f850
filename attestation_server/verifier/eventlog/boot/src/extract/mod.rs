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

//! Firmware state extraction
//!
//! Each role reads the events of its registers from a [`VerifiedEventLog`] and checks the
//! digest of every payload it decodes. A state is only returned when every role succeeded.

pub mod efi;
pub mod grub;
pub mod linux_kernel;
pub mod platform;
pub mod secure_boot;

use eventlog_common_verifier::{digest_matches, Event, EventLog, RegisterBank, VerifierError};
use crate::options::{ExtractOpts, Loader};
use crate::register_config::{RegisterConfig, RoleDecoder, Technology};
use crate::replay::{replay, ReplayOpts, VerifiedEventLog};
use crate::state::FirmwareLogState;

const SEPARATOR_DATA: [u8; 4] = [0; 4];

/// Extract the firmware state of a replayed log
///
/// # Errors
/// * `VerifierError::UnsupportedLoader` - `opts.loader` is not a supported bootloader,
///   reported before any event is decoded
/// * `VerifierError::InputError` - `verified` was replayed with a different register layout
/// * `VerifierError::MissingEvents` / `VerifierError::InvalidEvent` - A role is missing or one
///   of its events fails verification or decoding
pub fn extract(
    verified: &VerifiedEventLog,
    config: &RegisterConfig,
    opts: &ExtractOpts,
) -> Result<FirmwareLogState, VerifierError> {
    if opts.loader != Loader::Grub {
        return Err(VerifierError::UnsupportedLoader(opts.loader.to_string()));
    }
    if verified.log_type() != config.log_type {
        return Err(VerifierError::InputError(format!(
            "event log was replayed as {:?}, cannot extract it as {}", verified.log_type(), config.name
        )));
    }

    let events = verified.events();
    let platform = config.platform_decoder.decode(events, config)?;
    let secure_boot = secure_boot::secure_boot_state(events, config, opts)?;
    let efi = efi::efi_state(events, config, opts)?;
    let grub = config.grub_decoder.decode(events, config)?;
    let linux_kernel = linux_kernel::linux_kernel_state(events, config)?;

    log::info!(
        "Extracted {} firmware state: secure boot enabled {}, {} GRUB commands, {} GRUB files",
        config.name, secure_boot.enabled, grub.commands.len(), grub.files.len()
    );
    Ok(FirmwareLogState {
        platform,
        secure_boot,
        efi,
        grub,
        linux_kernel,
        log_type: config.log_type,
    })
}

/// Replay `log` against `bank` with the register layout of `technology`, then extract
pub fn replay_and_extract(
    log: &EventLog,
    bank: &RegisterBank,
    technology: Technology,
    opts: &ExtractOpts,
) -> Result<FirmwareLogState, VerifierError> {
    let config = technology.register_config();
    let verified = replay(log, bank, config, &ReplayOpts::default())?;
    extract(&verified, config, opts)
}

/// A separator must carry four zero bytes and hash to its digest
pub(crate) fn check_separator(event: &Event) -> Result<(), VerifierError> {
    if event.data != SEPARATOR_DATA {
        return Err(VerifierError::InputError(
            format!("invalid separator data {}", hex::encode(&event.data))
        ));
    }
    digest_matches(event, &event.data)
}
