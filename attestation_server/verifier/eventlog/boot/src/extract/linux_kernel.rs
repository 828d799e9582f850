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

use eventlog_common_verifier::{Event, VerifierError};
use crate::extract::grub::{ipl_events, verified_command, GRUB_KERNEL_CMDLINE_PREFIX, KERNEL_CMDLINE_PREFIX};
use crate::register_config::RegisterConfig;
use crate::state::LinuxKernelState;

pub const ROLE: &str = "linux kernel";

/// Kernel command line GRUB handed to Linux
///
/// GRUB configuration is UTF-8. An empty command line is reported when GRUB measured none.
pub fn linux_kernel_state(events: &[Event], config: &RegisterConfig) -> Result<LinuxKernelState, VerifierError> {
    let mut command_line: Option<String> = None;

    for event in ipl_events(events, &[config.grub_cmd_index], ROLE)? {
        let prefix_len = [KERNEL_CMDLINE_PREFIX, GRUB_KERNEL_CMDLINE_PREFIX]
            .iter()
            .find(|prefix| event.data.starts_with(prefix))
            .map(|prefix| prefix.len());
        let Some(prefix_len) = prefix_len else {
            continue;
        };
        if command_line.is_some() {
            return Err(VerifierError::InvalidEvent {
                role: ROLE.to_string(),
                sequence: event.sequence,
                reason: "more than one kernel command line in GRUB commands".to_string(),
            });
        }
        let command = verified_command(event)?;
        command_line = Some(command.get(prefix_len..).unwrap_or_default().to_string());
    }

    Ok(LinuxKernelState { command_line: command_line.unwrap_or_default() })
}
