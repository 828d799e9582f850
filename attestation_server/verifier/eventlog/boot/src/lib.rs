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

pub mod byte_reader;
pub mod extract;
pub mod options;
pub mod register_config;
pub mod replay;
pub mod state;
pub mod uefi;

pub use extract::{extract, replay_and_extract};
pub use options::{ExtractOpts, Loader};
pub use register_config::{
    ConfidentialTechnology, GrubDecoder, LogType, PlatformDecoder, RegisterConfig, RoleDecoder, Technology,
    RTMR_REGISTER_CONFIG, TPM_REGISTER_CONFIG,
};
pub use replay::{replay, ReplayOpts, ReplayResult, ReplayedRegister, VerifiedEventLog};
pub use state::{
    Certificate, EfiApp, EfiState, FirmwareLogState, FirmwareVersion, GrubFile, GrubState, LinuxKernelState,
    MeasuredVariable, PlatformState, SecureBootState, SignatureDatabase,
};
