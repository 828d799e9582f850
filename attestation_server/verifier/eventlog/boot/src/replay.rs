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

//! Event log replay
//!
//! Rebuilds every register the log extends and compares it with the register bank. Only a
//! log that replays completely is turned into a [`VerifiedEventLog`], the sole input the
//! extraction functions accept.

use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use eventlog_common_verifier::{extend, Event, EventLog, EventType, RegisterBank, VerifierError};
use crate::register_config::{LogType, RegisterConfig};

/// Leading bytes of the StartupLocality no-action event
pub const STARTUP_LOCALITY_SIGNATURE: &[u8] = b"StartupLocality\0";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayOpts {
    /// Skip log registers the bank has no entry for instead of failing.
    /// Events of skipped registers are left out of the verified log.
    pub allow_partial_bank: bool,
}

/// Replay outcome of one register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedRegister {
    pub log_index: u32,
    pub bank_index: u32,
    pub replayed: Vec<u8>,
    pub expected: Vec<u8>,
    pub matched: bool,
    pub event_count: usize,
    pub last_event: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayResult {
    pub registers: Vec<ReplayedRegister>,
}

impl ReplayResult {
    pub fn register(&self, log_index: u32) -> Option<&ReplayedRegister> {
        self.registers.iter().find(|r| r.log_index == log_index)
    }

    /// First register, by log index, whose replay differs from the bank
    pub fn first_mismatch(&self) -> Option<&ReplayedRegister> {
        self.registers.iter().filter(|r| !r.matched).min_by_key(|r| r.log_index)
    }
}

/// Events whose registers replayed to the bank values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedEventLog {
    events: Vec<Event>,
    result: ReplayResult,
    log_type: LogType,
    skipped_indices: Vec<u32>,
}

impl VerifiedEventLog {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn replay_result(&self) -> &ReplayResult {
        &self.result
    }

    pub fn log_type(&self) -> LogType {
        self.log_type
    }

    /// Log registers left out because the bank has no entry for them
    pub fn skipped_indices(&self) -> &[u32] {
        &self.skipped_indices
    }
}

/// Replay `log` against `bank`
///
/// # Errors
/// * `VerifierError::DuplicateSeparator` - A register carries a second separator event, reported
///   before any bank check
/// * `VerifierError::InvalidBank` - The bank has duplicate or malformed entries
/// * `VerifierError::MissingBankEntry` - A register extended by the log has no bank entry
/// * `VerifierError::UnusedBankEntry` - A bank entry no event extends
/// * `VerifierError::ReplayMismatch` - A replayed register differs from the bank
/// * Digest errors for events with an empty or unsupported digest
pub fn replay(
    log: &EventLog,
    bank: &RegisterBank,
    config: &RegisterConfig,
    opts: &ReplayOpts,
) -> Result<VerifiedEventLog, VerifierError> {
    check_separators(log)?;
    bank.validate()?;
    let locality = startup_locality(log, config);
    log::debug!("Replaying {} events against {} {} registers", log.len(), bank.registers.len(), config.name);

    let mut registers = Vec::new();
    let mut skipped_indices = Vec::new();
    for index in log.indices() {
        let chain: Vec<&Event> = log
            .events_for_index(index)
            .filter(|e| e.event_type != EventType::EvNoAction)
            .collect();
        if chain.is_empty() {
            continue;
        }

        let bank_entry = match config.bank_index(index) {
            Some(bank_index) => bank.digest(bank_index)?.map(|digest| (bank_index, digest)),
            None => None,
        };
        let Some((bank_index, expected)) = bank_entry else {
            if opts.allow_partial_bank {
                log::warn!("{} register {} has no bank entry, skipping {} events", config.name, index, chain.len());
                skipped_indices.push(index);
                continue;
            }
            return Err(VerifierError::MissingBankEntry { index });
        };

        registers.push(replay_register(index, bank_index, &chain, expected, config, locality)?);
    }

    if let Some(unused) = bank.indices()
        .into_iter()
        .find(|bank_index| !registers.iter().any(|r| r.bank_index == *bank_index)) {
        return Err(VerifierError::UnusedBankEntry { index: unused });
    }

    let result = ReplayResult { registers };
    if let Some(mismatch) = result.first_mismatch() {
        return Err(VerifierError::ReplayMismatch {
            index: mismatch.log_index,
            last_event: mismatch.last_event,
            expected: hex::encode(&mismatch.expected),
            replayed: hex::encode(&mismatch.replayed),
        });
    }

    let events = log
        .events()
        .iter()
        .filter(|e| !skipped_indices.contains(&e.index))
        .cloned()
        .collect();
    log::info!("{} event log replayed, {} registers verified", config.name, result.registers.len());
    Ok(VerifiedEventLog {
        events,
        result,
        log_type: config.log_type,
        skipped_indices,
    })
}

fn replay_register(
    index: u32,
    bank_index: u32,
    chain: &[&Event],
    expected: Vec<u8>,
    config: &RegisterConfig,
    locality: u8,
) -> Result<ReplayedRegister, VerifierError> {
    let mut accumulator = config.initial_value(index, expected.len(), locality);
    let mut last_event = 0;

    for event in chain {
        let algorithm = event.hash_algorithm()
            .map_err(|e| VerifierError::InputError(
                format!("event {} in register {}: {}", event.sequence, index, e)
            ))?;
        accumulator = extend(algorithm, &accumulator, &event.digest)?;
        last_event = event.sequence;
    }

    let matched = accumulator == expected;
    log::debug!("{} register {} replayed over {} events, matched: {}", config.name, index, chain.len(), matched);
    Ok(ReplayedRegister {
        log_index: index,
        bank_index,
        replayed: accumulator,
        expected,
        matched,
        event_count: chain.len(),
        last_event,
    })
}

/// Fail on the first register that carries a second separator
///
/// Covers registers without a bank entry, including those skipped in partial-bank mode.
fn check_separators(log: &EventLog) -> Result<(), VerifierError> {
    let mut seen: HashSet<u32> = HashSet::new();
    for event in log.events().iter().filter(|e| e.event_type == EventType::EvSeparator) {
        if !seen.insert(event.index) {
            return Err(VerifierError::DuplicateSeparator { index: event.index, sequence: event.sequence });
        }
    }
    Ok(())
}

/// Startup locality recorded by the TPM log, 0 when absent
fn startup_locality(log: &EventLog, config: &RegisterConfig) -> u8 {
    let Some(index) = config.locality_index else {
        return 0;
    };
    log.events_for_index(index)
        .filter(|e| e.event_type == EventType::EvNoAction)
        .find_map(|e| {
            e.data
                .strip_prefix(STARTUP_LOCALITY_SIGNATURE)
                .and_then(|rest| rest.first().copied())
        })
        .unwrap_or(0)
}
