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

//! Little-endian reader over event payloads
//!
//! Used by the UEFI payload decoders. Every read is bounds checked and reports
//! `VerifierError::InputError` on short data.

use byteorder::{LittleEndian, ReadBytesExt};
use eventlog_common_verifier::VerifierError;
use std::io::{Cursor, Read};
use uuid::Uuid;

/// UEFI GUID size
pub const UEFI_GUID_SIZE: usize = 16;

pub struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

/// Types decoded directly from a [`ByteReader`]
pub trait ByteParseable: Sized {
    fn parse_from(reader: &mut ByteReader<'_>) -> Result<Self, VerifierError>;
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        let total = self.cursor.get_ref().len() as u64;
        total.saturating_sub(self.cursor.position()) as usize
    }

    pub fn is_end(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_u32(&mut self) -> Result<u32, VerifierError> {
        self.cursor.read_u32::<LittleEndian>()
            .map_err(|e| VerifierError::InputError(format!("Failed to read u32: {}", e)))
    }

    pub fn read_u64(&mut self) -> Result<u64, VerifierError> {
        self.cursor.read_u64::<LittleEndian>()
            .map_err(|e| VerifierError::InputError(format!("Failed to read u64: {}", e)))
    }

    /// Read `length` bytes
    ///
    /// # Errors
    /// * Returns an error when fewer than `length` bytes remain
    pub fn read_bytes(&mut self, length: usize) -> Result<Vec<u8>, VerifierError> {
        if length > self.remaining() {
            return Err(VerifierError::InputError(
                format!("Read exceeds data range: requested {} bytes but only {} bytes remain",
                        length, self.remaining())
            ));
        }
        let mut buffer: Vec<u8> = vec![0u8; length];
        self.cursor.read_exact(&mut buffer)
            .map_err(|e| VerifierError::InputError(format!("Failed to read bytes: {}", e)))?;
        Ok(buffer)
    }

    /// Read a mixed-endian UEFI GUID
    pub fn read_guid(&mut self) -> Result<Uuid, VerifierError> {
        let mut guid_bytes: [u8; UEFI_GUID_SIZE] = [0; UEFI_GUID_SIZE];
        self.cursor.read_exact(&mut guid_bytes)
            .map_err(|e| VerifierError::InputError(format!("Failed to read guid: {}", e)))?;
        Ok(Uuid::from_bytes_le(guid_bytes))
    }

    /// Read exactly `length` UCS-2 code units, the name ends at the first NUL
    pub fn read_ucs2(&mut self, length: usize) -> Result<String, VerifierError> {
        let bytes = self.read_bytes(length.checked_mul(2).ok_or_else(|| {
            VerifierError::InputError(format!("UCS-2 length {} overflows", length))
        })?)?;
        Ok(decode_ucs2(&bytes))
    }
}

/// Decode UCS-2 (UTF-16LE) text up to the first NUL code unit
///
/// Unpaired surrogates become U+FFFD.
pub fn decode_ucs2(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}
