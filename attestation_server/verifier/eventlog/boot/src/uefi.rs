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

//! UEFI payload decoding for secure boot events
//!
//! Covers UEFI_VARIABLE_DATA, EFI_SIGNATURE_LIST and EFI_SIGNATURE_DATA as defined by the
//! UEFI specification and measured by the TCG PC Client Platform Firmware Profile.

use std::mem::size_of;
use openssl::x509::X509;
use uuid::{uuid, Uuid};
use eventlog_common_verifier::VerifierError;
use crate::byte_reader::{ByteParseable, ByteReader, UEFI_GUID_SIZE};
use crate::state::{Certificate, SignatureDatabase};

pub const EFI_GLOBAL_VARIABLE_GUID: Uuid = uuid!("8be4df61-93ca-11d2-aa0d-00e098032b8c");
pub const IMAGE_SECURITY_DATABASE_GUID: Uuid = uuid!("d719b2cb-3d3a-4596-a3bc-dad00e67656f");
pub const CERT_X509_GUID: Uuid = uuid!("a5c059a1-94e4-4aa7-87b5-ab155c2bf072");
pub const CERT_SHA256_GUID: Uuid = uuid!("c1c41626-504c-4092-aca9-41f936934328");

pub const VAR_SECURE_BOOT: &str = "SecureBoot";
pub const VAR_PK: &str = "PK";
pub const VAR_KEK: &str = "KEK";
pub const VAR_DB: &str = "db";
pub const VAR_DBX: &str = "dbx";

const SHA256_HASH_SIZE: usize = 32;
// SignatureType, SignatureListSize, SignatureHeaderSize, SignatureSize
const SIGNATURE_LIST_HEADER_SIZE: usize = UEFI_GUID_SIZE + size_of::<u32>() * 3;

/// UEFI_VARIABLE_DATA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UefiVariableData {
    pub guid: Uuid,
    pub name: String,
    pub data: Vec<u8>,
}

impl UefiVariableData {
    pub fn is_global(&self, name: &str) -> bool {
        self.guid == EFI_GLOBAL_VARIABLE_GUID && self.name == name
    }

    pub fn is_image_security_database(&self, name: &str) -> bool {
        self.guid == IMAGE_SECURITY_DATABASE_GUID && self.name == name
    }
}

impl ByteParseable for UefiVariableData {
    fn parse_from(reader: &mut ByteReader<'_>) -> Result<Self, VerifierError> {
        let guid = reader.read_guid()?;
        // length of the name in UCS-2 characters
        let name_length = to_usize(reader.read_u64()?)?;
        let data_length = to_usize(reader.read_u64()?)?;
        let name = reader.read_ucs2(name_length)?;
        let data = reader.read_bytes(data_length)?;
        Ok(Self { guid, name, data })
    }
}

/// Decode a variable event payload
pub fn parse_variable_data(data: &[u8]) -> Result<UefiVariableData, VerifierError> {
    let mut reader = ByteReader::new(data);
    UefiVariableData::parse_from(&mut reader)
}

/// Decode the EFI_SIGNATURE_LIST sequence of a signature database variable
///
/// X.509 entries are kept as certificates, SHA-256 entries as hashes. Lists of other
/// signature types are skipped.
pub fn parse_signature_lists(data: &[u8]) -> Result<SignatureDatabase, VerifierError> {
    let mut reader = ByteReader::new(data);
    let mut database = SignatureDatabase::default();

    while !reader.is_end() {
        let signature_type = reader.read_guid()?;
        let list_size = reader.read_u32()? as usize;
        let header_size = reader.read_u32()? as usize;
        let signature_size = reader.read_u32()? as usize;

        let body_size = list_size
            .checked_sub(SIGNATURE_LIST_HEADER_SIZE)
            .and_then(|size| size.checked_sub(header_size))
            .ok_or_else(|| VerifierError::InputError(
                format!("Invalid signature list size {} with header size {}", list_size, header_size)
            ))?;
        if signature_size <= UEFI_GUID_SIZE || body_size % signature_size != 0 {
            return Err(VerifierError::InputError(
                format!("Invalid signature size {} for list body of {} bytes", signature_size, body_size)
            ));
        }
        reader.read_bytes(header_size)?;

        for _ in 0..body_size / signature_size {
            let _owner = reader.read_guid()?;
            let signature = reader.read_bytes(signature_size - UEFI_GUID_SIZE)?;
            if signature_type == CERT_X509_GUID {
                database.certs.push(parse_certificate(&signature)?);
            } else if signature_type == CERT_SHA256_GUID {
                if signature.len() != SHA256_HASH_SIZE {
                    return Err(VerifierError::InputError(
                        format!("SHA-256 signature of {} bytes", signature.len())
                    ));
                }
                database.hashes.push(hex::encode(signature));
            } else {
                log::warn!("Skipping signature of unhandled type {}", signature_type);
            }
        }
    }

    Ok(database)
}

/// Decode the EFI_SIGNATURE_DATA of an authority event
///
/// Some shim versions omit the owner GUID, a bare certificate is accepted as well.
pub fn parse_authority(data: &[u8]) -> Result<SignatureDatabase, VerifierError> {
    let mut database = SignatureDatabase::default();
    if data.len() < UEFI_GUID_SIZE {
        return Err(VerifierError::InputError(
            format!("Signature data of {} bytes is smaller than its owner GUID", data.len())
        ));
    }

    let signature = &data[UEFI_GUID_SIZE..];
    if let Ok(cert) = parse_certificate(signature) {
        database.certs.push(cert);
    } else if let Ok(cert) = parse_certificate(data) {
        log::debug!("Authority signature data carries no owner GUID");
        database.certs.push(cert);
    } else if signature.len() == SHA256_HASH_SIZE {
        database.hashes.push(hex::encode(signature));
    } else {
        return Err(VerifierError::InputError(
            "Authority is neither an X.509 certificate nor a SHA-256 hash".to_string()
        ));
    }
    Ok(database)
}

fn parse_certificate(der: &[u8]) -> Result<Certificate, VerifierError> {
    let cert = X509::from_der(der)
        .map_err(|e| VerifierError::InputError(format!("Failed to parse certificate: {}", e)))?;
    let subject = cert
        .subject_name()
        .entries()
        .map(|e| {
            let key = e.object().nid().short_name().unwrap_or("UNDEF");
            let value = e.data().as_utf8().map(|v| v.to_string()).unwrap_or_default();
            format!("{}={}", key, value)
        })
        .collect::<Vec<String>>()
        .join(", ");
    Ok(Certificate { subject, der: hex::encode(der) })
}

fn to_usize(value: u64) -> Result<usize, VerifierError> {
    usize::try_from(value)
        .map_err(|_| VerifierError::InputError(format!("Length {} does not fit in memory", value)))
}
