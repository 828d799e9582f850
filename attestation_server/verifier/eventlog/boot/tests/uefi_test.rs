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

use uuid::Uuid;
use eventlog_boot_verifier::byte_reader::{decode_ucs2, ByteReader};
use eventlog_boot_verifier::extract::platform::{gce_firmware_version, gce_technology};
use eventlog_boot_verifier::uefi::{
    parse_authority, parse_signature_lists, parse_variable_data, CERT_SHA256_GUID, EFI_GLOBAL_VARIABLE_GUID,
    IMAGE_SECURITY_DATABASE_GUID,
};
use eventlog_boot_verifier::ConfidentialTechnology;

mod utils;
use utils::{self_signed_cert, sha256, sha256_list, signature_list, ucs2, uefi_variable, x509_list, OWNER_GUID};

#[test]
fn test_parse_variable_data() {
    let payload = uefi_variable(IMAGE_SECURITY_DATABASE_GUID, "dbx", &[1, 2, 3]);
    let variable = parse_variable_data(&payload).unwrap();
    assert_eq!(variable.guid, IMAGE_SECURITY_DATABASE_GUID);
    assert_eq!(variable.name, "dbx");
    assert_eq!(variable.data, vec![1, 2, 3]);
    assert!(variable.is_image_security_database("dbx"));
    assert!(!variable.is_global("dbx"));
}

#[test]
fn test_parse_truncated_variable_data() {
    let payload = uefi_variable(EFI_GLOBAL_VARIABLE_GUID, "SecureBoot", &[1]);
    let err = parse_variable_data(&payload[..payload.len() - 1]).unwrap_err();
    assert!(err.to_string().contains("Read exceeds data range"));
    assert!(parse_variable_data(&payload[..10]).is_err());
}

#[test]
fn test_parse_signature_lists() {
    let data = [
        x509_list(&[self_signed_cert("Vendor CA")]),
        sha256_list(&[sha256(b"one"), sha256(b"two")]),
    ].concat();
    let database = parse_signature_lists(&data).unwrap();
    assert_eq!(database.certs.len(), 1);
    assert_eq!(database.certs[0].subject, "CN=Vendor CA");
    assert_eq!(database.hashes, vec![hex::encode(sha256(b"one")), hex::encode(sha256(b"two"))]);

    assert!(parse_signature_lists(&[]).unwrap().is_empty());
}

#[test]
fn test_signature_list_of_unknown_type_is_skipped() {
    let rsa2048_guid = Uuid::from_u128(0x3c5766e8_269c_4e34_aa14_ed776e85b3b6);
    let data = [
        signature_list(rsa2048_guid, &[vec![0u8; 256]]),
        sha256_list(&[sha256(b"kept")]),
    ].concat();
    let database = parse_signature_lists(&data).unwrap();
    assert!(database.certs.is_empty());
    assert_eq!(database.hashes.len(), 1);
}

#[test]
fn test_malformed_signature_lists() {
    let mut list = sha256_list(&[sha256(b"one")]);
    // SignatureListSize smaller than the list header
    list[16..20].copy_from_slice(&8u32.to_le_bytes());
    assert!(parse_signature_lists(&list).is_err());

    let short_hash = signature_list(CERT_SHA256_GUID, &[vec![0u8; 20]]);
    assert!(parse_signature_lists(&short_hash).is_err());

    let truncated = sha256_list(&[sha256(b"one"), sha256(b"two")]);
    assert!(parse_signature_lists(&truncated[..truncated.len() - 4]).is_err());
}

#[test]
fn test_parse_authority() {
    let cert = self_signed_cert("Shim Vendor");
    let mut with_owner = OWNER_GUID.to_bytes_le().to_vec();
    with_owner.extend_from_slice(&cert);
    assert_eq!(parse_authority(&with_owner).unwrap().certs[0].subject, "CN=Shim Vendor");
    assert_eq!(parse_authority(&cert).unwrap().certs.len(), 1);

    let mut hash = OWNER_GUID.to_bytes_le().to_vec();
    hash.extend_from_slice(&sha256(b"image"));
    assert_eq!(parse_authority(&hash).unwrap().hashes, vec![hex::encode(sha256(b"image"))]);

    assert!(parse_authority(&[0u8; 8]).is_err());
    assert!(parse_authority(&[0u8; 40]).is_err());
}

#[test]
fn test_byte_reader_bounds() {
    let mut reader = ByteReader::new(&[1, 0, 0, 0, 2]);
    assert_eq!(reader.read_u32().unwrap(), 1);
    assert_eq!(reader.remaining(), 1);
    assert!(reader.read_u64().is_err());
    assert!(reader.read_bytes(2).is_err());
    assert_eq!(reader.read_bytes(1).unwrap(), vec![2]);
    assert!(reader.is_end());
}

#[test]
fn test_decode_ucs2_stops_at_nul() {
    assert_eq!(decode_ucs2(&ucs2("SecureBoot\0trailing")), "SecureBoot");
    assert_eq!(decode_ucs2(&ucs2("db")), "db");
    assert_eq!(decode_ucs2(&[0x41, 0x00, 0x42]), "A");
}

#[test]
fn test_gce_platform_payloads() {
    assert_eq!(gce_firmware_version(&ucs2("GCE Virtual Firmware v3\0")), Some(3));
    assert_eq!(gce_firmware_version(&ucs2("GCE Virtual Firmware vX\0")), None);
    assert_eq!(gce_firmware_version(&ucs2("OVMF\0")), None);

    assert_eq!(gce_technology(b"GCE NonHostInfo\0\x04\x00\x00"), Some(ConfidentialTechnology::AmdSevSnp));
    assert_eq!(gce_technology(b"GCE NonHostInfo\0\x09"), None);
    assert_eq!(gce_technology(b"GCE NonHostInfo\0"), None);
    assert_eq!(gce_technology(b"Other\0\x01"), None);
}
