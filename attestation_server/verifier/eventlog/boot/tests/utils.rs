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

#![allow(dead_code)]

use std::collections::BTreeMap;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::{hash, MessageDigest};
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::x509::{X509Builder, X509NameBuilder};
use uuid::Uuid;
use eventlog_common_verifier::{Event, EventLog, EventType, RegisterBank};
use eventlog_boot_verifier::uefi::{
    CERT_SHA256_GUID, CERT_X509_GUID, EFI_GLOBAL_VARIABLE_GUID, IMAGE_SECURITY_DATABASE_GUID,
};

pub const SHIM_DIGEST_INPUT: &[u8] = b"shimx64.efi";
pub const GRUB_DIGEST_INPUT: &[u8] = b"grubx64.efi";
pub const KERNEL_COMMAND_LINE: &str = "/vmlinuz-6.1 root=/dev/sda1 ro console=ttyS0";
pub const OWNER_GUID: Uuid = Uuid::from_u128(0x77fa9abd_0359_4d32_bd60_28f4e78f784b);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn message_digest(digest_size: usize) -> MessageDigest {
    match digest_size {
        20 => MessageDigest::sha1(),
        32 => MessageDigest::sha256(),
        48 => MessageDigest::sha384(),
        other => panic!("no digest of size {}", other),
    }
}

/// Builds event logs measured with a single hash algorithm
pub struct LogBuilder {
    digest_size: usize,
    events: Vec<Event>,
}

impl LogBuilder {
    pub fn new(digest_size: usize) -> Self {
        Self { digest_size, events: Vec::new() }
    }

    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        hash(message_digest(self.digest_size), data).unwrap().to_vec()
    }

    fn next_sequence(&self) -> u32 {
        self.events.len() as u32
    }

    /// Event whose digest is the hash of its data
    pub fn event(&mut self, index: u32, event_type: EventType, data: &[u8]) -> &mut Self {
        let digest = self.digest(data);
        self.raw(index, event_type as u32, data, digest)
    }

    /// Event whose digest is the hash of `digest_input` instead of its data
    pub fn event_over(&mut self, index: u32, event_type: EventType, data: &[u8], digest_input: &[u8]) -> &mut Self {
        let digest = self.digest(digest_input);
        self.raw(index, event_type as u32, data, digest)
    }

    pub fn raw(&mut self, index: u32, raw_type: u32, data: &[u8], digest: Vec<u8>) -> &mut Self {
        let sequence = self.next_sequence();
        self.events.push(Event::new(sequence, index, raw_type, data.to_vec(), digest));
        self
    }

    pub fn separator(&mut self, index: u32) -> &mut Self {
        self.event(index, EventType::EvSeparator, &[0, 0, 0, 0])
    }

    pub fn no_action(&mut self, index: u32, data: &[u8]) -> &mut Self {
        let digest = vec![0u8; self.digest_size];
        self.raw(index, EventType::EvNoAction as u32, data, digest)
    }

    /// GRUB command, digest taken over the command without its prefix and terminator
    pub fn grub_command(&mut self, index: u32, prefix: &str, command: &str) -> &mut Self {
        let data = format!("{}{}\0", prefix, command);
        self.event_over(index, EventType::EvIpl, data.as_bytes(), command.as_bytes())
    }

    pub fn grub_file(&mut self, index: u32, name: &str, content: &[u8]) -> &mut Self {
        let data = format!("{}\0", name);
        self.event_over(index, EventType::EvIpl, data.as_bytes(), content)
    }

    pub fn last_sequence(&self) -> u32 {
        self.next_sequence() - 1
    }

    pub fn build(&self) -> EventLog {
        EventLog::new(self.events.clone())
    }
}

/// Final register values of `log`, keyed by log index, computed from scratch
pub fn replay_registers(log: &EventLog, digest_size: usize, locality: u8) -> BTreeMap<u32, Vec<u8>> {
    let mut registers: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
    for event in log.events() {
        if event.event_type == EventType::EvNoAction {
            continue;
        }
        let register = registers.entry(event.index).or_insert_with(|| {
            let mut initial = vec![0u8; digest_size];
            if event.index == 0 {
                initial[digest_size - 1] = locality;
            }
            initial
        });
        let mut input = register.clone();
        input.extend_from_slice(&event.digest);
        *register = hash(message_digest(event.digest.len()), &input).unwrap().to_vec();
    }
    registers
}

pub fn pcr_bank(log: &EventLog, digest_size: usize) -> RegisterBank {
    RegisterBank::new(replay_registers(log, digest_size, 0)).unwrap()
}

pub fn pcr_bank_with_locality(log: &EventLog, digest_size: usize, locality: u8) -> RegisterBank {
    RegisterBank::new(replay_registers(log, digest_size, locality)).unwrap()
}

/// RTMR bank of a CCEL log: CC MR `n` is stored as RTMR `n - 1`
pub fn rtmr_bank(log: &EventLog) -> RegisterBank {
    let entries = replay_registers(log, 48, 0)
        .into_iter()
        .map(|(index, digest)| (index - 1, digest))
        .collect::<Vec<_>>();
    RegisterBank::new(entries).unwrap()
}

pub fn ucs2(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

/// UEFI_VARIABLE_DATA payload
pub fn uefi_variable(guid: Uuid, name: &str, data: &[u8]) -> Vec<u8> {
    let mut out = guid.to_bytes_le().to_vec();
    out.extend_from_slice(&(name.encode_utf16().count() as u64).to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(&ucs2(name));
    out.extend_from_slice(data);
    out
}

/// EFI_SIGNATURE_LIST with equally sized signatures
pub fn signature_list(signature_type: Uuid, signatures: &[Vec<u8>]) -> Vec<u8> {
    let signature_size = 16 + signatures.first().map_or(0, |s| s.len());
    let list_size = 28 + signature_size * signatures.len();
    let mut out = signature_type.to_bytes_le().to_vec();
    out.extend_from_slice(&(list_size as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(signature_size as u32).to_le_bytes());
    for signature in signatures {
        out.extend_from_slice(&OWNER_GUID.to_bytes_le());
        out.extend_from_slice(signature);
    }
    out
}

pub fn x509_list(certs: &[Vec<u8>]) -> Vec<u8> {
    certs.iter().flat_map(|cert| signature_list(CERT_X509_GUID, &[cert.clone()])).collect()
}

pub fn sha256_list(hashes: &[Vec<u8>]) -> Vec<u8> {
    signature_list(CERT_SHA256_GUID, hashes)
}

/// DER of a self-signed P-256 certificate
pub fn self_signed_cert(common_name: &str) -> Vec<u8> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, common_name).unwrap();
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(365).unwrap()).unwrap();
    builder.sign(&key, MessageDigest::sha256()).unwrap();
    builder.build().to_der().unwrap()
}

pub fn sha256(data: &[u8]) -> Vec<u8> {
    hash(MessageDigest::sha256(), data).unwrap().to_vec()
}

/// Secure boot variables measured by firmware with secure boot in `enabled` state
pub fn measure_secure_boot_variables(builder: &mut LogBuilder, index: u32, enabled: u8) {
    builder
        .event(index, EventType::EvEfiVariableDriverConfig,
               &uefi_variable(EFI_GLOBAL_VARIABLE_GUID, "SecureBoot", &[enabled]))
        .event(index, EventType::EvEfiVariableDriverConfig,
               &uefi_variable(EFI_GLOBAL_VARIABLE_GUID, "PK", &x509_list(&[self_signed_cert("Test PK")])))
        .event(index, EventType::EvEfiVariableDriverConfig,
               &uefi_variable(EFI_GLOBAL_VARIABLE_GUID, "KEK", &x509_list(&[self_signed_cert("Test KEK")])))
        .event(index, EventType::EvEfiVariableDriverConfig,
               &uefi_variable(IMAGE_SECURITY_DATABASE_GUID, "db", &[
                   x509_list(&[self_signed_cert("Test DB CA")]),
                   sha256_list(&[sha256(b"allowed image")]),
               ].concat()))
        .event(index, EventType::EvEfiVariableDriverConfig,
               &uefi_variable(IMAGE_SECURITY_DATABASE_GUID, "dbx",
                              &sha256_list(&[sha256(b"revoked one"), sha256(b"revoked two")])));
}

/// Authority event for an image verified by a db certificate
pub fn db_authority(cert: &[u8]) -> Vec<u8> {
    let mut signature = OWNER_GUID.to_bytes_le().to_vec();
    signature.extend_from_slice(cert);
    uefi_variable(IMAGE_SECURITY_DATABASE_GUID, "db", &signature)
}

/// SHA-256 TPM log of a GCE VM booting Linux through shim and GRUB
///
/// Without `with_secure_boot` PCR 7 only carries its separator.
pub fn tpm_grub_log(with_secure_boot: bool) -> LogBuilder {
    let mut builder = LogBuilder::new(32);
    let mut non_host_info = b"GCE NonHostInfo\0".to_vec();
    non_host_info.push(1);
    non_host_info.resize(32, 0);

    builder
        .event(0, EventType::EvSCrtmVersion, &ucs2("GCE Virtual Firmware v20\0"))
        .event(0, EventType::EvNonhostInfo, &non_host_info);
    if with_secure_boot {
        measure_secure_boot_variables(&mut builder, 7, 1);
    }
    builder
        .event_over(2, EventType::EvEfiBootServicesDriver, b"driver image path", b"virtio driver")
        .event(4, EventType::EvEfiAction, b"Calling EFI Application from Boot Option");
    for index in 0..=7 {
        builder.separator(index);
    }
    if with_secure_boot {
        builder.event(7, EventType::EvEfiVariableAuthority, &db_authority(&self_signed_cert("Test DB CA")));
    }
    builder
        .event_over(4, EventType::EvEfiBootServicesApplication, b"shim device path", SHIM_DIGEST_INPUT)
        .event_over(4, EventType::EvEfiBootServicesApplication, b"grub device path", GRUB_DIGEST_INPUT)
        .grub_command(8, "grub_cmd: ", "set root=hd0,gpt1")
        .grub_file(9, "/boot/vmlinuz-6.1", b"kernel image")
        .grub_command(8, "grub_cmd: ", &format!("linux {}", KERNEL_COMMAND_LINE))
        .grub_file(9, "/boot/initrd.img-6.1", b"initrd image")
        .grub_command(8, "kernel_cmdline: ", KERNEL_COMMAND_LINE)
        .event(5, EventType::EvEfiAction, b"Exit Boot Services Invocation")
        .event(5, EventType::EvEfiAction, b"Exit Boot Services Returned with Success");
    builder
}

/// SHA-384 CCEL log of a TDX guest booting Linux through GRUB
pub fn rtmr_grub_log() -> LogBuilder {
    let mut builder = LogBuilder::new(48);
    builder
        .no_action(0, b"Spec ID Event03\0")
        .event_over(1, EventType::EvEfiPlatformFirmwareBlob2, b"TDVF configuration", b"cfv blob")
        .event_over(1, EventType::EvEfiHandoffTables2, b"TD hob", b"hob list");
    measure_secure_boot_variables(&mut builder, 1, 0);
    builder
        .event(1, EventType::EvEfiVariableBoot, &uefi_variable(EFI_GLOBAL_VARIABLE_GUID, "BootOrder", &[0, 0]))
        .event(2, EventType::EvEfiAction, b"Calling EFI Application from Boot Option")
        .separator(1)
        .separator(2)
        .event_over(2, EventType::EvEfiBootServicesApplication, b"grub device path", GRUB_DIGEST_INPUT)
        .grub_command(3, "grub_cmd: ", "set root=hd0,gpt1")
        .grub_file(3, "/boot/vmlinuz-6.1", b"kernel image")
        .grub_command(3, "grub_cmd: ", &format!("linux {}", KERNEL_COMMAND_LINE))
        .grub_command(3, "grub_kernel_cmdline ", KERNEL_COMMAND_LINE)
        .event(2, EventType::EvEfiAction, b"Exit Boot Services Invocation");
    builder
}
