//! LMP body field layouts, dispatched by `(opcode, ext_opcode)`.
//!
//! Every parser here reads only its declared fields; trailing bytes left in
//! the segment are discarded once by the caller in [`super::lmp`], not by
//! each body parser individually.

use crate::cursor::Cursor;
use crate::error::{Result, SnifferError};

use super::tables;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LmpBody {
    FeaturesReq { features: u64 },
    FeaturesRes { features: u64 },
    VersionReq { version: u8, company_id: u16, subversion: u16 },
    VersionRes { version: u8, company_id: u16, subversion: u16 },
    FeaturesReqExt { fpage: u8, max_page: u8, features: u64 },
    FeaturesResExt { fpage: u8, max_page: u8, features: u64 },
    NameReq { name_offset: u8 },
    NameRes { name_offset: u8, name_len: u8, name_frag: Vec<u8> },
    Detach { error_code: u8 },
    Accepted { opcode: u8 },
    NotAccepted { opcode: u8, error_code: u8 },
    AcceptedExt { opcode: u8, ext_opcode: u8 },
    NotAcceptedExt { opcode: u8, ext_opcode: u8, error_code: u8 },
    AuRand([u8; 16]),
    Sres([u8; 4]),
    StartEncryptionReq([u8; 16]),
    SimplePairingConfirm([u8; 16]),
    SimplePairingNumber([u8; 16]),
    DhKeyCheck([u8; 16]),
    EncapsulatedPayload([u8; 16]),
    EncryptionModeReq { mode: u8 },
    EncryptionKeySizeReq { keysize: u8 },
    EncapsulatedHeader { major_type: u8, minor_type: u8, enc_len: u8 },
    SetAfh { instant: u32, mode: u8, ch_map: [u8; 10] },
    ChannelClassificationReq { mode: u8, min_interval: u16, max_interval: u16 },
    ChannelClassification { class: [u8; 10] },
    ClkoffsetRes { offset: u16 },
    SniffReq {
        timectr: u8,
        dsniff: u16,
        tsniff: u16,
        sniff_attempt: u16,
        sniff_timeout: u16,
    },
    SupervisionTimeout { timeout: u16 },
    SniffSubratingReq { max_sniff_subrate: u8, min_sniff_timeout: u16, subrating_instant: u16 },
    SniffSubratingRes { max_sniff_subrate: u8, min_sniff_timeout: u16, subrating_instant: u16 },
    IoCapabilityReq { io_cap: u8, oob: u8, auth: u8 },
    IoCapabilityRes { io_cap: u8, oob: u8, auth: u8 },
    PowerControlReq { poweradj: u8 },
    PowerControlRes { p_8dpsk: u8, p_dqpsk: u8, p_gfsk: u8 },
    PreferredRate { rfu: u8, edrsize: u8, packet_type: u8, size: u8, fec: u8 },
    TimingAccuracyRes { drift: u8, jitter: u8 },
    PageModeReq { scheme: u8, settings: u8 },
    PageScanModeReq { scheme: u8, settings: u8 },
    MaxSlot { max_slots: u8 },
    MaxSlotReq { max_slots: u8 },
    PacketTypeTableReq { packet_type_table: u8 },
    /// Empty-body opcodes: setup_complete, host_connection_req,
    /// unsniff_req, auto_rate, *_failed (numeric comparison/passkey/oob),
    /// ping_req/res, pause/resume_encryption_req, stop_encryption_req,
    /// clkoffset_req, timing_accuracy_req, max/min_power.
    Empty,
    /// Body bytes present but shorter than the declared layout; the frame
    /// degrades to opaque rather than aborting dissection (§4.F, §7
    /// ShortFrame/MalformedField policy).
    Opaque(Vec<u8>),
}

impl LmpBody {
    /// A human-readable detail to append to the PDU summary, resolving the
    /// body's own numeric fields through the named lookup tables — an
    /// error code, a Core spec version string, or the set feature-bit
    /// names. Returns `None` for bodies with nothing to resolve (the raw
    /// field is still always available on the struct itself).
    pub fn detail(&self) -> Option<String> {
        match self {
            LmpBody::Detach { error_code }
            | LmpBody::NotAccepted { error_code, .. }
            | LmpBody::NotAcceptedExt { error_code, .. } => {
                let name = tables::error_code_name(*error_code)?;
                Some(format!("error={name}"))
            }
            LmpBody::VersionReq { version, .. } | LmpBody::VersionRes { version, .. } => {
                let name = tables::version_name(*version)?;
                Some(format!("version={name}"))
            }
            LmpBody::FeaturesReq { features } | LmpBody::FeaturesRes { features } => {
                Some(format_features(*features, &tables::FEATURES_PAGE0))
            }
            LmpBody::FeaturesReqExt { fpage, features, .. }
            | LmpBody::FeaturesResExt { fpage, features, .. } => {
                let table = match fpage {
                    0 => &tables::FEATURES_PAGE0,
                    1 => &tables::EXT_FEATURES_1,
                    2 => &tables::EXT_FEATURES_2,
                    _ => return None,
                };
                Some(format_features(*features, table))
            }
            _ => None,
        }
    }
}

fn format_features(mask: u64, table: &[&'static str; 64]) -> String {
    format!("features=[{}]", tables::feature_names(mask, table).join(","))
}

fn features64(cursor: &mut Cursor) -> Result<u64> {
    cursor.read_le_u64().ok_or(SnifferError::ShortFrame)
}

/// Parses the body for a base opcode (1..126). `opcode` selects the
/// layout; `127` (escape to extended) is handled by the caller and never
/// reaches here.
pub fn parse_base(opcode: u8, cursor: &mut Cursor) -> Result<LmpBody> {
    let body = match opcode {
        39 => LmpBody::FeaturesReq { features: features64(cursor)? },
        40 => LmpBody::FeaturesRes { features: features64(cursor)? },
        37 => parse_version(cursor, true)?,
        38 => parse_version(cursor, false)?,
        1 => LmpBody::NameReq {
            name_offset: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        2 => {
            let name_offset = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let name_len = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let name_frag = cursor
                .read(name_len as usize)
                .ok_or(SnifferError::ShortFrame)?
                .to_vec();
            LmpBody::NameRes { name_offset, name_len, name_frag }
        }
        7 => LmpBody::Detach {
            error_code: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        3 => LmpBody::Accepted {
            opcode: cursor.read_u8().ok_or(SnifferError::ShortFrame)? & 0x7F,
        },
        4 => {
            let opcode = cursor.read_u8().ok_or(SnifferError::ShortFrame)? & 0x7F;
            let error_code = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::NotAccepted { opcode, error_code }
        }
        11 => LmpBody::AuRand(cursor.take_16().ok_or(SnifferError::ShortFrame)?),
        12 => LmpBody::Sres(cursor.take_4().ok_or(SnifferError::ShortFrame)?),
        17 => LmpBody::StartEncryptionReq(cursor.take_16().ok_or(SnifferError::ShortFrame)?),
        63 => LmpBody::SimplePairingConfirm(cursor.take_16().ok_or(SnifferError::ShortFrame)?),
        64 => LmpBody::SimplePairingNumber(cursor.take_16().ok_or(SnifferError::ShortFrame)?),
        65 => LmpBody::DhKeyCheck(cursor.take_16().ok_or(SnifferError::ShortFrame)?),
        62 => LmpBody::EncapsulatedPayload(cursor.take_16().ok_or(SnifferError::ShortFrame)?),
        15 => LmpBody::EncryptionModeReq {
            mode: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        16 => LmpBody::EncryptionKeySizeReq {
            keysize: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        61 => {
            let major_type = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let minor_type = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let enc_len = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::EncapsulatedHeader { major_type, minor_type, enc_len }
        }
        60 => {
            let instant = cursor.read_le_u32().ok_or(SnifferError::ShortFrame)?;
            let mode = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let ch_map = cursor.take_10().ok_or(SnifferError::ShortFrame)?;
            LmpBody::SetAfh { instant, mode, ch_map }
        }
        6 => LmpBody::ClkoffsetRes {
            offset: cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?,
        },
        23 => {
            let timectr = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let dsniff = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            let tsniff = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            let sniff_attempt = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            let sniff_timeout = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            LmpBody::SniffReq { timectr, dsniff, tsniff, sniff_attempt, sniff_timeout }
        }
        55 => LmpBody::SupervisionTimeout {
            timeout: cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?,
        },
        36 => {
            let b = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::PreferredRate {
                rfu: crate::cursor::msb_field_u8(b, 0, 1),
                edrsize: crate::cursor::msb_field_u8(b, 1, 2),
                packet_type: crate::cursor::msb_field_u8(b, 3, 2),
                size: crate::cursor::msb_field_u8(b, 5, 2),
                fec: crate::cursor::msb_field_u8(b, 7, 1),
            }
        }
        48 => {
            let drift = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let jitter = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::TimingAccuracyRes { drift, jitter }
        }
        53 => {
            let scheme = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let settings = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::PageModeReq { scheme, settings }
        }
        54 => {
            let scheme = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let settings = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::PageScanModeReq { scheme, settings }
        }
        45 => LmpBody::MaxSlot {
            max_slots: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        46 => LmpBody::MaxSlotReq {
            max_slots: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        33 | 34 | 35 | 49 | 51 | 18 | 5 | 47 | 24 => LmpBody::Empty,
        _ => LmpBody::Empty,
    };
    Ok(body)
}

fn parse_version(cursor: &mut Cursor, _is_req: bool) -> Result<LmpBody> {
    let version = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
    let company_id = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
    let subversion = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
    Ok(if _is_req {
        LmpBody::VersionReq { version, company_id, subversion }
    } else {
        LmpBody::VersionRes { version, company_id, subversion }
    })
}

/// Parses the body for an extended opcode (1..34, under base opcode 127).
pub fn parse_ext(ext_opcode: u8, cursor: &mut Cursor) -> Result<LmpBody> {
    let body = match ext_opcode {
        1 => LmpBody::AcceptedExt {
            opcode: cursor.read_u8().ok_or(SnifferError::ShortFrame)? & 0x7F,
            ext_opcode: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        2 => {
            let opcode = cursor.read_u8().ok_or(SnifferError::ShortFrame)? & 0x7F;
            let ext_opcode = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let error_code = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::NotAcceptedExt { opcode, ext_opcode, error_code }
        }
        3 => {
            let fpage = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let max_page = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let features = features64(cursor)?;
            LmpBody::FeaturesReqExt { fpage, max_page, features }
        }
        4 => {
            let fpage = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let max_page = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let features = features64(cursor)?;
            LmpBody::FeaturesResExt { fpage, max_page, features }
        }
        11 => LmpBody::PacketTypeTableReq {
            packet_type_table: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        16 => {
            let mode = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let min_interval = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            let max_interval = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            LmpBody::ChannelClassificationReq { mode, min_interval, max_interval }
        }
        17 => LmpBody::ChannelClassification {
            class: cursor.take_10().ok_or(SnifferError::ShortFrame)?,
        },
        21 => {
            let max_sniff_subrate = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let min_sniff_timeout = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            let subrating_instant = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            LmpBody::SniffSubratingReq { max_sniff_subrate, min_sniff_timeout, subrating_instant }
        }
        22 => {
            let max_sniff_subrate = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let min_sniff_timeout = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            let subrating_instant = cursor.read_le_u16().ok_or(SnifferError::ShortFrame)?;
            LmpBody::SniffSubratingRes { max_sniff_subrate, min_sniff_timeout, subrating_instant }
        }
        25 => {
            let io_cap = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let oob = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let auth = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::IoCapabilityReq { io_cap, oob, auth }
        }
        26 => {
            let io_cap = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let oob = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            let auth = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::IoCapabilityRes { io_cap, oob, auth }
        }
        31 => LmpBody::PowerControlReq {
            poweradj: cursor.read_u8().ok_or(SnifferError::ShortFrame)?,
        },
        32 => {
            let b = cursor.read_u8().ok_or(SnifferError::ShortFrame)?;
            LmpBody::PowerControlRes {
                p_8dpsk: crate::cursor::msb_field_u8(b, 2, 2),
                p_dqpsk: crate::cursor::msb_field_u8(b, 4, 2),
                p_gfsk: crate::cursor::msb_field_u8(b, 6, 2),
            }
        }
        23 | 24 | 27 | 28 | 29 | 33 | 34 => LmpBody::Empty,
        _ => LmpBody::Empty,
    };
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_req_matches_spec_scenario_s5() {
        // S5: 08 0F 00 09 61 -> version:8, company_id:0x000F, subversion:0x6109
        let buf = [0x08u8, 0x0F, 0x00, 0x09, 0x61];
        let mut c = Cursor::new(&buf);
        let body = parse_base(37, &mut c).unwrap();
        assert_eq!(
            body,
            LmpBody::VersionReq { version: 8, company_id: 0x000F, subversion: 0x6109 }
        );
    }

    #[test]
    fn features_req_ext_matches_spec_scenario_s6() {
        // S6: fpage=1, max_page=2, features1 = next 8 bytes
        let mut buf = vec![0x01u8, 0x02];
        buf.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        let mut c = Cursor::new(&buf);
        let body = parse_ext(3, &mut c).unwrap();
        match body {
            LmpBody::FeaturesReqExt { fpage, max_page, features } => {
                assert_eq!(fpage, 1);
                assert_eq!(max_page, 2);
                assert_eq!(features, 1);
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn detach_detail_resolves_error_code_name() {
        let body = LmpBody::Detach { error_code: 0x13 };
        assert_eq!(body.detail().as_deref(), Some("error=remote_user_terminated_connection"));
    }

    #[test]
    fn version_res_detail_resolves_version_name() {
        let body = LmpBody::VersionRes { version: 9, company_id: 0, subversion: 0 };
        assert_eq!(body.detail().as_deref(), Some("version=5.0"));
    }

    #[test]
    fn features_res_detail_lists_set_flag_names() {
        let body = LmpBody::FeaturesRes { features: 0b101 };
        assert_eq!(body.detail().as_deref(), Some("features=[3_slot_packets,encryption]"));
    }

    #[test]
    fn features_res_ext_detail_selects_table_by_fpage() {
        let body = LmpBody::FeaturesResExt { fpage: 1, max_page: 2, features: 1 };
        assert_eq!(
            body.detail().as_deref(),
            Some("features=[secure_simple_pairing_host_support]")
        );
    }

    #[test]
    fn empty_body_has_no_detail() {
        assert_eq!(LmpBody::Empty.detail(), None);
    }

    #[test]
    fn short_name_res_is_a_short_frame_error() {
        let buf = [0x00u8, 0x05]; // name_len=5 but no fragment bytes follow
        let mut c = Cursor::new(&buf);
        assert!(matches!(parse_base(2, &mut c), Err(SnifferError::ShortFrame)));
    }
}
