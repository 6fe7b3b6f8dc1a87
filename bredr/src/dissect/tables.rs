//! Named lookup tables for LMP opcodes, feature bits, error codes and
//! version numbers — used only to produce human-readable summaries; the
//! dissected struct fields always carry the raw values regardless of
//! whether a name is known.

/// LMP base opcode names (opcode 0..127), standard Bluetooth Core names.
/// Returns `None` for reserved/unassigned opcodes.
pub fn base_opcode_name(opcode: u8) -> Option<&'static str> {
    Some(match opcode {
        1 => "name_req",
        2 => "name_res",
        3 => "accepted",
        4 => "not_accepted",
        5 => "clkoffset_req",
        6 => "clkoffset_res",
        7 => "detach",
        8 => "in_rand",
        9 => "comb_key",
        10 => "unit_key",
        11 => "au_rand",
        12 => "sres",
        13 => "temp_rand",
        14 => "temp_key",
        15 => "encryption_mode_req",
        16 => "encryption_key_size_req",
        17 => "start_encryption_req",
        18 => "stop_encryption_req",
        19 => "switch_req",
        20 => "hold_req",
        21 => "hold",
        22 => "sniff_req",
        23 => "sniff_req",
        24 => "unsniff_req",
        25 => "park_req",
        26 => "park",
        27 => "set_broadcast_scan_window",
        28 => "modify_beacon",
        29 => "unpark_bd_addr_req",
        30 => "unpark_pm_addr_req",
        31 => "incr_power_req",
        32 => "decr_power_req",
        33 => "max_power",
        34 => "min_power",
        35 => "auto_rate",
        36 => "preferred_rate",
        37 => "version_req",
        38 => "version_res",
        39 => "features_req",
        40 => "features_res",
        41 => "quality_of_service",
        42 => "quality_of_service_req",
        43 => "SCO_link_req",
        44 => "remove_SCO_link_req",
        45 => "max_slot",
        46 => "max_slot_req",
        47 => "timing_accuracy_req",
        48 => "timing_accuracy_res",
        49 => "setup_complete",
        50 => "use_semi_permanent_key",
        51 => "host_connection_req",
        52 => "slot_offset",
        53 => "page_mode_req",
        54 => "page_scan_mode_req",
        55 => "supervision_timeout",
        56 => "test_activate",
        57 => "test_control",
        58 => "encryption_key_size_mask_req",
        59 => "encryption_key_size_mask_res",
        60 => "set_AFH",
        61 => "encapsulated_header",
        62 => "encapsulated_payload",
        63 => "Simple_Pairing_Confirm",
        64 => "Simple_Pairing_Number",
        65 => "DHkey_Check",
        66 => "pause_encryption_aes_req",
        127 => "escape",
        _ => return None,
    })
}

/// LMP extended (opcode 127) opcode names, 1..34.
pub fn ext_opcode_name(ext_opcode: u8) -> Option<&'static str> {
    Some(match ext_opcode {
        1 => "accepted_ext",
        2 => "not_accepted_ext",
        3 => "features_req_ext",
        4 => "features_res_ext",
        11 => "packet_type_table_req",
        12 => "eSCO_link_req",
        13 => "remove_eSCO_link_req",
        16 => "channel_classification_req",
        17 => "channel_classification",
        21 => "sniff_subrating_req",
        22 => "sniff_subrating_res",
        23 => "pause_encryption_req",
        24 => "resume_encryption_req",
        25 => "IO_Capability_req",
        26 => "IO_Capability_res",
        27 => "numeric_comparison_failed",
        28 => "passkey_failed",
        29 => "oob_failed",
        30 => "keypress_notification",
        31 => "power_control_req",
        32 => "power_control_res",
        33 => "ping_req",
        34 => "ping_res",
        _ => return None,
    })
}

/// Page-0 (standard) LMP feature bit names, bit index 0..63.
pub const FEATURES_PAGE0: [&str; 64] = [
    "3_slot_packets",
    "5_slot_packets",
    "encryption",
    "slot_offset",
    "timing_accuracy",
    "switch",
    "hold_mode",
    "sniff_mode",
    "previously_used",
    "power_control_requests",
    "channel_quality_driven_data_rate",
    "sco_link",
    "hv2_packets",
    "hv3_packets",
    "u_law_log_synchronous_data",
    "a_law_log_synchronous_data",
    "cvsd_synchronous_data",
    "paging_parameter_negotiation",
    "power_control",
    "transparent_synchronous_data",
    "flow_control_lag_bit0",
    "flow_control_lag_bit1",
    "flow_control_lag_bit2",
    "broadcast_encryption",
    "reserved_24",
    "enhanced_data_rate_acl_2mbps_mode",
    "enhanced_data_rate_acl_3mbps_mode",
    "enhanced_inquiry_scan",
    "interlaced_inquiry_scan",
    "interlaced_page_scan",
    "rssi_with_inquiry_results",
    "extended_sco_link_ev3_packets",
    "ev4_packets",
    "ev5_packets",
    "reserved_34",
    "afh_capable_slave",
    "afh_classification_slave",
    "br_edr_not_supported",
    "le_supported_controller",
    "3_slot_enhanced_data_rate_acl_packets",
    "5_slot_enhanced_data_rate_acl_packets",
    "sniff_subrating",
    "pause_encryption",
    "afh_capable_master",
    "afh_classification_master",
    "enhanced_data_rate_esco_2mbps_mode",
    "enhanced_data_rate_esco_3mbps_mode",
    "3_slot_enhanced_data_rate_esco_packets",
    "extended_inquiry_response",
    "simultaneous_le_and_bredr_to_same_device_capable",
    "reserved_50",
    "secure_simple_pairing",
    "encapsulated_pdu",
    "erroneous_data_reporting",
    "non_flushable_packet_boundary_flag",
    "reserved_55",
    "link_supervision_timeout_changed_event",
    "inquiry_response_tx_power_level",
    "enhanced_power_control",
    "reserved_59",
    "reserved_60",
    "reserved_61",
    "extended_features",
    "reserved_63",
];

/// Page-1 extended feature bit names. Most bits in page 1 are reserved;
/// only bit 0 is standardized.
pub const EXT_FEATURES_1: [&str; 64] = {
    let mut names = ["reserved"; 64];
    names[0] = "secure_simple_pairing_host_support";
    names
};

/// Page-2 extended feature bit names, the subset standardized as of Core
/// spec 5.x.
pub const EXT_FEATURES_2: [&str; 64] = {
    let mut names = ["reserved"; 64];
    names[0] = "connectionless_slave_broadcast_master_operation";
    names[1] = "connectionless_slave_broadcast_slave_operation";
    names[2] = "synchronization_train";
    names[3] = "synchronization_scan";
    names[4] = "inquiry_response_notification_event";
    names[5] = "generalized_interlaced_scan";
    names[6] = "coarse_clock_adjustment";
    names[8] = "secure_connections_host_support";
    names
};

/// Decodes a 64-bit feature mask into the list of set flag names from a
/// given page table, skipping unset and unnamed-reserved bits.
pub fn feature_names(mask: u64, table: &[&'static str; 64]) -> Vec<&'static str> {
    (0..64)
        .filter(|bit| mask & (1u64 << bit) != 0)
        .map(|bit| table[bit])
        .collect()
}

/// LMP/HCI error code names, 0..57 (Bluetooth Core spec Part D).
pub fn error_code_name(code: u8) -> Option<&'static str> {
    Some(match code {
        0 => "success",
        1 => "unknown_hci_command",
        2 => "unknown_connection_identifier",
        3 => "hardware_failure",
        4 => "page_timeout",
        5 => "authentication_failure",
        6 => "pin_or_key_missing",
        7 => "memory_capacity_exceeded",
        8 => "connection_timeout",
        9 => "connection_limit_exceeded",
        10 => "synchronous_connection_limit_exceeded",
        11 => "connection_already_exists",
        12 => "command_disallowed",
        13 => "connection_rejected_limited_resources",
        14 => "connection_rejected_security_reasons",
        15 => "connection_rejected_unacceptable_bdaddr",
        16 => "connection_accept_timeout_exceeded",
        17 => "unsupported_feature_or_parameter_value",
        18 => "invalid_hci_command_parameters",
        19 => "remote_user_terminated_connection",
        20 => "remote_device_terminated_low_resources",
        21 => "remote_device_terminated_power_off",
        22 => "connection_terminated_by_local_host",
        23 => "repeated_attempts",
        24 => "pairing_not_allowed",
        25 => "unknown_lmp_pdu",
        26 => "unsupported_remote_feature",
        27 => "sco_offset_rejected",
        28 => "sco_interval_rejected",
        29 => "sco_air_mode_rejected",
        30 => "invalid_lmp_parameters",
        31 => "unspecified_error",
        32 => "unsupported_lmp_parameter_value",
        33 => "role_change_not_allowed",
        34 => "lmp_response_timeout",
        35 => "lmp_error_transaction_collision",
        36 => "lmp_pdu_not_allowed",
        37 => "encryption_mode_not_acceptable",
        38 => "link_key_cannot_be_changed",
        39 => "requested_qos_not_supported",
        40 => "instant_passed",
        41 => "pairing_with_unit_key_not_supported",
        42 => "different_transaction_collision",
        44 => "qos_unacceptable_parameter",
        45 => "qos_rejected",
        46 => "channel_classification_not_supported",
        47 => "insufficient_security",
        48 => "parameter_out_of_mandatory_range",
        50 => "role_switch_pending",
        52 => "reserved_slot_violation",
        53 => "role_switch_failed",
        54 => "extended_inquiry_response_too_large",
        55 => "secure_simple_pairing_not_supported_by_host",
        56 => "host_busy_pairing",
        57 => "connection_rejected_no_suitable_channel_found",
        _ => return None,
    })
}

/// LMP version number byte -> Bluetooth Core spec version string.
pub fn version_name(version: u8) -> Option<&'static str> {
    Some(match version {
        0 => "1.0b",
        1 => "1.1",
        2 => "1.2",
        3 => "2.0+EDR",
        4 => "2.1+EDR",
        5 => "3.0+HS",
        6 => "4.0",
        7 => "4.1",
        8 => "4.2",
        9 => "5.0",
        10 => "5.1",
        11 => "5.2",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_base_opcode() {
        assert_eq!(base_opcode_name(37), Some("version_req"));
    }

    #[test]
    fn known_ext_opcode() {
        assert_eq!(ext_opcode_name(3), Some("features_req_ext"));
    }

    #[test]
    fn feature_name_lookup_respects_mask() {
        let mask = 0b101;
        let names = feature_names(mask, &FEATURES_PAGE0);
        assert_eq!(names, vec!["3_slot_packets", "encryption"]);
    }

    #[test]
    fn version_lookup() {
        assert_eq!(version_name(8), Some("4.2"));
    }
}
