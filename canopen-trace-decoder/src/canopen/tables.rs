//! CiA 301 lookup tables (emergency error codes, SDO abort codes)

/// Emergency error code descriptions (CiA 301 table 21)
pub fn emcy_error(code: u16) -> Option<&'static str> {
    let text = match code {
        0x0000 => "Error reset or no error",
        0x1000 => "Generic error",
        0x2000 => "Current - generic error",
        0x2100 => "Current, CANopen device input side - generic",
        0x2200 => "Current inside the CANopen device - generic",
        0x2300 => "Current, CANopen device output side - generic",
        0x3000 => "Voltage - generic error",
        0x3100 => "Mains voltage - generic",
        0x3200 => "Voltage inside the CANopen device - generic",
        0x3300 => "Output voltage - generic",
        0x4000 => "Temperature - generic error",
        0x4100 => "Ambient temperature - generic",
        0x4200 => "Device temperature - generic",
        0x5000 => "CANopen device hardware - generic error",
        0x6000 => "CANopen device software - generic error",
        0x6100 => "Internal software - generic",
        0x6200 => "User software - generic",
        0x6300 => "Data set - generic",
        0x7000 => "Additional modules - generic error",
        0x8000 => "Monitoring - generic error",
        0x8100 => "Communication - generic",
        0x8110 => "CAN overrun (objects lost)",
        0x8120 => "CAN in error passive mode",
        0x8130 => "Life guard error or heartbeat error",
        0x8140 => "recovered from bus off",
        0x8150 => "CAN-ID collision",
        0x8200 => "Protocol error - generic",
        0x8210 => "PDO not processed due to length error",
        0x8220 => "PDO length exceeded",
        0x8230 => "DAM MPDO not processed, destination object not available",
        0x8240 => "Unexpected SYNC data length",
        0x8250 => "RPDO timeout",
        0x9000 => "External error - generic error",
        0xF000 => "Additional functions - generic error",
        0xFF00 => "Device specific - generic error",
        _ => return None,
    };
    Some(text)
}

/// Emergency error classes by the high byte of the error code
pub fn emcy_error_class(class: u8) -> Option<&'static str> {
    let text = match class {
        0x00 => "Error reset or no error",
        0x10 => "Generic error",
        0x20 => "Current",
        0x21 => "Current, CANopen device input side",
        0x22 => "Current inside the CANopen device",
        0x23 => "Current, CANopen device output side",
        0x30 => "Voltage",
        0x31 => "Mains voltage",
        0x32 => "Voltage inside the CANopen device",
        0x33 => "Output voltage",
        0x40 => "Temperature",
        0x41 => "Ambient temperature",
        0x42 => "CANopen device temperature",
        0x50 => "CANopen device hardware",
        0x60 => "CANopen device software",
        0x61 => "Internal software",
        0x62 => "User software",
        0x63 => "Data set",
        0x70 => "Additional modules",
        0x80 => "Monitoring",
        0x81 => "Communication",
        0x82 => "Protocol error",
        0x90 => "External error",
        0xF0 => "Additional functions",
        0xFF => "CANopen device specific",
        _ => return None,
    };
    Some(text)
}

/// SDO abort code descriptions (CiA 301 table 22)
pub fn sdo_abort_reason(code: u32) -> Option<&'static str> {
    let text = match code {
        0x0503_0000 => "Toggle bit not alternated.",
        0x0504_0000 => "SDO protocol timed out.",
        0x0504_0001 => "Client/server command specifier not valid or unknown.",
        0x0504_0002 => "Invalid block size (block mode only).",
        0x0504_0003 => "Invalid sequence number (block mode only).",
        0x0504_0004 => "CRC error (block mode only).",
        0x0504_0005 => "Out of memory.",
        0x0601_0000 => "Unsupported access to an object.",
        0x0601_0001 => "Attempt to read a write only object.",
        0x0601_0002 => "Attempt to write a read only object.",
        0x0602_0000 => "Object does not exist in the object dictionary.",
        0x0604_0041 => "Object cannot be mapped to the PDO.",
        0x0604_0042 => "The number and length of the objects to be mapped would exceed PDO length.",
        0x0604_0043 => "General parameter incompatibility reason.",
        0x0604_0047 => "General internal incompatibility in the device.",
        0x0606_0000 => "Access failed due to an hardware error.",
        0x0607_0010 => "Data type does not match, length of service parameter does not match.",
        0x0607_0012 => "Data type does not match, length of service parameter too high.",
        0x0607_0013 => "Data type does not match, length of service parameter too low.",
        0x0609_0011 => "Sub-index does not exist.",
        0x0609_0030 => "Invalid value for parameter (download only).",
        0x0609_0031 => "Value of parameter written too high (download only).",
        0x0609_0032 => "Value of parameter written too low (download only).",
        0x0609_0036 => "Maximum value is less than minimum value.",
        0x060A_0023 => "Resource not available: SDO connection.",
        0x0800_0000 => "General error.",
        0x0800_0020 => "Data cannot be transferred or stored to the application.",
        0x0800_0021 => {
            "Data cannot be transferred or stored to the application because of local control."
        }
        0x0800_0022 => {
            "Data cannot be transferred or stored to the application because of the present device state."
        }
        0x0800_0023 => {
            "Object dictionary dynamic generation fails or no object dictionary is present."
        }
        0x0800_0024 => "No data available.",
        _ => return None,
    };
    Some(text)
}
