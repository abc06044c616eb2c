//! Decoders for the single-frame CANopen services (NMT, EMCY, TIME, PDO, error control)

use super::tables;
use crate::types::{FunctionCode, InterpretedMessage};
use byteorder::{ByteOrder, LittleEndian};
use chrono::{Duration, NaiveDate};

/// TIME_OF_DAY milliseconds field without its reserved top bits
const TIME_MS_MASK: u32 = 0x3FFF_FFFF;

/// NMT node control (CiA 301 7.2.8.3.1)
pub fn nmt(payload: Option<&[u8]>) -> InterpretedMessage {
    let Some(&[cs, node, ..]) = payload else {
        return InterpretedMessage::wrong(FunctionCode::Nmt, 0, "NMT");
    };

    let service = match cs {
        0x01 => "Start",
        0x02 => "Stop",
        0x80 => "Enter Preoperational",
        0x81 => "Reset",
        0x82 => "Reset communication",
        _ => "unknown service",
    };

    let text = if node == 0 {
        format!("NMT {} all nodes", service)
    } else {
        format!("NMT {}", service)
    };

    InterpretedMessage::with_text(FunctionCode::Nmt, node, text)
}

/// Emergency object (CiA 301 7.2.7.3.1)
pub fn emcy(node: u8, dlc: u8, payload: Option<&[u8]>) -> InterpretedMessage {
    let data = match payload {
        Some(data) if dlc == 8 && data.len() == 8 => data,
        _ => return InterpretedMessage::wrong(FunctionCode::SyncEmcy, node, "EMCY"),
    };

    let eec = LittleEndian::read_u16(&data[0..2]);
    let er = data[2];

    let mut text = format!("EMCY eec:{:#06x}, er:{:#04x}", eec, er);
    if let Some(description) =
        tables::emcy_error(eec).or_else(|| tables::emcy_error_class((eec >> 8) as u8))
    {
        text.push_str(", ");
        text.push_str(description);
    }

    InterpretedMessage::with_text(FunctionCode::SyncEmcy, node, text)
}

/// TIME object: TIME_OF_DAY with days counted from 1984-01-01 (CiA 301 7.1.6.5)
pub fn time(payload: Option<&[u8]>) -> InterpretedMessage {
    let data = match payload {
        Some(data) if data.len() >= 6 => data,
        _ => return InterpretedMessage::wrong(FunctionCode::Time, 0, "TIME"),
    };

    let ms = LittleEndian::read_u32(&data[0..4]) & TIME_MS_MASK;
    let days = LittleEndian::read_u16(&data[4..6]);

    let date = NaiveDate::from_ymd_opt(1984, 1, 1)
        .and_then(|epoch| epoch.and_hms_opt(0, 0, 0))
        .and_then(|epoch| epoch.checked_add_signed(Duration::days(i64::from(days))))
        .and_then(|day| day.checked_add_signed(Duration::milliseconds(i64::from(ms))));

    let Some(date) = date else {
        return InterpretedMessage::wrong(FunctionCode::Time, 0, "TIME");
    };

    let iso = if ms % 1000 == 0 {
        date.format("%Y-%m-%dT%H:%M:%S")
    } else {
        date.format("%Y-%m-%dT%H:%M:%S%.3f")
    };

    InterpretedMessage::with_text(FunctionCode::Time, 0, format!("TIME ms:{} ({})", ms, iso))
}

/// Process data objects are reported by slot only
pub fn pdo(function: FunctionCode, node: u8) -> InterpretedMessage {
    let text = match function {
        FunctionCode::Pdo1Tx => "Transmit PDO1",
        FunctionCode::Pdo1Rx => "Receive PDO1",
        FunctionCode::Pdo2Tx => "Transmit PDO2",
        FunctionCode::Pdo2Rx => "Receive PDO2",
        FunctionCode::Pdo3Tx => "Transmit PDO3",
        FunctionCode::Pdo3Rx => "Receive PDO3",
        FunctionCode::Pdo4Tx => "Transmit PDO4",
        FunctionCode::Pdo4Rx => "Receive PDO4",
        _ => return InterpretedMessage::unrecognized(node),
    };

    InterpretedMessage::with_text(function, node, text.to_string())
}

/// Heartbeat, boot-up and node guarding (CiA 301 7.2.8.3.2)
pub fn error_control(node: u8, payload: Option<&[u8]>) -> InterpretedMessage {
    match payload {
        None => InterpretedMessage::with_text(
            FunctionCode::ErrorControl,
            node,
            "Node-Guarding Request (RTR)".to_string(),
        ),
        Some(&[state]) => {
            let state = match state & 0x7F {
                0 => "Boot-Up",
                4 => "Stopped",
                5 => "Operational",
                127 => "Preoperational",
                _ => "unknown",
            };
            InterpretedMessage::with_text(
                FunctionCode::ErrorControl,
                node,
                format!("Heartbeat: {}", state),
            )
        }
        Some(_) => InterpretedMessage::wrong(FunctionCode::ErrorControl, node, "Node-Guarding"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nmt_services() {
        let start = nmt(Some(&[0x01, 0x05]));
        assert_eq!(start.text, "NMT Start");
        assert_eq!(start.node, 5);

        assert_eq!(nmt(Some(&[0x01, 0x00])).text, "NMT Start all nodes");
        assert_eq!(nmt(Some(&[0x80, 0x00])).text, "NMT Enter Preoperational all nodes");
        assert_eq!(nmt(Some(&[0x82, 0x7F])).text, "NMT Reset communication");
        assert_eq!(nmt(Some(&[0x42, 0x01])).text, "NMT unknown service");
    }

    #[test]
    fn test_nmt_too_short() {
        let msg = nmt(Some(&[0x01]));
        assert_eq!(msg.text, "wrong NMT");
        assert!(msg.malformed);
        assert!(nmt(None).malformed);
    }

    #[test]
    fn test_emcy_generic_error() {
        let msg = emcy(1, 8, Some(&[0x00, 0x10, 0x00, 0, 0, 0, 0, 0]));
        assert_eq!(msg.text, "EMCY eec:0x1000, er:0x00, Generic error");
        assert!(!msg.malformed);
    }

    #[test]
    fn test_emcy_falls_back_to_class() {
        let msg = emcy(3, 8, Some(&[0x34, 0x42, 0x08, 0, 0, 0, 0, 0]));
        assert_eq!(msg.text, "EMCY eec:0x4234, er:0x08, CANopen device temperature");

        let unknown = emcy(3, 8, Some(&[0x00, 0xA1, 0x01, 0, 0, 0, 0, 0]));
        assert_eq!(unknown.text, "EMCY eec:0xa100, er:0x01");
    }

    #[test]
    fn test_emcy_wrong_length() {
        let msg = emcy(1, 2, Some(&[0x00, 0x10]));
        assert_eq!(msg.text, "wrong EMCY");
        assert!(msg.malformed);
        assert!(emcy(1, 8, None).malformed);
    }

    #[test]
    fn test_time_epoch() {
        let msg = time(Some(&[0, 0, 0, 0, 0, 0]));
        assert_eq!(msg.text, "TIME ms:0 (1984-01-01T00:00:00)");
    }

    #[test]
    fn test_time_with_days_and_reserved_bits() {
        // 3_723_456 ms = 01:02:03.456, reserved bits set; 366 days = 1985-01-01
        let ms: u32 = 3_723_456 | 0xC000_0000;
        let mut data = ms.to_le_bytes().to_vec();
        data.extend_from_slice(&366u16.to_le_bytes());

        let msg = time(Some(&data));
        assert_eq!(msg.text, "TIME ms:3723456 (1985-01-01T01:02:03.456)");
    }

    #[test]
    fn test_time_too_short() {
        assert_eq!(time(Some(&[0, 0, 0, 0])).text, "wrong TIME");
    }

    #[test]
    fn test_error_control() {
        assert_eq!(error_control(5, None).text, "Node-Guarding Request (RTR)");
        assert_eq!(error_control(5, Some(&[0x00])).text, "Heartbeat: Boot-Up");
        assert_eq!(error_control(5, Some(&[0x85])).text, "Heartbeat: Operational");
        assert_eq!(error_control(5, Some(&[0x7F])).text, "Heartbeat: Preoperational");
        assert_eq!(error_control(5, Some(&[0x03])).text, "Heartbeat: unknown");

        let wrong = error_control(5, Some(&[0x05, 0x00]));
        assert_eq!(wrong.text, "wrong Node-Guarding");
        assert!(wrong.malformed);
    }

    #[test]
    fn test_pdo_names() {
        assert_eq!(pdo(FunctionCode::Pdo2Rx, 4).text, "Receive PDO2");
        assert_eq!(pdo(FunctionCode::Pdo4Tx, 4).text, "Transmit PDO4");
    }
}
