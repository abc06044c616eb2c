//! CANopen semantic decoder
//!
//! Classifies a frame record by the function code and node id packed into its 11-bit
//! CAN id (CiA 301 predefined connection set) and produces an [`InterpretedMessage`].
//! Decoding is a pure function of the frame and the (read-only) object dictionary;
//! malformed payloads become descriptive `wrong ...` messages instead of errors.

pub mod sdo;
pub mod services;
pub mod tables;

use crate::dictionary::database::read_unsigned;
use crate::dictionary::ObjectDictionary;
use crate::types::{FrameRecord, FunctionCode, InterpretedMessage, ResolvedValue};
use sdo::Role;

/// Split an 11-bit CAN id into function code and node id
pub fn classify(can_id: u16) -> (FunctionCode, u8) {
    let function = FunctionCode::from_bits(((can_id >> 7) & 0x0F) as u8);
    let node = (can_id & 0x7F) as u8;
    (function, node)
}

/// Interpret a frame record as a CANopen object
///
/// # Arguments
/// * `frame` - Frame record from a trace
/// * `dictionary` - Optional object dictionary used to name SDO objects
///
/// # Returns
/// The interpreted message; frames that are not CANopen objects come back with
/// [`FunctionCode::None`] and an empty text.
pub fn decode(
    frame: &FrameRecord,
    dictionary: Option<&dyn ObjectDictionary>,
) -> InterpretedMessage {
    let (function, node) = classify(frame.can_id());
    let payload = frame.payload();

    match function {
        FunctionCode::Nmt => services::nmt(payload),
        FunctionCode::SyncEmcy if node == 0 => {
            InterpretedMessage::with_text(FunctionCode::SyncEmcy, 0, "SYNC".to_string())
        }
        FunctionCode::SyncEmcy => services::emcy(node, frame.dlc(), payload),
        FunctionCode::Time if node == 0 => services::time(payload),
        FunctionCode::Pdo1Tx
        | FunctionCode::Pdo1Rx
        | FunctionCode::Pdo2Tx
        | FunctionCode::Pdo2Rx
        | FunctionCode::Pdo3Tx
        | FunctionCode::Pdo3Rx
        | FunctionCode::Pdo4Tx
        | FunctionCode::Pdo4Rx => services::pdo(function, node),
        FunctionCode::ErrorControl => services::error_control(node, payload),
        FunctionCode::SdoRx => decode_sdo(function, Role::Client, node, payload, dictionary),
        FunctionCode::SdoTx => decode_sdo(function, Role::Server, node, payload, dictionary),
        _ => InterpretedMessage::unrecognized(node),
    }
}

fn decode_sdo(
    function: FunctionCode,
    role: Role,
    node: u8,
    payload: Option<&[u8]>,
    dictionary: Option<&dyn ObjectDictionary>,
) -> InterpretedMessage {
    let Some(data) = payload.and_then(|p| <&[u8; 8]>::try_from(p).ok()) else {
        return InterpretedMessage::unrecognized(node);
    };

    let frame = sdo::decode(role, data);
    let mut message = InterpretedMessage::with_text(function, node, frame.text);
    message.index = frame.index;
    message.subindex = frame.subindex;

    if let Some(dictionary) = dictionary {
        resolve(&mut message, frame.inline.as_deref(), dictionary);
    }

    message
}

/// Attach the dictionary name (and inline value) of the addressed object
fn resolve(
    message: &mut InterpretedMessage,
    inline: Option<&[u8]>,
    dictionary: &dyn ObjectDictionary,
) {
    if message.index == 0 {
        return;
    }
    let Some(entry) = dictionary.lookup(message.index, message.subindex) else {
        log::trace!(
            "object {:#06x}/{} not in dictionary",
            message.index,
            message.subindex
        );
        return;
    };

    message.resolved_name = Some(entry.full_name());
    message.resolved_value = inline.filter(|bytes| !bytes.is_empty()).map(|bytes| {
        let raw = read_unsigned(bytes);
        ResolvedValue {
            hex: format!("{:#0width$x}", raw, width = 2 + 2 * bytes.len()),
            value: match entry.data_type {
                Some(data_type) => data_type.decode(bytes),
                None => crate::types::Value::Unsigned(raw),
            },
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{DataType, DictionaryEntry, EdsDictionary};
    use crate::types::Value;

    fn frame(can_id: u32, data: &[u8]) -> FrameRecord {
        FrameRecord::new(1, 0.0, can_id, data.len() as u8, Some(data.to_vec())).unwrap()
    }

    fn dictionary() -> EdsDictionary {
        let mut dict = EdsDictionary::new();
        dict.add_entry(
            0x1017,
            0,
            DictionaryEntry::new("Producer heartbeat time").with_data_type(DataType::Unsigned16),
        );
        dict.add_entry(
            0x1018,
            1,
            DictionaryEntry {
                name: "Vendor-ID".to_string(),
                parent: Some("Identity object".to_string()),
                data_type: Some(DataType::Unsigned32),
                access_type: Some("ro".to_string()),
            },
        );
        dict.add_entry(0x2000, 0, DictionaryEntry::new("Setpoint"));
        dict
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(0x000), (FunctionCode::Nmt, 0));
        assert_eq!(classify(0x081), (FunctionCode::SyncEmcy, 1));
        assert_eq!(classify(0x181), (FunctionCode::Pdo1Tx, 1));
        assert_eq!(classify(0x5FF), (FunctionCode::SdoTx, 0x7F));
        assert_eq!(classify(0x601), (FunctionCode::SdoRx, 1));
        assert_eq!(classify(0x701), (FunctionCode::ErrorControl, 1));
        assert_eq!(classify(0x7E5), (FunctionCode::None, 0x65));
    }

    #[test]
    fn test_nmt_frame() {
        let msg = decode(&frame(0x000, &[0x01, 0x05]), None);
        assert_eq!(msg.function, FunctionCode::Nmt);
        assert_eq!(msg.text, "NMT Start");
        assert_eq!(msg.node, 5);

        let all = decode(&frame(0x000, &[0x01, 0x00]), None);
        assert_eq!(all.text, "NMT Start all nodes");
    }

    #[test]
    fn test_sync_and_emcy() {
        let sync = decode(&frame(0x080, &[]), None);
        assert_eq!(sync.function, FunctionCode::SyncEmcy);
        assert_eq!(sync.text, "SYNC");

        let emcy = decode(&frame(0x081, &[0x00, 0x10, 0x00, 0, 0, 0, 0, 0]), None);
        assert_eq!(emcy.node, 1);
        assert!(emcy.text.contains("Generic error"));
    }

    #[test]
    fn test_time_only_for_node_zero() {
        let time = decode(&frame(0x100, &[0, 0, 0, 0, 0, 0]), None);
        assert_eq!(time.text, "TIME ms:0 (1984-01-01T00:00:00)");

        let other = decode(&frame(0x105, &[0, 0, 0, 0, 0, 0]), None);
        assert_eq!(other.function, FunctionCode::None);
        assert_eq!(other.text, "");
    }

    #[test]
    fn test_pdo_and_heartbeat() {
        assert_eq!(decode(&frame(0x281, &[1, 2]), None).text, "Transmit PDO2");
        assert_eq!(decode(&frame(0x505, &[]), None).text, "Receive PDO4");

        let rtr = FrameRecord::new(1, 0.0, 0x705, 1, None).unwrap();
        assert_eq!(decode(&rtr, None).text, "Node-Guarding Request (RTR)");
        assert_eq!(decode(&frame(0x705, &[0x05]), None).text, "Heartbeat: Operational");
    }

    #[test]
    fn test_sdo_requires_eight_bytes() {
        let short = decode(&frame(0x601, &[0x40, 0x18, 0x10, 0x01]), None);
        assert_eq!(short.function, FunctionCode::None);
        assert_eq!(short.text, "");

        let rtr = FrameRecord::new(1, 0.0, 0x601, 8, None).unwrap();
        assert_eq!(decode(&rtr, None).function, FunctionCode::None);
    }

    #[test]
    fn test_sdo_initiate_upload_request() {
        let msg = decode(&frame(0x605, &[0x40, 0x18, 0x10, 0x01, 0, 0, 0, 0]), None);
        assert_eq!(msg.function, FunctionCode::SdoRx);
        assert_eq!(msg.node, 5);
        assert_eq!(msg.index, 0x1018);
        assert_eq!(msg.subindex, 1);
        assert_eq!(msg.text, "client: initiate upload request");
        assert_eq!(msg.resolved_name, None);
    }

    #[test]
    fn test_sdo_resolves_name() {
        let dict = dictionary();
        let msg = decode(&frame(0x605, &[0x40, 0x18, 0x10, 0x01, 0, 0, 0, 0]), Some(&dict));
        assert_eq!(msg.resolved_name.as_deref(), Some("Identity object.Vendor-ID"));
        assert_eq!(msg.resolved_value, None);
    }

    #[test]
    fn test_sdo_resolves_inline_value() {
        let dict = dictionary();
        let msg = decode(&frame(0x585, &[0x4B, 0x17, 0x10, 0x00, 0xE8, 0x03, 0, 0]), Some(&dict));
        assert_eq!(msg.resolved_name.as_deref(), Some("Producer heartbeat time"));
        assert_eq!(
            msg.resolved_value,
            Some(ResolvedValue {
                hex: "0x03e8".to_string(),
                value: Value::Unsigned(1000),
            })
        );
    }

    #[test]
    fn test_sdo_value_without_declared_type() {
        let dict = dictionary();
        let msg = decode(&frame(0x605, &[0x2F, 0x00, 0x20, 0x00, 0xFF, 0, 0, 0]), Some(&dict));
        assert_eq!(msg.resolved_name.as_deref(), Some("Setpoint"));
        let value = msg.resolved_value.unwrap();
        assert_eq!(value.hex, "0xff");
        assert_eq!(value.value, Value::Unsigned(255));
    }

    #[test]
    fn test_sdo_dictionary_miss() {
        let dict = dictionary();
        let msg = decode(&frame(0x605, &[0x40, 0x00, 0x30, 0x00, 0, 0, 0, 0]), Some(&dict));
        assert_eq!(msg.index, 0x3000);
        assert_eq!(msg.resolved_name, None);
        assert_eq!(msg.resolved_value, None);
    }

    #[test]
    fn test_abort_decoding() {
        let msg = decode(&frame(0x585, &[0x80, 0x00, 0x20, 0x00, 0x00, 0x00, 0x02, 0x06]), None);
        assert!(msg.text.contains("Object does not exist in the object dictionary."));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let dict = dictionary();
        let f = frame(0x585, &[0x4B, 0x17, 0x10, 0x00, 0xE8, 0x03, 0, 0]);
        assert_eq!(decode(&f, Some(&dict)), decode(&f, Some(&dict)));
    }

    #[test]
    fn test_reserved_function_codes() {
        let lss = decode(&frame(0x7E5, &[0x04, 0x01, 0, 0, 0, 0, 0, 0]), None);
        assert_eq!(lss.function, FunctionCode::None);
        assert_eq!(lss.text, "");
        assert!(!lss.malformed);

        assert_eq!(decode(&frame(0x681, &[0; 8]), None).function, FunctionCode::None);
    }
}
