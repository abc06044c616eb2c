//! Stateless SDO frame decoding (CiA 301 7.2.4.3)
//!
//! Every SDO frame is decoded on its own, without knowledge of the transfer it belongs
//! to. The meaning of the command byte depends on who sent the frame, so decoding goes
//! through two explicit tables: [`command`] maps (role, command specifier) to an SDO
//! service and [`block_phase`] maps (role, service, sub-command) to a block transfer
//! phase. Both are total, so every command byte has a defined outcome.

use super::tables;
use byteorder::{ByteOrder, LittleEndian};

/// Which side of the SDO connection sent the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Request from the client (SDO receive, 0x600 + node)
    Client,
    /// Response from the server (SDO transmit, 0x580 + node)
    Server,
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }
}

/// SDO service selected by the command specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdoCommand {
    DownloadSegment,
    InitiateDownload,
    InitiateUpload,
    UploadSegment,
    Abort,
    BlockUpload,
    BlockDownload,
    /// Command specifier 7
    Reserved,
}

/// Phase of a block transfer selected by the sub-command bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPhase {
    Initiate,
    /// Client request to start sending sub-blocks (block upload only)
    StartUpload,
    /// Acknowledge of a received sub-block
    Acknowledge,
    End,
}

/// Map a 3-bit command specifier to the service it selects for `role`
pub fn command(role: Role, cs: u8) -> SdoCommand {
    use SdoCommand::*;

    match (role, cs & 0x07) {
        (Role::Client, 0) => DownloadSegment,
        (Role::Client, 1) => InitiateDownload,
        (Role::Client, 2) => InitiateUpload,
        (Role::Client, 3) => UploadSegment,
        (Role::Server, 0) => UploadSegment,
        (Role::Server, 1) => DownloadSegment,
        (Role::Server, 2) => InitiateUpload,
        (Role::Server, 3) => InitiateDownload,
        (_, 4) => Abort,
        (Role::Client, 5) | (Role::Server, 6) => BlockUpload,
        (Role::Client, 6) | (Role::Server, 5) => BlockDownload,
        _ => Reserved,
    }
}

/// Map the sub-command bits of a block transfer frame to its phase
///
/// # Returns
/// * `None` if the combination has no defined layout
pub fn block_phase(role: Role, command: SdoCommand, cb: u8) -> Option<BlockPhase> {
    use BlockPhase::*;

    match (role, command) {
        (Role::Client, SdoCommand::BlockUpload) => Some(match cb & 0b11 {
            0 => Initiate,
            1 => End,
            2 => Acknowledge,
            _ => StartUpload,
        }),
        (Role::Server, SdoCommand::BlockUpload) | (Role::Client, SdoCommand::BlockDownload) => {
            Some(if cb & 0b1 == 0 { Initiate } else { End })
        }
        (Role::Server, SdoCommand::BlockDownload) => match cb & 0b11 {
            0 => Some(Initiate),
            1 => Some(End),
            2 => Some(Acknowledge),
            _ => None,
        },
        _ => None,
    }
}

/// Decoded content of one SDO frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdoFrame {
    pub text: String,
    pub index: u16,
    pub subindex: u8,
    /// Expedited inline value (initiate download request / upload response)
    pub inline: Option<Vec<u8>>,
}

impl SdoFrame {
    fn text(text: String) -> Self {
        Self {
            text,
            index: 0,
            subindex: 0,
            inline: None,
        }
    }

    fn addressed(text: String, data: &[u8; 8]) -> Self {
        Self {
            text,
            index: LittleEndian::read_u16(&data[1..3]),
            subindex: data[3],
            inline: None,
        }
    }
}

/// Decode the 8 data bytes of an SDO frame sent by `role`
pub fn decode(role: Role, data: &[u8; 8]) -> SdoFrame {
    let cb = data[0];
    let who = role.label();
    let service = command(role, cb >> 5);

    match service {
        SdoCommand::DownloadSegment | SdoCommand::UploadSegment => segment(role, service, data),
        SdoCommand::InitiateDownload | SdoCommand::InitiateUpload => initiate(role, service, data),
        // Abort is exactly 0x80; other bytes with cs 4 are numbered sub-block segments
        SdoCommand::Abort if cb != 0x80 => sub_block(role, cb),
        SdoCommand::Abort => {
            let code = LittleEndian::read_u32(&data[4..8]);
            let reason = tables::sdo_abort_reason(code)
                .map(str::to_string)
                .unwrap_or_else(|| format!("abort code:{:#010x}", code));
            SdoFrame::addressed(format!("{}: abort transfer request: \"{}\"", who, reason), data)
        }
        SdoCommand::BlockUpload | SdoCommand::BlockDownload => block(role, service, data),
        SdoCommand::Reserved => SdoFrame::text(String::new()),
    }
}

fn toggle(cb: u8) -> &'static str {
    if cb & 0x10 != 0 {
        "T"
    } else {
        "!T"
    }
}

/// Segment frames: data carrying (download request, upload response) or toggle only
fn segment(role: Role, service: SdoCommand, data: &[u8; 8]) -> SdoFrame {
    let cb = data[0];
    let who = role.label();

    let carries_data = matches!(
        (role, service),
        (Role::Client, SdoCommand::DownloadSegment) | (Role::Server, SdoCommand::UploadSegment)
    );
    let kind = match (role, service) {
        (Role::Client, SdoCommand::DownloadSegment) => "download segment request",
        (Role::Server, SdoCommand::DownloadSegment) => "download segment response",
        (Role::Client, _) => "upload segment request",
        (Role::Server, _) => "upload segment response",
    };

    if !carries_data {
        return SdoFrame::text(format!("{}: {} ({})", who, kind, toggle(cb)));
    }

    let unused = ((cb >> 1) & 0x07) as usize;
    let mut text = format!(
        "{}: {} ({}) = {}",
        who,
        kind,
        toggle(cb),
        format_data(&data[1..8 - unused])
    );
    if cb & 0x01 != 0 {
        text.push_str(" (last segment)");
    }

    SdoFrame::text(text)
}

/// Initiate download/upload frames
fn initiate(role: Role, service: SdoCommand, data: &[u8; 8]) -> SdoFrame {
    let cb = data[0];
    let who = role.label();

    let (request, response) = match (role, service) {
        (Role::Client, SdoCommand::InitiateDownload) => {
            ("download request", "initiate download request")
        }
        (Role::Server, SdoCommand::InitiateUpload) => {
            ("upload response", "initiate upload response")
        }
        // Requests and confirmations without a value field
        (Role::Client, _) => {
            return SdoFrame::addressed(format!("{}: initiate upload request", who), data)
        }
        (Role::Server, _) => {
            return SdoFrame::addressed(format!("{}: initiate download response", who), data)
        }
    };

    let size_indicated = cb & 0x01 != 0;
    let expedited = cb & 0x02 != 0;

    match (expedited, size_indicated) {
        (true, true) => {
            let unused = ((cb >> 2) & 0x03) as usize;
            let value = &data[4..8 - unused];
            let mut frame =
                SdoFrame::addressed(format!("{}: {} = {}", who, request, format_data(value)), data);
            frame.inline = Some(value.to_vec());
            frame
        }
        (true, false) => {
            let value = &data[4..8];
            let mut frame = SdoFrame::addressed(
                format!("{}: {} = {} (unspecified length)", who, request, format_data(value)),
                data,
            );
            frame.inline = Some(value.to_vec());
            frame
        }
        (false, true) => {
            let size = LittleEndian::read_u32(&data[4..8]);
            let text = match role {
                Role::Client => format!("{}: {} for {} bytes", who, response, size),
                Role::Server => format!("{}: {} length={} bytes", who, response, size),
            };
            SdoFrame::addressed(text, data)
        }
        (false, false) => SdoFrame::addressed(format!("{}: {}", who, response), data),
    }
}

/// Block upload / block download frames
fn block(role: Role, service: SdoCommand, data: &[u8; 8]) -> SdoFrame {
    let cb = data[0];
    let who = role.label();

    let Some(phase) = block_phase(role, service, cb) else {
        return sub_block(role, cb);
    };

    match (role, service, phase) {
        (Role::Client, SdoCommand::BlockUpload, BlockPhase::Initiate) => SdoFrame::addressed(
            format!("{}: initiate block upload request, {} segments per block", who, data[4]),
            data,
        ),
        (Role::Client, SdoCommand::BlockUpload, BlockPhase::StartUpload) => {
            SdoFrame::text(format!("{}: block upload: start upload", who))
        }
        (Role::Client, SdoCommand::BlockUpload, BlockPhase::End) => {
            SdoFrame::text(format!("{}: end block upload response", who))
        }
        (Role::Server, SdoCommand::BlockUpload, BlockPhase::Initiate) => {
            let mut text = format!("{}: initiate block upload response", who);
            if cb & 0x02 != 0 {
                text.push_str(&format!(", size: {}", LittleEndian::read_u32(&data[4..8])));
            }
            SdoFrame::addressed(text, data)
        }
        (Role::Server, SdoCommand::BlockUpload, _) => SdoFrame::text(format!(
            "{}: end block upload request, crc:{:#06x}",
            who,
            LittleEndian::read_u16(&data[1..3])
        )),
        (Role::Client, SdoCommand::BlockDownload, BlockPhase::Initiate) => {
            let mut text = format!("{}: initiate block download request", who);
            if cb & 0x02 != 0 {
                text.push_str(&format!(", size: {}", LittleEndian::read_u32(&data[4..8])));
            }
            SdoFrame::addressed(text, data)
        }
        (Role::Client, SdoCommand::BlockDownload, _) => SdoFrame::text(format!(
            "{}: end block download request, crc:{:#06x}",
            who,
            LittleEndian::read_u16(&data[1..3])
        )),
        (Role::Server, SdoCommand::BlockDownload, BlockPhase::Initiate) => SdoFrame::addressed(
            format!("{}: initiate block download response, {} segments per block", who, data[4]),
            data,
        ),
        (Role::Server, SdoCommand::BlockDownload, BlockPhase::End) => {
            SdoFrame::text(format!("{}: end block download response", who))
        }
        (_, SdoCommand::BlockDownload, _) | (_, SdoCommand::BlockUpload, _) => {
            let service = if service == SdoCommand::BlockUpload {
                "block upload"
            } else {
                "block download"
            };
            SdoFrame::text(format!(
                "{}: {} response ackseq:{}, {} segments per block",
                who, service, data[1], data[2]
            ))
        }
        _ => sub_block(role, cb),
    }
}

/// Frames without a defined command layout; with the high bit set these are taken for
/// sub-block segments (sequence number in the low bits, bit 7 = last segment)
fn sub_block(role: Role, cb: u8) -> SdoFrame {
    if cb & 0x80 == 0 {
        return SdoFrame::text(String::new());
    }
    let text = match role {
        Role::Client => "client: block download sub-block",
        Role::Server => "server: block upload sub-block",
    };
    SdoFrame::text(text.to_string())
}

/// Render bytes as `[0x41 0x42] = [AB]`, non-printable bytes escaped as `\xNN`
pub fn format_data(data: &[u8]) -> String {
    let hex: Vec<String> = data.iter().map(|b| format!("{:#04x}", b)).collect();
    let text: String = data
        .iter()
        .map(|&b| {
            if (0x20..0x7F).contains(&b) {
                (b as char).to_string()
            } else {
                format!("\\x{:02x}", b)
            }
        })
        .collect();
    format!("[{}] = [{}]", hex.join(" "), text)
}
