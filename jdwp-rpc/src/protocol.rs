// JDWP wire frames
//
// Reference: https://docs.oracle.com/javase/8/docs/platform/jpda/jdwp/jdwp-protocol.html

use crate::error::{JdwpError, JdwpResult};
use bytes::{Buf, BufMut, BytesMut};

// JDWP uses big-endian (network byte order) for all multi-byte values

// JDWP handshake string
pub const JDWP_HANDSHAKE: &[u8] = b"JDWP-Handshake";

// Packet structure:
// length (4 bytes) - includes header
// id (4 bytes)
// flags (1 byte) - 0x00 = command, 0x80 = reply
// [Command packet: command set (1 byte) + command (1 byte)]
// [Reply packet: error code (2 bytes)]
// data (variable)

pub const HEADER_SIZE: usize = 11;
pub const REPLY_FLAG: u8 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    pub id: u32,
    pub command_set: u8,
    pub command: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPacket {
    pub id: u32,
    pub error_code: u16,
    pub data: Vec<u8>,
}

/// One frame read off the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Reply(ReplyPacket),
    Command(CommandPacket),
}

impl CommandPacket {
    pub fn new(id: u32, command_set: u8, command: u8) -> Self {
        Self {
            id,
            command_set,
            command,
            data: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let length = HEADER_SIZE + self.data.len();
        let mut buf = BytesMut::with_capacity(length);

        buf.put_u32(length as u32);
        buf.put_u32(self.id);
        buf.put_u8(0x00); // command flag
        buf.put_u8(self.command_set);
        buf.put_u8(self.command);
        buf.put_slice(&self.data);

        buf.to_vec()
    }
}

impl ReplyPacket {
    pub fn new(id: u32, error_code: u16, data: Vec<u8>) -> Self {
        Self {
            id,
            error_code,
            data,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let length = HEADER_SIZE + self.data.len();
        let mut buf = BytesMut::with_capacity(length);

        buf.put_u32(length as u32);
        buf.put_u32(self.id);
        buf.put_u8(REPLY_FLAG);
        buf.put_u16(self.error_code);
        buf.put_slice(&self.data);

        buf.to_vec()
    }

    pub fn is_error(&self) -> bool {
        self.error_code != 0
    }
}

impl Frame {
    /// Decode a complete frame, header included.
    pub fn decode(mut buf: &[u8]) -> JdwpResult<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(JdwpError::Transport(format!(
                "Frame too short: {} bytes",
                buf.len()
            )));
        }

        let length = buf.get_u32() as usize;
        if length != buf.len() + 4 {
            return Err(JdwpError::Transport(format!(
                "Frame length {} does not match {} bytes received",
                length,
                buf.len() + 4
            )));
        }

        let id = buf.get_u32();
        let flags = buf.get_u8();

        if flags & REPLY_FLAG != 0 {
            let error_code = buf.get_u16();
            Ok(Frame::Reply(ReplyPacket {
                id,
                error_code,
                data: buf.to_vec(),
            }))
        } else {
            let command_set = buf.get_u8();
            let command = buf.get_u8();
            Ok(Frame::Command(CommandPacket {
                id,
                command_set,
                command,
                data: buf.to_vec(),
            }))
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Frame::Reply(r) => r.id,
            Frame::Command(c) => c.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_packet_encode() {
        let packet = CommandPacket::new(1, 1, 1);
        let encoded = packet.encode();

        assert_eq!(encoded.len(), HEADER_SIZE);
        assert_eq!(&encoded[0..4], &[0, 0, 0, 11]); // length (big-endian)
        assert_eq!(&encoded[4..8], &[0, 0, 0, 1]); // id (big-endian)
        assert_eq!(encoded[8], 0x00); // command flag
        assert_eq!(encoded[9], 1); // command set
        assert_eq!(encoded[10], 1); // command
    }

    #[test]
    fn test_big_endian_encoding() {
        let packet = CommandPacket::new(0x12345678, 1, 1);
        let encoded = packet.encode();

        assert_eq!(&encoded[4..8], &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_reply_frame_decode() {
        let reply_data = vec![
            0, 0, 0, 13, // length
            0, 0, 0, 1, // id
            0x80, // reply flag
            0, 41, // error code
            7, 8,
        ];

        let frame = Frame::decode(&reply_data).unwrap();
        assert_eq!(frame, Frame::Reply(ReplyPacket::new(1, 41, vec![7, 8])));
        assert_eq!(frame.id(), 1);
    }

    #[test]
    fn test_command_frame_decode() {
        let encoded = CommandPacket::new(9, 64, 100).with_data(vec![2]).encode();
        match Frame::decode(&encoded).unwrap() {
            Frame::Command(c) => {
                assert_eq!((c.id, c.command_set, c.command), (9, 64, 100));
                assert_eq!(c.data, vec![2]);
            }
            other => panic!("expected command frame, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_frames_rejected() {
        assert!(matches!(
            Frame::decode(&[0, 0, 0, 11]),
            Err(JdwpError::Transport(_))
        ));

        let mut encoded = ReplyPacket::new(1, 0, vec![1, 2]).encode();
        encoded.pop();
        assert!(Frame::decode(&encoded).is_err());
    }
}
