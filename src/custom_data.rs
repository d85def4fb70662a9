//! Custom data block codec.
//!
//! Each tagged scene object carries a block under header [`DATA_ID`]:
//!
//! ```text
//! { field_id: u32 LE, field_len: u32 LE, payload: [u8; field_len] }*
//! ```
//!
//! Records are packed back to back with no padding and no trailer.

use crate::{QuadcopterError, Result};
use std::collections::BTreeMap;

/// Header number our custom data is stored under.
pub const DATA_ID: u32 = 1000;

/// Decoded custom data: field ID -> payload.
pub type CustomData = BTreeMap<u32, Vec<u8>>;

/// Read a little-endian u32 at `*pos`, advancing past it.
fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32> {
    let bytes = buf
        .get(*pos..*pos + 4)
        .ok_or(QuadcopterError::Format)?;
    *pos += 4;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Parse a custom data buffer into its fields. A repeated field ID keeps
/// the last payload.
pub fn decode(buf: &[u8]) -> Result<CustomData> {
    let mut result = CustomData::new();
    let mut pos = 0;

    while pos != buf.len() {
        let id = read_u32(buf, &mut pos)?;
        let len = read_u32(buf, &mut pos)? as usize;
        let end = pos.checked_add(len).ok_or(QuadcopterError::Format)?;
        let payload = buf.get(pos..end).ok_or(QuadcopterError::Format)?;
        result.insert(id, payload.to_vec());
        pos = end;
    }

    Ok(result)
}

/// Encode records in order. Duplicates are written as given.
pub fn encode<'a, I>(records: I) -> Vec<u8>
where
    I: IntoIterator<Item = (u32, &'a [u8])>,
{
    let mut buf = Vec::new();
    for (id, payload) in records {
        buf.extend_from_slice(&id.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload);
    }
    buf
}

/// Builder for authoring a custom data block.
#[derive(Debug, Default, Clone)]
pub struct CustomDataBuilder {
    records: Vec<(u32, Vec<u8>)>,
}

impl CustomDataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the object with a role, empty payload.
    pub fn field(self, field: crate::Field) -> Self {
        self.record(field.id(), Vec::new())
    }

    pub fn record(mut self, id: u32, payload: impl Into<Vec<u8>>) -> Self {
        self.records.push((id, payload.into()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        encode(self.records.iter().map(|(id, p)| (*id, p.as_slice())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    #[test]
    fn test_decode_empty() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_decode_wire_layout() {
        let buf = [
            0x07, 0x00, 0x00, 0x00, // id = 7
            0x02, 0x00, 0x00, 0x00, // len = 2
            0xAB, 0xCD, //
            0x00, 0x00, 0x00, 0x00, // id = 0
            0x00, 0x00, 0x00, 0x00, // len = 0
        ];
        let data = decode(&buf).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[&7], vec![0xAB, 0xCD]);
        assert!(data[&0].is_empty());
    }

    #[test]
    fn test_round_trip() {
        let records: Vec<(u32, Vec<u8>)> = vec![
            (Field::Body.id(), vec![]),
            (Field::Motor2.id(), b"rear".to_vec()),
            (0xDEAD_BEEF, vec![0; 300]),
        ];
        let buf = encode(records.iter().map(|(id, p)| (*id, p.as_slice())));
        let data = decode(&buf).unwrap();
        let expected: CustomData = records.into_iter().collect();
        assert_eq!(data, expected);
    }

    #[test]
    fn test_every_truncation_fails() {
        let buf = CustomDataBuilder::new().record(1, b"abcdef".to_vec()).build();
        for cut in 1..buf.len() {
            let truncated = &buf[..buf.len() - cut];
            assert!(
                matches!(decode(truncated), Err(QuadcopterError::Format)),
                "cut {} bytes decoded successfully",
                cut
            );
        }
    }

    #[test]
    fn test_truncation_inside_last_record_fails() {
        let head = CustomDataBuilder::new()
            .record(1, b"abc".to_vec())
            .field(Field::Target)
            .build();
        let buf = CustomDataBuilder::new()
            .record(1, b"abc".to_vec())
            .field(Field::Target)
            .record(42, vec![9; 5])
            .build();
        // Cutting the whole last record leaves a valid buffer, anything less does not.
        let last = buf.len() - head.len();
        for cut in 1..last {
            assert!(matches!(
                decode(&buf[..buf.len() - cut]),
                Err(QuadcopterError::Format)
            ));
        }
        assert_eq!(decode(&buf[..head.len()]).unwrap().len(), 2);
    }

    #[test]
    fn test_length_past_end_fails() {
        let mut buf = encode([(3u32, &b"xy"[..])]);
        buf[4] = 0xFF;
        assert!(matches!(decode(&buf), Err(QuadcopterError::Format)));

        // Huge length must not wrap the cursor.
        buf[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(decode(&buf), Err(QuadcopterError::Format)));
    }

    #[test]
    fn test_duplicate_field_last_wins() {
        let buf = CustomDataBuilder::new()
            .record(5, b"first".to_vec())
            .record(5, b"second".to_vec())
            .build();
        let data = decode(&buf).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[&5], b"second".to_vec());
    }
}
