//! Simulcast encoding policy
//!
//! Encoding hints are advisory: the engine may ignore or reinterpret them.
//! This policy only guarantees what is requested, never what is honored.

use crate::domain::negotiation::value_object::{MediaKind, SendEncoding};

/// One row of the fixed simulcast table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulcastEncoding {
    pub rid: &'static str,
    pub max_bitrate: u32,
    pub scale_resolution_down_by: f64,
}

impl From<&SimulcastEncoding> for SendEncoding {
    fn from(encoding: &SimulcastEncoding) -> Self {
        SendEncoding {
            rid: encoding.rid.to_string(),
            max_bitrate: encoding.max_bitrate,
            scale_resolution_down_by: encoding.scale_resolution_down_by,
        }
    }
}

/// Lowest layer first
pub const SIMULCAST_ENCODINGS: [SimulcastEncoding; 3] = [
    SimulcastEncoding {
        rid: "r0",
        max_bitrate: 700_000,
        scale_resolution_down_by: 16.0,
    },
    SimulcastEncoding {
        rid: "r1",
        max_bitrate: 800_000,
        scale_resolution_down_by: 8.0,
    },
    SimulcastEncoding {
        rid: "r2",
        max_bitrate: 900_000,
        scale_resolution_down_by: 1.0,
    },
];

/// Stateless provider of send encodings for outgoing tracks
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodingPolicy;

impl EncodingPolicy {
    pub fn new() -> Self {
        Self
    }

    /// The fixed simulcast table
    pub fn simulcast_table(&self) -> &'static [SimulcastEncoding] {
        &SIMULCAST_ENCODINGS
    }

    /// Send encodings for an outgoing track of `kind`
    ///
    /// Audio never carries encodings; video carries the full table when
    /// simulcast is enabled.
    pub fn send_encodings(&self, kind: MediaKind, simulcast: bool) -> Vec<SendEncoding> {
        match kind {
            MediaKind::Video if simulcast => {
                self.simulcast_table().iter().map(SendEncoding::from).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_fixed() {
        let table = EncodingPolicy::new().simulcast_table();
        let rids: Vec<_> = table.iter().map(|e| e.rid).collect();
        let scales: Vec<_> = table.iter().map(|e| e.scale_resolution_down_by).collect();
        let bitrates: Vec<_> = table.iter().map(|e| e.max_bitrate).collect();

        assert_eq!(rids, vec!["r0", "r1", "r2"]);
        assert_eq!(scales, vec![16.0, 8.0, 1.0]);
        assert_eq!(bitrates, vec![700_000, 800_000, 900_000]);
    }

    #[test]
    fn test_video_gets_table_when_simulcast() {
        let encodings = EncodingPolicy::new().send_encodings(MediaKind::Video, true);
        assert_eq!(encodings.len(), 3);
        assert_eq!(encodings[0].rid, "r0");
        assert_eq!(encodings[2].scale_resolution_down_by, 1.0);
    }

    #[test]
    fn test_audio_never_gets_encodings() {
        let policy = EncodingPolicy::new();
        assert!(policy.send_encodings(MediaKind::Audio, true).is_empty());
        assert!(policy.send_encodings(MediaKind::Audio, false).is_empty());
    }

    #[test]
    fn test_video_without_simulcast() {
        assert!(EncodingPolicy::new()
            .send_encodings(MediaKind::Video, false)
            .is_empty());
    }
}
