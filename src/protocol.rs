//! Wire encoding for the device channel. Frames and settings travel as
//! compact binary messages; effect configuration and bulk animation
//! hand-off travel as structured text messages on the same connection.

use crate::color::Rgb;
use crate::effects::ParamSet;
use crate::error::{GlowgridError, GlowgridResult};
use crate::grid::{Frame, LED_COUNT};
use crate::timeline::Animation;

pub const CMD_FRAME: u8 = 0x01;
pub const CMD_SETTINGS: u8 = 0x02;
pub const CMD_EFFECT: u8 = 0x03;
pub const CMD_ANIMATION_META: u8 = 0x04;

/// `[cmd][brightness]` followed by an RGB triplet per LED.
pub const FRAME_MESSAGE_LEN: usize = 2 + LED_COUNT * 3;
pub const SETTINGS_MESSAGE_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceMode {
    Static,
    Animation,
    Effect,
}

impl DeviceMode {
    pub fn wire(self) -> u8 {
        match self {
            Self::Static => 0,
            Self::Animation => 1,
            Self::Effect => 2,
        }
    }

    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Static),
            1 => Some(Self::Animation),
            2 => Some(Self::Effect),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceSettings {
    pub brightness: u8,
    pub speed: u8,
    pub mode: DeviceMode,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            brightness: 128,
            speed: 50,
            mode: DeviceMode::Static,
        }
    }
}

/// Encode one frame for streaming. The single brightness byte applies to
/// the whole device for this frame.
pub fn encode_frame(frame: &Frame, brightness: u8) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_MESSAGE_LEN);
    buf.push(CMD_FRAME);
    buf.push(brightness);
    for pixel in frame.as_slice() {
        buf.extend([pixel.r, pixel.g, pixel.b]);
    }
    buf
}

/// Decode a frame message back into brightness and pixels.
pub fn decode_frame(bytes: &[u8]) -> GlowgridResult<(u8, Frame)> {
    if bytes.len() != FRAME_MESSAGE_LEN {
        return Err(GlowgridError::protocol(format!(
            "frame message is {} bytes, expected {FRAME_MESSAGE_LEN}",
            bytes.len()
        )));
    }
    if bytes[0] != CMD_FRAME {
        return Err(GlowgridError::protocol(format!(
            "expected frame command 0x{CMD_FRAME:02x}, got 0x{:02x}",
            bytes[0]
        )));
    }
    let brightness = bytes[1];
    let pixels = bytes[2..]
        .chunks_exact(3)
        .map(|rgb| Rgb::new(rgb[0], rgb[1], rgb[2]))
        .collect();
    Ok((brightness, Frame::from_pixels(pixels)?))
}

pub fn encode_settings(settings: DeviceSettings) -> [u8; SETTINGS_MESSAGE_LEN] {
    [
        CMD_SETTINGS,
        settings.brightness,
        settings.speed,
        settings.mode.wire(),
    ]
}

pub fn decode_settings(bytes: &[u8]) -> GlowgridResult<DeviceSettings> {
    if bytes.len() != SETTINGS_MESSAGE_LEN || bytes[0] != CMD_SETTINGS {
        return Err(GlowgridError::protocol("malformed settings message"));
    }
    let mode = DeviceMode::from_wire(bytes[3])
        .ok_or_else(|| GlowgridError::protocol(format!("unknown device mode {}", bytes[3])))?;
    Ok(DeviceSettings {
        brightness: bytes[1],
        speed: bytes[2],
        mode,
    })
}

/// Structured messages carried as JSON text frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TextMessage {
    Effect {
        effect: String,
        params: ParamSet,
    },
    Animation {
        fps: u32,
        #[serde(rename = "loop")]
        looped: bool,
        frames: Vec<Frame>,
    },
}

impl TextMessage {
    pub fn effect(name: impl Into<String>, params: &ParamSet) -> Self {
        Self::Effect {
            effect: name.into(),
            params: params.clone(),
        }
    }

    pub fn animation(anim: &Animation) -> Self {
        Self::Animation {
            fps: anim.fps,
            looped: anim.looped,
            frames: anim.frames.clone(),
        }
    }

    pub fn to_json(&self) -> GlowgridResult<String> {
        serde_json::to_string(self)
            .map_err(|e| GlowgridError::protocol(format!("encode text message: {e}")))
    }
}

/// Device-reported runtime metrics, display only. Every field is optional:
/// a missing or mistyped field is dropped on its own without failing the
/// rest of the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Telemetry {
    pub fps: Option<f64>,
    pub packets: Option<u64>,
    pub manual: Option<bool>,
    pub uptime_ms: Option<u64>,
}

impl Telemetry {
    pub fn is_empty(&self) -> bool {
        self.fps.is_none()
            && self.packets.is_none()
            && self.manual.is_none()
            && self.uptime_ms.is_none()
    }
}

/// Lenient telemetry parse. Returns `None` when the payload is not a JSON
/// object at all; otherwise each recognized field is extracted if it has
/// the right type.
pub fn parse_telemetry(text: &str) -> Option<Telemetry> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;
    Some(Telemetry {
        fps: obj.get("fps").and_then(serde_json::Value::as_f64),
        packets: obj.get("packets").and_then(serde_json::Value::as_u64),
        manual: obj.get("manual").and_then(serde_json::Value::as_bool),
        uptime_ms: obj.get("uptime").and_then(serde_json::Value::as_u64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{COLS, ROWS, serpentine_coords};

    fn gradient_frame() -> Frame {
        let mut frame = Frame::blank();
        for index in 0..LED_COUNT {
            let (row, col) = serpentine_coords(index);
            frame.set(
                row,
                col,
                Rgb::new(index as u8, (index / 2) as u8, 255 - index as u8),
            );
        }
        frame
    }

    #[test]
    fn frame_roundtrip_preserves_all_channels() {
        let frame = gradient_frame();
        let encoded = encode_frame(&frame, 200);
        assert_eq!(encoded.len(), FRAME_MESSAGE_LEN);
        assert_eq!(encoded[0], CMD_FRAME);

        let (brightness, decoded) = decode_frame(&encoded).unwrap();
        assert_eq!(brightness, 200);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn frame_payload_is_wire_ordered() {
        let mut frame = Frame::blank();
        frame.set(1, 0, Rgb::new(9, 8, 7));
        let encoded = encode_frame(&frame, 0);
        // Row 1 is reversed, so (1,0) sits at physical index 41.
        let offset = 2 + 41 * 3;
        assert_eq!(&encoded[offset..offset + 3], &[9, 8, 7]);
    }

    #[test]
    fn decode_frame_rejects_bad_length_and_command() {
        assert!(decode_frame(&[CMD_FRAME, 0, 0]).is_err());
        let mut encoded = encode_frame(&Frame::blank(), 0);
        encoded[0] = CMD_SETTINGS;
        assert!(decode_frame(&encoded).is_err());
    }

    #[test]
    fn settings_roundtrip() {
        let settings = DeviceSettings {
            brightness: 128,
            speed: 50,
            mode: DeviceMode::Effect,
        };
        let encoded = encode_settings(settings);
        assert_eq!(encoded, [CMD_SETTINGS, 128, 50, 2]);
        assert_eq!(decode_settings(&encoded).unwrap(), settings);
    }

    #[test]
    fn settings_rejects_unknown_mode() {
        assert!(decode_settings(&[CMD_SETTINGS, 0, 0, 9]).is_err());
    }

    #[test]
    fn effect_message_shape() {
        let mut params = ParamSet::new();
        params.insert("shift".to_string(), 120.0);
        let json = TextMessage::effect("rainbow", &params).to_json().unwrap();
        assert!(json.contains("\"type\":\"effect\""));
        assert!(json.contains("\"effect\":\"rainbow\""));
        assert!(json.contains("\"shift\":120.0"));
    }

    #[test]
    fn animation_message_uses_loop_key() {
        let anim = Animation::new();
        let json = TextMessage::animation(&anim).to_json().unwrap();
        assert!(json.contains("\"type\":\"animation\""));
        assert!(json.contains("\"loop\":true"));
        assert!(json.contains("\"fps\":24"));

        let back: TextMessage = serde_json::from_str(&json).unwrap();
        match back {
            TextMessage::Animation { fps, looped, frames } => {
                assert_eq!(fps, 24);
                assert!(looped);
                assert_eq!(frames.len(), 1);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn telemetry_parses_full_payload() {
        let t = parse_telemetry(r#"{"fps":42.5,"packets":9,"manual":true,"uptime":1234}"#).unwrap();
        assert_eq!(t.fps, Some(42.5));
        assert_eq!(t.packets, Some(9));
        assert_eq!(t.manual, Some(true));
        assert_eq!(t.uptime_ms, Some(1234));
    }

    #[test]
    fn telemetry_drops_mistyped_fields_individually() {
        let t = parse_telemetry(r#"{"fps":"fast","packets":3}"#).unwrap();
        assert_eq!(t.fps, None);
        assert_eq!(t.packets, Some(3));
    }

    #[test]
    fn telemetry_rejects_non_objects_only() {
        assert!(parse_telemetry("not json").is_none());
        assert!(parse_telemetry("[1,2,3]").is_none());
        assert!(parse_telemetry("{}").unwrap().is_empty());
    }

    #[test]
    fn reserved_command_bytes_are_distinct() {
        let cmds = [CMD_FRAME, CMD_SETTINGS, CMD_EFFECT, CMD_ANIMATION_META];
        assert_eq!(cmds, [0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn matrix_dimensions_match_device() {
        assert_eq!((ROWS, COLS), (10, 21));
        assert_eq!(FRAME_MESSAGE_LEN, 632);
    }
}
