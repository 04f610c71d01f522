//! Animation persistence: the device-hosted library and config endpoints
//! over HTTP, and local JSON import/export of the same frame schema.

use std::time::{Duration, Instant};

use tracing::instrument;

use crate::error::{GlowgridError, GlowgridResult};
use crate::grid::{COLS, Frame, ROWS};
use crate::protocol::{self, Telemetry};
use crate::sched::Deadline;
use crate::timeline::{Animation, DEFAULT_FPS};

pub const ANIMATION_SCHEMA_VERSION: u32 = 1;

/// How often the HTTP fallback asks the device for status while the
/// WebSocket is down.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// On-disk animation snapshot. The same schema travels to and from the
/// device's animation store, minus the geometry fields.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct AnimationFile {
    pub name: String,
    pub version: u32,
    pub rows: u32,
    pub cols: u32,
    pub fps: u32,
    #[serde(rename = "loop")]
    pub looped: bool,
    pub frames: Vec<Frame>,
}

pub fn export_animation(name: &str, anim: &Animation) -> AnimationFile {
    AnimationFile {
        name: name.to_string(),
        version: ANIMATION_SCHEMA_VERSION,
        rows: ROWS as u32,
        cols: COLS as u32,
        fps: anim.fps,
        looped: anim.looped,
        frames: anim.frames.clone(),
    }
}

pub fn export_json(name: &str, anim: &Animation) -> GlowgridResult<String> {
    serde_json::to_string_pretty(&export_animation(name, anim))
        .map_err(|e| GlowgridError::library(format!("encode animation: {e}")))
}

/// Parse an exported file back into an animation.
///
/// A rows/cols mismatch with the compiled-in matrix is a hard rejection,
/// not a resize; the caller's in-memory animation is untouched because
/// nothing is swapped in until this returns `Ok`.
pub fn import_json(text: &str) -> GlowgridResult<Animation> {
    let file: AnimationFile = serde_json::from_str(text)
        .map_err(|e| GlowgridError::library(format!("invalid animation file: {e}")))?;
    if (file.rows, file.cols) != (ROWS as u32, COLS as u32) {
        return Err(GlowgridError::geometry_mismatch(file.rows, file.cols));
    }
    let anim = Animation {
        frames: file.frames,
        fps: file.fps,
        looped: file.looped,
    };
    anim.validate()?;
    Ok(anim)
}

/// The device's pixel-output configuration, clamped the way the firmware
/// clamps it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelConfig {
    pub count: u32,
    pub brightness: u8,
}

impl PixelConfig {
    pub const DEFAULT_COUNT: u32 = 300;
    pub const DEFAULT_BRIGHTNESS: u8 = 200;

    /// Clamp raw values into the ranges the device accepts.
    pub fn sanitized(count: i64, brightness: i64) -> Self {
        Self {
            count: count.clamp(1, 1024) as u32,
            brightness: brightness.clamp(0, 255) as u8,
        }
    }
}

impl Default for PixelConfig {
    fn default() -> Self {
        Self {
            count: Self::DEFAULT_COUNT,
            brightness: Self::DEFAULT_BRIGHTNESS,
        }
    }
}

#[derive(serde::Serialize)]
struct SaveRequest<'a> {
    name: &'a str,
    fps: u32,
    #[serde(rename = "loop")]
    looped: bool,
    frames: &'a [Frame],
}

#[derive(serde::Deserialize)]
struct LoadResponse {
    fps: Option<u32>,
    #[serde(rename = "loop")]
    looped: Option<bool>,
    frames: Vec<Frame>,
}

#[derive(serde::Serialize)]
struct ConfigRequest {
    pixels: PixelConfig,
}

/// Blocking HTTP client for the device's REST surface: the animation
/// library, pixel config, status polling and log retrieval.
pub struct DeviceClient {
    base: String,
    http: reqwest::blocking::Client,
}

impl DeviceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            base,
            http: reqwest::blocking::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Names of the animations held by the device.
    #[instrument(skip(self))]
    pub fn list_animations(&self) -> GlowgridResult<Vec<String>> {
        self.http
            .get(self.url("/api/animations"))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| GlowgridError::library(format!("list animations: {e}")))
    }

    #[instrument(skip(self, anim))]
    pub fn save_animation(&self, name: &str, anim: &Animation) -> GlowgridResult<()> {
        let request = SaveRequest {
            name,
            fps: anim.fps,
            looped: anim.looped,
            frames: &anim.frames,
        };
        self.http
            .post(self.url("/api/animations"))
            .json(&request)
            .send()
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|e| GlowgridError::library(format!("save animation '{name}': {e}")))
    }

    /// Fetch a stored animation. Missing rate or loop fields fall back to
    /// the editor defaults; the frame payload itself is validated strictly.
    #[instrument(skip(self))]
    pub fn load_animation(&self, name: &str) -> GlowgridResult<Animation> {
        let response: LoadResponse = self
            .http
            .get(self.url(&format!("/api/animations/{name}")))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| GlowgridError::library(format!("load animation '{name}': {e}")))?;

        let anim = Animation {
            frames: response.frames,
            fps: response.fps.unwrap_or(DEFAULT_FPS),
            looped: response.looped.unwrap_or(true),
        };
        anim.validate()?;
        Ok(anim)
    }

    /// Read the pixel section of the device config. Missing fields fall
    /// back to the firmware defaults; extra config sections are ignored.
    #[instrument(skip(self))]
    pub fn fetch_config(&self) -> GlowgridResult<PixelConfig> {
        let value: serde_json::Value = self
            .http
            .get(self.url("/config"))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| GlowgridError::library(format!("fetch config: {e}")))?;

        let pixels = value.get("pixels");
        let field = |name: &str| pixels.and_then(|p| p.get(name)).and_then(|v| v.as_u64());
        Ok(PixelConfig {
            count: field("count").unwrap_or(u64::from(PixelConfig::DEFAULT_COUNT)) as u32,
            brightness: field("brightness")
                .unwrap_or(u64::from(PixelConfig::DEFAULT_BRIGHTNESS))
                .min(255) as u8,
        })
    }

    #[instrument(skip(self))]
    pub fn push_config(&self, pixels: PixelConfig) -> GlowgridResult<()> {
        self.http
            .post(self.url("/config"))
            .json(&ConfigRequest { pixels })
            .send()
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|e| GlowgridError::library(format!("push config: {e}")))
    }

    /// Polling-fallback telemetry, same lenient parse as the WebSocket
    /// payloads.
    pub fn fetch_status(&self) -> GlowgridResult<Telemetry> {
        let body = self
            .http
            .get(self.url("/status"))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| GlowgridError::library(format!("fetch status: {e}")))?;
        protocol::parse_telemetry(&body)
            .ok_or_else(|| GlowgridError::library("status payload is not a JSON object"))
    }

    /// The device's current run log, served from a fixed path.
    pub fn fetch_log(&self) -> GlowgridResult<String> {
        self.http
            .get(self.url("/logs/run_latest.txt"))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| GlowgridError::library(format!("fetch log: {e}")))
    }
}

/// Schedules the HTTP status fallback while the WebSocket link is down.
/// Starting is idempotent; stopping cancels the pending poll.
#[derive(Debug, Default)]
pub struct StatusPoller {
    tick: Deadline,
}

impl StatusPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Instant) {
        self.tick.arm_if_idle(now);
    }

    pub fn stop(&mut self) {
        self.tick.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.tick.is_armed()
    }

    /// `true` when a status request is due; re-arms for the next interval.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.tick.fire(now) {
            self.tick.arm(now + STATUS_POLL_INTERVAL);
            true
        } else {
            false
        }
    }
}
