#![forbid(unsafe_code)]

pub mod color;
pub mod draw;
pub mod editor;
pub mod effects;
pub mod error;
pub mod grid;
pub mod history;
pub mod library;
pub mod preview;
pub mod protocol;
pub mod sched;
pub mod timeline;
pub mod transport;
pub mod transport_ws;

pub use color::Rgb;
pub use editor::{Editor, Tool};
pub use effects::{EffectBank, EffectKind, ParamSet};
pub use error::{GlowgridError, GlowgridResult};
pub use grid::{COLS, Frame, LED_COUNT, ROWS};
pub use library::{AnimationFile, DeviceClient, PixelConfig, StatusPoller};
pub use protocol::{DeviceMode, DeviceSettings, Telemetry};
pub use timeline::{Animation, Player, Step, Timeline};
pub use transport::{ConnectionState, DeviceLink, LinkEvent};
pub use transport_ws::WsConnector;
