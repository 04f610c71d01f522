//! Procedural frame generators. Each effect is a pure function of its
//! parameter set and the supplied RNG, so a fixed seed reproduces the exact
//! frame under test while interactive use can seed from entropy.

use std::collections::BTreeMap;

use rand::Rng;
use rand::rngs::StdRng;

use crate::color::{Rgb, hsv_to_rgb};
use crate::grid::{COLS, Frame, ROWS};

/// Declared range and default for one effect parameter.
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

/// Parameter values keyed by name.
pub type ParamSet = BTreeMap<String, f64>;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Rainbow,
    Fire,
    Twinkle,
    Snow,
    Glitch,
    Meteor,
}

const RAINBOW_PARAMS: &[ParamSpec] = &[
    ParamSpec { name: "shift", label: "Hue Shift", min: 0.0, max: 360.0, default: 0.0 },
    ParamSpec { name: "saturation", label: "Saturation", min: 40.0, max: 100.0, default: 90.0 },
    ParamSpec { name: "brightness", label: "Brightness", min: 30.0, max: 100.0, default: 80.0 },
];

const FIRE_PARAMS: &[ParamSpec] = &[
    ParamSpec { name: "intensity", label: "Intensity", min: 20.0, max: 100.0, default: 70.0 },
    ParamSpec { name: "flicker", label: "Flicker", min: 1.0, max: 10.0, default: 4.0 },
];

const TWINKLE_PARAMS: &[ParamSpec] = &[
    ParamSpec { name: "density", label: "Density", min: 1.0, max: 50.0, default: 12.0 },
    ParamSpec { name: "hue", label: "Hue", min: 0.0, max: 360.0, default: 210.0 },
];

const SNOW_PARAMS: &[ParamSpec] = &[
    ParamSpec { name: "count", label: "Flakes", min: 5.0, max: 60.0, default: 24.0 },
];

const GLITCH_PARAMS: &[ParamSpec] = &[
    ParamSpec { name: "blocks", label: "Blocks", min: 1.0, max: 12.0, default: 4.0 },
    ParamSpec { name: "chaos", label: "Chaos", min: 1.0, max: 10.0, default: 6.0 },
];

const METEOR_PARAMS: &[ParamSpec] = &[
    ParamSpec { name: "length", label: "Length", min: 3.0, max: 15.0, default: 8.0 },
    ParamSpec { name: "hue", label: "Hue", min: 0.0, max: 360.0, default: 180.0 },
    ParamSpec { name: "trails", label: "Trails", min: 1.0, max: 5.0, default: 2.0 },
];

impl EffectKind {
    pub const ALL: [EffectKind; 6] = [
        EffectKind::Rainbow,
        EffectKind::Fire,
        EffectKind::Twinkle,
        EffectKind::Snow,
        EffectKind::Glitch,
        EffectKind::Meteor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rainbow => "rainbow",
            Self::Fire => "fire",
            Self::Twinkle => "twinkle",
            Self::Snow => "snow",
            Self::Glitch => "glitch",
            Self::Meteor => "meteor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn params(self) -> &'static [ParamSpec] {
        match self {
            Self::Rainbow => RAINBOW_PARAMS,
            Self::Fire => FIRE_PARAMS,
            Self::Twinkle => TWINKLE_PARAMS,
            Self::Snow => SNOW_PARAMS,
            Self::Glitch => GLITCH_PARAMS,
            Self::Meteor => METEOR_PARAMS,
        }
    }

    pub fn defaults(self) -> ParamSet {
        self.params()
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default))
            .collect()
    }
}

/// Per-effect parameter sets, lazily initialized from the declared defaults
/// the first time an effect is touched and retained across edits.
#[derive(Debug, Default)]
pub struct EffectBank {
    sets: BTreeMap<EffectKind, ParamSet>,
}

impl EffectBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&mut self, kind: EffectKind) -> &ParamSet {
        self.sets.entry(kind).or_insert_with(|| kind.defaults())
    }

    /// Set one parameter, clamped to its declared range. Unknown names are
    /// ignored.
    pub fn set(&mut self, kind: EffectKind, name: &str, value: f64) {
        let Some(spec) = kind.params().iter().find(|spec| spec.name == name) else {
            return;
        };
        let clamped = value.clamp(spec.min, spec.max);
        self.sets
            .entry(kind)
            .or_insert_with(|| kind.defaults())
            .insert(name.to_string(), clamped);
    }
}

fn value_of(params: &ParamSet, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

/// Generate one frame for the effect. Output always covers the full grid
/// with valid colors.
pub fn generate(kind: EffectKind, params: &ParamSet, rng: &mut StdRng) -> Frame {
    match kind {
        EffectKind::Rainbow => rainbow(params),
        EffectKind::Fire => fire(params, rng),
        EffectKind::Twinkle => twinkle(params, rng),
        EffectKind::Snow => snow(params, rng),
        EffectKind::Glitch => glitch(params, rng),
        EffectKind::Meteor => meteor(params, rng),
    }
}

/// String-keyed entry point for wire and CLI callers. An unknown effect
/// name yields a blank frame rather than an error.
pub fn generate_named(name: &str, params: &ParamSet, rng: &mut StdRng) -> Frame {
    match EffectKind::from_name(name) {
        Some(kind) => generate(kind, params, rng),
        None => Frame::blank(),
    }
}

fn rainbow(params: &ParamSet) -> Frame {
    let shift = value_of(params, "shift", 0.0);
    let saturation = value_of(params, "saturation", 90.0);
    let brightness = value_of(params, "brightness", 80.0);

    let mut frame = Frame::blank();
    for row in 0..ROWS {
        for col in 0..COLS {
            let hue = (col as f64 / COLS as f64) * 360.0 + shift;
            frame.set(row, col, hsv_to_rgb(hue, saturation, brightness));
        }
    }
    frame
}

fn fire(params: &ParamSet, rng: &mut StdRng) -> Frame {
    let intensity = value_of(params, "intensity", 70.0);
    let flicker = value_of(params, "flicker", 4.0);

    let mut frame = Frame::blank();
    for row in 0..ROWS {
        for col in 0..COLS {
            let heat = rng.random::<f64>() * (row as f64 / ROWS as f64) * (intensity / 100.0)
                + rng.random::<f64>() * flicker / 10.0;
            // Bottom rows run hotter: hue slides from 15 toward pure red.
            let hue = (15.0 - heat * 15.0).max(0.0);
            let value = (30.0 + heat * 70.0).min(100.0);
            frame.set(row, col, hsv_to_rgb(hue, 100.0, value));
        }
    }
    frame
}

fn twinkle(params: &ParamSet, rng: &mut StdRng) -> Frame {
    let density = value_of(params, "density", 12.0).max(0.0) as usize;
    let hue = value_of(params, "hue", 210.0);

    let mut frame = Frame::blank();
    for _ in 0..density {
        let row = rng.random_range(0..ROWS);
        let col = rng.random_range(0..COLS);
        let brightness = 60.0 + rng.random::<f64>() * 40.0;
        frame.set(row, col, hsv_to_rgb(hue, 30.0, brightness));
    }
    frame
}

fn snow(params: &ParamSet, rng: &mut StdRng) -> Frame {
    let count = value_of(params, "count", 24.0).max(0.0) as usize;

    let mut frame = Frame::filled(Rgb::new(0x0b, 0x1a, 0x2b));
    let flake = Rgb::new(0xf8, 0xfb, 0xff);
    for _ in 0..count {
        let row = rng.random_range(0..ROWS);
        let col = rng.random_range(0..COLS);
        frame.set(row, col, flake);
    }
    frame
}

fn glitch(params: &ParamSet, rng: &mut StdRng) -> Frame {
    let blocks = value_of(params, "blocks", 4.0).max(0.0) as usize;
    let chaos = value_of(params, "chaos", 6.0).max(1.0) as usize;

    let mut frame = Frame::blank();
    for _ in 0..blocks {
        let width = rng.random_range(0..chaos).max(1).min(COLS);
        let height = rng.random_range(0..chaos).max(1).min(ROWS);
        let row = rng.random_range(0..(ROWS - height).max(1));
        let col = rng.random_range(0..(COLS - width).max(1));
        let color = hsv_to_rgb(rng.random::<f64>() * 360.0, 70.0, 90.0);
        for r in row..row + height {
            for c in col..col + width {
                frame.set(r, c, color);
            }
        }
    }
    frame
}

fn meteor(params: &ParamSet, rng: &mut StdRng) -> Frame {
    let length = value_of(params, "length", 8.0).max(1.0) as usize;
    let hue = value_of(params, "hue", 180.0);
    let trails = value_of(params, "trails", 2.0).max(0.0) as usize;

    let mut frame = Frame::blank();
    let start_col = rng.random_range(0..COLS);
    for i in 0..length {
        let row = i.min(ROWS - 1);
        let col = (start_col + i) % COLS;
        let brightness = 100.0 - (i as f64 / length as f64) * 80.0;
        frame.set(row, col, hsv_to_rgb(hue, 80.0, brightness));
        for t in 1..=trails {
            let trail_row = row + t;
            if trail_row < ROWS {
                let fade = brightness * 0.7_f64.powi(t as i32);
                frame.set(trail_row, col, hsv_to_rgb(hue, 60.0, fade));
            }
        }
    }
    frame
}
