use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::SeedableRng as _;
use rand::rngs::StdRng;

use glowgrid::{
    Animation, ConnectionState, DeviceClient, DeviceLink, LinkEvent, PixelConfig, Player, Step,
    StatusPoller, Telemetry, Timeline, WsConnector, effects, library, preview,
};

#[derive(Parser, Debug)]
#[command(name = "glowgrid", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a procedural effect frame.
    Effect(EffectArgs),
    /// Render an animation's frames as PNGs.
    Preview(PreviewArgs),
    /// Stream an animation to the device over WebSocket.
    Stream(StreamArgs),
    /// Work with the device's animation library.
    #[command(subcommand)]
    Library(LibraryCmd),
    /// Read or write the device's pixel configuration.
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(Parser, Debug)]
struct EffectArgs {
    /// Effect name (rainbow, fire, twinkle, snow, glitch, meteor).
    #[arg(long)]
    name: String,

    /// Parameter override as `name=value`; may repeat.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    sets: Vec<String>,

    /// RNG seed; omitted means seeded from entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// Output animation JSON path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    png: Option<PathBuf>,

    /// Pixels per LED in the PNG.
    #[arg(long, default_value_t = 16)]
    scale: u32,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input animation JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory for frame-NNN.png files.
    #[arg(long)]
    out_dir: PathBuf,

    /// Pixels per LED.
    #[arg(long, default_value_t = 16)]
    scale: u32,
}

#[derive(Parser, Debug)]
struct StreamArgs {
    /// Input animation JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Device WebSocket endpoint.
    #[arg(long, default_value = "ws://matrix.local/ws")]
    url: String,

    /// Whole-device brightness byte sent with each frame.
    #[arg(long, default_value_t = 128)]
    brightness: u8,

    /// Device HTTP base for the status-polling fallback.
    #[arg(long)]
    http: Option<String>,
}

#[derive(Subcommand, Debug)]
enum LibraryCmd {
    /// List stored animation names.
    List {
        #[arg(long)]
        base: String,
    },
    /// Upload an animation JSON under a name.
    Save {
        #[arg(long)]
        base: String,
        #[arg(long)]
        name: String,
        #[arg(long = "in")]
        in_path: PathBuf,
    },
    /// Download a stored animation to a local JSON file.
    Load {
        #[arg(long)]
        base: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCmd {
    Get {
        #[arg(long)]
        base: String,
    },
    Set {
        #[arg(long)]
        base: String,
        #[arg(long)]
        count: i64,
        #[arg(long)]
        brightness: i64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Effect(args) => cmd_effect(args),
        Command::Preview(args) => cmd_preview(args),
        Command::Stream(args) => cmd_stream(args),
        Command::Library(cmd) => cmd_library(cmd),
        Command::Config(cmd) => cmd_config(cmd),
    }
}

fn read_animation(path: &Path) -> anyhow::Result<Animation> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read animation '{}'", path.display()))?;
    Ok(library::import_json(&text)?)
}

fn write_png(frame: &glowgrid::Frame, scale: u32, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let img = preview::render_image(frame, scale);
    let (width, height) = img.dimensions();
    image::save_buffer_with_format(
        path,
        img.as_raw(),
        width,
        height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn cmd_effect(args: EffectArgs) -> anyhow::Result<()> {
    let kind = effects::EffectKind::from_name(&args.name)
        .with_context(|| format!("unknown effect '{}'", args.name))?;

    let mut bank = effects::EffectBank::new();
    for entry in &args.sets {
        let (name, value) = entry
            .split_once('=')
            .with_context(|| format!("--set '{entry}' is not NAME=VALUE"))?;
        let value: f64 = value
            .parse()
            .with_context(|| format!("--set '{entry}' has a non-numeric value"))?;
        bank.set(kind, name, value);
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let frame = effects::generate(kind, bank.params(kind), &mut rng);

    if let Some(png) = &args.png {
        write_png(&frame, args.scale, png)?;
        eprintln!("wrote {}", png.display());
    }
    if let Some(out) = &args.out {
        let anim = Animation {
            frames: vec![frame.clone()],
            ..Animation::new()
        };
        fs::write(out, library::export_json(&args.name, &anim)?)
            .with_context(|| format!("write '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }
    if args.png.is_none() && args.out.is_none() {
        anyhow::bail!("nothing to do: pass --png and/or --out");
    }
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let anim = read_animation(&args.in_path)?;
    for (index, frame) in anim.frames.iter().enumerate() {
        let path = args.out_dir.join(format!("frame-{index:03}.png"));
        write_png(frame, args.scale, &path)?;
    }
    eprintln!("wrote {} frames to {}", anim.frames.len(), args.out_dir.display());
    Ok(())
}

fn print_telemetry(t: &Telemetry) {
    if let Some(fps) = t.fps {
        eprintln!("device: {fps:.1} fps");
    }
    if let Some(packets) = t.packets {
        eprintln!("device: {packets} pkts");
    }
}

fn cmd_stream(args: StreamArgs) -> anyhow::Result<()> {
    let anim = read_animation(&args.in_path)?;
    let looped = anim.looped;
    let mut timeline = Timeline::new(anim)?;
    let mut player = Player::new(timeline.fps());
    let mut link = DeviceLink::new(WsConnector::new(&args.url));
    let fallback = args.http.as_deref().map(DeviceClient::new);
    let mut poller = StatusPoller::new();

    let start = Instant::now();
    link.open(start);
    player.play(start);
    if looped {
        eprintln!("streaming '{}' on a loop; interrupt to stop", args.in_path.display());
    }

    loop {
        let now = Instant::now();

        for event in link.poll(now) {
            match event {
                LinkEvent::StateChanged(state) => {
                    eprintln!("device: {state:?}");
                    match state {
                        ConnectionState::Connected => poller.stop(),
                        ConnectionState::Disconnected => {
                            if fallback.is_some() {
                                poller.start(now);
                            }
                        }
                        ConnectionState::Connecting => {}
                    }
                }
                LinkEvent::Telemetry(t) => print_telemetry(&t),
            }
        }

        if poller.poll(now) {
            if let Some(client) = &fallback {
                match client.fetch_status() {
                    Ok(t) => print_telemetry(&t),
                    Err(err) => eprintln!("status poll failed: {err}"),
                }
            }
        }

        if player.poll(now) {
            let step = timeline.step();
            link.send_frame(timeline.current(), args.brightness, now);
            if step == Step::Completed {
                player.stop();
                link.close();
                eprintln!("done: {} frames sent", link.packets_sent());
                return Ok(());
            }
        }

        thread::sleep(Duration::from_millis(5));
    }
}

fn cmd_library(cmd: LibraryCmd) -> anyhow::Result<()> {
    match cmd {
        LibraryCmd::List { base } => {
            let names = DeviceClient::new(base).list_animations()?;
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        LibraryCmd::Save { base, name, in_path } => {
            let anim = read_animation(&in_path)?;
            DeviceClient::new(base).save_animation(&name, &anim)?;
            eprintln!("saved '{name}'");
            Ok(())
        }
        LibraryCmd::Load { base, name, out } => {
            let anim = DeviceClient::new(base).load_animation(&name)?;
            fs::write(&out, library::export_json(&name, &anim)?)
                .with_context(|| format!("write '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
            Ok(())
        }
    }
}

fn cmd_config(cmd: ConfigCmd) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Get { base } => {
            let pixels = DeviceClient::new(base).fetch_config()?;
            println!("count: {}", pixels.count);
            println!("brightness: {}", pixels.brightness);
            Ok(())
        }
        ConfigCmd::Set { base, count, brightness } => {
            let pixels = PixelConfig::sanitized(count, brightness);
            DeviceClient::new(base).push_config(pixels)?;
            eprintln!("config saved ({} pixels, brightness {})", pixels.count, pixels.brightness);
            Ok(())
        }
    }
}
