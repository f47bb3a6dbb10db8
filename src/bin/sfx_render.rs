use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env};
use sfxia_core::codec;
use sfxia_core::dsp::renderer::{self, EXPORT_FILE_NAME, RenderConfig};
use sfxia_core::error::{DecodeError, SfxError, StoreError};
use sfxia_core::params::{ParameterSnapshot, ParameterSpec};
use sfxia_core::store::{FileStore, PresetStore};

/// Render an SFXIA sound effect to a WAV file
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Share token copied from the web UI
    #[arg(long, conflicts_with_all = ["json", "preset", "current", "random"])]
    token: Option<String>,

    /// Snapshot JSON file (missing ids take their defaults)
    #[arg(long, conflicts_with_all = ["preset", "current", "random"])]
    json: Option<PathBuf>,

    /// Name of a preset in the local store
    #[arg(long, conflicts_with_all = ["current", "random"])]
    preset: Option<String>,

    /// Use the current snapshot from the local store
    #[arg(long, default_value_t = false, conflicts_with = "random")]
    current: bool,

    /// Use a random snapshot
    #[arg(long, default_value_t = false)]
    random: bool,

    /// Override a parameter, e.g. `--set pitch=0.8` (repeatable)
    #[arg(long = "set", value_parser = parse_assignment)]
    overrides: Vec<(String, f64)>,

    /// Output file
    #[arg(short, long, default_value = EXPORT_FILE_NAME)]
    out: PathBuf,

    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    #[arg(long, default_value_t = 1)]
    channels: usize,

    /// Save the rendered snapshot to the local store under this name
    #[arg(long)]
    save_as: Option<String>,

    /// Local store file (defaults to the platform data directory)
    #[arg(long)]
    store: Option<PathBuf>,
}

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected id=value, got {s:?}"))?;
    let spec = ParameterSpec::find(id.trim()).ok_or_else(|| format!("unknown parameter {id:?}"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad value for {}: {e}", spec.id))?;
    Ok((spec.id.to_string(), value))
}

fn open_store(args: &Args) -> Result<PresetStore<FileStore>, StoreError> {
    let kv = match &args.store {
        Some(path) => FileStore::open(path)?,
        None => FileStore::open_default()?,
    };
    log::debug!("using store {}", kv.path().display());
    Ok(PresetStore::open(kv))
}

fn main() -> Result<(), SfxError> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut snapshot = if let Some(token) = &args.token {
        codec::decode(token)?
    } else if let Some(path) = &args.json {
        serde_json::from_str::<ParameterSnapshot>(&std::fs::read_to_string(path)?)
            .map_err(DecodeError::from)?
    } else if let Some(name) = &args.preset {
        let store = open_store(&args)?;
        let index = store
            .find(name)
            .ok_or_else(|| StoreError::UnknownPreset { name: name.clone() })?;
        store.presets()[index].snapshot
    } else if args.current {
        *open_store(&args)?.current()
    } else if args.random {
        ParameterSnapshot::random(&mut rand::thread_rng())
    } else {
        ParameterSnapshot::default()
    };

    for (id, value) in &args.overrides {
        snapshot.set(id, *value);
    }

    let config = RenderConfig {
        sample_rate: args.sample_rate,
        channels: args.channels,
        ..RenderConfig::default()
    };
    let buffer = renderer::render_offline(&snapshot, &config)?;
    std::fs::write(&args.out, buffer.to_wav())?;

    log::info!(
        "wrote {} ({:.2}s, {} Hz, {} ch)",
        args.out.display(),
        buffer.duration(),
        buffer.sample_rate(),
        buffer.number_of_channels()
    );
    println!("{}", codec::encode(&snapshot));

    if let Some(name) = &args.save_as {
        let mut store = open_store(&args)?;
        store.replace_current(snapshot)?;
        store.save_current(Some(name))?;
        log::info!("saved preset {name:?}");
    }

    Ok(())
}
