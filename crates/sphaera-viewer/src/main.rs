use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use sphaera_engine::device::GpuInit;
use sphaera_engine::logging::{init_logging, LoggingConfig};
use sphaera_engine::scene::SceneConfig;
use sphaera_engine::shader::{ShaderFailurePolicy, ShaderSources};
use sphaera_engine::window::{Runtime, RuntimeConfig};

#[derive(Parser, Debug)]
#[command(name = "sphaera")]
#[command(about = "Draws a Phong-lit sphere", long_about = None)]
struct Args {
    /// Vertex shader (WGSL); requires --frag
    #[arg(long, requires = "frag")]
    vert: Option<PathBuf>,

    /// Fragment shader (WGSL); requires --vert
    #[arg(long, requires = "vert")]
    frag: Option<PathBuf>,

    /// Log filter in env_logger syntax; overrides RUST_LOG
    #[arg(long)]
    log: Option<String>,

    /// Exit at startup if a shader fails to compile or link
    #[arg(long)]
    strict_shaders: bool,

    /// Keep the projection's aspect ratio in step with the window
    #[arg(long)]
    fit_projection: bool,
}

impl Args {
    fn scene(&self) -> SceneConfig {
        SceneConfig {
            shader_failure: if self.strict_shaders {
                ShaderFailurePolicy::Abort
            } else {
                ShaderFailurePolicy::Continue
            },
            projection_follows_viewport: self.fit_projection,
            ..SceneConfig::default()
        }
    }

    fn shaders(&self) -> Result<ShaderSources> {
        match (&self.vert, &self.frag) {
            (Some(vert), Some(frag)) => ShaderSources::from_files(vert, frag),
            _ => Ok(ShaderSources::builtin()),
        }
    }
}

fn run(args: Args) -> Result<()> {
    let shaders = args.shaders()?;
    Runtime::run(
        RuntimeConfig::default(),
        GpuInit::default(),
        args.scene(),
        shaders,
    )
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..LoggingConfig::default()
    });

    log::info!("sphaera v{}", env!("CARGO_PKG_VERSION"));

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
