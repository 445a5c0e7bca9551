// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "flipbook")]
#[command(about = "Aquarium diorama viewer with a click-toggled television", long_about = None)]
pub struct Cli {
    /// Diorama model (glTF)
    #[arg(long, default_value = "assets/aquarium-scene.glb")]
    pub scene_model: PathBuf,

    /// Baked texture applied across the diorama model
    #[arg(long)]
    pub scene_texture: Option<PathBuf>,

    /// Television prop model (glTF)
    #[arg(long, default_value = "assets/television-ad.glb")]
    pub tv_model: PathBuf,

    /// Name of the mesh acting as the television screen
    #[arg(long, default_value = "Plane001")]
    pub screen_mesh: String,

    /// Directory holding the frame sequences
    #[arg(long, default_value = "assets/animate")]
    pub frames_dir: String,

    /// Sequence played at startup
    #[arg(long, default_value = "television_ad")]
    pub initial_sequence: String,

    /// Sequence toggled in by clicking the screen
    #[arg(long, default_value = "television_ad_2")]
    pub alternate_sequence: String,

    /// Frames per sequence
    #[arg(long, default_value_t = 80)]
    pub frame_count: u32,

    /// Playback rate, frames per second
    #[arg(long, default_value_t = 30.0)]
    pub frame_rate: f32,

    /// Render resolution relative to the window (lower is faster)
    #[arg(long, default_value_t = 0.5)]
    pub render_scale: f32,
}
