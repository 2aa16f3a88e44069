use clap::Parser;
use std::path::PathBuf;

/// imgforge - build disk images from declarative specifications
#[derive(Parser, Debug)]
#[command(name = "imgforge")]
#[command(about = "Run the provisioning steps in a build specification against a target image")]
#[command(version)]
pub struct Cli {
    /// Path to the build specification file (exactly one)
    pub spec: PathBuf,

    /// Create the output image at FILE (available to templates as {{ image }})
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Verbose progress output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
