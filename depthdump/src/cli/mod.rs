use anyhow::Result;
use clap::{Parser, Subcommand};

mod convert;
mod inspect;
mod probe;
mod synth;

pub use convert::ConvertCommand;
pub use inspect::InspectCommand;
pub use probe::ProbeCommand;
pub use synth::SynthCommand;

#[derive(Parser, Debug)]
#[command(name = "depthdump")]
#[command(about = "Convert recorded depth and color frames into packed images")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert every frame of a recording and store the images
    Convert(ConvertCommand),
    /// Show the frames of a recording and whether they convert
    Inspect(InspectCommand),
    /// Print the value of a pixel in a stored frame
    Probe(ProbeCommand),
    /// Write a synthetic recording
    Synth(SynthCommand),
}

impl Args {
    pub fn run(self) -> Result<()> {
        match self.command {
            Command::Convert(cmd) => cmd.run(),
            Command::Inspect(cmd) => cmd.run(),
            Command::Probe(cmd) => cmd.run(),
            Command::Synth(cmd) => cmd.run(),
        }
    }
}
