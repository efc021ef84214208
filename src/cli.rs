use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mauloader")]
#[command(author, version, about = "Telegram bot that fetches TikTok and Reddit videos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot in long polling mode
    Run,

    /// Resolve a TikTok short link through the lookup API
    Lookup {
        /// Short link, e.g. https://vm.tiktok.com/ZMabc123/
        url: String,

        /// Print the metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a Reddit video locally
    Fetch {
        /// Post link
        url: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Re-encode the video before copying it out
        #[arg(long)]
        compress: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
