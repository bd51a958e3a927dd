use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "svgify", version, about = "Turn images into animated SVG with a hosted model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the relay server (default)
    Serve,
    /// Send one image through a running relay and save the SVG
    Convert {
        /// Image file to convert
        image: PathBuf,
        /// Base URL of the relay
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,
        /// Where to write the SVG; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["svgify"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_convert() {
        let cli = Cli::try_parse_from(["svgify", "convert", "cat.png", "-o", "cat.svg"]).unwrap();
        match cli.command {
            Some(Command::Convert {
                image,
                server,
                output,
            }) => {
                assert_eq!(image, PathBuf::from("cat.png"));
                assert_eq!(server, "http://localhost:3000");
                assert_eq!(output, Some(PathBuf::from("cat.svg")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
