use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hikarin-blocks",
    about = "Generates vn scripts from Blockly block data (workspace JSON or saved script documents)."
)]
pub struct Args {
    #[arg(value_name = "INPUT", required_unless_present = "definitions")]
    pub input: Option<PathBuf>,

    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        value_name = "DIR",
        help = "Character library root (containing characters/<id>/data.json) used for dynamic dropdowns."
    )]
    pub library: Option<PathBuf>,

    #[arg(
        long,
        help = "Write only the generated source to OUTPUT, without the trailing block data."
    )]
    pub source_only: bool,

    #[arg(long, help = "Print the Blockly block definitions JSON and exit.")]
    pub definitions: bool,

    #[arg(long, help = "Fail when block checks report any warning.")]
    pub check: bool,
}
