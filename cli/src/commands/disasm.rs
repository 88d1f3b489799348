use camino::Utf8PathBuf;
use clap::{Parser, ValueHint};

use super::load_computer;

#[derive(Parser, Debug)]
pub struct DisasmOpt {
    /// Program file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,
}

impl DisasmOpt {
    pub fn exec(&self) -> anyhow::Result<()> {
        let computer = load_computer(&self.input)?;

        for (address, decoded) in computer.disassemble() {
            println!("{address:02X}: {decoded}");
        }

        Ok(())
    }
}
