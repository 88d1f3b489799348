use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueHint};
use ls8_emulator::runtime::State;
use tracing::info;

use super::{load_computer, CommandError};

#[derive(Parser, Debug)]
pub struct RunOpt {
    /// Program file
    #[clap(value_parser, value_hint = ValueHint::FilePath)]
    input: Utf8PathBuf,

    /// Print the state of the computer on stderr before each instruction
    #[clap(short, long, action = ArgAction::SetTrue)]
    trace: bool,
}

impl RunOpt {
    pub fn exec(self) -> anyhow::Result<()> {
        let mut computer = load_computer(&self.input)?;
        let mut out = std::io::stdout().lock();

        info!("Running program");
        if self.trace {
            loop {
                eprintln!("{}", computer.trace());
                if computer.step(&mut out).map_err(CommandError::from)? == State::Halted {
                    break;
                }
            }
        } else {
            computer.run(&mut out).map_err(CommandError::from)?;
        }

        info!(
            registers = %computer.registers(),
            cycles = computer.cycles(),
            "End of program"
        );

        Ok(())
    }
}
