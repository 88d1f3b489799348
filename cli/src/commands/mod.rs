use camino::Utf8Path;
use ls8_emulator::loader::ProgramParseError;
use ls8_emulator::runtime::{LoadError, ProcessorError};
use ls8_emulator::{parse_program, Computer};
use thiserror::Error;
use tracing::{debug, info};

mod completion;
mod disasm;
mod run;

#[derive(clap::Subcommand)]
pub enum Subcommand {
    /// Load and run a program
    Run(self::run::RunOpt),

    /// Print the instructions of a program
    Disasm(self::disasm::DisasmOpt),

    /// Generate shell completions
    Completion(self::completion::CompletionOpt),
}

impl Subcommand {
    /// Run a subcommand
    pub fn exec(self) -> anyhow::Result<()> {
        match self {
            Self::Run(opt) => opt.exec(),
            Self::Disasm(opt) => opt.exec(),
            Self::Completion(opt) => {
                opt.exec();
                Ok(())
            }
        }
    }
}

/// Errors reported to the user with a dedicated exit code
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{program}: {path} not found")]
    NotFound { program: String, path: String },

    #[error("{path}: {inner}")]
    Parse {
        path: String,
        inner: ProgramParseError,
    },

    #[error("{path}: {inner}")]
    Load { path: String, inner: LoadError },

    #[error("Unknown instruction: {opcode}")]
    UnknownInstruction { opcode: u8 },

    #[error("{0}")]
    Processor(ProcessorError),
}

impl From<ProcessorError> for CommandError {
    fn from(e: ProcessorError) -> Self {
        match e {
            ProcessorError::UnknownInstruction { opcode, .. } => Self::UnknownInstruction { opcode },
            other => Self::Processor(other),
        }
    }
}

impl CommandError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 2,
            Self::Parse { .. }
            | Self::Load { .. }
            | Self::UnknownInstruction { .. }
            | Self::Processor(_) => 1,
        }
    }
}

/// Read a program file and load it in a new computer
fn load_computer(path: &Utf8Path) -> Result<Computer, CommandError> {
    info!(%path, "Reading program");
    let source = std::fs::read_to_string(path).map_err(|e| {
        debug!(error = %e, "Could not read program");
        CommandError::NotFound {
            program: std::env::args().next().unwrap_or_else(|| "ls8".to_owned()),
            path: path.to_string(),
        }
    })?;

    debug!("Parsing program");
    let program = parse_program(&source).map_err(|inner| CommandError::Parse {
        path: path.to_string(),
        inner,
    })?;

    debug!(size = program.len(), "Loading program");
    Computer::with_program(&program).map_err(|inner| CommandError::Load {
        path: path.to_string(),
        inner,
    })
}
