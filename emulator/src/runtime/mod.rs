use std::cmp::Ordering;
use std::io::Write;

use thiserror::Error;
use tracing::{debug, info};

use crate::constants::{Address, Word};

mod instructions;
mod memory;
mod registers;

pub use self::instructions::{disassemble, AluOp, Decoded, Instruction, Opcode};
pub use self::memory::{LoadError, Memory, MemoryError};
pub use self::registers::{Flags, Reg, RegisterIndexError, Registers};

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("unknown instruction {opcode:#010b} at address {pc:#04x}")]
    UnknownInstruction { opcode: Word, pc: Address },

    #[error("invalid register index {index} in instruction at address {pc:#04x}")]
    InvalidRegister { index: u8, pc: Address },

    #[error("unsupported ALU operation for opcode {0}")]
    UnsupportedAluOperation(Opcode),

    #[error("stack overflow (sp = {sp:#04x})")]
    StackOverflow { sp: Address },

    #[error("stack underflow (sp = {sp:#04x})")]
    StackUnderflow { sp: Address },

    #[error("program counter overflow after instruction at address {pc:#04x}")]
    ProgramCounterOverflow { pc: Address },

    #[error("invalid memory access ({0})")]
    InvalidMemoryAccess(#[from] MemoryError),

    #[error("could not write output: {0}")]
    Output(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, ProcessorError>;

/// Where to go after an instruction was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Continue with the instruction following this one
    Next,

    /// The instruction set the program counter
    Jump(Address),

    /// Stop the computer
    Halt,
}

/// State of the computer after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

#[derive(Default, Clone)]
pub struct Computer {
    pub(crate) registers: Registers,
    pub(crate) memory: Memory,
    pub(crate) cycles: usize,
    program_len: usize,
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ registers: {:?}, memory: [...] }}",
            self.registers
        )
    }
}

impl Computer {
    /// Build a computer with the given program loaded at address 0
    ///
    /// # Errors
    ///
    /// Fails if the program does not fit in memory.
    pub fn with_program(program: &[Word]) -> std::result::Result<Self, LoadError> {
        let mut computer = Self::default();
        computer.load(program)?;
        Ok(computer)
    }

    /// Copy a program in memory, starting at address 0
    ///
    /// # Errors
    ///
    /// Fails if the program does not fit in memory.
    pub fn load(&mut self, program: &[Word]) -> std::result::Result<(), LoadError> {
        self.memory.load(program)?;
        self.program_len = program.len();
        Ok(())
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Number of instructions executed so far
    #[must_use]
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Address of the instruction following the current one
    fn fallthrough_address(&self, size: usize) -> Result<Address> {
        let pc = self.registers.pc;
        Address::try_from(usize::from(pc) + size)
            .map_err(|_| ProcessorError::ProgramCounterOverflow { pc })
    }

    #[tracing::instrument(skip(self), err(level = "debug"))]
    fn decode_instruction(&self) -> Result<Instruction> {
        let pc = self.registers.pc;
        let opcode = self.memory.get(pc.into())?;
        let opcode = Opcode::from_byte(opcode)
            .ok_or(ProcessorError::UnknownInstruction { opcode, pc })?;

        // Only the operands this opcode needs are fetched
        let mut operands = [0; 2];
        for (offset, operand) in operands
            .iter_mut()
            .take(opcode.operand_count())
            .enumerate()
        {
            *operand = self.memory.get(usize::from(pc) + 1 + offset)?;
        }

        Instruction::decode(opcode, operands)
            .map_err(|RegisterIndexError(index)| ProcessorError::InvalidRegister { index, pc })
    }

    /// Fetch, decode and execute one instruction
    ///
    /// # Errors
    ///
    /// Fails if the instruction could not be decoded or its execution failed. In that case, the
    /// program counter still points to the faulty instruction.
    #[tracing::instrument(skip(self, out), level = "debug")]
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<State> {
        let inst = self.decode_instruction()?;
        debug!(pc = self.registers.pc, "Executing instruction \"{}\"", inst);

        let flow = inst.execute(self, out)?;
        self.cycles += 1;

        match flow {
            Flow::Halt => {
                info!(cycles = self.cycles, "Computer halted");
                return Ok(State::Halted);
            }
            Flow::Next => {
                self.registers.pc = self.fallthrough_address(inst.size())?;
            }
            Flow::Jump(address) => {
                debug!("Jumping to address {:#04x}", address);
                self.registers.pc = address;
            }
        }

        debug!("Register state {}", self.registers);
        Ok(State::Running)
    }

    /// Run the computer until it halts
    ///
    /// # Errors
    ///
    /// Fails on the first instruction that could not be decoded or executed.
    #[tracing::instrument(skip(self, out))]
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<()> {
        loop {
            if self.step(out)? == State::Halted {
                return Ok(());
            }
        }
    }

    /// Execute an ALU operation on two registers
    ///
    /// `add` and `mul` store their result in `a` and wrap around on overflow, `cmp` only sets
    /// the flags.
    #[tracing::instrument(skip(self))]
    pub fn alu(&mut self, op: AluOp, a: Reg, b: Reg) {
        let x = self.registers.get(a);
        let y = self.registers.get(b);

        match op {
            AluOp::Add => {
                let (res, overflow) = x.overflowing_add(y);
                debug!(overflow, "{} + {} = {}", x, y, res);
                self.registers.set(a, res);
            }

            AluOp::Mul => {
                let (res, overflow) = x.overflowing_mul(y);
                debug!(overflow, "{} * {} = {}", x, y, res);
                self.registers.set(a, res);
            }

            AluOp::Cmp => {
                self.registers.fl = match x.cmp(&y) {
                    Ordering::Less => Flags::LESS,
                    Ordering::Equal => Flags::EQUAL,
                    Ordering::Greater => Flags::GREATER,
                };
                debug!("cmp({}, {}) => {:?}", x, y, self.registers.fl);
            }
        }
    }

    #[tracing::instrument(skip(self))]
    fn push(&mut self, value: Word) -> Result<()> {
        let sp = self.registers.sp();
        let sp = sp
            .checked_sub(1)
            .ok_or(ProcessorError::StackOverflow { sp })?;

        // A failed write leaves the SP untouched
        *self.memory.get_mut(sp.into())? = value;
        self.registers.set_sp(sp);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn pop(&mut self) -> Result<Word> {
        let sp = self.registers.sp();
        // The SP must stay inside the memory once moved
        let next = sp
            .checked_add(1)
            .ok_or(ProcessorError::StackUnderflow { sp })?;

        // First read the value
        let value = self.memory.get(sp.into())?;
        // Then move the SP
        self.registers.set_sp(next);
        debug!("Popping value: {}", value);
        Ok(value)
    }

    /// Render the state of the computer on one line
    ///
    /// The line shows the program counter, the three bytes starting at it and the value of every
    /// general purpose register, in hexadecimal.
    #[must_use]
    pub fn trace(&self) -> String {
        let pc = usize::from(self.registers.pc);
        let cell = |offset: usize| self.memory.get(pc + offset).unwrap_or(0);

        let registers: Vec<String> = self
            .registers
            .gp
            .iter()
            .map(|value| format!("{value:02X}"))
            .collect();

        format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} | {}",
            pc,
            cell(0),
            cell(1),
            cell(2),
            registers.join(" ")
        )
    }

    /// List the instructions of the loaded program
    #[must_use]
    pub fn disassemble(&self) -> Vec<(Address, Decoded)> {
        disassemble(&self.memory.as_slice()[..self.program_len])
    }
}
