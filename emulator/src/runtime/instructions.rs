use std::io::Write;

use parse_display::Display;
use tracing::debug;

use crate::constants::{Address, Word};

use super::{
    registers::{Flags, Reg, RegisterIndexError},
    Computer, Flow, ProcessorError,
};

/// Operation codes, as found in the first byte of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(style = "UPPERCASE")]
#[repr(u8)]
pub enum Opcode {
    Hlt = 0b0000_0001,
    Ldi = 0b1000_0010,
    Prn = 0b0100_0111,
    Mul = 0b1010_0010,
    Add = 0b1010_0000,
    Cmp = 0b1010_0111,
    Push = 0b0100_0101,
    Pop = 0b0100_0110,
    Call = 0b0101_0000,
    Ret = 0b0001_0001,
    Jmp = 0b0101_0100,
    Jeq = 0b0101_0101,
    Jne = 0b0101_0110,
}

impl Opcode {
    pub const ALL: [Opcode; 13] = [
        Opcode::Hlt,
        Opcode::Ldi,
        Opcode::Prn,
        Opcode::Mul,
        Opcode::Add,
        Opcode::Cmp,
        Opcode::Push,
        Opcode::Pop,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Jmp,
        Opcode::Jeq,
        Opcode::Jne,
    ];

    /// Decode an opcode byte
    #[must_use]
    pub fn from_byte(byte: Word) -> Option<Self> {
        Self::ALL.into_iter().find(|op| *op as Word == byte)
    }

    /// Number of operand bytes following the opcode
    ///
    /// This is fixed per opcode and must never be inferred from the opcode bits: getting it wrong
    /// desynchronizes the program counter from instruction boundaries.
    #[must_use]
    pub const fn operand_count(self) -> usize {
        match self {
            Opcode::Hlt | Opcode::Ret => 0,
            Opcode::Prn
            | Opcode::Push
            | Opcode::Pop
            | Opcode::Call
            | Opcode::Jmp
            | Opcode::Jeq
            | Opcode::Jne => 1,
            Opcode::Ldi | Opcode::Mul | Opcode::Add | Opcode::Cmp => 2,
        }
    }
}

/// Operations handled by the ALU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(style = "UPPERCASE")]
pub enum AluOp {
    Add,
    Mul,
    Cmp,
}

impl TryFrom<Opcode> for AluOp {
    type Error = ProcessorError;

    fn try_from(opcode: Opcode) -> Result<Self, Self::Error> {
        match opcode {
            Opcode::Add => Ok(AluOp::Add),
            Opcode::Mul => Ok(AluOp::Mul),
            Opcode::Cmp => Ok(AluOp::Cmp),
            other => Err(ProcessorError::UnsupportedAluOperation(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Instruction {
    /// Halt the computer
    #[display("hlt")]
    Hlt,

    /// Load an immediate value in a register
    #[display("ldi  {0}, {1}")]
    Ldi(Reg, Word),

    /// Print the value of a register
    #[display("prn  {0}")]
    Prn(Reg),

    /// Multiply two registers, storing the result in the first one
    #[display("mul  {0}, {1}")]
    Mul(Reg, Reg),

    /// Add two registers, storing the result in the first one
    #[display("add  {0}, {1}")]
    Add(Reg, Reg),

    /// Compare two registers
    #[display("cmp  {0}, {1}")]
    Cmp(Reg, Reg),

    /// Push a register on the stack
    #[display("push {0}")]
    Push(Reg),

    /// Pop the top of the stack into a register
    #[display("pop  {0}")]
    Pop(Reg),

    /// Push the return address and jump to the address held in a register
    #[display("call {0}")]
    Call(Reg),

    /// Return from a `call`
    #[display("ret")]
    Ret,

    /// Unconditional jump
    #[display("jmp  {0}")]
    Jmp(Reg),

    /// Jump if equal
    #[display("jeq  {0}")]
    Jeq(Reg),

    /// Jump if not equal
    #[display("jne  {0}")]
    Jne(Reg),
}

impl Instruction {
    /// Build an instruction from its opcode and operand bytes
    ///
    /// Operand bytes the opcode does not use are ignored.
    ///
    /// # Errors
    ///
    /// Fails if a register operand is not a valid register index.
    pub fn decode(opcode: Opcode, operands: [Word; 2]) -> Result<Self, RegisterIndexError> {
        let reg = |i: usize| Reg::try_from(operands[i]);

        let instruction = match opcode {
            Opcode::Hlt => Self::Hlt,
            Opcode::Ldi => Self::Ldi(reg(0)?, operands[1]),
            Opcode::Prn => Self::Prn(reg(0)?),
            Opcode::Mul => Self::Mul(reg(0)?, reg(1)?),
            Opcode::Add => Self::Add(reg(0)?, reg(1)?),
            Opcode::Cmp => Self::Cmp(reg(0)?, reg(1)?),
            Opcode::Push => Self::Push(reg(0)?),
            Opcode::Pop => Self::Pop(reg(0)?),
            Opcode::Call => Self::Call(reg(0)?),
            Opcode::Ret => Self::Ret,
            Opcode::Jmp => Self::Jmp(reg(0)?),
            Opcode::Jeq => Self::Jeq(reg(0)?),
            Opcode::Jne => Self::Jne(reg(0)?),
        };

        Ok(instruction)
    }

    #[must_use]
    pub const fn opcode(self) -> Opcode {
        match self {
            Self::Hlt => Opcode::Hlt,
            Self::Ldi(..) => Opcode::Ldi,
            Self::Prn(_) => Opcode::Prn,
            Self::Mul(..) => Opcode::Mul,
            Self::Add(..) => Opcode::Add,
            Self::Cmp(..) => Opcode::Cmp,
            Self::Push(_) => Opcode::Push,
            Self::Pop(_) => Opcode::Pop,
            Self::Call(_) => Opcode::Call,
            Self::Ret => Opcode::Ret,
            Self::Jmp(_) => Opcode::Jmp,
            Self::Jeq(_) => Opcode::Jeq,
            Self::Jne(_) => Opcode::Jne,
        }
    }

    /// Size of the instruction in memory, in bytes
    #[must_use]
    pub const fn size(self) -> usize {
        1 + self.opcode().operand_count()
    }

    /// Encode the instruction to its binary representation
    #[must_use]
    pub fn encode(self) -> Vec<Word> {
        let opcode = self.opcode() as Word;

        match self {
            Self::Hlt | Self::Ret => vec![opcode],
            Self::Ldi(r, imm) => vec![opcode, r.as_byte(), imm],
            Self::Mul(a, b) | Self::Add(a, b) | Self::Cmp(a, b) => {
                vec![opcode, a.as_byte(), b.as_byte()]
            }
            Self::Prn(r)
            | Self::Push(r)
            | Self::Pop(r)
            | Self::Call(r)
            | Self::Jmp(r)
            | Self::Jeq(r)
            | Self::Jne(r) => vec![opcode, r.as_byte()],
        }
    }

    /// Execute the instruction
    ///
    /// The program counter is not touched here, the returned [`Flow`] tells the caller where to
    /// go next.
    #[tracing::instrument(skip(computer, out))]
    pub(crate) fn execute(
        self,
        computer: &mut Computer,
        out: &mut dyn Write,
    ) -> Result<Flow, ProcessorError> {
        match self {
            Self::Hlt => return Ok(Flow::Halt),

            Self::Ldi(reg, imm) => {
                debug!("{} <- {}", reg, imm);
                computer.registers.set(reg, imm);
            }

            Self::Prn(reg) => {
                let value = computer.registers.get(reg);
                writeln!(out, "{value}")?;
            }

            Self::Mul(a, b) | Self::Add(a, b) | Self::Cmp(a, b) => {
                let op = AluOp::try_from(self.opcode())?;
                computer.alu(op, a, b);
            }

            Self::Push(reg) => {
                let value = computer.registers.get(reg);
                computer.push(value)?;
            }

            Self::Pop(reg) => {
                let value = computer.pop()?;
                computer.registers.set(reg, value);
            }

            Self::Call(reg) => {
                let ret = computer.fallthrough_address(self.size())?;
                computer.push(ret)?;
                let target = computer.registers.get(reg);
                return Ok(Flow::Jump(target));
            }

            Self::Ret => {
                let ret = computer.pop()?;
                debug!("Returning to {:#04x}", ret);
                return Ok(Flow::Jump(ret));
            }

            Self::Jmp(reg) => {
                return Ok(Flow::Jump(computer.registers.get(reg)));
            }

            Self::Jeq(reg) => {
                if computer.registers.fl.contains(Flags::EQUAL) {
                    return Ok(Flow::Jump(computer.registers.get(reg)));
                }
            }

            Self::Jne(reg) => {
                if !computer.registers.fl.contains(Flags::EQUAL) {
                    return Ok(Flow::Jump(computer.registers.get(reg)));
                }
            }
        }

        Ok(Flow::Next)
    }
}

/// A line of a disassembly listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Instruction(Instruction),

    /// A byte which does not start a valid instruction
    Byte(Word),
}

impl std::fmt::Display for Decoded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instruction(i) => write!(f, "{i}"),
            Self::Byte(b) => write!(f, ".byte {b:#010b}"),
        }
    }
}

/// Decode a sequence of bytes into a listing of instructions, with their address
///
/// Bytes which do not decode into a valid instruction, either because the opcode is unknown,
/// an operand is not a valid register or the instruction is truncated, are listed as raw bytes.
#[must_use]
pub fn disassemble(bytes: &[Word]) -> Vec<(Address, Decoded)> {
    let mut listing = Vec::new();
    let mut offset = 0;

    while offset < bytes.len() {
        let byte = bytes[offset];
        let instruction = Opcode::from_byte(byte).and_then(|opcode| {
            let available = bytes.get(offset + 1..offset + 1 + opcode.operand_count())?;
            let mut operands = [0; 2];
            operands[..available.len()].copy_from_slice(available);
            Instruction::decode(opcode, operands).ok()
        });

        let (decoded, len) = match instruction {
            Some(i) => (Decoded::Instruction(i), i.size()),
            None => (Decoded::Byte(byte), 1),
        };

        // Listings never exceed the memory size, so the offset always fits in an address
        if let Ok(address) = Address::try_from(offset) {
            listing.push((address, decoded));
        }
        offset += len;
    }

    listing
}
