use bitflags::bitflags;
use parse_display::Display;
use thiserror::Error;

use crate::constants as C;

bitflags! {
    /// Result of the last `cmp`
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Flags: u8 {
        const EQUAL   = 0b0000_0001;
        const GREATER = 0b0000_0010;
        const LESS    = 0b0000_0100;
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010b}", self.bits())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    /// General purpose, `r7` doubles as the stack pointer
    pub gp: [C::Word; C::REGISTER_COUNT],

    /// Program counter
    pub pc: C::Address,

    /// Flags register
    pub fl: Flags,
}

impl Default for Registers {
    fn default() -> Self {
        let mut gp = [0; C::REGISTER_COUNT];
        gp[C::SP_REGISTER] = C::STACK_START;
        Self {
            gp,
            pc: C::PROGRAM_START,
            fl: Flags::empty(),
        }
    }
}

impl Registers {
    #[must_use]
    pub fn get(&self, reg: Reg) -> C::Word {
        self.gp[reg.index()]
    }

    pub fn set(&mut self, reg: Reg, value: C::Word) {
        self.gp[reg.index()] = value;
    }

    /// Current value of the stack pointer
    #[must_use]
    pub fn sp(&self) -> C::Address {
        self.get(Reg::SP)
    }

    pub(crate) fn set_sp(&mut self, sp: C::Address) {
        self.set(Reg::SP, sp);
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, value) in self.gp.iter().enumerate() {
            write!(f, "r{i} = {value} | ")?;
        }
        write!(f, "pc = {} | fl = {:?}", self.pc, self.fl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(style = "lowercase")]
pub enum Reg {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Reg {
    /// The stack pointer register
    pub const SP: Reg = Reg::R7;

    pub const ALL: [Reg; C::REGISTER_COUNT] = [
        Reg::R0,
        Reg::R1,
        Reg::R2,
        Reg::R3,
        Reg::R4,
        Reg::R5,
        Reg::R6,
        Reg::R7,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Encoding of the register as an instruction operand
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid register index {0}")]
pub struct RegisterIndexError(pub u8);

impl TryFrom<u8> for Reg {
    type Error = RegisterIndexError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Reg::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(RegisterIndexError(value))
    }
}
