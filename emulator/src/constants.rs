pub type Address = u8;
pub type Word = u8;

/// Total size of the computer memory
pub const MEMORY_SIZE: usize = 256;

/// Number of general purpose registers
pub const REGISTER_COUNT: usize = 8;

/// Index of the register holding the stack pointer
pub const SP_REGISTER: usize = 7;

/// Start of the stack pointer
///
/// The stack grows downwards from here; cells above it are never written by `push`.
pub const STACK_START: Address = 0xF4;

/// Address where programs are loaded and execution starts
pub const PROGRAM_START: Address = 0;
