pub mod constants;
pub mod loader;
pub mod runtime;

pub use self::loader::parse_program;
pub use self::runtime::Computer;
