use ls8_emulator::constants as C;
use ls8_emulator::runtime::{Instruction, LoadError, ProcessorError, Reg};
use ls8_emulator::{parse_program, Computer};
use pretty_assertions::assert_eq;

/// Run a program to completion, returning the computer and what it printed
fn run(program: &[u8]) -> (Computer, String) {
    let mut computer = Computer::with_program(program).unwrap();
    let mut out = Vec::new();
    computer.run(&mut out).unwrap();
    (computer, String::from_utf8(out).unwrap())
}

fn assemble(program: &[Instruction]) -> Vec<u8> {
    program.iter().flat_map(|i| i.encode()).collect()
}

#[test]
fn mult_test() {
    #[rustfmt::skip]
    let program = [
        0b1000_0010, 0b0000_0000, 0b0000_1000, // LDI R0,8
        0b1000_0010, 0b0000_0001, 0b0000_1001, // LDI R1,9
        0b1010_0010, 0b0000_0000, 0b0000_0001, // MUL R0,R1
        0b0100_0111, 0b0000_0000, // PRN R0
        0b0000_0001, // HLT
    ];

    let (computer, out) = run(&program);
    assert_eq!(out, "72\n");
    assert_eq!(computer.registers().get(Reg::R0), 72);
    assert_eq!(computer.registers().pc, 11);
    assert_eq!(computer.cycles(), 5);
}

#[test]
fn call_test() {
    let input = indoc::indoc! {r"
        # Calls a subroutine which doubles and prints R0

        10000010 # LDI R1,MULT2PRINT
        00000001
        00011000
        10000010 # LDI R0,10
        00000000
        00001010
        01010000 # CALL R1
        00000001
        10000010 # LDI R0,15
        00000000
        00001111
        01010000 # CALL R1
        00000001
        10000010 # LDI R0,18
        00000000
        00010010
        01010000 # CALL R1
        00000001
        10000010 # LDI R0,30
        00000000
        00011110
        01010000 # CALL R1
        00000001
        00000001 # HLT

        # MULT2PRINT (address 24):

        10100000 # ADD R0,R0
        00000000
        00000000
        01000111 # PRN R0
        00000000
        00010001 # RET
    "};

    let program = parse_program(input).unwrap();
    assert_eq!(program.len(), 30);

    let (computer, out) = run(&program);
    assert_eq!(out, "20\n30\n36\n60\n");
    assert_eq!(computer.registers().sp(), C::STACK_START);
    assert_eq!(computer.registers().pc, 23);
}

#[test]
fn stack_test() {
    let input = indoc::indoc! {r"
        10000010 # LDI R0,1
        00000000
        00000001
        10000010 # LDI R1,2
        00000001
        00000010
        01000101 # PUSH R0
        00000000
        01000101 # PUSH R1
        00000001
        10000010 # LDI R0,3
        00000000
        00000011
        01000110 # POP R0
        00000000
        01000111 # PRN R0
        00000000
        10000010 # LDI R0,4
        00000000
        00000100
        01000101 # PUSH R0
        00000000
        01000110 # POP R2
        00000010
        01000110 # POP R1
        00000001
        01000111 # PRN R2
        00000010
        01000111 # PRN R1
        00000001
        00000001 # HLT
    "};

    let (computer, out) = run(&parse_program(input).unwrap());
    assert_eq!(out, "2\n4\n1\n");
    assert_eq!(computer.registers().sp(), C::STACK_START);
}

#[test]
fn compare_and_jump_test() {
    let program = assemble(&[
        Instruction::Ldi(Reg::R0, 10),
        Instruction::Ldi(Reg::R1, 20),
        Instruction::Ldi(Reg::R2, 17),
        Instruction::Cmp(Reg::R0, Reg::R1),
        Instruction::Jeq(Reg::R2),
        Instruction::Jne(Reg::R2),
        Instruction::Hlt,
        // 17: not equal
        Instruction::Ldi(Reg::R3, 1),
        Instruction::Prn(Reg::R3),
        Instruction::Ldi(Reg::R1, 10),
        Instruction::Ldi(Reg::R2, 34),
        Instruction::Cmp(Reg::R0, Reg::R1),
        Instruction::Jeq(Reg::R2),
        Instruction::Hlt,
        // 34: equal
        Instruction::Ldi(Reg::R3, 2),
        Instruction::Prn(Reg::R3),
        Instruction::Ldi(Reg::R4, 46),
        Instruction::Jmp(Reg::R4),
        Instruction::Prn(Reg::R0),
        // 46: end
        Instruction::Hlt,
    ]);

    let (computer, out) = run(&program);
    assert_eq!(out, "1\n2\n");
    assert_eq!(computer.registers().pc, 46);
}

#[test]
fn unknown_instruction_test() {
    let program = assemble(&[Instruction::Ldi(Reg::R0, 8), Instruction::Prn(Reg::R0)]);
    let mut computer = Computer::with_program(&program).unwrap();
    let mut out = Vec::new();

    // Memory after the program is zero-filled, and 0 is not a valid opcode
    let err = computer.run(&mut out).unwrap_err();
    assert!(matches!(
        err,
        ProcessorError::UnknownInstruction { opcode: 0, pc: 5 }
    ));
    assert_eq!(out, b"8\n");
    assert_eq!(computer.registers().pc, 5);
    assert_eq!(computer.registers().get(Reg::R0), 8);
}

#[test]
fn program_too_large_test() {
    let program = vec![0b0000_0001; C::MEMORY_SIZE + 1];
    let err = Computer::with_program(&program).unwrap_err();
    assert_eq!(
        err,
        LoadError {
            size: 257,
            capacity: 256
        }
    );
}

#[test]
fn demos_test() {
    let demos = [
        (include_str!("../../demos/print8.ls8"), "8\n"),
        (include_str!("../../demos/mult.ls8"), "72\n"),
        (include_str!("../../demos/call.ls8"), "20\n30\n36\n60\n"),
        (include_str!("../../demos/sctest.ls8"), "1\n2\n"),
    ];

    for (input, expected) in demos {
        let (_, out) = run(&parse_program(input).unwrap());
        assert_eq!(out, expected);
    }
}
