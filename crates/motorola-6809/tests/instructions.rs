//! Unit tests for 6809 instruction behaviour.

use emu_core::{Bus, Cpu, Observable, SimpleBus, Value};
use motorola_6809::{M6809, RegisterId, WaitState, flags};

/// Load a program at $0200, point the reset vector at it and reset.
fn setup_program(program: &[u8]) -> (M6809, SimpleBus) {
    let mut bus = SimpleBus::new();
    bus.load(0x0200, program);
    bus.load(0xFFFE, &[0x02, 0x00]);
    let mut cpu = M6809::new();
    cpu.reset(&mut bus);
    cpu.regs.s = 0x1000;
    cpu.regs.u = 0x2000;
    (cpu, bus)
}

/// Step `n` instructions with both interrupt lines idle; returns total cycles.
fn run(cpu: &mut M6809, bus: &mut SimpleBus, n: usize) -> u32 {
    (0..n).map(|_| cpu.step(bus, false, false)).sum()
}

#[test]
fn reset_loads_vector_and_masks_interrupts() {
    let (cpu, _) = setup_program(&[]);
    assert_eq!(cpu.regs.pc, 0x0200);
    assert!(flags::is_set(cpu.regs.cc, flags::I));
    assert!(flags::is_set(cpu.regs.cc, flags::F));
    assert_eq!(cpu.wait_state(), WaitState::Normal);
}

#[test]
fn test_lda_immediate_sets_flags() {
    // LDA #$80; LDA #$00
    let (mut cpu, mut bus) = setup_program(&[0x86, 0x80, 0x86, 0x00]);

    assert_eq!(run(&mut cpu, &mut bus, 1), 2);
    assert_eq!(cpu.regs.a, 0x80);
    assert!(flags::is_set(cpu.regs.cc, flags::N));

    run(&mut cpu, &mut bus, 1);
    assert!(flags::is_set(cpu.regs.cc, flags::Z));
    assert!(!flags::is_set(cpu.regs.cc, flags::N));
}

#[test]
fn test_direct_page_store_and_load() {
    // LDA #$30; TFR A,DP; LDB #$5A; STB <$10; CLRB; LDB <$10
    let program = [
        0x86, 0x30, // LDA #$30
        0x1F, 0x8B, // TFR A,DP
        0xC6, 0x5A, // LDB #$5A
        0xD7, 0x10, // STB <$10
        0x5F, // CLRB
        0xD6, 0x10, // LDB <$10
    ];
    let (mut cpu, mut bus) = setup_program(&program);
    run(&mut cpu, &mut bus, 6);

    assert_eq!(cpu.regs.dp, 0x30);
    assert_eq!(bus.peek(0x3010), 0x5A);
    assert_eq!(cpu.regs.b, 0x5A);
}

#[test]
fn test_extended_rmw_inc() {
    // INC $4000
    let (mut cpu, mut bus) = setup_program(&[0x7C, 0x40, 0x00]);
    bus.write(0x4000, 0x7F);
    assert_eq!(run(&mut cpu, &mut bus, 1), 7);
    assert_eq!(bus.peek(0x4000), 0x80);
    assert!(flags::is_set(cpu.regs.cc, flags::V));
}

#[test]
fn test_clr_memory_does_not_need_read() {
    // CLR $4000
    let (mut cpu, mut bus) = setup_program(&[0x7F, 0x40, 0x00]);
    bus.write(0x4000, 0x99);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.peek(0x4000), 0x00);
    assert!(flags::is_set(cpu.regs.cc, flags::Z));
}

#[test]
fn test_addd_and_std() {
    // LDD #$1234; ADDD #$0F0F; STD $3000
    let program = [0xCC, 0x12, 0x34, 0xC3, 0x0F, 0x0F, 0xFD, 0x30, 0x00];
    let (mut cpu, mut bus) = setup_program(&program);
    let cycles = run(&mut cpu, &mut bus, 3);

    assert_eq!(cpu.regs.d(), 0x2143);
    assert_eq!(bus.peek(0x3000), 0x21);
    assert_eq!(bus.peek(0x3001), 0x43);
    assert_eq!(cycles, 3 + 4 + 6);
}

#[test]
fn test_branch_taken_and_not_taken() {
    // LDA #$00; BEQ +2; LDA #$11; LDB #$22
    let program = [0x86, 0x00, 0x27, 0x02, 0x86, 0x11, 0xC6, 0x22];
    let (mut cpu, mut bus) = setup_program(&program);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.a, 0x00, "BEQ should skip LDA #$11");
    assert_eq!(cpu.regs.b, 0x22);

    // LDA #$01; BEQ +2; LDA #$11
    let (mut cpu, mut bus) = setup_program(&[0x86, 0x01, 0x27, 0x02, 0x86, 0x11]);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.a, 0x11);
}

#[test]
fn test_signed_branch_bgt_ble() {
    // LDA #$05; CMPA #$03; BGT +1; NOP; ... BLE would not be taken
    let program = [0x86, 0x05, 0x81, 0x03, 0x2E, 0x01, 0x12, 0x12];
    let (mut cpu, mut bus) = setup_program(&program);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.pc, 0x0207);
}

#[test]
fn test_long_branch_backwards() {
    // LBRA -3 (loops onto itself)
    let (mut cpu, mut bus) = setup_program(&[0x16, 0xFF, 0xFD]);
    assert_eq!(run(&mut cpu, &mut bus, 1), 5);
    assert_eq!(cpu.regs.pc, 0x0200);
}

#[test]
fn test_long_conditional_branch_cycles() {
    // LDA #$00; LBEQ +0 (taken)
    let (mut cpu, mut bus) = setup_program(&[0x86, 0x00, 0x10, 0x27, 0x00, 0x00]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(run(&mut cpu, &mut bus, 1), 6);
    assert_eq!(cpu.regs.pc, 0x0206);

    // LDA #$01; LBEQ +4 (not taken)
    let (mut cpu, mut bus) = setup_program(&[0x86, 0x01, 0x10, 0x27, 0x00, 0x04]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(run(&mut cpu, &mut bus, 1), 5);
    assert_eq!(cpu.regs.pc, 0x0206);

    // LDA #$01; LBNE +4 (taken)
    let (mut cpu, mut bus) = setup_program(&[0x86, 0x01, 0x10, 0x26, 0x00, 0x04]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(run(&mut cpu, &mut bus, 1), 6);
    assert_eq!(cpu.regs.pc, 0x020A);
}

#[test]
fn test_ldd_extended_sets_flags() {
    // LDD $3000
    let (mut cpu, mut bus) = setup_program(&[0xFC, 0x30, 0x00]);
    bus.load(0x3000, &[0x80, 0x01]);
    assert_eq!(run(&mut cpu, &mut bus, 1), 6);
    assert_eq!(cpu.regs.d(), 0x8001);
    assert!(flags::is_set(cpu.regs.cc, flags::N));
    assert!(!flags::is_set(cpu.regs.cc, flags::Z));
}

#[test]
fn test_jsr_rts() {
    // JSR $0300; LDB #$01 ... at $0300: LDA #$42; RTS
    let (mut cpu, mut bus) = setup_program(&[0xBD, 0x03, 0x00, 0xC6, 0x01]);
    bus.load(0x0300, &[0x86, 0x42, 0x39]);

    assert_eq!(run(&mut cpu, &mut bus, 1), 8);
    assert_eq!(cpu.regs.pc, 0x0300);
    assert_eq!(cpu.regs.s, 0x0FFE);
    assert_eq!(bus.peek(0x0FFE), 0x02);
    assert_eq!(bus.peek(0x0FFF), 0x03);

    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.a, 0x42);
    assert_eq!(cpu.regs.b, 0x01);
    assert_eq!(cpu.regs.s, 0x1000);
}

#[test]
fn test_pshs_puls_round_trip_order() {
    // LDA #$11; LDB #$22; LDX #$3344; PSHS A,B,X; CLRA; CLRB; LDX #0; PULS A,B,X
    let program = [
        0x86, 0x11, 0xC6, 0x22, 0x8E, 0x33, 0x44, 0x34, 0x16, 0x4F, 0x5F, 0x8E, 0x00, 0x00,
        0x35, 0x16,
    ];
    let (mut cpu, mut bus) = setup_program(&program);
    run(&mut cpu, &mut bus, 4);

    // X pushed first (higher addresses), then B, then A on top.
    assert_eq!(cpu.regs.s, 0x1000 - 4);
    assert_eq!(bus.peek(0x0FFC), 0x11);
    assert_eq!(bus.peek(0x0FFD), 0x22);
    assert_eq!(bus.peek(0x0FFE), 0x33);
    assert_eq!(bus.peek(0x0FFF), 0x44);

    run(&mut cpu, &mut bus, 4);
    assert_eq!(cpu.regs.a, 0x11);
    assert_eq!(cpu.regs.b, 0x22);
    assert_eq!(cpu.regs.x, 0x3344);
    assert_eq!(cpu.regs.s, 0x1000);
}

#[test]
fn test_indexed_post_increment_and_offsets() {
    // LDX #$4000; LDA ,X+; LDB 2,X; LDY #$1234; LEAY -4,Y
    let program = [
        0x8E, 0x40, 0x00, // LDX #$4000
        0xA6, 0x80, // LDA ,X+
        0xE6, 0x02, // LDB 2,X (5-bit offset)
        0x10, 0x8E, 0x12, 0x34, // LDY #$1234
        0x31, 0x3C, // LEAY -4,Y
    ];
    let (mut cpu, mut bus) = setup_program(&program);
    bus.load(0x4000, &[0xAA, 0xBB, 0xCC, 0xDD]);

    run(&mut cpu, &mut bus, 1);
    assert_eq!(run(&mut cpu, &mut bus, 1), 4 + 2);
    assert_eq!(cpu.regs.a, 0xAA);
    assert_eq!(cpu.regs.x, 0x4001);

    assert_eq!(run(&mut cpu, &mut bus, 1), 4 + 1);
    assert_eq!(cpu.regs.b, 0xDD);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.y, 0x1230);
}

#[test]
fn test_indexed_indirect_extended() {
    // LDA [$5000]
    let (mut cpu, mut bus) = setup_program(&[0xA6, 0x9F, 0x50, 0x00]);
    bus.load(0x5000, &[0x60, 0x10]);
    bus.write(0x6010, 0x77);
    assert_eq!(run(&mut cpu, &mut bus, 1), 4 + 5);
    assert_eq!(cpu.regs.a, 0x77);
}

#[test]
fn test_pc_relative_indexed() {
    // LEAX 16,PC (8-bit offset form)
    let (mut cpu, mut bus) = setup_program(&[0x30, 0x8C, 0x10]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.x, 0x0203 + 0x10);
}

#[test]
fn test_exg_and_tfr() {
    // LDA #$12; LDB #$34; EXG A,B; LDX #$ABCD; TFR X,Y
    let program = [0x86, 0x12, 0xC6, 0x34, 0x1E, 0x89, 0x8E, 0xAB, 0xCD, 0x1F, 0x12];
    let (mut cpu, mut bus) = setup_program(&program);
    run(&mut cpu, &mut bus, 5);
    assert_eq!(cpu.regs.a, 0x34);
    assert_eq!(cpu.regs.b, 0x12);
    assert_eq!(cpu.regs.y, 0xABCD);
}

#[test]
fn test_tfr_from_undefined_code_reads_ffff() {
    // TFR (code 6),X
    let (mut cpu, mut bus) = setup_program(&[0x1F, 0x61]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.x, 0xFFFF);
}

#[test]
fn test_mul_and_sex() {
    // LDA #$10; LDB #$10; MUL; LDB #$F0; SEX
    let program = [0x86, 0x10, 0xC6, 0x10, 0x3D, 0xC6, 0xF0, 0x1D];
    let (mut cpu, mut bus) = setup_program(&program);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.regs.d(), 0x0100);

    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.regs.a, 0xFF);
    assert!(flags::is_set(cpu.regs.cc, flags::N));
}

#[test]
fn test_cmpd_prefixed() {
    // LDD #$1000; CMPD #$1000
    let (mut cpu, mut bus) = setup_program(&[0xCC, 0x10, 0x00, 0x10, 0x83, 0x10, 0x00]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(run(&mut cpu, &mut bus, 1), 5);
    assert!(flags::is_set(cpu.regs.cc, flags::Z));
}

#[test]
fn test_irq_stacks_everything_and_rti_restores() {
    // ANDCC #$EF (unmask IRQ); NOP ... handler at $0400: RTI
    let (mut cpu, mut bus) = setup_program(&[0x1C, 0xEF, 0x12, 0x12]);
    bus.load(0xFFF8, &[0x04, 0x00]);
    bus.load(0x0400, &[0x3B]);

    run(&mut cpu, &mut bus, 1);
    cpu.regs.a = 0x5A;

    // Interrupt entry then the handler's RTI in the same step.
    let cycles = cpu.step(&mut bus, true, false);
    assert_eq!(cycles, 12 + 7 + 12 + 3);
    assert_eq!(cpu.regs.pc, 0x0202);
    assert_eq!(cpu.regs.s, 0x1000);
    assert_eq!(cpu.regs.a, 0x5A);
    assert!(!flags::is_set(cpu.regs.cc, flags::I), "RTI restores the mask");
}

#[test]
fn test_masked_irq_is_ignored() {
    let (mut cpu, mut bus) = setup_program(&[0x12]);
    bus.load(0xFFF8, &[0x04, 0x00]);
    cpu.step(&mut bus, true, false);
    assert_eq!(cpu.regs.pc, 0x0201);
}

#[test]
fn test_firq_stacks_pc_and_cc_only() {
    // ANDCC #$BF (unmask FIRQ)
    let (mut cpu, mut bus) = setup_program(&[0x1C, 0xBF]);
    bus.load(0xFFF6, &[0x05, 0x00]);
    bus.load(0x0500, &[0x12]);
    run(&mut cpu, &mut bus, 1);

    let cycles = cpu.step(&mut bus, false, true);
    assert_eq!(cycles, 3 + 7 + 2);
    assert_eq!(cpu.regs.s, 0x1000 - 3);
    assert!(!flags::is_set(bus.peek(0x0FFD), flags::E));
    assert!(flags::is_set(cpu.regs.cc, flags::F));
    assert!(flags::is_set(cpu.regs.cc, flags::I));
}

#[test]
fn test_sync_waits_until_interrupt_line() {
    // SYNC; LDA #$01
    let (mut cpu, mut bus) = setup_program(&[0x13, 0x86, 0x01]);
    run(&mut cpu, &mut bus, 1);
    assert!(cpu.is_waiting());

    assert_eq!(cpu.step(&mut bus, false, false), 1);
    assert_eq!(cpu.regs.pc, 0x0201);

    // Masked IRQ releases SYNC without vectoring.
    cpu.step(&mut bus, true, false);
    assert!(!cpu.is_waiting());
    assert_eq!(cpu.regs.a, 0x01);
}

#[test]
fn test_cwai_then_irq_skips_second_push() {
    // CWAI #$EF
    let (mut cpu, mut bus) = setup_program(&[0x3C, 0xEF]);
    bus.load(0xFFF8, &[0x04, 0x00]);
    bus.load(0x0400, &[0x12]);

    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.wait_state(), WaitState::Cwai);
    assert_eq!(cpu.regs.s, 0x1000 - 12);

    cpu.step(&mut bus, true, false);
    assert_eq!(cpu.regs.s, 0x1000 - 12, "registers were already stacked");
    assert_eq!(cpu.regs.pc, 0x0401);
}

#[test]
fn test_swi_vectors_and_masks() {
    let (mut cpu, mut bus) = setup_program(&[0x3F]);
    bus.load(0xFFFA, &[0x06, 0x00]);
    bus.load(0x0600, &[0x12]);
    cpu.regs.cc = 0;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.regs.pc, 0x0600);
    assert!(flags::is_set(cpu.regs.cc, flags::I));
    assert!(flags::is_set(cpu.regs.cc, flags::F));
    assert!(flags::is_set(bus.peek(0x1000 - 12), flags::E));
}

#[test]
fn test_undefined_opcode_costs_two_cycles() {
    let (mut cpu, mut bus) = setup_program(&[0x01]);
    assert_eq!(run(&mut cpu, &mut bus, 1), 2);
    assert_eq!(cpu.regs.pc, 0x0201);
}

#[test]
fn test_register_query_and_observable() {
    let (mut cpu, mut bus) = setup_program(&[0x8E, 0xBE, 0xEF]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.register(RegisterId::X), 0xBEEF);
    assert_eq!(cpu.register(RegisterId::S), 0x1000);
    assert_eq!(cpu.query("x"), Some(Value::U16(0xBEEF)));
    assert_eq!(cpu.query("flags.n"), Some(Value::Bool(true)));
    assert_eq!(cpu.query("cycles"), Some(Value::U64(3)));
    assert_eq!(cpu.query("nope"), None);
}
