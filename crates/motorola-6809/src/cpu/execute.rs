//! Instruction execution for the 6809.
//!
//! Cycle counts are charged per instruction; indexed addressing adds its
//! own surcharge inside `ea_indexed`.

use emu_core::Bus;

use crate::alu;
use crate::flags::{self, C, E, F, I, N, V, Z};

use super::{M6809, Stack, VEC_SWI, VEC_SWI2, VEC_SWI3, WaitState, read16, sext8, write16};

/// Read-modify-write group shared by pages $0x, $4x, $5x, $6x and $7x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RmwOp {
    Neg,
    Com,
    Lsr,
    Ror,
    Asr,
    Asl,
    Rol,
    Dec,
    Inc,
    Tst,
    Jmp,
    Clr,
}

impl RmwOp {
    const fn decode(op: u8) -> Option<Self> {
        Some(match op & 0x0F {
            0x0 => Self::Neg,
            0x3 => Self::Com,
            0x4 => Self::Lsr,
            0x6 => Self::Ror,
            0x7 => Self::Asr,
            0x8 => Self::Asl,
            0x9 => Self::Rol,
            0xA => Self::Dec,
            0xC => Self::Inc,
            0xD => Self::Tst,
            // No inherent JMP A / JMP B.
            0xE if op & 0xF0 != 0x40 && op & 0xF0 != 0x50 => Self::Jmp,
            0xF => Self::Clr,
            _ => return None,
        })
    }
}

/// Where a read-modify-write instruction gets and puts its operand.
#[derive(Debug, Clone, Copy)]
enum Operand {
    A,
    B,
    Memory(u16),
}

/// Cycle costs indexed by addressing mode: immediate, direct, indexed, extended.
const CYCLES_ALU8: [u32; 4] = [2, 4, 4, 5];
const CYCLES_ALU16: [u32; 4] = [4, 6, 6, 7];
const CYCLES_LOAD16: [u32; 4] = [3, 5, 5, 6];
const CYCLES_STORE8: [u32; 4] = [0, 4, 4, 5];
const CYCLES_STORE16: [u32; 4] = [0, 5, 5, 6];
const CYCLES_JSR: [u32; 4] = [0, 7, 7, 8];
const CYCLES_CMP16_PREFIXED: [u32; 4] = [5, 7, 7, 8];
const CYCLES_LOAD16_PREFIXED: [u32; 4] = [4, 6, 6, 7];
const CYCLES_STORE16_PREFIXED: [u32; 4] = [0, 6, 6, 7];

impl M6809 {
    /// Execute the instruction whose opcode byte has just been fetched.
    pub(super) fn execute<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            0x00..=0x0F | 0x40..=0x7F => self.execute_rmw(bus, op),

            0x10 => {
                let op = self.fetch8(bus);
                self.execute_page2(bus, op);
            }
            0x11 => {
                let op = self.fetch8(bus);
                self.execute_page3(bus, op);
            }

            // NOP
            0x12 => self.cycles += 2,

            // SYNC
            0x13 => {
                self.wait = WaitState::Sync;
                self.cycles += 2;
            }

            // LBRA
            0x16 => {
                let offset = self.fetch16(bus);
                self.regs.pc = self.regs.pc.wrapping_add(offset);
                self.cycles += 5;
            }

            // LBSR
            0x17 => {
                let offset = self.fetch16(bus);
                self.push16(bus, Stack::S, self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(offset);
                self.cycles += 9;
            }

            // DAA
            0x19 => {
                self.regs.a = alu::daa(&mut self.regs.cc, self.regs.a);
                self.cycles += 2;
            }

            // ORCC #
            0x1A => {
                let mask = self.fetch8(bus);
                self.regs.cc |= mask;
                self.cycles += 3;
            }

            // ANDCC #
            0x1C => {
                let mask = self.fetch8(bus);
                self.regs.cc &= mask;
                self.cycles += 3;
            }

            // SEX
            0x1D => {
                self.regs.a = if self.regs.b & 0x80 != 0 { 0xFF } else { 0x00 };
                let d = self.regs.d();
                flags::set(&mut self.regs.cc, N, self.regs.a & 0x80 != 0);
                flags::set(&mut self.regs.cc, Z, d == 0);
                self.cycles += 2;
            }

            // EXG
            0x1E => {
                let post = self.fetch8(bus);
                self.exg(post);
                self.cycles += 8;
            }

            // TFR
            0x1F => {
                let post = self.fetch8(bus);
                self.tfr(post);
                self.cycles += 6;
            }

            // Short branches
            0x20..=0x2F => {
                let offset = sext8(self.fetch8(bus));
                if self.branch_taken(op) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset);
                }
                self.cycles += 3;
            }

            // LEAX / LEAY set Z; LEAS / LEAU leave flags alone.
            0x30 => {
                self.regs.x = self.ea_indexed(bus);
                flags::set(&mut self.regs.cc, Z, self.regs.x == 0);
                self.cycles += 4;
            }
            0x31 => {
                self.regs.y = self.ea_indexed(bus);
                flags::set(&mut self.regs.cc, Z, self.regs.y == 0);
                self.cycles += 4;
            }
            0x32 => {
                self.regs.s = self.ea_indexed(bus);
                self.cycles += 4;
            }
            0x33 => {
                self.regs.u = self.ea_indexed(bus);
                self.cycles += 4;
            }

            // PSHS / PULS / PSHU / PULU
            0x34 => {
                let post = self.fetch8(bus);
                self.push_regs(bus, Stack::S, post);
                self.cycles += 5;
            }
            0x35 => {
                let post = self.fetch8(bus);
                self.pull_regs(bus, Stack::S, post);
                self.cycles += 5;
            }
            0x36 => {
                let post = self.fetch8(bus);
                self.push_regs(bus, Stack::U, post);
                self.cycles += 5;
            }
            0x37 => {
                let post = self.fetch8(bus);
                self.pull_regs(bus, Stack::U, post);
                self.cycles += 5;
            }

            // RTS
            0x39 => {
                self.regs.pc = self.pull16(bus, Stack::S);
                self.cycles += 5;
            }

            // ABX
            0x3A => {
                self.regs.x = self.regs.x.wrapping_add(u16::from(self.regs.b));
                self.cycles += 3;
            }

            // RTI: the stacked E bit decides how much comes back.
            0x3B => {
                self.pull_regs(bus, Stack::S, 0x01);
                if flags::is_set(self.regs.cc, E) {
                    self.pull_regs(bus, Stack::S, 0xFE);
                } else {
                    self.pull_regs(bus, Stack::S, 0x80);
                }
                self.cycles += 3;
            }

            // CWAI #
            0x3C => {
                let mask = self.fetch8(bus);
                self.regs.cc &= mask;
                self.regs.cc |= E;
                self.push_regs(bus, Stack::S, 0xFF);
                self.wait = WaitState::Cwai;
                self.cycles += 4;
            }

            // MUL
            0x3D => {
                let d = alu::mul(&mut self.regs.cc, self.regs.a, self.regs.b);
                self.regs.set_d(d);
                self.cycles += 11;
            }

            // SWI
            0x3F => {
                self.regs.cc |= E;
                self.push_regs(bus, Stack::S, 0xFF);
                self.regs.cc |= I | F;
                self.regs.pc = read16(bus, VEC_SWI);
                self.cycles += 7;
            }

            0x80..=0xFF => self.execute_accumulator(bus, op),

            _ => self.undefined(u16::from(op)),
        }
    }

    fn undefined(&mut self, op: u16) {
        log::warn!(
            "6809: undefined opcode {op:#04X} near PC {:#06X}",
            self.regs.pc
        );
        self.cycles += 2;
    }

    /// Evaluate the condition for a short or long branch opcode.
    ///
    /// Even opcodes branch when the condition holds, odd ones when it fails.
    fn branch_taken(&self, op: u8) -> bool {
        let cc = self.regs.cc;
        let n = flags::is_set(cc, N);
        let z = flags::is_set(cc, Z);
        let v = flags::is_set(cc, V);
        let c = flags::is_set(cc, C);

        let condition = match (op >> 1) & 0x07 {
            0 => true, // BRA / BRN
            1 => !(c || z), // BHI / BLS
            2 => !c, // BCC / BCS
            3 => !z, // BNE / BEQ
            4 => !v, // BVC / BVS
            5 => !n, // BPL / BMI
            6 => n == v, // BGE / BLT
            _ => !z && n == v, // BGT / BLE
        };

        condition != (op & 0x01 != 0)
    }

    // =========================================================================
    // Read-modify-write group
    // =========================================================================

    fn execute_rmw<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let Some(kind) = RmwOp::decode(op) else {
            self.undefined(u16::from(op));
            return;
        };

        if kind == RmwOp::Jmp {
            self.regs.pc = match op >> 4 {
                0x0 => {
                    self.cycles += 3;
                    self.ea_direct(bus)
                }
                0x6 => {
                    self.cycles += 3;
                    self.ea_indexed(bus)
                }
                _ => {
                    self.cycles += 4;
                    self.ea_extended(bus)
                }
            };
            return;
        }

        let operand = match op >> 4 {
            0x0 => {
                self.cycles += 6;
                Operand::Memory(self.ea_direct(bus))
            }
            0x4 => {
                self.cycles += 2;
                Operand::A
            }
            0x5 => {
                self.cycles += 2;
                Operand::B
            }
            0x6 => {
                self.cycles += 6;
                Operand::Memory(self.ea_indexed(bus))
            }
            _ => {
                self.cycles += 7;
                Operand::Memory(self.ea_extended(bus))
            }
        };

        // CLR writes without reading first.
        if kind == RmwOp::Clr {
            let zero = alu::clr(&mut self.regs.cc);
            self.put_operand(bus, operand, zero);
            return;
        }

        let value = match operand {
            Operand::A => self.regs.a,
            Operand::B => self.regs.b,
            Operand::Memory(ea) => bus.read(ea),
        };

        let cc = &mut self.regs.cc;
        let result = match kind {
            RmwOp::Neg => alu::neg(cc, value),
            RmwOp::Com => alu::com(cc, value),
            RmwOp::Lsr => alu::lsr(cc, value),
            RmwOp::Ror => alu::ror(cc, value),
            RmwOp::Asr => alu::asr(cc, value),
            RmwOp::Asl => alu::asl(cc, value),
            RmwOp::Rol => alu::rol(cc, value),
            RmwOp::Dec => alu::dec(cc, value),
            RmwOp::Inc => alu::inc(cc, value),
            RmwOp::Tst | RmwOp::Jmp | RmwOp::Clr => {
                alu::tst8(cc, value);
                return;
            }
        };

        self.put_operand(bus, operand, result);
    }

    fn put_operand<B: Bus>(&mut self, bus: &mut B, operand: Operand, value: u8) {
        match operand {
            Operand::A => self.regs.a = value,
            Operand::B => self.regs.b = value,
            Operand::Memory(ea) => bus.write(ea, value),
        }
    }

    // =========================================================================
    // Accumulator and 16-bit register group ($80-$FF)
    // =========================================================================

    /// Effective address for direct (1), indexed (2) or extended (3) mode.
    fn mode_ea<B: Bus>(&mut self, bus: &mut B, mode: usize) -> u16 {
        match mode {
            1 => self.ea_direct(bus),
            2 => self.ea_indexed(bus),
            _ => self.ea_extended(bus),
        }
    }

    fn mode_operand8<B: Bus>(&mut self, bus: &mut B, mode: usize) -> u8 {
        if mode == 0 {
            self.fetch8(bus)
        } else {
            let ea = self.mode_ea(bus, mode);
            bus.read(ea)
        }
    }

    fn mode_operand16<B: Bus>(&mut self, bus: &mut B, mode: usize) -> u16 {
        if mode == 0 {
            self.fetch16(bus)
        } else {
            let ea = self.mode_ea(bus, mode);
            read16(bus, ea)
        }
    }

    /// Store a 16-bit register with N/Z/V set from the value.
    fn store16<B: Bus>(&mut self, bus: &mut B, mode: usize, value: u16) {
        let ea = self.mode_ea(bus, mode);
        alu::tst16(&mut self.regs.cc, value);
        write16(bus, ea, value);
    }

    fn execute_accumulator<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let mode = usize::from((op >> 4) & 0x03);
        let b_side = op & 0x40 != 0;

        match op & 0x0F {
            // SUBD / ADDD
            0x3 => {
                let value = self.mode_operand16(bus, mode);
                let d = self.regs.d();
                let result = if b_side {
                    alu::add16(&mut self.regs.cc, d, value)
                } else {
                    alu::sub16(&mut self.regs.cc, d, value)
                };
                self.regs.set_d(result);
                self.cycles += CYCLES_ALU16[mode];
            }

            // STA / STB
            0x7 => {
                if mode == 0 {
                    self.undefined(u16::from(op));
                    return;
                }
                let ea = self.mode_ea(bus, mode);
                let value = if b_side { self.regs.b } else { self.regs.a };
                alu::tst8(&mut self.regs.cc, value);
                bus.write(ea, value);
                self.cycles += CYCLES_STORE8[mode];
            }

            // CMPX / LDD
            0xC => {
                let value = self.mode_operand16(bus, mode);
                if b_side {
                    let d = alu::tst16(&mut self.regs.cc, value);
                    self.regs.set_d(d);
                    self.cycles += CYCLES_LOAD16[mode];
                } else {
                    alu::sub16(&mut self.regs.cc, self.regs.x, value);
                    self.cycles += CYCLES_ALU16[mode];
                }
            }

            // BSR / JSR / STD
            0xD => match (b_side, mode) {
                (false, 0) => {
                    let offset = sext8(self.fetch8(bus));
                    self.push16(bus, Stack::S, self.regs.pc);
                    self.regs.pc = self.regs.pc.wrapping_add(offset);
                    self.cycles += 7;
                }
                (false, _) => {
                    let ea = self.mode_ea(bus, mode);
                    self.push16(bus, Stack::S, self.regs.pc);
                    self.regs.pc = ea;
                    self.cycles += CYCLES_JSR[mode];
                }
                (true, 0) => self.undefined(u16::from(op)),
                (true, _) => {
                    self.store16(bus, mode, self.regs.d());
                    self.cycles += CYCLES_STORE16[mode];
                }
            },

            // LDX / LDU
            0xE => {
                let value = self.mode_operand16(bus, mode);
                let value = alu::tst16(&mut self.regs.cc, value);
                if b_side {
                    self.regs.u = value;
                } else {
                    self.regs.x = value;
                }
                self.cycles += CYCLES_LOAD16[mode];
            }

            // STX / STU
            0xF => {
                if mode == 0 {
                    self.undefined(u16::from(op));
                    return;
                }
                let value = if b_side { self.regs.u } else { self.regs.x };
                self.store16(bus, mode, value);
                self.cycles += CYCLES_STORE16[mode];
            }

            // 8-bit ALU on A or B
            kind => {
                let value = self.mode_operand8(bus, mode);
                let acc = if b_side { self.regs.b } else { self.regs.a };
                let cc = &mut self.regs.cc;
                let result = match kind {
                    0x0 => Some(alu::sub8(cc, acc, value)),
                    0x1 => {
                        alu::sub8(cc, acc, value);
                        None
                    }
                    0x2 => Some(alu::sbc8(cc, acc, value)),
                    0x4 => Some(alu::and(cc, acc, value)),
                    0x5 => {
                        alu::and(cc, acc, value);
                        None
                    }
                    0x6 => Some(alu::tst8(cc, value)),
                    0x8 => Some(alu::eor(cc, acc, value)),
                    0x9 => Some(alu::adc8(cc, acc, value)),
                    0xA => Some(alu::or(cc, acc, value)),
                    _ => Some(alu::add8(cc, acc, value)),
                };
                if let Some(result) = result {
                    if b_side {
                        self.regs.b = result;
                    } else {
                        self.regs.a = result;
                    }
                }
                self.cycles += CYCLES_ALU8[mode];
            }
        }
    }

    // =========================================================================
    // Page 2 ($10 prefix)
    // =========================================================================

    fn execute_page2<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let mode = usize::from((op >> 4) & 0x03);

        match op {
            // Long branches
            0x20..=0x2F => {
                let offset = self.fetch16(bus);
                self.cycles += 5;
                // Taken long branches cost one more cycle.
                if self.branch_taken(op) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset);
                    self.cycles += 1;
                }
            }

            // SWI2: masks are left alone.
            0x3F => {
                self.regs.cc |= E;
                self.push_regs(bus, Stack::S, 0xFF);
                self.regs.pc = read16(bus, VEC_SWI2);
                self.cycles += 8;
            }

            // CMPD
            0x83 | 0x93 | 0xA3 | 0xB3 => {
                let value = self.mode_operand16(bus, mode);
                let d = self.regs.d();
                alu::sub16(&mut self.regs.cc, d, value);
                self.cycles += CYCLES_CMP16_PREFIXED[mode];
            }

            // CMPY
            0x8C | 0x9C | 0xAC | 0xBC => {
                let value = self.mode_operand16(bus, mode);
                alu::sub16(&mut self.regs.cc, self.regs.y, value);
                self.cycles += CYCLES_CMP16_PREFIXED[mode];
            }

            // LDY
            0x8E | 0x9E | 0xAE | 0xBE => {
                let value = self.mode_operand16(bus, mode);
                self.regs.y = alu::tst16(&mut self.regs.cc, value);
                self.cycles += CYCLES_LOAD16_PREFIXED[mode];
            }

            // STY
            0x9F | 0xAF | 0xBF => {
                self.store16(bus, mode, self.regs.y);
                self.cycles += CYCLES_STORE16_PREFIXED[mode];
            }

            // LDS
            0xCE | 0xDE | 0xEE | 0xFE => {
                let value = self.mode_operand16(bus, mode);
                self.regs.s = alu::tst16(&mut self.regs.cc, value);
                self.cycles += CYCLES_LOAD16_PREFIXED[mode];
            }

            // STS
            0xDF | 0xEF | 0xFF => {
                self.store16(bus, mode, self.regs.s);
                self.cycles += CYCLES_STORE16_PREFIXED[mode];
            }

            _ => self.undefined(0x1000 | u16::from(op)),
        }
    }

    // =========================================================================
    // Page 3 ($11 prefix)
    // =========================================================================

    fn execute_page3<B: Bus>(&mut self, bus: &mut B, op: u8) {
        let mode = usize::from((op >> 4) & 0x03);

        match op {
            // SWI3
            0x3F => {
                self.regs.cc |= E;
                self.push_regs(bus, Stack::S, 0xFF);
                self.regs.pc = read16(bus, VEC_SWI3);
                self.cycles += 8;
            }

            // CMPU
            0x83 | 0x93 | 0xA3 | 0xB3 => {
                let value = self.mode_operand16(bus, mode);
                alu::sub16(&mut self.regs.cc, self.regs.u, value);
                self.cycles += CYCLES_CMP16_PREFIXED[mode];
            }

            // CMPS
            0x8C | 0x9C | 0xAC | 0xBC => {
                let value = self.mode_operand16(bus, mode);
                alu::sub16(&mut self.regs.cc, self.regs.s, value);
                self.cycles += CYCLES_CMP16_PREFIXED[mode];
            }

            _ => self.undefined(0x1100 | u16::from(op)),
        }
    }
}
