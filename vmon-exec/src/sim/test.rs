use std::fs;

use expect_test::{expect, Expect};
use vmon::addr::{MemSpace, MonAddr};
use vmon::asm::{AddrMode, AsmInstr, AsmOperand};
use vmon::reg::{CpuType, RegId, RegRef};

use super::d64::{D64, IMAGE_LEN};
use super::m6502::M6502;
use super::SimMachine;
use crate::machine::{Assembler, Machine};

fn c(offset: u32) -> MonAddr {
    MonAddr::new(MemSpace::Computer, offset)
}

fn assemble(src: &str, mode: AddrMode, param: i64, pc: u32) -> String {
    let instr = AsmInstr {
        mnemonic: src.to_owned(),
        operand: AsmOperand {
            mode,
            submode: 0,
            param,
        },
    };
    match M6502.assemble(&instr, pc) {
        Ok(bytes) => bytes
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" "),
        Err(err) => err.to_string(),
    }
}

fn check_asm(src: &str, mode: AddrMode, param: i64, expect: Expect) {
    expect.assert_eq(&assemble(src, mode, param, 0x1000));
}

fn check_disasm(bytes: &[u8], expect: Expect) {
    let (len, text) = M6502.disassemble(bytes, 0x1000);
    expect.assert_eq(&format!("{len} {text}"));
}

#[test]
fn encode() {
    check_asm("lda", AddrMode::Immediate, 1, expect![["a9 01"]]);
    check_asm("LDA", AddrMode::ZeroPage, 0x10, expect![["a5 10"]]);
    check_asm("lda", AddrMode::Absolute, 0xd020, expect![["ad 20 d0"]]);
    check_asm("rts", AddrMode::Implied, 0, expect![["60"]]);
}
#[test]
fn encode_promotes_modes() {
    check_asm("sta", AddrMode::ZeroPageY, 0x10, expect![["99 10 00"]]);
    check_asm("jmp", AddrMode::Indirect, 0x20, expect![["6c 20 00"]]);
    check_asm("asl", AddrMode::Implied, 0, expect![["0a"]]);
    check_asm("jsr", AddrMode::ZeroPage, 0x20, expect![["20 20 00"]]);
}
#[test]
fn encode_errors() {
    check_asm("frob", AddrMode::Implied, 0, expect![["Assembly failed: unknown mnemonic `frob'"]]);
    check_asm(
        "stx",
        AddrMode::AbsoluteY,
        0x1234,
        expect![["Assembly failed: STX has no AbsoluteY mode"]],
    );
    check_asm("lda", AddrMode::Implied, 0, expect![["Assembly failed: LDA has no Implied mode"]]);
}
#[test]
fn branches() {
    check_asm("bne", AddrMode::Absolute, 0x1010, expect![["d0 0e"]]);
    check_asm("beq", AddrMode::Absolute, 0x1000, expect![["f0 fe"]]);
    check_asm("bcc", AddrMode::Absolute, 0x1081, expect![["90 7f"]]);
    check_asm("bcc", AddrMode::Absolute, 0x1082, expect![["Assembly failed: branch out of range"]]);
    check_asm("bpl", AddrMode::Immediate, 1, expect![["Assembly failed: BPL takes an address"]]);
}
#[test]
fn decode() {
    check_disasm(&[0xd0, 0xfe], expect![["2 BNE $1000"]]);
    check_disasm(&[0x10, 0x0e], expect![["2 BPL $1010"]]);
    check_disasm(&[0x6c, 0x34, 0x12], expect![["3 JMP ($1234)"]]);
    check_disasm(&[0xbd, 0x34, 0x12], expect![["3 LDA $1234,X"]]);
    check_disasm(&[0xb1, 0x20], expect![["2 LDA ($20),Y"]]);
    check_disasm(&[0x0a], expect![["1 ASL A"]]);
    check_disasm(&[0xa9, 0x01], expect![["2 LDA #$01"]]);
    check_disasm(&[0x02], expect![["1 ???"]]);
    check_disasm(&[], expect![["1 ???"]]);
}

#[test]
fn blank_image() {
    let image = D64::blank("TEST DISK", "01");
    assert_eq!(image.bytes().len(), IMAGE_LEN);
    assert_eq!(image.free_blocks(), 664);
    assert_eq!(image.disk_name(), ("TEST DISK".to_owned(), "01".to_owned()));
    assert_eq!(image.read_block(18, 0).unwrap()[..2], [18, 1]);
    expect![[r#"
        0 "TEST DISK       " 01 2A
        664 BLOCKS FREE."#]]
    .assert_eq(&image.listing().join("\n"));
}
#[test]
fn image_files() {
    let mut image = D64::blank("FILES", "ab");
    let long: Vec<u8> = (0..300u32).map(|i| i as u8).collect();
    image.write_file("one", &[0x01, 0x08, 0x60]).unwrap();
    image.write_file("two", &long).unwrap();
    assert_eq!(image.free_blocks(), 661);
    assert_eq!(image.read_file("ONE").unwrap(), [0x01, 0x08, 0x60]);
    assert_eq!(image.read_file("two").unwrap(), long);
    assert_eq!(image.find("T*").map(|entry| entry.name), Some("TWO".to_owned()));

    expect![[r#"
        0 "FILES           " ab 2A
        1    "ONE"              PRG
        2    "TWO"              PRG
        661 BLOCKS FREE."#]]
    .assert_eq(&image.listing().join("\n"));

    let err = image.write_file("one", &[]).unwrap_err();
    assert_eq!(err.to_string(), "File `ONE' exists.");
    let err = image.read_file("three").unwrap_err();
    assert_eq!(err.to_string(), "File `three' not found.");
}
#[test]
fn image_blocks() {
    let mut image = D64::blank("BLOCKS", "00");
    image.write_block(1, 20, &[1, 2, 3]).unwrap();
    assert_eq!(image.read_block(1, 20).unwrap()[..4], [1, 2, 3, 0]);

    let err = image.read_block(36, 0).unwrap_err();
    assert_eq!(err.to_string(), "Invalid track 36 sector 0.");
    let err = image.read_block(1, 21).unwrap_err();
    assert_eq!(err.to_string(), "Invalid track 1 sector 21.");
    let err = image.write_block(-1, 0, &[]).unwrap_err();
    assert_eq!(err.to_string(), "Invalid track -1 sector 0.");
}
#[test]
fn image_from_bytes() {
    assert!(D64::from_bytes(vec![0; 1000]).is_none());
    // a trailing error table is dropped
    let image = D64::from_bytes(vec![0; IMAGE_LEN + 683]).unwrap();
    assert_eq!(image.bytes().len(), IMAGE_LEN);
}

#[test]
fn memory_layout() {
    let mut sim = SimMachine::default();
    sim.load_rom(0xe000, &[0x4c]);
    sim.write(c(0xe000), 0x11);
    sim.write(c(0xd020), 0x06);
    assert_eq!(sim.peek_bank(None, c(0xe000)), 0x4c);
    assert_eq!(sim.peek_bank(Some(2), c(0xe000)), 0x11);
    assert_eq!(sim.peek_bank(Some(4), c(0xd020)), 0x06);
    assert_eq!(sim.peek_bank(Some(2), c(0xd020)), 0x00);

    // with RAM banked in, writes land under the I/O area
    sim.set_bank(MemSpace::Computer, 2);
    sim.write(c(0xd020), 0x07);
    assert_eq!(sim.peek_bank(None, c(0xd020)), 0x07);
    assert_eq!(sim.peek_bank(Some(0), c(0xd020)), 0x06);

    // drives have plain RAM
    sim.write(MonAddr::new(MemSpace::Disk8, 0xe000), 0x22);
    assert_eq!(sim.peek_bank(None, MonAddr::new(MemSpace::Disk8, 0xe000)), 0x22);
}
#[test]
fn register_widths() {
    let mut sim = SimMachine::default();
    let a = RegRef::new(MemSpace::Computer, RegId::A);
    let pc = RegRef::new(MemSpace::Computer, RegId::Pc);
    sim.set_register(a, 0x1ff);
    sim.set_register(pc, 0x1_c000);
    assert_eq!(sim.register(a), 0xff);
    assert_eq!(sim.register(pc), 0xc000);
}
#[test]
fn register_pairs() {
    let mut sim = SimMachine::default();
    let reg = |id| RegRef::new(MemSpace::Computer, id);
    sim.set_cpu(MemSpace::Computer, CpuType::Z80).unwrap();
    sim.set_register(reg(RegId::Bc), 0x1_2345);
    assert_eq!(sim.register(reg(RegId::B)), 0x23);
    assert_eq!(sim.register(reg(RegId::C)), 0x45);
    sim.set_register(reg(RegId::Ixl), 0x1ff);
    assert_eq!(sim.register(reg(RegId::Ix)), 0x00ff);

    sim.set_cpu(MemSpace::Computer, CpuType::M6809).unwrap();
    sim.set_register(reg(RegId::A), 0xab);
    sim.set_register(reg(RegId::B), 0xcd);
    assert_eq!(sim.register(reg(RegId::D)), 0xabcd);
}
#[test]
fn reset_vector() {
    let mut sim = SimMachine::default();
    sim.load_rom(0xfffc, &[0x00, 0xe0]);
    sim.tick(100);
    sim.reset(0).unwrap();
    assert_eq!(sim.register(RegRef::new(MemSpace::Computer, RegId::Pc)), 0xe000);
    assert_eq!(sim.stopwatch().unwrap(), 0);
    assert_eq!(sim.reset(5).unwrap_err().to_string(), "Invalid device number 5.");
}
#[test]
fn stopwatch() {
    let mut sim = SimMachine::default();
    sim.tick(100);
    sim.reset_stopwatch().unwrap();
    sim.tick(20);
    assert_eq!(sim.stopwatch().unwrap(), 20);
}
#[test]
fn io_chips() {
    let mut sim = SimMachine::default();
    assert_eq!(sim.io(None).unwrap().len(), 4);
    sim.write(c(0xdd00), 0x97);
    let lines = sim.io(Some(c(0xdd03))).unwrap();
    assert!(lines[0].starts_with("CIA2 at $dd00: 97 00"));
    assert_eq!(sim.io(Some(c(0x1000))).unwrap(), ["No I/O chip at C:1000."]);
}
#[test]
fn drives() {
    let mut sim = SimMachine::default();
    assert_eq!(sim.drive_command(8, "i").unwrap(), "74,DRIVE NOT READY,00,00");
    sim.attach_image(9, D64::blank("WORK", "w1"));
    assert_eq!(sim.drive_command(9, "ui").unwrap(), "30,SYNTAX ERROR,00,00");
    assert_eq!(sim.export().unwrap(), ["Drive 9: \"WORK\" w1"]);
    assert_eq!(sim.detach(7).unwrap_err().to_string(), "Invalid device number 7.");
    sim.detach(9).unwrap();
    assert!(sim.image(9).is_none());
}
#[test]
fn autostart_image() {
    let dir = std::env::temp_dir().join(format!("vmon-autostart-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("game.d64");
    let mut image = D64::blank("GAME", "g1");
    image.write_file("loader", &[0x01, 0x08, 0xaa, 0xbb]).unwrap();
    fs::write(&path, image.bytes()).unwrap();

    let mut sim = SimMachine::default();
    sim.autostart(&path, None, true).unwrap();
    assert_eq!(sim.peek_bank(None, c(0x0802)), 0xbb);
    assert_eq!(sim.pending_keys(), "RUN\r");
    assert!(sim.image(8).is_some());
}
#[test]
fn resources_file() {
    let dir = std::env::temp_dir().join(format!("vmon-resources-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("vice.ini");

    let mut sim = SimMachine::default();
    sim.set_resource("SidModel", "1").unwrap();
    sim.save_resources(&path).unwrap();
    expect![[r#"
        [C64]
        Drive8Type=1541
        MachineVideoStandard=1
        SidModel=1
        VICIIBorderMode=0
        VirtualDevices=0
    "#]]
    .assert_eq(&fs::read_to_string(&path).unwrap());

    let mut fresh = SimMachine::default();
    fresh.load_resources(&path).unwrap();
    assert_eq!(fresh.resource("SidModel").unwrap(), "1");
}
