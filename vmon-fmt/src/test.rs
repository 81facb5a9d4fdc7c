use expect_test::{expect, Expect};
use vmon::addr::{AddrRange, MemSpace, MonAddr};
use vmon::command::{CheckpointKind, MemOps};
use vmon::cond::{CompareOp, CondExpr, Operand};
use vmon::error::{ErrorKind, ParseError};
use vmon::lex::Radix;
use vmon::reg::{CpuType, RegId, RegRef};

use crate::{petscii, CheckpointLine, FmtContext};

fn c(offset: u32) -> MonAddr {
    MonAddr::new(MemSpace::Computer, offset)
}

fn check(actual: String, expect: Expect) {
    expect.assert_eq(&actual);
}

#[test]
fn error_report_caret() {
    let err = ParseError::new(ErrorKind::MissingCloseParen, 6);
    assert_eq!(
        crate::error_report("p (1+2\n", &err, &FmtContext::default()),
        "ERROR -- ')' expected:\n  p (1+2\n        ^\n"
    );
    let err = ParseError::new(ErrorKind::BadCmd, 0);
    assert_eq!(
        crate::error_report("frob", &err, &FmtContext::default()),
        "ERROR -- Bad command:\n  frob\n  ^\n"
    );
}
#[test]
fn values() {
    assert_eq!(crate::value(4096, Radix::Hex), "$1000");
    assert_eq!(crate::value(-1, Radix::Hex), "-$1");
    assert_eq!(crate::value(-1, Radix::Decimal), "-1");
    assert_eq!(crate::value(8, Radix::Octal), "&10");
    check(
        crate::convert(10),
        expect![[r#"
            $a
            10
            &12
            %1010"#]],
    );
}
#[test]
fn mem_rows() {
    assert_eq!(
        crate::mem_row(c(0x1000), b"HELLO", Radix::Hex, 8),
        format!(">C:1000  48 45 4c 4c  4f{}HELLO", " ".repeat(12))
    );
    assert_eq!(
        crate::mem_row(c(0), &[1, 200], Radix::Decimal, 2),
        ">C:0000   1 200   .H"
    );
    assert_eq!(
        crate::text_row(c(0x0400), &[8, 5, 12, 12, 15], true),
        ">C:0400  HELLO"
    );
}
#[test]
fn char_and_sprite_rows() {
    check(
        crate::char_rows(c(0x2000), &[0x3c, 0x66], 0xffff),
        expect![[r#"
            >C:2000  ..****..  3c
            >C:2001  .**..**.  66"#]],
    );
    check(
        crate::sprite_rows(c(0x2000), &[0xff, 0x00, 0x81, 0x01, 0x02, 0x03], 0xffff),
        expect![[r#"
            >C:2000  ********........*......*
            >C:2003  .......*......*.......**"#]],
    );
}
#[test]
fn screen_text() {
    check(
        crate::screen(4, &[8, 9, 0x20, 0x20, 1, 2, 3, 4]),
        expect![[r#"
            HI
            ABCD"#]],
    );
}
#[test]
fn register_lines() {
    let values = [
        (RegId::Pc, 0xc000),
        (RegId::A, 1),
        (RegId::X, 2),
        (RegId::Y, 3),
        (RegId::Sp, 0xff),
        (RegId::Flags, 0x22),
    ];
    assert_eq!(
        crate::registers(CpuType::Mos6502, &values),
        "  PC   A  X  Y  SP NV-BDIZC\n.;c000 01 02 03 ff 00100010"
    );
    let values = [(RegId::Pc, 0x1234), (RegId::Hl, 0xbeef), (RegId::A, 7)];
    assert_eq!(
        crate::registers(CpuType::Z80, &values),
        "  PC   HL   A\n.;1234 beef 07"
    );
}
#[test]
fn disasm() {
    assert_eq!(
        crate::disasm_line(c(0xc000), &[0xa9, 0x01], "LDA #$01"),
        ".C:c000  a9 01     LDA #$01"
    );
    assert_eq!(crate::label_line(c(0x1000), ".loop"), "C:$1000 .loop");
    assert_eq!(
        crate::memmap_line(c(0x0801), MemOps::LOAD.union(MemOps::EXEC)),
        "C:0801  r-x"
    );
}
#[test]
fn checkpoint_lines() {
    let line = CheckpointLine {
        num: 1,
        kind: CheckpointKind::Break,
        ops: MemOps::EXEC,
        range: AddrRange::single(c(0x1000)),
        enabled: true,
        temporary: false,
        hit_count: 0,
        ignore_count: 0,
        cond: None,
        command: None,
    };
    assert_eq!(line.to_string(), "BREAK: 1  C:$1000  (Stop on exec)");

    let cond = CondExpr::binary(
        CompareOp::Eq,
        CondExpr::leaf(Operand::Register(RegRef::new(MemSpace::Computer, RegId::A))),
        CondExpr::leaf(Operand::Value(5)),
    );
    let line = CheckpointLine {
        num: 2,
        kind: CheckpointKind::Watch,
        ops: MemOps::LOAD.union(MemOps::STORE),
        range: AddrRange::new(c(0x1000), c(0x1010)),
        enabled: false,
        temporary: false,
        hit_count: 3,
        ignore_count: 0,
        cond: Some(&cond),
        command: Some("m 0"),
    };
    assert_eq!(
        line.to_string(),
        "WATCH: 2  C:$1000-$1010  (Stop on load store) disabled\n\tHit count: 3\n\tCondition: A == $05\n\tCommand: m 0"
    );
    assert_eq!(
        crate::hit_line(1, CheckpointKind::Trace, MemOps::LOAD, c(0x1000)),
        "#1 (Trace load C:1000)"
    );
}
#[test]
fn help_topics() {
    check(
        crate::help(Some("M")),
        expect![[r#"
            Syntax: mem [<data_type>] [<address_range>]
            Abbreviation: m
            Display memory; <data_type> is one of h, d, o or b.
        "#]],
    );
    assert_eq!(crate::help(Some("zz")), "Command `zz' is unknown.\n");
    assert!(crate::help(None).contains("break (bk, b)\n"));
}
#[test]
fn glyphs() {
    assert_eq!(petscii::petscii(0x41), 'A');
    assert_eq!(petscii::petscii(0xc1), 'A');
    assert_eq!(petscii::petscii(0x0d), '.');
    assert_eq!(petscii::screen_code(0x00), '@');
    assert_eq!(petscii::screen_code(0x81), 'A');
}
