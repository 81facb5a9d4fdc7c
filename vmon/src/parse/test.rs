use expect_test::{expect, Expect};

use super::{Context, Parser};
use crate::addr::{MemSpace, MonAddr};
use crate::command::Command;
use crate::cond::{CondExpr, Inspect};
use crate::lex::Radix;
use crate::reg::{CpuType, RegId, RegRef};

struct TestContext {
    radix: Radix,
    cpu: CpuType,
}

impl Default for TestContext {
    fn default() -> Self {
        Self {
            radix: Radix::Hex,
            cpu: CpuType::Mos6502,
        }
    }
}

impl Context for TestContext {
    fn radix(&self) -> Radix {
        self.radix
    }
    fn default_space(&self) -> MemSpace {
        MemSpace::Computer
    }
    fn cpu(&self, _space: MemSpace) -> CpuType {
        self.cpu
    }
    fn register(&self, reg: RegRef) -> u32 {
        match reg.reg {
            RegId::A => 0x10,
            RegId::X => 0x20,
            RegId::Y => 0x30,
            RegId::Pc => 0xc000,
            _ => 0,
        }
    }
    fn label(&self, space: MemSpace, name: &str) -> Option<u32> {
        match (space, name) {
            (MemSpace::Computer, ".start") => Some(0x1000),
            (MemSpace::Disk8, ".drv") => Some(0x0500),
            _ => None,
        }
    }
    fn bank_number(&self, _space: MemSpace, name: &str) -> Option<u16> {
        match name {
            "cpu" => Some(0),
            "ram" => Some(1),
            "rom" => Some(2),
            "io" => Some(3),
            _ => None,
        }
    }
}

impl Inspect for TestContext {
    fn register(&self, reg: RegRef) -> u32 {
        Context::register(self, reg)
    }
    fn peek_bank(&self, bank: Option<u16>, _addr: MonAddr) -> u8 {
        bank.map_or(0xee, |bank| bank as u8)
    }
}

fn run(ctx: &TestContext, src: &str) -> String {
    let mut parser = Parser::new(src);
    let mut out = Vec::new();
    loop {
        match parser.command(ctx) {
            Ok(Some(Command::Assemble(addr))) => {
                out.push(format!("{:?}", Command::Assemble(addr)));
                loop {
                    match parser.instruction(ctx, addr.space) {
                        Ok(Some(instr)) => out.push(format!("{instr:?}")),
                        Ok(None) => break,
                        Err(err) => {
                            out.push(err.to_string());
                            break;
                        }
                    }
                }
                break;
            }
            Ok(Some(command)) => out.push(format!("{command:?}")),
            Ok(None) => break,
            Err(err) => {
                out.push(err.to_string());
                break;
            }
        }
    }
    out.join("\n")
}

fn check(src: &str, expect: Expect) {
    expect.assert_eq(&run(&TestContext::default(), src));
}

fn check_asm(src: &str, expect: Expect) {
    let ctx = TestContext::default();
    let mut parser = Parser::new(src);
    let out = match parser.instruction(&ctx, MemSpace::Computer) {
        Ok(Some(instr)) => format!("{:?} {}", instr.operand.mode, instr.operand.param),
        Ok(None) => "none".to_owned(),
        Err(err) => err.to_string(),
    };
    expect.assert_eq(&out);
}

fn cond(src: &str) -> CondExpr {
    match Parser::new(src).command(&TestContext::default()) {
        Ok(Some(Command::Checkpoint { cond: Some(cond), .. })) => cond,
        Ok(Some(Command::Condition { cond, .. })) => cond,
        other => panic!("no condition in {src:?}: {other:?}"),
    }
}

#[test]
fn empty() {
    check("", expect![[""]]);
    check("  ;; ", expect![[""]]);
    check("# m 1000", expect![[""]]);
}
#[test]
fn bad_command() {
    check("frob", expect![["Bad command: (at 0)"]]);
    check("x 1", expect![["Unexpected token: (at 2)"]]);
}
#[test]
fn mem_range() {
    check(
        "m 1000 2000",
        expect![["Display { format: Radix(None), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: Some(MonAddr { space: Computer, offset: 8192 }) }) }"]],
    );
    check(
        "m 10002000",
        expect![["Display { format: Radix(None), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: Some(MonAddr { space: Computer, offset: 8192 }) }) }"]],
    );
    check(
        "m h 1000",
        expect![["Display { format: Radix(Some(Hex)), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: None }) }"]],
    );
}
#[test]
fn mem_range_other_radix() {
    let ctx = TestContext {
        radix: Radix::Decimal,
        ..TestContext::default()
    };
    expect![["Address too large: (at 2)"]].assert_eq(&run(&ctx, "m 10002000"));
    expect![["Display { format: Radix(None), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 1000 }, end: None }) }"]]
        .assert_eq(&run(&ctx, "m 1000"));
}
#[test]
fn range_guess_in_session_radix() {
    let single = |radix, src| {
        let ctx = TestContext {
            radix,
            ..TestContext::default()
        };
        run(&ctx, src)
    };
    expect![["Display { format: Radix(None), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 0 }, end: None }) }"]]
        .assert_eq(&single(Radix::Decimal, "m 0000abcd"));
    expect![["Display { format: Radix(None), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 83 }, end: None }) }"]]
        .assert_eq(&single(Radix::Octal, "m 00001238"));
    expect![["Display { format: Radix(None), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 1 }, end: None }) }"]]
        .assert_eq(&single(Radix::Binary, "m 00000012"));
}
#[test]
fn range_errors() {
    check("m 2000 1000", expect![["Bad second address in range: (at 7)"]]);
    check("m 1000,", expect![["Bad second address in range: (at 7)"]]);
    check("m c:1000 8:1010", expect![["Bad second address in range: (at 9)"]]);
    check("t 1000", expect![["Bad second address in range: (at 6)"]]);
    check("m 20001000", expect![["Bad second address in range: (at 2)"]]);
    check("f 20001000 aa", expect![["Bad second address in range: (at 2)"]]);
}
#[test]
fn expressions() {
    check("p 10/0", expect![["Print(1)"]]);
    check("p (2+3)*4", expect![["Print(20)"]]);
    check("p -1", expect![["Print(-1)"]]);
    check("p (1+2", expect![["')' expected: (at 6)"]]);
}
#[test]
fn labels_in_expressions() {
    check("p .start + 1", expect![["Print(4097)"]]);
    check("p 8:.drv", expect![["Print(1280)"]]);
    check("p .nope", expect![["Found an undefined label. (at 2)"]]);
}
#[test]
fn registers() {
    check("r", expect![["ShowRegisters(Computer)"]]);
    check("r 8:", expect![["ShowRegisters(Disk8)"]]);
    check(
        "r a=1, x = $20",
        expect![["SetRegisters([(RegRef { space: Computer, reg: A }, 1), (RegRef { space: Computer, reg: X }, 32)])"]],
    );
    check("r ix=1", expect![["Invalid register. (at 2)"]]);
    check("r q=1", expect![["Wrong syntax: (at 2)"]]);
}
#[test]
fn registers_other_cpu() {
    let ctx = TestContext {
        cpu: CpuType::Z80,
        ..TestContext::default()
    };
    expect![["SetRegisters([(RegRef { space: Computer, reg: Hl }, 4660)])"]]
        .assert_eq(&run(&ctx, "r hl=$1234"));
}
#[test]
fn checkpoints() {
    check(
        "break 1000",
        expect![["Checkpoint { kind: Break, ops: MemOps { load: false, store: false, exec: true }, range: AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: None }, cond: None }"]],
    );
    check(
        "watch store c000 c0ff",
        expect![["Checkpoint { kind: Watch, ops: MemOps { load: false, store: true, exec: false }, range: AddrRange { start: MonAddr { space: Computer, offset: 49152 }, end: Some(MonAddr { space: Computer, offset: 49407 }) }, cond: None }"]],
    );
    check(
        "trace 1000",
        expect![["Checkpoint { kind: Trace, ops: MemOps { load: true, store: true, exec: false }, range: AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: None }, cond: None }"]],
    );
    check("break", expect![["ListCheckpoints"]]);
    check("break load", expect![["Expecting an address. (at 10)"]]);
    check(
        "until 1000",
        expect![["Until(AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: None })"]],
    );
}
#[test]
fn checkpoint_numbers() {
    check("del 10", expect![["Delete(Some(10))"]]);
    check("del", expect![["Delete(None)"]]);
    check("en 3", expect![["Enable(Some(3))"]]);
    check("ignore 2 5", expect![["Ignore { num: 2, count: Some(5) }"]]);
    check(
        r#"command 1 "m 0""#,
        expect![[r#"CheckpointCommand { num: 1, command: "m 0" }"#]],
    );
    check("cond x if a == 1", expect![["Checkpoint number expected: (at 5)"]]);
}
#[test]
fn conditions() {
    let ctx = TestContext::default();

    let expr = cond("break 1000 if a == $10 && @io:d020 != 0");
    assert_eq!(expr.to_string(), "A == $10 && @io:$d020 != $00");
    assert!(expr.check(&ctx));

    let expr = cond("cond 1 if (x < 5 || y >= $30)");
    assert_eq!(expr.to_string(), "(X < $05 || Y >= $30)");
    assert!(expr.check(&ctx));

    // an unknown bank reads the current one
    let expr = cond("break 1000 if @weird:0 == 1");
    assert_eq!(expr.to_string(), "@weird:$0000 == $01");
    assert!(!expr.check(&ctx));

    check(
        "break 1000 if a ==",
        expect![["Compare operation missing an operand: (at 18)"]],
    );
}
#[test]
fn label_commands() {
    check(
        r#"ll "syms.lbl""#,
        expect![[r#"LoadLabels { space: Computer, file: "syms.lbl" }"#]],
    );
    check(
        r#"ll 8 "x""#,
        expect![[r#"LoadLabels { space: Disk8, file: "x" }"#]],
    );
    check(
        r#"ll 9: "x""#,
        expect![[r#"LoadLabels { space: Disk9, file: "x" }"#]],
    );
    check(
        "al 1000 .loop",
        expect![[r#"AddLabel { addr: MonAddr { space: Computer, offset: 4096 }, name: ".loop" }"#]],
    );
    check(
        ".loop = c000",
        expect![[r#"AddLabel { addr: MonAddr { space: Computer, offset: 49152 }, name: ".loop" }"#]],
    );
    check(
        "dl .loop",
        expect![[r#"DeleteLabel { space: Computer, name: ".loop" }"#]],
    );
    check("ll", expect![["Expecting a filename: (at 2)"]]);
}
#[test]
fn several_commands() {
    check(
        "r a=1 ; m 0 ; x",
        expect![[r#"
            SetRegisters([(RegRef { space: Computer, reg: A }, 1)])
            Display { format: Radix(None), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 0 }, end: None }) }
            Exit"#]],
    );
}
#[test]
fn data_lists() {
    check(
        r#"f 1000 10ff 1,2 "ab" 1234"#,
        expect![["Fill { range: AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: Some(MonAddr { space: Computer, offset: 4351 }) }, data: [1, 2, 97, 98, 52, 18] }"]],
    );
    check(
        "h 1000 2000 a9 xx 60",
        expect![["Hunt { range: AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: Some(MonAddr { space: Computer, offset: 8192 }) }, pattern: [Some(169), None, Some(96)] }"]],
    );
    check(
        "f 1000 10ff 12345",
        expect![["Immediate argument too large: (at 12)"]],
    );
    check(
        "> c000 a9 01",
        expect![["EnterData { addr: MonAddr { space: Computer, offset: 49152 }, data: [169, 1] }"]],
    );
    check(
        "t 1000 10ff 8:0",
        expect![["Move { range: AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: Some(MonAddr { space: Computer, offset: 4351 }) }, dest: MonAddr { space: Disk8, offset: 0 } }"]],
    );
}
#[test]
fn session_commands() {
    check("bank", expect![["Bank { space: Computer, name: None }"]]);
    check("bank 0", expect![[r#"Bank { space: Computer, name: Some("0") }"#]]);
    check("bank ram0", expect![[r#"Bank { space: Computer, name: Some("ram0") }"#]]);
    check(
        "bank 8: ram",
        expect![[r#"Bank { space: Disk8, name: Some("ram") }"#]],
    );
    check("dev 8", expect![["Device(Disk8)"]]);
    check("dev c:", expect![["Device(Computer)"]]);
    check("dev", expect![["Expecting a device number. (at 3)"]]);
    check("radix d", expect![["Radix(Some(Decimal))"]]);
    check("radix q", expect![["Wrong syntax: (at 6)"]]);
    check("sfx toggle", expect![["SideFx(Some(Toggle))"]]);
    check(
        "mmsh 7 1000 2000",
        expect![["MemMapShow { mask: Some(7), range: Some(AddrRange { start: MonAddr { space: Computer, offset: 4096 }, end: Some(MonAddr { space: Computer, offset: 8192 }) }) }"]],
    );
    check("@ i0:", expect![[r#"DiskCommand("i0:")"#]]);
    check("help break", expect![[r#"Help(Some("break"))"#]]);
    check("?", expect![["Help(None)"]]);
}
#[test]
fn file_commands() {
    check(
        r#"load "prg" 8 c000"#,
        expect![[r#"Load { file: "prg", device: 8, addr: Some(MonAddr { space: Computer, offset: 49152 }), raw: false }"#]],
    );
    check(
        r#"save "prg" 8 c000 c0ff"#,
        expect![[r#"Save { file: "prg", device: 8, range: AddrRange { start: MonAddr { space: Computer, offset: 49152 }, end: Some(MonAddr { space: Computer, offset: 49407 }) }, raw: false }"#]],
    );
    check(r#"save "prg" 8"#, expect![["Expecting an address. (at 12)"]]);
}
#[test]
fn assemble_line() {
    check(
        "a c000 lda #$01 : sta $d020",
        expect![[r#"
            Assemble(MonAddr { space: Computer, offset: 49152 })
            AsmInstr { mnemonic: "lda", operand: AsmOperand { mode: Immediate, submode: 0, param: 1 } }
            AsmInstr { mnemonic: "sta", operand: AsmOperand { mode: Absolute, submode: 0, param: 53280 } }"#]],
    );
}
#[test]
fn asm_modes() {
    check_asm("rts", expect![["Implied 0"]]);
    check_asm("asl a", expect![["Accumulator 0"]]);
    check_asm("lda #$1234", expect![["Immediate16 4660"]]);
    check_asm("lda #$12345", expect![["Immediate argument too large: (at 5)"]]);
    check_asm("lda $10,x", expect![["ZeroPageX 16"]]);
    check_asm("lda $1234,y", expect![["AbsoluteY 4660"]]);
    check_asm("lda ($20),y", expect![["IndirectY 32"]]);
    check_asm("lda ($20,x)", expect![["IndirectX 32"]]);
    check_asm("jmp ($1234)", expect![["AbsIndirect 4660"]]);
    check_asm("lda ($20", expect![["')' expected: (at 8)"]]);
    check_asm("lda <$10", expect![["Direct 16"]]);
    check_asm("", expect![["none"]]);
}
#[test]
fn asm_indexed() {
    let ctx = TestContext::default();
    let submode = |src: &str| match Parser::new(src).instruction(&ctx, MemSpace::Computer) {
        Ok(Some(instr)) => (instr.operand.mode, instr.operand.submode, instr.operand.param),
        other => panic!("{other:?}"),
    };
    use crate::asm::AddrMode::Indexed;
    assert_eq!(submode("lda ,x+"), (Indexed, 0x80, 0));
    assert_eq!(submode("lda ,x++"), (Indexed, 0x81, 0));
    assert_eq!(submode("lda ,--y"), (Indexed, 0xa3, 0));
    assert_eq!(submode("ldb $200,u"), (Indexed, 0xc9, 0x200));
    assert_eq!(submode("lda [,x]"), (Indexed, 0x94, 0));
    assert_eq!(submode("lda [$1234]"), (Indexed, 0x9f, 0x1234));
    assert_eq!(submode("lda b,x"), (Indexed, 0x85, 0));
}
