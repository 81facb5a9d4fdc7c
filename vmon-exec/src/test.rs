use std::fs;
use std::path::PathBuf;

use expect_test::{expect, Expect};
use vmon::addr::{MemSpace, MonAddr};
use vmon::command::MemOps;
use vmon::reg::{RegId, RegRef};

use crate::sim::d64::D64;
use crate::sim::SimMachine;
use crate::{Flow, Machine, Mode, Monitor, MonitorConfig, Resume};

fn c(offset: u32) -> MonAddr {
    MonAddr::new(MemSpace::Computer, offset)
}

fn monitor() -> Monitor<SimMachine> {
    Monitor::new(SimMachine::default(), MonitorConfig::default())
}

/// A fresh directory under the system temp dir, unique per test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("vmon-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(mon: &mut Monitor<SimMachine>, lines: &[&str]) -> String {
    for line in lines {
        mon.line(line);
    }
    mon.take_output()
}

fn check(lines: &[&str], expect: Expect) {
    let mut mon = monitor();
    expect.assert_eq(&run(&mut mon, lines));
}

#[test]
fn labels() {
    check(
        &[
            "al 1000 .loop",
            "p .loop",
            "al 2000 .loop",
            "shl",
            "dl .loop",
            "dl .loop",
            "p .loop",
        ],
        expect![[r#"
            $1000
            Changed `.loop' from $1000 to $2000.
            C:$2000 .loop
            Label `.loop' not found.
            ERROR -- Found an undefined label.
              p .loop
                ^
        "#]],
    );
}
#[test]
fn registers() {
    check(
        &["r a=12, x=34", "r"],
        expect![[r#"
              PC   A  X  Y  SP NV-BDIZC
            .;0000 12 34 00 ff 00100000
        "#]],
    );
}
#[test]
fn z80_register_pairs() {
    check(
        &["cpu z80", "r af=1234, h=56", "r"],
        expect![[r#"
              PC   SP   AF   BC   DE   HL   IX   IY   A  B  C  D  E  H  L  IXH IXL IYH IYL I  R
            .;0000 00ff 1234 0000 0000 5600 0000 0000 12 00 00 00 00 56 00 00  00  00  00  00 00
        "#]],
    );
}
#[test]
fn bad_register_changes_nothing() {
    let mut mon = monitor();
    let out = run(&mut mon, &["r a=5", "r a=6, ix=1"]);
    expect![[r#"
        ERROR -- Invalid register.
          r a=6, ix=1
                 ^
    "#]]
    .assert_eq(&out);
    assert_eq!(mon.machine.register(RegRef::new(MemSpace::Computer, RegId::A)), 5);
}
#[test]
fn memory() {
    check(
        &["f 1000 100f 41", "m 1000 100f"],
        expect![[r#"
            >C:1000  41 41 41 41  41 41 41 41  41 41 41 41  41 41 41 41   AAAAAAAAAAAAAAAA
        "#]],
    );
    check(
        &["> 1000 a9 01 60", "t 1000 1002 2000", "c 1000 1002 2000", "> 2001 02", "c 1000 1002 2000"],
        expect![[r#"
            C:1001 C:2001: 01 02
        "#]],
    );
    check(
        &["> 1000 a9 01 a9 02", "h 1000 1010 a9 xx"],
        expect![[r#"
            C:1000
            C:1002
        "#]],
    );
}
#[test]
fn memory_continues() {
    let rows = |out: &str| {
        out.lines()
            .map(|line| line[..7].to_owned())
            .collect::<Vec<_>>()
            .join(" ")
    };
    let mut mon = monitor();
    let out = run(&mut mon, &["m 1000 1000"]);
    expect![[">C:1000"]].assert_eq(&rows(&out));
    let out = run(&mut mon, &["m"]);
    expect![[">C:1001 >C:1011 >C:1021 >C:1031 >C:1041 >C:1051 >C:1061 >C:1071"]]
        .assert_eq(&rows(&out));
    let out = run(&mut mon, &["m"]);
    expect![[">C:1081 >C:1091 >C:10a1 >C:10b1 >C:10c1 >C:10d1 >C:10e1 >C:10f1"]]
        .assert_eq(&rows(&out));
}
#[test]
fn print_and_radix() {
    check(
        &["p 10", "radix d", "p 10", "~ 10", "radix"],
        expect![[r#"
            $10
            Current radix is Decimal
            10
            $a
            10
            &12
            %1010
            Current radix is Decimal
        "#]],
    );
}
#[test]
fn banks() {
    let mut mon = monitor();
    mon.machine.load_rom(0xa000, &[0x11]);
    let out = run(&mut mon, &["> a000 22", "bank"]);
    expect![[r#"
        Current bank: default
        Available banks: default cpu ram rom io
    "#]]
    .assert_eq(&out);

    assert_eq!(mon.machine.peek_bank(None, c(0xa000)), 0x11);
    run(&mut mon, &["bank ram"]);
    assert_eq!(mon.machine.peek_bank(None, c(0xa000)), 0x22);
    run(&mut mon, &["bank rom"]);
    assert_eq!(mon.machine.peek_bank(None, c(0xa000)), 0x11);

    // a number selects by position, so bank 0 is the default bank
    run(&mut mon, &["bank ram", "bank 0"]);
    assert_eq!(mon.machine.peek_bank(None, c(0xa000)), 0x11);
    let out = run(&mut mon, &["bank", "bank ram0"]);
    expect![[r#"
        Current bank: default
        Available banks: default cpu ram rom io
        Unknown bank name `ram0'.
    "#]]
    .assert_eq(&out);

    let out = run(&mut mon, &["bank nope"]);
    expect![[r#"
        Unknown bank name `nope'.
    "#]]
    .assert_eq(&out);
}
#[test]
fn assemble_mode() {
    let mut mon = monitor();
    assert_eq!(mon.prompt(), "(C:$0000) ");

    let out = run(&mut mon, &["a c000 lda #$01"]);
    assert_eq!(out, "");
    assert_eq!(mon.mode(), Mode::Assemble(c(0xc002)));
    assert_eq!(mon.prompt(), ".C:c002  ");

    run(&mut mon, &["sta $d020", ""]);
    assert_eq!(mon.mode(), Mode::Command);

    let out = run(&mut mon, &["d c000 c004"]);
    expect![[r#"
        .C:c000  a9 01     LDA #$01
        .C:c002  8d 20 d0  STA $d020
    "#]]
    .assert_eq(&out);
}
#[test]
fn assemble_error_leaves_mode() {
    let mut mon = monitor();
    let out = run(&mut mon, &["a c000 nop : frob"]);
    expect![[r#"
        Assembly failed: unknown mnemonic `frob'
    "#]]
    .assert_eq(&out);
    assert_eq!(mon.mode(), Mode::Command);
    assert_eq!(mon.machine.peek_bank(None, c(0xc000)), 0xea);
}
#[test]
fn disassembly_shows_labels() {
    check(
        &["> 1000 20 00 20 60", "al 1003 .done", "d 1000 1003"],
        expect![[r#"
            .C:1000  20 00 20  JSR $2000
            .done:
            .C:1003  60        RTS
        "#]],
    );
}
#[test]
fn checkpoints() {
    let mut mon = monitor();
    let out = run(&mut mon, &["break 1000", "watch store c000 c0ff", "ignore 2 1"]);
    expect![[r#"
        BREAK: 1  C:$1000  (Stop on exec)
        WATCH: 2  C:$c000-$c0ff  (Stop on store)
        Will ignore the next 1 crossings of checkpoint #2
    "#]]
    .assert_eq(&out);

    assert_eq!(mon.check(c(0xc010), MemOps::STORE), Flow::Resume(Resume::Continue));
    assert_eq!(mon.check(c(0xc010), MemOps::LOAD), Flow::Resume(Resume::Continue));
    assert_eq!(mon.check(c(0xc010), MemOps::STORE), Flow::Stay);
    let out = run(&mut mon, &["break"]);
    expect![[r#"
        #2 (Stop on store C:c010)
        BREAK: 1  C:$1000  (Stop on exec)
        WATCH: 2  C:$c000-$c0ff  (Stop on store)
        	Hit count: 1
    "#]]
    .assert_eq(&out);

    let out = run(&mut mon, &["dis 2", "del 1", "del 5"]);
    expect![[r#"
        Checkpoint #5 not found.
    "#]]
    .assert_eq(&out);
    assert_eq!(mon.check(c(0xc010), MemOps::STORE), Flow::Resume(Resume::Continue));
    assert_eq!(mon.check(c(0x1000), MemOps::EXEC), Flow::Resume(Resume::Continue));

    let out = run(&mut mon, &["del", "break"]);
    expect![[r#"
        No breakpoints are set
    "#]]
    .assert_eq(&out);
}
#[test]
fn conditions_and_commands() {
    let mut mon = monitor();
    let out = run(
        &mut mon,
        &["break 1000 if a == 5", r#"command 1 "r x=7""#, "cond 1 if a == 6"],
    );
    expect![[r#"
        BREAK: 1  C:$1000  (Stop on exec)
        	Condition: A == $05
        Setting checkpoint 1 command to: r x=7
        Setting checkpoint 1 condition to: A == $06
    "#]]
    .assert_eq(&out);

    run(&mut mon, &["r a=5"]);
    assert_eq!(mon.check(c(0x1000), MemOps::EXEC), Flow::Resume(Resume::Continue));
    run(&mut mon, &["r a=6"]);
    assert_eq!(mon.check(c(0x1000), MemOps::EXEC), Flow::Stay);
    assert_eq!(mon.machine.register(RegRef::new(MemSpace::Computer, RegId::X)), 7);
}
#[test]
fn hit_commands_can_resume() {
    let mut mon = monitor();
    run(
        &mut mon,
        &["break 1000", r#"command 1 "g 2000""#, "break 3000", r#"command 2 "quit""#],
    );
    assert_eq!(mon.check(c(0x1000), MemOps::EXEC), Flow::Resume(Resume::Continue));
    assert_eq!(mon.machine.register(RegRef::new(MemSpace::Computer, RegId::Pc)), 0x2000);
    assert_eq!(mon.check(c(0x3000), MemOps::EXEC), Flow::Quit);
}
#[test]
fn trace_does_not_stop() {
    let mut mon = monitor();
    run(&mut mon, &["trace exec 1000"]);
    assert_eq!(mon.check(c(0x1000), MemOps::EXEC), Flow::Resume(Resume::Continue));
    expect![[r#"
        #1 (Trace exec C:1000)
    "#]]
    .assert_eq(&mon.take_output());
}
#[test]
fn until_is_temporary() {
    let mut mon = monitor();
    assert_eq!(mon.line("until 2000"), Flow::Resume(Resume::Continue));
    assert_eq!(mon.check(c(0x2000), MemOps::EXEC), Flow::Stay);
    assert!(mon.checkpoints().is_empty());
}
#[test]
fn flow() {
    let mut mon = monitor();
    assert_eq!(mon.line("z 3"), Flow::Resume(Resume::Step { count: 3, over: false }));
    assert_eq!(mon.line("n"), Flow::Resume(Resume::Step { count: 1, over: true }));
    assert_eq!(mon.line("ret"), Flow::Resume(Resume::Return));
    assert_eq!(mon.line("x"), Flow::Resume(Resume::Continue));
    assert_eq!(mon.line("quit"), Flow::Quit);
    assert_eq!(mon.line("g c000"), Flow::Resume(Resume::Continue));
    assert_eq!(mon.machine.register(RegRef::new(MemSpace::Computer, RegId::Pc)), 0xc000);
    // nothing after a resuming command runs
    assert_eq!(mon.line("x ; p 1"), Flow::Resume(Resume::Continue));
    assert_eq!(mon.take_output(), "");
}
#[test]
fn side_effects() {
    let mut mon = monitor();
    mon.machine.write(c(0xdc0d), 0x81);
    run(&mut mon, &["m $dc0d $dc0d"]);
    assert_eq!(mon.machine.peek_bank(None, c(0xdc0d)), 0x81);

    let out = run(&mut mon, &["sfx on"]);
    assert_eq!(out, "I/O side effects are enabled.\n");
    run(&mut mon, &["m $dc0d $dc0d"]);
    assert_eq!(mon.machine.peek_bank(None, c(0xdc0d)), 0);
}
#[test]
fn memory_map() {
    let mut mon = monitor();
    mon.machine.record_access(c(0x0801), MemOps::LOAD);
    mon.machine.record_access(c(0x0801), MemOps::EXEC);
    mon.machine.record_access(c(0x0803), MemOps::STORE);
    check_output(
        &mut mon,
        &["mmsh 7 0800 0803", "mmsh 4 0800 0803", "mmzap", "mmsh 7 0800 0803"],
        expect![[r#"
            C:0801  r-x
            C:0803  -w-
            C:0801  r-x
        "#]],
    );
}

fn check_output(mon: &mut Monitor<SimMachine>, lines: &[&str], expect: Expect) {
    expect.assert_eq(&run(mon, lines));
}

#[test]
fn record_and_playback() {
    let dir = scratch("record");
    let mut mon = monitor().with_cwd(dir.clone());
    let out = run(&mut mon, &[r#"record "cmds""#, "al 1000 .a", "p 1", "stop"]);
    assert_eq!(out, "$1\n");
    assert_eq!(fs::read_to_string(dir.join("cmds")).unwrap(), "al 1000 .a\np 1\n");

    let mut mon = monitor().with_cwd(dir.clone());
    let out = run(&mut mon, &[r#"pb "cmds""#, "p .a"]);
    assert_eq!(out, "$1\n$1000\n");

    let out = run(&mut mon, &["stop"]);
    assert_eq!(out, "Not recording.\n");
}
#[test]
fn playback_stops_on_resume() {
    let dir = scratch("resume");
    fs::write(dir.join("go"), "p 1\nx\np 2\n").unwrap();
    let mut mon = monitor().with_cwd(dir);
    assert_eq!(mon.line(r#"pb "go""#), Flow::Resume(Resume::Continue));
    assert_eq!(mon.take_output(), "$1\n");
}
#[test]
fn playback_depth() {
    let dir = scratch("depth");
    fs::write(dir.join("loop"), "pb \"loop\"\n").unwrap();
    let mut mon = monitor().with_cwd(dir);
    let out = run(&mut mon, &[r#"pb "loop""#]);
    assert_eq!(out, "Playback files nested too deeply.\n");
}
#[test]
fn label_files() {
    let dir = scratch("labels");
    let mut mon = monitor().with_cwd(dir.clone());
    run(&mut mon, &["al 1000 .a", "al 0801 .b", r#"sl "syms""#]);
    assert_eq!(
        fs::read_to_string(dir.join("syms")).unwrap(),
        "al $0801 .b\nal $1000 .a\n"
    );

    let mut mon = monitor().with_cwd(dir);
    run(&mut mon, &[r#"ll 8 "syms""#]);
    assert_eq!(mon.symbols().lookup(MemSpace::Disk8, ".a"), Some(0x1000));
    assert_eq!(mon.symbols().lookup(MemSpace::Computer, ".a"), None);
    run(&mut mon, &[r#"ll "syms""#]);
    assert_eq!(mon.symbols().lookup(MemSpace::Computer, ".b"), Some(0x0801));
}
#[test]
fn host_files() {
    let dir = scratch("files");
    let mut mon = monitor().with_cwd(dir.clone());
    let out = run(
        &mut mon,
        &[
            "> 1000 01 02 03",
            r#"save "p.prg" 0 1000 1002"#,
            "f 1000 1002 00",
            r#"load "p.prg" 0"#,
            r#"verify "p.prg" 0 1000"#,
            "> 1001 ff",
            r#"verify "p.prg" 0 1000"#,
        ],
    );
    expect![[r#"
        Saving file `p.prg' from C:1000 to C:1002
        Loading p.prg from C:1000 to C:1002 ($3 bytes)
        Verifying file `p.prg' at C:1000
        0 differences
        Verifying file `p.prg' at C:1000
          C:1001: memory $ff, file $02
        1 differences
    "#]]
    .assert_eq(&out);
    assert_eq!(fs::read(dir.join("p.prg")).unwrap(), [0x00, 0x10, 1, 2, 3]);

    let out = run(&mut mon, &[r#"load "p.prg" 0 2000"#]);
    assert_eq!(out, "Loading p.prg from C:2000 to C:2002 ($3 bytes)\n");
    assert_eq!(mon.machine.peek_bank(None, c(0x2001)), 2);
}
#[test]
fn disk_files() {
    let mut mon = monitor();
    mon.machine.attach_image(8, D64::blank("TEST DISK", "01"));
    let out = run(
        &mut mon,
        &[
            "> 1000 01 02 03",
            r#"save "prog" 8 1000 1002"#,
            "list",
            "f 1000 1002 00",
            r#"load "prog" 8"#,
            "@ i",
        ],
    );
    expect![[r#"
        Saving file `prog' from C:1000 to C:1002
        0 "TEST DISK       " 01 2A
        1    "PROG"             PRG
        663 BLOCKS FREE.
        Loading prog from C:1000 to C:1002 ($3 bytes)
        00, OK,00,00
    "#]]
    .assert_eq(&out);
    assert_eq!(mon.machine.peek_bank(None, c(0x1002)), 3);

    let out = run(&mut mon, &["detach 8", "list"]);
    assert_eq!(out, "No disk image attached to unit #8.\n");
}
#[test]
fn snapshots() {
    let dir = scratch("snap");
    let mut mon = monitor().with_cwd(dir);
    run(&mut mon, &["> 1000 42", "r a=9", r#"dump "s""#, "> 1000 00", "r a=0", r#"undump "s""#]);
    assert_eq!(mon.machine.peek_bank(None, c(0x1000)), 0x42);
    assert_eq!(mon.machine.register(RegRef::new(MemSpace::Computer, RegId::A)), 9);
}
#[test]
fn resources() {
    check(
        &[
            r#"resget "SidModel""#,
            r#"resset "SidModel" "1""#,
            r#"resget "SidModel""#,
            r#"resget "Nope""#,
        ],
        expect![[r#"
            SidModel: 0
            SidModel: 1
            Unknown resource `Nope'.
        "#]],
    );
}
#[test]
fn session_toggles() {
    check(
        &["maincpu_trace on", "maincpu_trace", "yydebug", "yydebug", "sw", "sw reset", "dev 8"],
        expect![[r#"
            Main CPU trace is now on.
            Main CPU trace is now off.
            Parser debugging is now on.
            Parser debugging is now off.
            Stopwatch: 0 cycles
            Stopwatch reset to 0.
            Setting default device to `8'
        "#]],
    );
    let mut mon = monitor();
    run(&mut mon, &["maincpu_trace on"]);
    assert!(mon.machine.cpu_trace());
    run(&mut mon, &["maincpu_trace off", "dev 8"]);
    assert!(!mon.machine.cpu_trace());
    assert_eq!(mon.prompt(), "(8:$0000) ");
}
#[test]
fn cpu_type() {
    let mut mon = monitor();
    let out = run(&mut mon, &["cpu", "cpu z80", "cpu", "cpu 8080"]);
    expect![[r#"
        Current CPU type: 6502
        Current CPU type: z80
        Unknown CPU type `8080'.
    "#]]
    .assert_eq(&out);
}
#[test]
fn keybuf_and_screen() {
    let mut mon = monitor();
    run(&mut mon, &[r#"keybuf load\n"#]);
    assert_eq!(mon.machine.pending_keys(), "load\r");

    // screen codes 8, 9 are `HI`
    run(&mut mon, &["f 0400 07e7 20", "> 0400 08 09"]);
    assert_eq!(mon.take_output(), "");
    run(&mut mon, &["sc"]);
    assert!(mon.take_output().starts_with("HI\n"));
}
#[test]
fn backtrace_frames() {
    let mut mon = monitor();
    // JSR at $1000 and $2000, their return addresses on the stack
    run(&mut mon, &["> 1000 20 00 20", "> 2000 20 00 30", "> 01fc 02 20 02 10", "r sp=fb"]);
    let out = run(&mut mon, &["bt", "up", "up", "up", "down"]);
    expect![[r#"
        (#0) C:2000
        (#1) C:1000
        #1 C:1000
        #1 C:1000
        #1 C:1000
        #0 C:2000
    "#]]
    .assert_eq(&out);
}
