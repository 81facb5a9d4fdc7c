#[cfg(test)]
mod test;

mod asm;
mod expr;

use crate::addr::MemSpace;
use crate::command::{CheckpointKind, Command, DisplayFormat, MemOps, Toggle};
use crate::error::{ErrorKind, ParseError};
use crate::lex::{unquote, Lexer, Radix, Span, Token};
use crate::reg::{CpuType, RegId, RegRef};
use crate::table::{self, Keyword};

/// Session and machine state the grammar reads while resolving arguments.
pub trait Context {
    fn radix(&self) -> Radix;
    fn default_space(&self) -> MemSpace;
    fn cpu(&self, space: MemSpace) -> CpuType;
    fn register(&self, reg: RegRef) -> u32;
    fn label(&self, space: MemSpace, name: &str) -> Option<u32>;
    fn bank_number(&self, space: MemSpace, name: &str) -> Option<u16>;
}

/// Parses one input line, one command at a time.
///
/// The caller executes each command before asking for the next, so a later
/// command on the same line sees the effects of the earlier ones.
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pos: u32,
    stop: u32,
    trace: bool,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer::new(src),
            pos: 0,
            stop: 0,
            trace: false,
        }
    }
    /// Emits a `trace!` event for every token looked at.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
    pub fn src(&self) -> &'a str {
        self.lexer.src()
    }
    pub fn is_at_end(&mut self) -> bool {
        self.peek().1 == Token::Eol
    }

    fn peek(&mut self) -> (Span, Token) {
        self.peek_as(false)
    }
    fn peek_operand(&mut self) -> (Span, Token) {
        self.peek_as(true)
    }
    fn peek_as(&mut self, operand: bool) -> (Span, Token) {
        let (span, token) = self.lexer.token(self.pos, operand);
        self.stop = span.from;
        if self.trace {
            tracing::trace!(?span, ?token, text = self.lexer.slice(span), "token");
        }
        (span, token)
    }
    fn bump(&mut self, span: Span) {
        self.pos = span.to;
    }
    fn text(&self, span: Span) -> &'a str {
        self.lexer.slice(span)
    }
    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError::new(kind, self.stop)
    }
    fn expect(&mut self, want: Token, kind: ErrorKind) -> Result<(), ParseError> {
        let (span, token) = self.peek();
        if token != want {
            return Err(self.error(kind));
        }
        self.bump(span);
        Ok(())
    }
    /// The text of the next token if it is a bare word or number.
    fn peek_word(&mut self) -> Option<(Span, &'a str)> {
        match self.peek() {
            (span, Token::Word | Token::Number(_)) => Some((span, self.text(span))),
            _ => None,
        }
    }
    fn eat_word(&mut self, word: &str) -> bool {
        match self.peek_word() {
            Some((span, text)) if text.eq_ignore_ascii_case(word) => {
                self.bump(span);
                true
            }
            _ => false,
        }
    }
    fn at_end_command(&mut self) -> bool {
        matches!(self.peek().1, Token::Eol | Token::Semi)
    }
    fn end_command(&mut self) -> Result<(), ParseError> {
        match self.peek() {
            (_, Token::Eol) => Ok(()),
            (span, Token::Semi) => {
                self.bump(span);
                Ok(())
            }
            _ => Err(self.error(ErrorKind::ExpectEndCmd)),
        }
    }

    /// Parses the next command on the line, or `None` once the line is done.
    pub fn command(
        &mut self,
        ctx: &(impl Context + ?Sized),
    ) -> Result<Option<Command>, ParseError> {
        loop {
            match self.peek() {
                (_, Token::Eol) => return Ok(None),
                (span, Token::Semi) => self.bump(span),
                (_, Token::Hash) => {
                    self.pos = self.lexer.len();
                    return Ok(None);
                }
                _ => break,
            }
        }
        let command = self.command_body(ctx)?;
        // instructions may follow on the same line
        if !matches!(command, Command::Assemble(_)) {
            self.end_command()?;
        }
        Ok(Some(command))
    }

    fn keyword(&mut self) -> Result<Keyword, ParseError> {
        let (span, token) = self.peek();
        let keyword = match token {
            Token::Greater => Keyword::EnterData,
            Token::At => Keyword::Disk,
            Token::Tilde => Keyword::Convert,
            Token::Question => Keyword::Help,
            Token::Word | Token::Number(_) => match table::lookup(self.text(span)) {
                Some(info) => info.keyword,
                None => return Err(self.error(ErrorKind::BadCmd)),
            },
            _ => return Err(self.error(ErrorKind::BadCmd)),
        };
        self.bump(span);
        Ok(keyword)
    }

    fn command_body(&mut self, ctx: &(impl Context + ?Sized)) -> Result<Command, ParseError> {
        if let (span, Token::Label) = self.peek() {
            return self.label_assign(ctx, span);
        }
        let keyword = self.keyword()?;
        let default = ctx.default_space();
        use Keyword as K;
        Ok(match keyword {
            K::Bank => {
                let space = self.opt_memspace().unwrap_or(default);
                let name = self.opt_name();
                Command::Bank { space, name }
            }
            K::Goto => Command::Goto(self.opt_address(ctx, default)?),
            K::Io => Command::Io(self.opt_address(ctx, default)?),
            K::Cpu => Command::Cpu(self.opt_name()),
            K::CpuHistory => Command::CpuHistory(self.opt_expression(ctx)?),
            K::Return => Command::Return,
            K::Dump => Command::Dump(self.filename()?),
            K::Undump => Command::Undump(self.filename()?),
            K::Step => Command::Step(self.opt_expression(ctx)?),
            K::Next => Command::Next(self.opt_expression(ctx)?),
            K::Up => Command::Up(self.opt_expression(ctx)?),
            K::Down => Command::Down(self.opt_expression(ctx)?),
            K::Screen => Command::Screen,
            K::Registers => self.registers(ctx)?,

            K::LoadLabels => {
                let space = self.opt_space_arg().unwrap_or(default);
                let file = self.filename()?;
                Command::LoadLabels { space, file }
            }
            K::SaveLabels => {
                let space = self.opt_space_arg().unwrap_or(default);
                let file = self.filename()?;
                Command::SaveLabels { space, file }
            }
            K::AddLabel => {
                let addr = self.address(ctx, default)?;
                let name = self.label_name()?;
                Command::AddLabel { addr, name }
            }
            K::DeleteLabel => {
                let space = self.opt_space_arg().unwrap_or(default);
                let name = self.label_name()?;
                Command::DeleteLabel { space, name }
            }
            K::ShowLabels => Command::ShowLabels(self.opt_space_arg().unwrap_or(default)),
            K::ClearLabels => Command::ClearLabels(self.opt_space_arg().unwrap_or(default)),

            K::Assemble => Command::Assemble(self.address(ctx, default)?),
            K::Disassemble => Command::Disassemble(self.opt_range(ctx)?),

            K::Move => {
                let range = self.range(ctx)?;
                let dest = self.address(ctx, range.start.space)?;
                Command::Move { range, dest }
            }
            K::Compare => {
                let range = self.range(ctx)?;
                let dest = self.address(ctx, range.start.space)?;
                Command::Compare { range, dest }
            }
            K::Fill => {
                let range = self.range(ctx)?;
                let data = self.data_list(ctx, false)?.into_iter().flatten().collect();
                Command::Fill { range, data }
            }
            K::Hunt => {
                let range = self.range(ctx)?;
                let pattern = self.data_list(ctx, true)?;
                Command::Hunt { range, pattern }
            }
            K::Mem => {
                let radix = match self.peek_word() {
                    Some((span, text)) if text.len() == 1 => {
                        let radix = Radix::from_word(text);
                        if radix.is_some() {
                            self.bump(span);
                        }
                        radix
                    }
                    _ => None,
                };
                let range = self.opt_range(ctx)?;
                Command::Display {
                    format: DisplayFormat::Radix(radix),
                    range,
                }
            }
            K::MemChar => self.display(ctx, DisplayFormat::Char)?,
            K::MemSprite => self.display(ctx, DisplayFormat::Sprite)?,
            K::MemText => self.display(ctx, DisplayFormat::Petscii)?,
            K::MemScreen => self.display(ctx, DisplayFormat::ScreenCode)?,
            K::MemMapZap => Command::MemMapZap,
            K::MemMapShow => {
                let mask = self.opt_expression(ctx)?;
                let range = match mask {
                    Some(_) => self.opt_range(ctx)?,
                    None => None,
                };
                Command::MemMapShow { mask, range }
            }
            K::MemMapSave => {
                let file = self.filename()?;
                let format = self.expression(ctx, default)?;
                Command::MemMapSave { file, format }
            }
            K::EnterData => {
                let addr = self.address(ctx, default)?;
                let data: Vec<u8> = self.data_list(ctx, false)?.into_iter().flatten().collect();
                Command::EnterData { addr, data }
            }

            K::Break => self.checkpoint(ctx, CheckpointKind::Break)?,
            K::Watch => self.checkpoint(ctx, CheckpointKind::Watch)?,
            K::Trace => self.checkpoint(ctx, CheckpointKind::Trace)?,
            K::Until => match self.opt_range(ctx)? {
                Some(range) => Command::Until(range),
                None => return Err(self.error(ErrorKind::ExpectAddress)),
            },
            K::Enable => Command::Enable(self.opt_checknum()?),
            K::Disable => Command::Disable(self.opt_checknum()?),
            K::Delete => Command::Delete(self.opt_checknum()?),
            K::Ignore => {
                let num = self.checknum()?;
                let count = self.opt_expression(ctx)?;
                Command::Ignore { num, count }
            }
            K::Condition => {
                let num = self.checknum()?;
                if !self.eat_word("if") {
                    return Err(self.error(ErrorKind::IllegalInput));
                }
                let cond = self.cond_expr(ctx)?;
                Command::Condition { num, cond }
            }
            K::Command => {
                let num = self.checknum()?;
                let command = self.string()?;
                Command::CheckpointCommand { num, command }
            }

            K::SideFx => Command::SideFx(self.opt_toggle()?),
            K::Radix => match self.peek_word() {
                Some((span, text)) => match Radix::from_word(text) {
                    Some(radix) => {
                        self.bump(span);
                        Command::Radix(Some(radix))
                    }
                    None => return Err(self.error(ErrorKind::IllegalInput)),
                },
                None => Command::Radix(None),
            },
            K::Device => match self.opt_space_arg() {
                Some(space) => Command::Device(space),
                None => return Err(self.error(ErrorKind::ExpectDeviceNum)),
            },
            K::Export => Command::Export,
            K::Quit => Command::Quit,
            K::Exit => Command::Exit,
            K::MainCpuTrace => Command::MainCpuTrace(self.opt_toggle()?),
            K::YyDebug => Command::YyDebug,
            K::Stopwatch => Command::Stopwatch {
                reset: self.eat_word("reset"),
            },

            K::Disk => Command::DiskCommand(self.rest_of_line()),
            K::Print => Command::Print(self.expression(ctx, default)?),
            K::Help => {
                let topic = self.rest_of_line();
                Command::Help((!topic.is_empty()).then_some(topic))
            }
            K::Convert => Command::Convert(self.expression(ctx, default)?),
            K::ChDir => Command::ChDir(self.string_or_rest()),
            K::KeyBuf => Command::KeyBuf(self.string_or_rest()),
            K::Backtrace => Command::Backtrace,
            K::Dir => {
                let dir = self.string_or_rest();
                Command::Dir((!dir.is_empty()).then_some(dir))
            }
            K::Pwd => Command::Pwd,
            K::Screenshot => {
                let file = self.filename()?;
                let format = self.opt_expression(ctx)?;
                Command::Screenshot { file, format }
            }
            K::ResourceGet => Command::ResourceGet(self.string()?),
            K::ResourceSet => {
                let name = self.string()?;
                let value = self.string()?;
                Command::ResourceSet { name, value }
            }
            K::LoadResources => Command::LoadResources(self.filename()?),
            K::SaveResources => Command::SaveResources(self.filename()?),
            K::Reset => Command::Reset(self.opt_expression(ctx)?),
            K::TapeCtrl => Command::TapeCtrl(self.expression(ctx, default)?),
            K::CartFreeze => Command::CartFreeze,

            K::Load | K::BLoad => {
                let raw = keyword == K::BLoad;
                let file = self.filename()?;
                let device = self.device_num(ctx)?;
                let addr = match raw {
                    true => Some(self.address(ctx, default)?),
                    false => self.opt_address(ctx, default)?,
                };
                Command::Load {
                    file,
                    device,
                    addr,
                    raw,
                }
            }
            K::Save | K::BSave => {
                let file = self.filename()?;
                let device = self.device_num(ctx)?;
                if !self.starts_operand() {
                    return Err(self.error(ErrorKind::ExpectAddress));
                }
                let range = self.range(ctx)?;
                Command::Save {
                    file,
                    device,
                    range,
                    raw: keyword == K::BSave,
                }
            }
            K::Verify => {
                let file = self.filename()?;
                let device = self.device_num(ctx)?;
                let addr = self.address(ctx, default)?;
                Command::Verify { file, device, addr }
            }
            K::BlockRead => {
                let track = self.expression(ctx, default)?;
                let sector = self.expression(ctx, default)?;
                let addr = self.opt_address(ctx, default)?;
                Command::BlockRead {
                    track,
                    sector,
                    addr,
                }
            }
            K::BlockWrite => {
                let track = self.expression(ctx, default)?;
                let sector = self.expression(ctx, default)?;
                let addr = self.address(ctx, default)?;
                Command::BlockWrite {
                    track,
                    sector,
                    addr,
                }
            }
            K::List => Command::List(self.opt_expression(ctx)?),
            K::Attach => {
                let file = self.filename()?;
                let device = self.device_num(ctx)?;
                Command::Attach { file, device }
            }
            K::Detach => Command::Detach(self.device_num(ctx)?),
            K::Autostart | K::Autoload => {
                let file = self.filename()?;
                let index = self.opt_expression(ctx)?;
                Command::Autostart {
                    file,
                    index,
                    run: keyword == K::Autostart,
                }
            }
            K::Record => Command::Record(self.filename()?),
            K::Stop => Command::Stop,
            K::Playback => Command::Playback(self.filename()?),
        })
    }

    fn label_assign(
        &mut self,
        ctx: &(impl Context + ?Sized),
        span: Span,
    ) -> Result<Command, ParseError> {
        self.bump(span);
        let name = self.text(span).to_owned();
        self.expect(Token::Equals, ErrorKind::IllegalInput)?;
        let addr = self.address(ctx, ctx.default_space())?;
        Ok(Command::AddLabel { addr, name })
    }

    fn registers(&mut self, ctx: &(impl Context + ?Sized)) -> Result<Command, ParseError> {
        let space = self.opt_memspace().unwrap_or(ctx.default_space());
        if self.at_end_command() {
            return Ok(Command::ShowRegisters(space));
        }
        let cpu = ctx.cpu(space);
        let mut assignments = Vec::new();
        loop {
            let Some((span, text)) = self.peek_word() else {
                return Err(self.error(ErrorKind::IllegalInput));
            };
            let reg: RegId = text
                .parse()
                .map_err(|()| self.error(ErrorKind::IllegalInput))?;
            if !cpu.has_register(reg) {
                return Err(self.error(ErrorKind::InvalidRegister));
            }
            self.bump(span);
            match self.peek() {
                (span, Token::Equals | Token::Compare(crate::cond::CompareOp::Eq)) => {
                    self.bump(span)
                }
                _ => return Err(self.error(ErrorKind::IllegalInput)),
            }
            let value = self.expression(ctx, space)?;
            assignments.push((RegRef::new(space, reg), value));
            match self.peek() {
                (span, Token::Comma) => self.bump(span),
                _ => break,
            }
        }
        Ok(Command::SetRegisters(assignments))
    }

    fn checkpoint(
        &mut self,
        ctx: &(impl Context + ?Sized),
        kind: CheckpointKind,
    ) -> Result<Command, ParseError> {
        let mut ops = MemOps::default();
        while let Some((span, text)) = self.peek_word() {
            let Some(op) = MemOps::from_word(text) else {
                break;
            };
            self.bump(span);
            ops = ops.union(op);
        }
        if ops.is_empty() && self.at_end_command() {
            return Ok(Command::ListCheckpoints);
        }
        if ops.is_empty() {
            ops = kind.default_ops();
        }
        let Some(range) = self.opt_range(ctx)? else {
            return Err(self.error(ErrorKind::ExpectAddress));
        };
        let cond = match self.eat_word("if") {
            true => Some(self.cond_expr(ctx)?),
            false => None,
        };
        Ok(Command::Checkpoint {
            kind,
            ops,
            range,
            cond,
        })
    }

    fn display(
        &mut self,
        ctx: &(impl Context + ?Sized),
        format: DisplayFormat,
    ) -> Result<Command, ParseError> {
        let range = self.opt_range(ctx)?;
        Ok(Command::Display { format, range })
    }

    fn opt_memspace(&mut self) -> Option<MemSpace> {
        match self.peek() {
            (span, Token::MemSpace(space)) => {
                self.bump(span);
                Some(space)
            }
            _ => None,
        }
    }
    /// A memspace prefix, or a bare unit number naming a drive.
    fn opt_space_arg(&mut self) -> Option<MemSpace> {
        if let Some(space) = self.opt_memspace() {
            return Some(space);
        }
        match self.peek() {
            (span, Token::Number(kind)) => {
                let text = self.text(span);
                let space = if text.eq_ignore_ascii_case("c") {
                    Some(MemSpace::Computer)
                } else {
                    MemSpace::from_device(kind.decimal_value(text))
                };
                if space.is_some() {
                    self.bump(span);
                }
                space
            }
            _ => None,
        }
    }
    fn opt_name(&mut self) -> Option<String> {
        match self.peek() {
            (span, Token::Word | Token::Number(_)) => {
                self.bump(span);
                Some(self.text(span).to_owned())
            }
            (span, Token::String) => {
                self.bump(span);
                Some(unquote(self.text(span)))
            }
            _ => None,
        }
    }
    fn label_name(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            (span, Token::Label) => {
                self.bump(span);
                Ok(self.text(span).to_owned())
            }
            _ => Err(self.error(ErrorKind::IllegalInput)),
        }
    }
    fn filename(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            (span, Token::String) => {
                self.bump(span);
                Ok(unquote(self.text(span)))
            }
            _ => Err(self.error(ErrorKind::ExpectFilename)),
        }
    }
    fn string(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            (span, Token::String) => {
                self.bump(span);
                Ok(unquote(self.text(span)))
            }
            _ => Err(self.error(ErrorKind::ExpectString)),
        }
    }
    fn string_or_rest(&mut self) -> String {
        match self.peek() {
            (span, Token::String) => {
                self.bump(span);
                unquote(self.text(span))
            }
            _ => self.rest_of_line(),
        }
    }
    fn rest_of_line(&mut self) -> String {
        let span = self.lexer.rest(self.pos);
        self.pos = self.lexer.len();
        self.text(span).to_owned()
    }
    fn checknum(&mut self) -> Result<u32, ParseError> {
        self.opt_checknum()?
            .ok_or_else(|| self.error(ErrorKind::ExpectCheckNum))
    }
    fn opt_checknum(&mut self) -> Result<Option<u32>, ParseError> {
        match self.peek() {
            (span, Token::Number(kind)) => {
                let value = kind.decimal_value(self.text(span));
                let num = u32::try_from(value).map_err(|_| self.error(ErrorKind::ExpectCheckNum))?;
                self.bump(span);
                Ok(Some(num))
            }
            _ => Ok(None),
        }
    }
    fn device_num(&mut self, ctx: &(impl Context + ?Sized)) -> Result<i64, ParseError> {
        if !self.starts_operand() {
            return Err(self.error(ErrorKind::ExpectDeviceNum));
        }
        match self.peek() {
            (span, Token::Number(kind)) if kind.is_guess() => {
                self.bump(span);
                Ok(kind.decimal_value(self.text(span)))
            }
            _ => self.expression(ctx, ctx.default_space()),
        }
    }
    fn opt_toggle(&mut self) -> Result<Option<Toggle>, ParseError> {
        match self.peek_word() {
            Some((span, text)) => match Toggle::from_word(text) {
                Some(toggle) => {
                    self.bump(span);
                    Ok(Some(toggle))
                }
                None => Err(self.error(ErrorKind::IllegalInput)),
            },
            None => Ok(None),
        }
    }
}
