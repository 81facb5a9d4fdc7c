use super::{Context, Parser};
use crate::addr::{check_addr, resolve_range, AddrRange, MemSpace, MonAddr};
use crate::cond::{CompareOp, CondExpr, Operand};
use crate::error::{ErrorKind, ParseError};
use crate::lex::{unquote, NumberKind, Token};
use crate::reg::{RegId, RegRef};

impl<'a> Parser<'a> {
    /// Whether the next token can begin an address or expression operand.
    pub(super) fn starts_operand(&mut self) -> bool {
        match self.peek_operand() {
            (_, Token::Number(_) | Token::Label | Token::LParen | Token::MemSpace(_)) => true,
            (span, Token::Word) => self.text(span).parse::<RegId>().is_ok(),
            _ => false,
        }
    }

    /// `term (('+' | '-') term)*`, evaluated eagerly with wrapping arithmetic.
    pub(super) fn expression(
        &mut self,
        ctx: &(impl Context + ?Sized),
        space: MemSpace,
    ) -> Result<i64, ParseError> {
        let mut value = self.term(ctx, space)?;
        loop {
            match self.peek() {
                (span, Token::Plus) => {
                    self.bump(span);
                    value = value.wrapping_add(self.term(ctx, space)?);
                }
                (span, Token::Minus) => {
                    self.bump(span);
                    value = value.wrapping_sub(self.term(ctx, space)?);
                }
                _ => return Ok(value),
            }
        }
    }
    pub(super) fn opt_expression(
        &mut self,
        ctx: &(impl Context + ?Sized),
    ) -> Result<Option<i64>, ParseError> {
        if !self.starts_operand() && self.peek_operand().1 != Token::Minus {
            return Ok(None);
        }
        self.expression(ctx, ctx.default_space()).map(Some)
    }
    fn term(&mut self, ctx: &(impl Context + ?Sized), space: MemSpace) -> Result<i64, ParseError> {
        let mut value = self.unary(ctx, space)?;
        loop {
            match self.peek() {
                (span, Token::Star) => {
                    self.bump(span);
                    value = value.wrapping_mul(self.unary(ctx, space)?);
                }
                (span, Token::Slash) => {
                    self.bump(span);
                    let rhs = self.unary(ctx, space)?;
                    value = match rhs {
                        0 => 1,
                        _ => value.wrapping_div(rhs),
                    };
                }
                _ => return Ok(value),
            }
        }
    }
    fn unary(&mut self, ctx: &(impl Context + ?Sized), space: MemSpace) -> Result<i64, ParseError> {
        match self.peek_operand() {
            (span, Token::Minus) => {
                self.bump(span);
                Ok(self.unary(ctx, space)?.wrapping_neg())
            }
            _ => self.operand(ctx, space),
        }
    }
    /// A number, label, register or parenthesised expression.
    pub(super) fn operand(
        &mut self,
        ctx: &(impl Context + ?Sized),
        space: MemSpace,
    ) -> Result<i64, ParseError> {
        let (span, token) = self.peek_operand();
        match token {
            Token::Number(kind) => {
                self.bump(span);
                Ok(kind.value(self.text(span), ctx.radix()))
            }
            Token::Label => {
                let value = ctx
                    .label(space, self.text(span))
                    .ok_or_else(|| self.error(ErrorKind::UndefinedLabel))?;
                self.bump(span);
                Ok(value as i64)
            }
            Token::Word => {
                let reg = self.register(ctx, space)?;
                Ok(ctx.register(reg) as i64)
            }
            Token::MemSpace(space) => {
                self.bump(span);
                self.operand(ctx, space)
            }
            Token::LParen => {
                self.bump(span);
                let value = self.expression(ctx, space)?;
                self.expect(Token::RParen, ErrorKind::MissingCloseParen)?;
                Ok(value)
            }
            _ => Err(self.error(ErrorKind::IllegalInput)),
        }
    }
    /// A register name valid for the CPU of `space`.
    fn register(
        &mut self,
        ctx: &(impl Context + ?Sized),
        space: MemSpace,
    ) -> Result<RegRef, ParseError> {
        let (span, _) = self.peek();
        let reg: RegId = self
            .text(span)
            .parse()
            .map_err(|()| self.error(ErrorKind::IllegalInput))?;
        if !ctx.cpu(space).has_register(reg) {
            return Err(self.error(ErrorKind::InvalidRegister));
        }
        self.bump(span);
        Ok(RegRef::new(space, reg))
    }

    /// An optional memspace prefix and one operand, checked against the
    /// address width of the space's CPU.
    pub(super) fn address(
        &mut self,
        ctx: &(impl Context + ?Sized),
        default: MemSpace,
    ) -> Result<MonAddr, ParseError> {
        let space = self.opt_memspace().unwrap_or(default);
        if !self.starts_operand() {
            return Err(self.error(ErrorKind::ExpectAddress));
        }
        let start = self.stop;
        let value = self.operand(ctx, space)?;
        if !check_addr(value, ctx.cpu(space).address_mask()) {
            return Err(ParseError::new(ErrorKind::AddrTooBig, start));
        }
        Ok(MonAddr::new(space, value as u32))
    }
    pub(super) fn opt_address(
        &mut self,
        ctx: &(impl Context + ?Sized),
        default: MemSpace,
    ) -> Result<Option<MonAddr>, ParseError> {
        if !self.starts_operand() {
            return Ok(None);
        }
        self.address(ctx, default).map(Some)
    }

    /// `address [sep address]`, where an eight digit range guess may supply
    /// both ends at once.
    pub(super) fn opt_range(
        &mut self,
        ctx: &(impl Context + ?Sized),
    ) -> Result<Option<AddrRange>, ParseError> {
        if !self.starts_operand() {
            return Ok(None);
        }
        let mut range = self.range_start(ctx)?;
        if range.end.is_some() {
            return Ok(Some(range));
        }
        let separated = match self.peek() {
            (span, Token::Comma | Token::Minus) => {
                self.bump(span);
                true
            }
            _ => false,
        };
        if self.starts_operand() {
            let from = self.stop;
            let end = match self.address(ctx, range.start.space) {
                Err(err) if err.kind == ErrorKind::ExpectAddress => {
                    return Err(ParseError::new(ErrorKind::RangeBadEnd, from))
                }
                end => end?,
            };
            if end.space != range.start.space || end.offset < range.start.offset {
                return Err(ParseError::new(ErrorKind::RangeBadEnd, from));
            }
            range.end = Some(end);
        } else if separated {
            return Err(self.error(ErrorKind::RangeBadEnd));
        }
        Ok(Some(range))
    }
    fn range_start(&mut self, ctx: &(impl Context + ?Sized)) -> Result<AddrRange, ParseError> {
        let save = self.pos;
        let space = self.opt_memspace().unwrap_or(ctx.default_space());
        if let (span, Token::Number(NumberKind::RangeGuess)) = self.peek_operand() {
            self.bump(span);
            let mask = ctx.cpu(space).address_mask();
            return resolve_range(space, self.text(span), ctx.radix(), mask)
                .map_err(|kind| ParseError::new(kind, span.from));
        }
        self.pos = save;
        match self.address(ctx, ctx.default_space()) {
            Ok(start) => Ok(AddrRange::single(start)),
            Err(err) if err.kind == ErrorKind::ExpectAddress => {
                Err(ParseError::new(ErrorKind::RangeBadStart, err.pos))
            }
            Err(err) => Err(err),
        }
    }
    /// A range with both ends present.
    pub(super) fn range(&mut self, ctx: &(impl Context + ?Sized)) -> Result<AddrRange, ParseError> {
        match self.opt_range(ctx)? {
            Some(range) if range.end.is_some() => Ok(range),
            Some(_) => Err(self.error(ErrorKind::RangeBadEnd)),
            None => Err(self.error(ErrorKind::RangeBadStart)),
        }
    }

    /// Bytes for `fill`, `hunt` and `>`: numbers and strings, optionally
    /// comma separated. `None` is the `xx` wildcard, allowed when `hunt`.
    pub(super) fn data_list(
        &mut self,
        ctx: &(impl Context + ?Sized),
        hunt: bool,
    ) -> Result<Vec<Option<u8>>, ParseError> {
        let mut data = Vec::new();
        loop {
            match self.peek_operand() {
                (span, Token::String) => {
                    self.bump(span);
                    data.extend(unquote(self.text(span)).bytes().map(Some));
                }
                (span, Token::Word) if hunt && self.text(span).eq_ignore_ascii_case("xx") => {
                    self.bump(span);
                    data.push(None);
                }
                (_, Token::Eol | Token::Semi) if !data.is_empty() => return Ok(data),
                _ => {
                    let start = self.stop;
                    let value = self.operand(ctx, ctx.default_space())?;
                    match value {
                        -0x80..=0xff => data.push(Some(value as u8)),
                        0x100..=0xffff => {
                            data.push(Some(value as u8));
                            data.push(Some((value >> 8) as u8));
                        }
                        _ => return Err(ParseError::new(ErrorKind::ImmTooBig, start)),
                    }
                }
            }
            if let (span, Token::Comma) = self.peek() {
                self.bump(span);
            }
        }
    }

    /// `and ('||' and)*`
    pub(super) fn cond_expr(
        &mut self,
        ctx: &(impl Context + ?Sized),
    ) -> Result<CondExpr, ParseError> {
        let mut lhs = self.cond_and(ctx)?;
        while let (span, Token::Compare(CompareOp::Or)) = self.peek() {
            self.bump(span);
            self.expect_cond_operand()?;
            let rhs = self.cond_and(ctx)?;
            lhs = CondExpr::binary(CompareOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }
    fn cond_and(&mut self, ctx: &(impl Context + ?Sized)) -> Result<CondExpr, ParseError> {
        let mut lhs = self.cond_compare(ctx)?;
        while let (span, Token::Compare(CompareOp::And)) = self.peek() {
            self.bump(span);
            self.expect_cond_operand()?;
            let rhs = self.cond_compare(ctx)?;
            lhs = CondExpr::binary(CompareOp::And, lhs, rhs);
        }
        Ok(lhs)
    }
    fn cond_compare(&mut self, ctx: &(impl Context + ?Sized)) -> Result<CondExpr, ParseError> {
        let mut lhs = self.cond_atom(ctx)?;
        loop {
            let (span, token) = self.peek();
            let op = match token {
                Token::Equals => CompareOp::Eq,
                Token::Less => CompareOp::Lt,
                Token::Greater => CompareOp::Gt,
                Token::Compare(op) if !matches!(op, CompareOp::And | CompareOp::Or) => op,
                _ => return Ok(lhs),
            };
            self.bump(span);
            self.expect_cond_operand()?;
            let rhs = self.cond_atom(ctx)?;
            lhs = CondExpr::binary(op, lhs, rhs);
        }
    }
    fn expect_cond_operand(&mut self) -> Result<(), ParseError> {
        match self.peek_operand() {
            (_, Token::At | Token::LParen) => Ok(()),
            _ if self.starts_operand() => Ok(()),
            _ => Err(self.error(ErrorKind::IncompleteCompareOp)),
        }
    }
    fn cond_atom(&mut self, ctx: &(impl Context + ?Sized)) -> Result<CondExpr, ParseError> {
        let default = ctx.default_space();
        let (span, token) = self.peek_operand();
        let operand = match token {
            Token::LParen => {
                self.bump(span);
                let mut inner = self.cond_expr(ctx)?;
                self.expect(Token::RParen, ErrorKind::MissingCloseParen)?;
                inner.parenthesized = true;
                return Ok(inner);
            }
            Token::At => {
                self.bump(span);
                return self.bank_operand(ctx).map(CondExpr::leaf);
            }
            Token::MemSpace(space) => {
                self.bump(span);
                Operand::Register(self.register(ctx, space)?)
            }
            Token::Number(kind) => {
                let text = self.text(span);
                match text.parse::<RegId>() {
                    Ok(reg) if ctx.cpu(default).has_register(reg) => {
                        self.bump(span);
                        Operand::Register(RegRef::new(default, reg))
                    }
                    _ => {
                        self.bump(span);
                        Operand::Value(kind.value(text, ctx.radix()))
                    }
                }
            }
            Token::Word => Operand::Register(self.register(ctx, default)?),
            Token::Label => Operand::Value(self.operand(ctx, default)?),
            _ => return Err(self.error(ErrorKind::IllegalInput)),
        };
        Ok(CondExpr::leaf(operand))
    }
    /// `bankname ':' address`, after the `@`.
    fn bank_operand(&mut self, ctx: &(impl Context + ?Sized)) -> Result<Operand, ParseError> {
        let default = ctx.default_space();
        let bank = match self.peek() {
            // `@c:1000` lexes the bank name as a memspace prefix
            (span, Token::MemSpace(_)) => {
                self.bump(span);
                self.text(span).trim_end_matches(':').to_owned()
            }
            (span, Token::Word | Token::Number(_)) => {
                self.bump(span);
                let bank = self.text(span).to_owned();
                self.expect(Token::Colon, ErrorKind::IllegalInput)?;
                bank
            }
            _ => return Err(self.error(ErrorKind::IllegalInput)),
        };
        let addr = self.address(ctx, default)?;
        let number = ctx.bank_number(addr.space, &bank);
        Ok(Operand::Memory { bank, number, addr })
    }
}
