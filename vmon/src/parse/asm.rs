use super::{Context, Parser};
use crate::addr::MemSpace;
use crate::asm::{indexed, AddrMode, AsmInstr, AsmOperand};
use crate::error::{ErrorKind, ParseError};
use crate::lex::{Span, Token};

/// Register names that can appear in an assembly operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AsmReg {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
    Af,
    Bc,
    De,
    Hl,
    Ix,
    Iy,
    Sp,
    X,
    Y,
    S,
    U,
    Pcr,
}

impl AsmReg {
    fn from_name(name: &str) -> Option<Self> {
        use AsmReg::*;
        Some(match name.to_ascii_lowercase().as_str() {
            "a" => A,
            "b" => B,
            "c" => C,
            "d" => D,
            "e" => E,
            "h" => H,
            "l" => L,
            "ixh" => Ixh,
            "ixl" => Ixl,
            "iyh" => Iyh,
            "iyl" => Iyl,
            "af" => Af,
            "bc" => Bc,
            "de" => De,
            "hl" => Hl,
            "ix" => Ix,
            "iy" => Iy,
            "sp" => Sp,
            "x" => X,
            "y" => Y,
            "s" => S,
            "u" => U,
            "pcr" => Pcr,
            _ => return None,
        })
    }
    /// The 6809 index register bits, for the registers that can index.
    fn index_bits(self) -> Option<u8> {
        match self {
            AsmReg::X => Some(indexed::REG_X),
            AsmReg::Y => Some(indexed::REG_Y),
            AsmReg::U => Some(indexed::REG_U),
            AsmReg::S => Some(indexed::REG_S),
            _ => None,
        }
    }
}

impl<'a> Parser<'a> {
    /// Parses the next `mnemonic operand` of an assemble-mode line.
    ///
    /// Instructions are separated by `:`; `None` once the line is done.
    pub fn instruction(
        &mut self,
        ctx: &(impl Context + ?Sized),
        space: MemSpace,
    ) -> Result<Option<AsmInstr>, ParseError> {
        let mnemonic = loop {
            match self.peek() {
                (_, Token::Eol) => return Ok(None),
                (span, Token::Colon) => self.bump(span),
                (span, Token::Word | Token::Number(_)) => {
                    self.bump(span);
                    break self.text(span).to_owned();
                }
                _ => return Err(self.error(ErrorKind::IllegalInput)),
            }
        };
        let operand = self.asm_operand(ctx, space)?;
        match self.peek() {
            (span, Token::Colon) => self.bump(span),
            (_, Token::Eol) => (),
            _ => return Err(self.error(ErrorKind::ExpectEndCmd)),
        }
        Ok(Some(AsmInstr { mnemonic, operand }))
    }

    fn peek_asm_reg(&mut self) -> Option<(Span, AsmReg)> {
        let (span, text) = self.peek_word()?;
        Some((span, AsmReg::from_name(text)?))
    }
    fn index_reg(&mut self) -> Result<u8, ParseError> {
        match self.peek_asm_reg() {
            Some((span, reg)) => match reg.index_bits() {
                Some(bits) => {
                    self.bump(span);
                    Ok(bits)
                }
                None => Err(self.error(ErrorKind::IllegalInput)),
            },
            None => Err(self.error(ErrorKind::IllegalInput)),
        }
    }

    fn asm_operand(
        &mut self,
        ctx: &(impl Context + ?Sized),
        space: MemSpace,
    ) -> Result<AsmOperand, ParseError> {
        let (span, token) = self.peek_operand();
        match token {
            Token::Eol | Token::Colon => Ok(AsmOperand::new(AddrMode::Implied)),
            Token::Hash => {
                self.bump(span);
                let start = self.peek_operand().0.from;
                let value = self.expression(ctx, space)?;
                match value {
                    -0x8000..=0xff => Ok(AsmOperand::with_param(AddrMode::Immediate, value)),
                    0x100..=0xffff => Ok(AsmOperand::with_param(AddrMode::Immediate16, value)),
                    _ => Err(ParseError::new(ErrorKind::ImmTooBig, start)),
                }
            }
            Token::Less => {
                self.bump(span);
                let value = self.expression(ctx, space)?;
                Ok(AsmOperand::with_param(AddrMode::Direct, value))
            }
            Token::Comma => {
                self.bump(span);
                self.asm_auto_index(false)
            }
            Token::LParen => {
                self.bump(span);
                self.asm_paren(ctx, space)
            }
            Token::LBracket => {
                self.bump(span);
                self.asm_bracket(ctx, space)
            }
            Token::Word | Token::Number(_) => match self.peek_asm_reg() {
                Some((span, reg)) => {
                    self.bump(span);
                    self.asm_register(reg)
                }
                None => self.asm_value(ctx, space),
            },
            _ => self.asm_value(ctx, space),
        }
    }

    /// A register operand, or a 6809 accumulator offset such as `b,x`.
    fn asm_register(&mut self, reg: AsmReg) -> Result<AsmOperand, ParseError> {
        let offset = match reg {
            AsmReg::A => Some(indexed::OFFA),
            AsmReg::B => Some(indexed::OFFB),
            AsmReg::D => Some(indexed::OFFD),
            _ => None,
        };
        if let (Some(form), (span, Token::Comma)) = (offset, self.peek()) {
            self.bump(span);
            let index = self.index_reg()?;
            return Ok(AsmOperand::register(index, form, false));
        }
        let mode = match reg {
            AsmReg::A => AddrMode::Accumulator,
            AsmReg::B => AddrMode::RegB,
            AsmReg::C => AddrMode::RegC,
            AsmReg::D => AddrMode::RegD,
            AsmReg::E => AddrMode::RegE,
            AsmReg::H => AddrMode::RegH,
            AsmReg::L => AddrMode::RegL,
            AsmReg::Ixh => AddrMode::RegIxh,
            AsmReg::Ixl => AddrMode::RegIxl,
            AsmReg::Iyh => AddrMode::RegIyh,
            AsmReg::Iyl => AddrMode::RegIyl,
            AsmReg::Af => AddrMode::RegAf,
            AsmReg::Bc => AddrMode::RegBc,
            AsmReg::De => AddrMode::RegDe,
            AsmReg::Hl => AddrMode::RegHl,
            AsmReg::Ix => AddrMode::RegIx,
            AsmReg::Iy => AddrMode::RegIy,
            AsmReg::Sp => AddrMode::RegSp,
            AsmReg::X | AsmReg::Y | AsmReg::S | AsmReg::U | AsmReg::Pcr => {
                return Err(self.error(ErrorKind::IllegalInput))
            }
        };
        Ok(AsmOperand::new(mode))
    }

    /// A value, optionally followed by `,x` `,y` `,s` `,u` `,pcr` or a second
    /// value.
    fn asm_value(
        &mut self,
        ctx: &(impl Context + ?Sized),
        space: MemSpace,
    ) -> Result<AsmOperand, ParseError> {
        let value = self.expression(ctx, space)?;
        let (span, Token::Comma) = self.peek() else {
            let mode = match value {
                ..=0xff => AddrMode::ZeroPage,
                0x100..=0xffff => AddrMode::Absolute,
                _ => AddrMode::AbsoluteLong,
            };
            return Ok(AsmOperand::with_param(mode, value));
        };
        self.bump(span);
        if let Some((span, reg)) = self.peek_asm_reg() {
            let operand = match reg {
                AsmReg::X => AsmOperand::with_param(
                    match value {
                        ..=0xff => AddrMode::ZeroPageX,
                        0x100..=0xffff => AddrMode::AbsoluteX,
                        _ => AddrMode::AbsoluteLongX,
                    },
                    value,
                ),
                AsmReg::Y => AsmOperand::with_param(
                    match value {
                        ..=0xff => AddrMode::ZeroPageY,
                        _ => AddrMode::AbsoluteY,
                    },
                    value,
                ),
                AsmReg::S | AsmReg::U if (0..0x100).contains(&value) => {
                    AsmOperand::with_param(AddrMode::StackRelative, value)
                }
                AsmReg::S | AsmReg::U => {
                    let bits = reg.index_bits().unwrap_or(indexed::REG_S);
                    AsmOperand::offset(bits, value, false)
                }
                AsmReg::Pcr => AsmOperand::pc_relative(value, false),
                _ => return Err(self.error(ErrorKind::IllegalInput)),
            };
            self.bump(span);
            return Ok(operand);
        }
        let second = self.expression(ctx, space)?;
        if !(0..0x100).contains(&value) {
            return Ok(AsmOperand::with_param(AddrMode::Illegal, second));
        }
        Ok(AsmOperand {
            mode: AddrMode::Double,
            submode: value as u8,
            param: second,
        })
    }

    /// Operands that open with `(`.
    fn asm_paren(
        &mut self,
        ctx: &(impl Context + ?Sized),
        space: MemSpace,
    ) -> Result<AsmOperand, ParseError> {
        if let Some((span, reg)) = self.peek_asm_reg() {
            let mode = match reg {
                AsmReg::Bc => Some(AddrMode::RegIndBc),
                AsmReg::De => Some(AddrMode::RegIndDe),
                AsmReg::Hl => Some(AddrMode::RegIndHl),
                AsmReg::Ix => Some(AddrMode::RegIndIx),
                AsmReg::Iy => Some(AddrMode::RegIndIy),
                AsmReg::Sp => Some(AddrMode::RegIndSp),
                _ => None,
            };
            if let Some(mode) = mode {
                self.bump(span);
                self.expect(Token::RParen, ErrorKind::MissingCloseParen)?;
                return Ok(AsmOperand::new(mode));
            }
        }
        let value = self.expression(ctx, space)?;
        match self.peek() {
            (span, Token::RParen) => {
                self.bump(span);
                let (span, Token::Comma) = self.peek() else {
                    let mode = match value {
                        ..=0xff => AddrMode::Indirect,
                        _ => AddrMode::AbsIndirect,
                    };
                    return Ok(AsmOperand::with_param(mode, value));
                };
                self.bump(span);
                let Some((span, reg)) = self.peek_asm_reg() else {
                    return Err(self.error(ErrorKind::IllegalInput));
                };
                let mode = match reg {
                    AsmReg::Y => AddrMode::IndirectY,
                    AsmReg::A => AddrMode::AbsoluteA,
                    AsmReg::Hl => AddrMode::AbsoluteHl,
                    AsmReg::Ix => AddrMode::AbsoluteIx,
                    AsmReg::Iy => AddrMode::AbsoluteIy,
                    _ => return Err(self.error(ErrorKind::IllegalInput)),
                };
                self.bump(span);
                Ok(AsmOperand::with_param(mode, value))
            }
            (span, Token::Comma) => {
                self.bump(span);
                match self.peek_asm_reg() {
                    Some((span, AsmReg::X)) => {
                        self.bump(span);
                        self.expect(Token::RParen, ErrorKind::MissingCloseParen)?;
                        let mode = match value {
                            ..=0xff => AddrMode::IndirectX,
                            _ => AddrMode::AbsIndirectX,
                        };
                        Ok(AsmOperand::with_param(mode, value))
                    }
                    Some((span, AsmReg::S)) => {
                        self.bump(span);
                        self.expect(Token::RParen, ErrorKind::MissingCloseParen)?;
                        self.expect(Token::Comma, ErrorKind::IllegalInput)?;
                        match self.peek_asm_reg() {
                            Some((span, AsmReg::Y)) => self.bump(span),
                            _ => return Err(self.error(ErrorKind::IllegalInput)),
                        }
                        Ok(AsmOperand::with_param(AddrMode::StackRelativeY, value))
                    }
                    _ => Err(self.error(ErrorKind::IllegalInput)),
                }
            }
            _ => Err(self.error(ErrorKind::MissingCloseParen)),
        }
    }

    /// Operands that open with `[`: 6809 indirect indexing and the 65816
    /// `[dp],y` form.
    fn asm_bracket(
        &mut self,
        ctx: &(impl Context + ?Sized),
        space: MemSpace,
    ) -> Result<AsmOperand, ParseError> {
        let operand = match self.peek_operand() {
            (span, Token::Comma) => {
                self.bump(span);
                self.asm_auto_index(true)?
            }
            _ => match self.peek_asm_reg() {
                Some((span, reg @ (AsmReg::A | AsmReg::B | AsmReg::D))) => {
                    self.bump(span);
                    self.expect(Token::Comma, ErrorKind::IllegalInput)?;
                    let index = self.index_reg()?;
                    let form = match reg {
                        AsmReg::A => indexed::OFFA,
                        AsmReg::B => indexed::OFFB,
                        _ => indexed::OFFD,
                    };
                    AsmOperand::register(index, form, true)
                }
                _ => {
                    let value = self.expression(ctx, space)?;
                    match self.peek() {
                        (span, Token::RBracket) => {
                            self.bump(span);
                            if let (span, Token::Comma) = self.peek() {
                                self.bump(span);
                                match self.peek_asm_reg() {
                                    Some((span, AsmReg::Y)) => self.bump(span),
                                    _ => return Err(self.error(ErrorKind::IllegalInput)),
                                }
                                return Ok(AsmOperand::with_param(AddrMode::IndirectLongY, value));
                            }
                            return Ok(AsmOperand {
                                mode: AddrMode::Indexed,
                                submode: indexed::LONG | indexed::EXTENDED_INDIRECT,
                                param: value,
                            });
                        }
                        (span, Token::Comma) => {
                            self.bump(span);
                            match self.peek_asm_reg() {
                                Some((span, AsmReg::Pcr)) => {
                                    self.bump(span);
                                    AsmOperand::pc_relative(value, true)
                                }
                                _ => {
                                    let index = self.index_reg()?;
                                    AsmOperand::offset(index, value, true)
                                }
                            }
                        }
                        _ => return Err(self.error(ErrorKind::IllegalInput)),
                    }
                }
            },
        };
        self.expect(Token::RBracket, ErrorKind::IllegalInput)?;
        Ok(operand)
    }

    /// `,r` `,r+` `,r++` `,-r` `,--r`, after the comma.
    fn asm_auto_index(&mut self, indirect: bool) -> Result<AsmOperand, ParseError> {
        let mut decrement = 0;
        while let (span, Token::Minus) = self.peek() {
            if decrement == 2 {
                return Err(self.error(ErrorKind::IllegalInput));
            }
            self.bump(span);
            decrement += 1;
        }
        let index = self.index_reg()?;
        let form = match decrement {
            1 => indexed::DEC1,
            2 => indexed::DEC2,
            _ => {
                let mut increment = 0;
                while let (span, Token::Plus) = self.peek() {
                    if increment == 2 {
                        return Err(self.error(ErrorKind::IllegalInput));
                    }
                    self.bump(span);
                    increment += 1;
                }
                match increment {
                    1 => indexed::INC1,
                    2 => indexed::INC2,
                    _ => indexed::OFF0,
                }
            }
        };
        Ok(AsmOperand::register(index, form, indirect))
    }
}
