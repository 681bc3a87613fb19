//! Canonical textual rendering of a bytecode sequence (spec §4.8/§6):
//! `NNN <op> [<operand>]`, one instruction per line. `parse` of `print` is
//! the identity for canonical texts (spec §8 quantified invariant).

use std::fmt::Write as _;

use num::{BigInt, BigUint, Num};

use crate::errors::{Error, Result};
use crate::number::Bits;
use crate::source::Span;
use crate::types::Type;
use crate::value::{FnRef, Value};

use super::op::{Bytecode, Op};

fn render_value(v: &Value) -> String {
    // `Value`'s `Display` already renders bits as `uK:V`/`sK:V`, which is
    // exactly the operand shape spec §6 requires for `literal`.
    v.to_string()
}

fn render_fn_ref(f: &FnRef) -> String {
    match f {
        FnRef::User(id) => format!("fn#{}", id.0),
        FnRef::Builtin(b) => format!("{:?}", b).to_lowercase(),
    }
}

pub fn render(ops: &[Bytecode]) -> String {
    let mut out = String::new();
    for (i, bc) in ops.iter().enumerate() {
        let _ = write!(out, "{:03} ", i);
        match &bc.op {
            Op::Literal(v) => {
                let _ = writeln!(out, "literal {}", render_value(v));
            }
            Op::Load(slot) => {
                let _ = writeln!(out, "load {}", slot);
            }
            Op::Store(slot) => {
                let _ = writeln!(out, "store {}", slot);
            }
            Op::Add => writeln!(out, "add").unwrap(),
            Op::Sub => writeln!(out, "sub").unwrap(),
            Op::Mul => writeln!(out, "mul").unwrap(),
            Op::Div => writeln!(out, "div").unwrap(),
            Op::And => writeln!(out, "and").unwrap(),
            Op::Or => writeln!(out, "or").unwrap(),
            Op::Xor => writeln!(out, "xor").unwrap(),
            Op::Shll => writeln!(out, "shll").unwrap(),
            Op::Shrl => writeln!(out, "shrl").unwrap(),
            Op::Shra => writeln!(out, "shra").unwrap(),
            Op::Concat => writeln!(out, "concat").unwrap(),
            Op::Eq => writeln!(out, "eq").unwrap(),
            Op::Ne => writeln!(out, "ne").unwrap(),
            Op::Lt => writeln!(out, "lt").unwrap(),
            Op::Le => writeln!(out, "le").unwrap(),
            Op::Gt => writeln!(out, "gt").unwrap(),
            Op::Ge => writeln!(out, "ge").unwrap(),
            Op::Invert => writeln!(out, "invert").unwrap(),
            Op::Negate => writeln!(out, "negate").unwrap(),
            Op::Cast(ty) => {
                let _ = writeln!(out, "cast {}", ty);
            }
            Op::Index => writeln!(out, "index").unwrap(),
            Op::Slice { start, width } => {
                let _ = writeln!(out, "slice {} {}", start, width);
            }
            Op::WidthSlice { width } => {
                let _ = writeln!(out, "width_slice {}", width);
            }
            Op::CreateTuple(n) => {
                let _ = writeln!(out, "create_tuple {}", n);
            }
            Op::CreateArray(n) => {
                let _ = writeln!(out, "create_array {}", n);
            }
            Op::ExpandTuple => writeln!(out, "expand_tuple").unwrap(),
            Op::Call(f) => {
                let _ = writeln!(out, "call {}", render_fn_ref(f));
            }
            Op::JumpRel(off) => {
                let _ = writeln!(out, "jump_rel {}{}", if *off >= 0 { "+" } else { "" }, off);
            }
            Op::JumpRelIf(off) => {
                let _ = writeln!(out, "jump_rel_if {}{}", if *off >= 0 { "+" } else { "" }, off);
            }
            Op::JumpDest => writeln!(out, "jump_dest").unwrap(),
            Op::Return => writeln!(out, "return").unwrap(),
        };
    }
    out
}

fn parse_literal_operand(s: &str) -> Result<Value> {
    // `uK:V` / `sK:V`, decimal, signed may be negative.
    let signed = s.starts_with('s');
    if !signed && !s.starts_with('u') {
        return Err(Error::argument(format!("unsupported literal operand: {}", s)));
    }
    let rest = &s[1..];
    let (width_str, value_str) =
        rest.split_once(':').ok_or_else(|| Error::argument(format!("malformed literal: {}", s)))?;
    let width: usize =
        width_str.parse().map_err(|_| Error::argument(format!("bad literal width: {}", s)))?;
    if signed {
        let v = BigInt::from_str_radix(value_str, 10)
            .map_err(|_| Error::argument(format!("bad literal value: {}", s)))?;
        Ok(Value::SBits(Bits::from_signed(width, v)))
    } else {
        let v = BigUint::from_str_radix(value_str, 10)
            .map_err(|_| Error::argument(format!("bad literal value: {}", s)))?;
        Ok(Value::UBits(Bits::from_unsigned(width, v)))
    }
}

fn parse_type_operand(s: &str) -> Result<Type> {
    let signed = s.starts_with('s');
    if !signed && !s.starts_with('u') {
        return Err(Error::argument(format!("unsupported cast operand for round-trip: {}", s)));
    }
    let width: u32 = s[1..]
        .parse()
        .map_err(|_| Error::argument(format!("unsupported cast operand for round-trip: {}", s)))?;
    Ok(if signed { Type::s(width) } else { Type::u(width) })
}

/// Parse canonical bytecode text back into a sequence. Only the operand
/// shapes this crate itself emits round-trip (plain `uN`/`sN` literals and
/// casts); anything else is an `Error::Argument`, matching "a user-facing
/// usage error at ... boundaries" (spec §7).
pub fn parse(text: &str) -> Result<Vec<Bytecode>> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, ' ');
        let _index = parts.next();
        let rest = parts.next().unwrap_or("").trim();
        let (mnemonic, operand) = match rest.split_once(' ') {
            Some((m, o)) => (m, Some(o.trim())),
            None => (rest, None),
        };
        let op = match mnemonic {
            "literal" => Op::Literal(parse_literal_operand(
                operand.ok_or_else(|| Error::argument("literal missing operand"))?,
            )?),
            "load" => Op::Load(
                operand
                    .ok_or_else(|| Error::argument("load missing operand"))?
                    .parse()
                    .map_err(|_| Error::argument("bad load operand"))?,
            ),
            "store" => Op::Store(
                operand
                    .ok_or_else(|| Error::argument("store missing operand"))?
                    .parse()
                    .map_err(|_| Error::argument("bad store operand"))?,
            ),
            "add" => Op::Add,
            "sub" => Op::Sub,
            "mul" => Op::Mul,
            "div" => Op::Div,
            "and" => Op::And,
            "or" => Op::Or,
            "xor" => Op::Xor,
            "shll" => Op::Shll,
            "shrl" => Op::Shrl,
            "shra" => Op::Shra,
            "concat" => Op::Concat,
            "eq" => Op::Eq,
            "ne" => Op::Ne,
            "lt" => Op::Lt,
            "le" => Op::Le,
            "gt" => Op::Gt,
            "ge" => Op::Ge,
            "invert" => Op::Invert,
            "negate" => Op::Negate,
            "cast" => {
                Op::Cast(parse_type_operand(operand.ok_or_else(|| Error::argument("cast missing operand"))?)?)
            }
            "index" => Op::Index,
            "slice" => {
                let operand = operand.ok_or_else(|| Error::argument("slice missing operands"))?;
                let (start_str, width_str) =
                    operand.split_once(' ').ok_or_else(|| Error::argument("slice needs start and width"))?;
                let start: u32 = start_str.parse().map_err(|_| Error::argument("bad slice start"))?;
                let width: u32 = width_str.parse().map_err(|_| Error::argument("bad slice width"))?;
                Op::Slice { start, width }
            }
            "width_slice" => {
                let width: u32 = operand
                    .ok_or_else(|| Error::argument("width_slice missing operand"))?
                    .parse()
                    .map_err(|_| Error::argument("bad width_slice operand"))?;
                Op::WidthSlice { width }
            }
            "create_tuple" => Op::CreateTuple(
                operand
                    .ok_or_else(|| Error::argument("create_tuple missing operand"))?
                    .parse()
                    .map_err(|_| Error::argument("bad create_tuple operand"))?,
            ),
            "create_array" => Op::CreateArray(
                operand
                    .ok_or_else(|| Error::argument("create_array missing operand"))?
                    .parse()
                    .map_err(|_| Error::argument("bad create_array operand"))?,
            ),
            "expand_tuple" => Op::ExpandTuple,
            "call" => {
                let _ = operand;
                return Err(Error::argument("call round-trip is not supported for user fn operands"));
            }
            "jump_rel" => Op::JumpRel(parse_signed_offset(
                operand.ok_or_else(|| Error::argument("jump_rel missing operand"))?,
            )?),
            "jump_rel_if" => Op::JumpRelIf(parse_signed_offset(
                operand.ok_or_else(|| Error::argument("jump_rel_if missing operand"))?,
            )?),
            "jump_dest" => Op::JumpDest,
            "return" => Op::Return,
            other => return Err(Error::argument(format!("unknown mnemonic: {}", other))),
        };
        out.push(Bytecode::new(op, Span::dummy()));
    }
    Ok(out)
}

fn parse_signed_offset(s: &str) -> Result<i32> {
    let s = s.strip_prefix('+').unwrap_or(s);
    s.parse().map_err(|_| Error::argument(format!("bad jump offset: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Span;

    #[test]
    fn roundtrip_ternary_sequence() {
        let ops = vec![
            Bytecode::new(Op::Literal(Value::UBits(Bits::from_unsigned(1, BigUint::from(1u8)))), Span::dummy()),
            Bytecode::new(Op::JumpRelIf(3), Span::dummy()),
            Bytecode::new(Op::Literal(Value::u32(64)), Span::dummy()),
            Bytecode::new(Op::JumpRel(3), Span::dummy()),
            Bytecode::new(Op::JumpDest, Span::dummy()),
            Bytecode::new(Op::Literal(Value::u32(42)), Span::dummy()),
            Bytecode::new(Op::JumpDest, Span::dummy()),
        ];
        let text = render(&ops);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, ops);
    }

    #[test]
    fn roundtrip_add_sequence() {
        let ops = vec![
            Bytecode::new(Op::Literal(Value::u32(1)), Span::dummy()),
            Bytecode::new(Op::Store(0), Span::dummy()),
            Bytecode::new(Op::Load(0), Span::dummy()),
            Bytecode::new(Op::Literal(Value::u32(2)), Span::dummy()),
            Bytecode::new(Op::Add, Span::dummy()),
        ];
        let text = render(&ops);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, ops);
    }
}
