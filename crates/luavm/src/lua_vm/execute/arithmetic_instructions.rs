/*----------------------------------------------------------------------
  Arithmetic and bitwise operators

  Each operator carries an integer implementation, a float
  implementation, or both, plus the metamethod consulted when the
  operands do not coerce:
  - integer-only (bitwise): both operands must convert to integers
  - float-only (/, ^): always computed in floats
  - both: integer path only when both operands are integers already,
    otherwise both are converted to floats (strings included)
----------------------------------------------------------------------*/

use crate::lua_value::LuaValue;
use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState};

use super::metamethod::TmKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ArithOp {
    Add = 0,
    Sub,
    Mul,
    Mod,
    Pow,
    Div,
    IDiv,
    BAnd,
    BOr,
    BXor,
    Shl,
    Shr,
    Unm,
    BNot,
}

impl ArithOp {
    pub fn is_unary(self) -> bool {
        matches!(self, ArithOp::Unm | ArithOp::BNot)
    }

    pub fn is_bitwise(self) -> bool {
        OPERATORS[self as usize].float_func.is_none()
    }
}

type IntegerFunc = fn(i64, i64) -> LuaResult<i64>;
type FloatFunc = fn(f64, f64) -> f64;

struct Operator {
    metamethod: TmKind,
    integer_func: Option<IntegerFunc>,
    float_func: Option<FloatFunc>,
}

// ===== Integer / float primitives =====

/// Floor division on integers
pub fn lua_idiv(a: i64, b: i64) -> LuaResult<i64> {
    if b == 0 {
        return Err(LuaError::runtime("attempt to perform 'n//0'"));
    }
    if b == -1 {
        // avoids overflow of MIN / -1
        return Ok(a.wrapping_neg());
    }
    let q = a / b;
    if a % b != 0 && (a < 0) != (b < 0) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Integer modulo with the sign of the divisor
pub fn lua_imod(a: i64, b: i64) -> LuaResult<i64> {
    if b == 0 {
        return Err(LuaError::runtime("attempt to perform 'n%%0'"));
    }
    if b == -1 {
        return Ok(0);
    }
    let r = a % b;
    if r != 0 && (r ^ b) < 0 {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Float modulo with the sign of the divisor
pub fn lua_fmod(a: f64, b: f64) -> f64 {
    let m = a % b;
    if m * b < 0.0 { m + b } else { m }
}

/// Logical shift left; negative counts shift right, |n| >= 64 yields 0
pub fn lua_shiftl(a: i64, n: i64) -> i64 {
    if n <= -64 || n >= 64 {
        0
    } else if n >= 0 {
        ((a as u64) << n) as i64
    } else {
        ((a as u64) >> -n) as i64
    }
}

pub fn lua_shiftr(a: i64, n: i64) -> i64 {
    lua_shiftl(a, n.wrapping_neg())
}

static OPERATORS: [Operator; 14] = [
    Operator {
        metamethod: TmKind::Add,
        integer_func: Some(|a, b| Ok(a.wrapping_add(b))),
        float_func: Some(|a, b| a + b),
    },
    Operator {
        metamethod: TmKind::Sub,
        integer_func: Some(|a, b| Ok(a.wrapping_sub(b))),
        float_func: Some(|a, b| a - b),
    },
    Operator {
        metamethod: TmKind::Mul,
        integer_func: Some(|a, b| Ok(a.wrapping_mul(b))),
        float_func: Some(|a, b| a * b),
    },
    Operator {
        metamethod: TmKind::Mod,
        integer_func: Some(lua_imod),
        float_func: Some(lua_fmod),
    },
    Operator {
        metamethod: TmKind::Pow,
        integer_func: None,
        float_func: Some(f64::powf),
    },
    Operator {
        metamethod: TmKind::Div,
        integer_func: None,
        float_func: Some(|a, b| a / b),
    },
    Operator {
        metamethod: TmKind::IDiv,
        integer_func: Some(lua_idiv),
        float_func: Some(|a, b| (a / b).floor()),
    },
    Operator {
        metamethod: TmKind::Band,
        integer_func: Some(|a, b| Ok(a & b)),
        float_func: None,
    },
    Operator {
        metamethod: TmKind::Bor,
        integer_func: Some(|a, b| Ok(a | b)),
        float_func: None,
    },
    Operator {
        metamethod: TmKind::Bxor,
        integer_func: Some(|a, b| Ok(a ^ b)),
        float_func: None,
    },
    Operator {
        metamethod: TmKind::Shl,
        integer_func: Some(|a, b| Ok(lua_shiftl(a, b))),
        float_func: None,
    },
    Operator {
        metamethod: TmKind::Shr,
        integer_func: Some(|a, b| Ok(lua_shiftr(a, b))),
        float_func: None,
    },
    Operator {
        metamethod: TmKind::Unm,
        integer_func: Some(|a, _| Ok(a.wrapping_neg())),
        float_func: Some(|a, _| -a),
    },
    Operator {
        metamethod: TmKind::Bnot,
        integer_func: Some(|a, _| Ok(!a)),
        float_func: None,
    },
];

/// Apply `op` without metamethods; `Ok(None)` when the operands do not coerce
pub(crate) fn arith_raw(a: &LuaValue, b: &LuaValue, op: ArithOp) -> LuaResult<Option<LuaValue>> {
    let operator = &OPERATORS[op as usize];
    match (operator.integer_func, operator.float_func) {
        (Some(integer_func), None) => match (a.to_integer(), b.to_integer()) {
            (Some(x), Some(y)) => Ok(Some(LuaValue::Integer(integer_func(x, y)?))),
            _ => Ok(None),
        },
        (integer_func, Some(float_func)) => {
            if let (Some(integer_func), LuaValue::Integer(x), LuaValue::Integer(y)) =
                (integer_func, a, b)
            {
                return Ok(Some(LuaValue::Integer(integer_func(*x, *y)?)));
            }
            match (a.to_float(), b.to_float()) {
                (Some(x), Some(y)) => Ok(Some(LuaValue::Float(float_func(x, y)))),
                _ => Ok(None),
            }
        }
        (None, None) => Ok(None),
    }
}

fn arith_error(a: &LuaValue, b: &LuaValue, op: ArithOp) -> LuaError {
    let culprit = if a.to_number().is_none() { a } else { b };
    if op.is_bitwise() {
        if a.to_number().is_some() && b.to_number().is_some() {
            return LuaError::type_error("number has no integer representation");
        }
        LuaError::type_error(format!(
            "attempt to perform bitwise operation on a {} value",
            culprit.type_name()
        ))
    } else {
        LuaError::type_error(format!(
            "attempt to perform arithmetic on a {} value",
            culprit.type_name()
        ))
    }
}

impl LuaState {
    /// Pop the operand(s), push the result. Unary operators use the top value for both operands.
    pub fn arith(&mut self, op: ArithOp) -> LuaResult<()> {
        let b = self.pop_value()?;
        let a = if op.is_unary() {
            b.clone()
        } else {
            self.pop_value()?
        };
        if let Some(result) = arith_raw(&a, &b, op)? {
            return self.push(result);
        }
        let event = OPERATORS[op as usize].metamethod;
        match self.call_metamethod(&a, &b, event)? {
            Some(result) => self.push(result),
            None => Err(arith_error(&a, &b, op)),
        }
    }
}

// ===== Handlers =====

// R(A) := RK(B) op RK(C)
fn binary_arith(lua_state: &mut LuaState, instr: Instruction, op: ArithOp) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    lua_state.get_rk(instr.get_b())?;
    lua_state.get_rk(instr.get_c())?;
    lua_state.arith(op)?;
    lua_state.replace(a)
}

// R(A) := op R(B)
fn unary_arith(lua_state: &mut LuaState, instr: Instruction, op: ArithOp) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    lua_state.push_value(b)?;
    lua_state.arith(op)?;
    lua_state.replace(a)
}

pub fn exec_add(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::Add)
}

pub fn exec_sub(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::Sub)
}

pub fn exec_mul(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::Mul)
}

pub fn exec_mod(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::Mod)
}

pub fn exec_pow(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::Pow)
}

pub fn exec_div(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::Div)
}

pub fn exec_idiv(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::IDiv)
}

pub fn exec_band(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::BAnd)
}

pub fn exec_bor(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::BOr)
}

pub fn exec_bxor(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::BXor)
}

pub fn exec_shl(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::Shl)
}

pub fn exec_shr(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    binary_arith(lua_state, instr, ArithOp::Shr)
}

pub fn exec_unm(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    unary_arith(lua_state, instr, ArithOp::Unm)
}

pub fn exec_bnot(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    unary_arith(lua_state, instr, ArithOp::BNot)
}

/// NOT: R(A) := not R(B)
pub fn exec_not(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    let value = !lua_state.to_boolean(b);
    lua_state.push_boolean(value)?;
    lua_state.replace(a)
}
