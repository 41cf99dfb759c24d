mod instruction;

pub use instruction::Instruction;

use crate::lua_vm::execute::*;
use crate::lua_vm::{LuaResult, LuaState};

/// Instruction format modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    IABC,
    IABx,
    IAsBx,
    IAx,
}

/// How an instruction uses its B or C operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpArgMask {
    /// Argument is not used
    N,
    /// Argument is used
    U,
    /// Argument is a register or a jump offset
    R,
    /// Argument is a constant or register/constant
    K,
}

/// Complete Lua 5.3 Opcode Set (47 opcodes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Move = 0, // R(A) := R(B)
    LoadK,    // R(A) := Kst(Bx)
    LoadKX,   // R(A) := Kst(extra arg)
    LoadBool, // R(A) := (Bool)B; if (C) pc++
    LoadNil,  // R(A), R(A+1), ..., R(A+B) := nil
    GetUpval, // R(A) := UpValue[B]
    GetTabUp, // R(A) := UpValue[B][RK(C)]
    GetTable, // R(A) := R(B)[RK(C)]
    SetTabUp, // UpValue[A][RK(B)] := RK(C)
    SetUpval, // UpValue[B] := R(A)
    SetTable, // R(A)[RK(B)] := RK(C)
    NewTable, // R(A) := {} (size = B,C)
    Self_,    // R(A+1) := R(B); R(A) := R(B)[RK(C)]
    Add,      // R(A) := RK(B) + RK(C)
    Sub,      // R(A) := RK(B) - RK(C)
    Mul,      // R(A) := RK(B) * RK(C)
    Mod,      // R(A) := RK(B) % RK(C)
    Pow,      // R(A) := RK(B) ^ RK(C)
    Div,      // R(A) := RK(B) / RK(C)
    IDiv,     // R(A) := RK(B) // RK(C)
    BAnd,     // R(A) := RK(B) & RK(C)
    BOr,      // R(A) := RK(B) | RK(C)
    BXor,     // R(A) := RK(B) ~ RK(C)
    Shl,      // R(A) := RK(B) << RK(C)
    Shr,      // R(A) := RK(B) >> RK(C)
    Unm,      // R(A) := -R(B)
    BNot,     // R(A) := ~R(B)
    Not,      // R(A) := not R(B)
    Len,      // R(A) := length of R(B)
    Concat,   // R(A) := R(B).. ... ..R(C)
    Jmp,      // pc+=sBx; if (A) close all upvalues >= R(A - 1)
    Eq,       // if ((RK(B) == RK(C)) ~= A) then pc++
    Lt,       // if ((RK(B) <  RK(C)) ~= A) then pc++
    Le,       // if ((RK(B) <= RK(C)) ~= A) then pc++
    Test,     // if not (R(A) <=> C) then pc++
    TestSet,  // if (R(B) <=> C) then R(A) := R(B) else pc++
    Call,     // R(A), ... ,R(A+C-2) := R(A)(R(A+1), ... ,R(A+B-1))
    TailCall, // return R(A)(R(A+1), ... ,R(A+B-1))
    Return,   // return R(A), ... ,R(A+B-2)
    ForLoop,  // R(A)+=R(A+2); if R(A) <?= R(A+1) then { pc+=sBx; R(A+3)=R(A) }
    ForPrep,  // R(A)-=R(A+2); pc+=sBx
    TForCall, // R(A+3), ... ,R(A+2+C) := R(A)(R(A+1), R(A+2));
    TForLoop, // if R(A+1) ~= nil then { R(A)=R(A+1); pc += sBx }
    SetList,  // R(A)[(C-1)*FPF+i] := R(A+i), 1 <= i <= B
    Closure,  // R(A) := closure(KPROTO[Bx])
    VarArg,   // R(A), R(A+1), ..., R(A+B-2) = vararg
    ExtraArg, // extra (larger) argument for previous opcode
}

/// Handler executing one decoded instruction against the running frame
pub type OpAction = fn(&mut LuaState, Instruction) -> LuaResult<()>;

/// Static description of one opcode
#[derive(Clone, Copy)]
pub struct OpCodeInfo {
    /// Operator is a test (next instruction must be a jump)
    pub test_flag: bool,
    /// Instruction sets register A
    pub set_a_flag: bool,
    pub arg_b_mode: OpArgMask,
    pub arg_c_mode: OpArgMask,
    pub op_mode: OpMode,
    pub name: &'static str,
    pub action: Option<OpAction>,
}

const fn op(
    test_flag: bool,
    set_a_flag: bool,
    arg_b_mode: OpArgMask,
    arg_c_mode: OpArgMask,
    op_mode: OpMode,
    name: &'static str,
    action: Option<OpAction>,
) -> OpCodeInfo {
    OpCodeInfo {
        test_flag,
        set_a_flag,
        arg_b_mode,
        arg_c_mode,
        op_mode,
        name,
        action,
    }
}

use OpArgMask::{K, N, R, U};
use OpMode::{IABC, IABx, IAsBx, IAx};

#[rustfmt::skip]
pub static OP_CODES: [OpCodeInfo; OpCode::COUNT] = [
    /*     T      A      B  C  mode   name        action */
    op(false, true,  R, N, IABC,  "MOVE",     Some(exec_move)),
    op(false, true,  K, N, IABx,  "LOADK",    Some(exec_loadk)),
    op(false, true,  N, N, IABx,  "LOADKX",   Some(exec_loadkx)),
    op(false, true,  U, U, IABC,  "LOADBOOL", Some(exec_loadbool)),
    op(false, true,  U, N, IABC,  "LOADNIL",  Some(exec_loadnil)),
    op(false, true,  U, N, IABC,  "GETUPVAL", Some(exec_getupval)),
    op(false, true,  U, K, IABC,  "GETTABUP", Some(exec_gettabup)),
    op(false, true,  R, K, IABC,  "GETTABLE", Some(exec_gettable)),
    op(false, false, K, K, IABC,  "SETTABUP", Some(exec_settabup)),
    op(false, false, U, N, IABC,  "SETUPVAL", Some(exec_setupval)),
    op(false, false, K, K, IABC,  "SETTABLE", Some(exec_settable)),
    op(false, true,  U, U, IABC,  "NEWTABLE", Some(exec_newtable)),
    op(false, true,  R, K, IABC,  "SELF",     Some(exec_self)),
    op(false, true,  K, K, IABC,  "ADD",      Some(exec_add)),
    op(false, true,  K, K, IABC,  "SUB",      Some(exec_sub)),
    op(false, true,  K, K, IABC,  "MUL",      Some(exec_mul)),
    op(false, true,  K, K, IABC,  "MOD",      Some(exec_mod)),
    op(false, true,  K, K, IABC,  "POW",      Some(exec_pow)),
    op(false, true,  K, K, IABC,  "DIV",      Some(exec_div)),
    op(false, true,  K, K, IABC,  "IDIV",     Some(exec_idiv)),
    op(false, true,  K, K, IABC,  "BAND",     Some(exec_band)),
    op(false, true,  K, K, IABC,  "BOR",      Some(exec_bor)),
    op(false, true,  K, K, IABC,  "BXOR",     Some(exec_bxor)),
    op(false, true,  K, K, IABC,  "SHL",      Some(exec_shl)),
    op(false, true,  K, K, IABC,  "SHR",      Some(exec_shr)),
    op(false, true,  R, N, IABC,  "UNM",      Some(exec_unm)),
    op(false, true,  R, N, IABC,  "BNOT",     Some(exec_bnot)),
    op(false, true,  R, N, IABC,  "NOT",      Some(exec_not)),
    op(false, true,  R, N, IABC,  "LEN",      Some(exec_len)),
    op(false, true,  R, R, IABC,  "CONCAT",   Some(exec_concat)),
    op(false, false, R, N, IAsBx, "JMP",      Some(exec_jmp)),
    op(true,  false, K, K, IABC,  "EQ",       Some(exec_eq)),
    op(true,  false, K, K, IABC,  "LT",       Some(exec_lt)),
    op(true,  false, K, K, IABC,  "LE",       Some(exec_le)),
    op(true,  false, N, U, IABC,  "TEST",     Some(exec_test)),
    op(true,  true,  R, U, IABC,  "TESTSET",  Some(exec_testset)),
    op(false, true,  U, U, IABC,  "CALL",     Some(exec_call)),
    op(false, true,  U, U, IABC,  "TAILCALL", Some(exec_tailcall)),
    op(false, false, U, N, IABC,  "RETURN",   Some(exec_return)),
    op(false, true,  R, N, IAsBx, "FORLOOP",  Some(exec_forloop)),
    op(false, true,  R, N, IAsBx, "FORPREP",  Some(exec_forprep)),
    op(false, false, N, U, IABC,  "TFORCALL", Some(exec_tforcall)),
    op(false, true,  R, N, IAsBx, "TFORLOOP", Some(exec_tforloop)),
    op(false, false, U, U, IABC,  "SETLIST",  Some(exec_setlist)),
    op(false, true,  U, N, IABx,  "CLOSURE",  Some(exec_closure)),
    op(false, true,  U, N, IABC,  "VARARG",   Some(exec_vararg)),
    // only ever read as the operand of LOADKX / SETLIST
    op(false, false, U, U, IAx,   "EXTRAARG", None),
];

impl OpCode {
    pub const COUNT: usize = 47;

    const ALL: [OpCode; OpCode::COUNT] = [
        OpCode::Move,
        OpCode::LoadK,
        OpCode::LoadKX,
        OpCode::LoadBool,
        OpCode::LoadNil,
        OpCode::GetUpval,
        OpCode::GetTabUp,
        OpCode::GetTable,
        OpCode::SetTabUp,
        OpCode::SetUpval,
        OpCode::SetTable,
        OpCode::NewTable,
        OpCode::Self_,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::Mod,
        OpCode::Pow,
        OpCode::Div,
        OpCode::IDiv,
        OpCode::BAnd,
        OpCode::BOr,
        OpCode::BXor,
        OpCode::Shl,
        OpCode::Shr,
        OpCode::Unm,
        OpCode::BNot,
        OpCode::Not,
        OpCode::Len,
        OpCode::Concat,
        OpCode::Jmp,
        OpCode::Eq,
        OpCode::Lt,
        OpCode::Le,
        OpCode::Test,
        OpCode::TestSet,
        OpCode::Call,
        OpCode::TailCall,
        OpCode::Return,
        OpCode::ForLoop,
        OpCode::ForPrep,
        OpCode::TForCall,
        OpCode::TForLoop,
        OpCode::SetList,
        OpCode::Closure,
        OpCode::VarArg,
        OpCode::ExtraArg,
    ];

    #[inline(always)]
    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::ALL.get(byte as usize).copied()
    }

    #[inline(always)]
    pub fn info(self) -> &'static OpCodeInfo {
        &OP_CODES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn get_mode(self) -> OpMode {
        self.info().op_mode
    }

    pub fn is_test(self) -> bool {
        self.info().test_flag
    }
}
