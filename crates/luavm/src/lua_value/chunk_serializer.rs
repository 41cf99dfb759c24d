// Chunk serializer/deserializer for precompiled Lua 5.3 binary chunks
// Format follows ldump.c / lundump.c byte for byte

use std::io::{Cursor, Read};
use std::rc::Rc;

use smol_str::SmolStr;

use super::{Chunk, LocVar, LuaString, LuaValue, UpvalueDesc};
use crate::lua_vm::{Instruction, LuaError, LuaResult};

// ===== Header =====
pub const LUA_SIGNATURE: &[u8; 4] = b"\x1bLua";
const LUAC_VERSION: u8 = 0x53;
const LUAC_FORMAT: u8 = 0;
const LUAC_DATA: &[u8; 6] = b"\x19\x93\r\n\x1a\n";
const CINT_SIZE: u8 = 4;
const CSIZET_SIZE: u8 = 8;
const INSTRUCTION_SIZE: u8 = 4;
const LUA_INTEGER_SIZE: u8 = 8;
const LUA_NUMBER_SIZE: u8 = 8;
const LUAC_INT: i64 = 0x5678;
const LUAC_NUM: f64 = 370.5;

// ===== Constant tags =====
const TAG_NIL: u8 = 0x00;
const TAG_BOOLEAN: u8 = 0x01;
const TAG_NUMBER: u8 = 0x03;
const TAG_INTEGER: u8 = 0x13;
const TAG_SHORT_STR: u8 = 0x04;
const TAG_LONG_STR: u8 = 0x14;

/// Does `data` start with the binary chunk signature?
pub fn is_binary_chunk(data: &[u8]) -> bool {
    data.starts_with(LUA_SIGNATURE)
}

/// Deserialize a binary chunk into its main function prototype
pub fn undump(data: &[u8]) -> LuaResult<Rc<Chunk>> {
    let mut cursor = Cursor::new(data);
    check_header(&mut cursor)?;
    // upvalue count of the main function, repeated in its descriptor list
    read_u8(&mut cursor)?;
    let chunk = read_function(&mut cursor, None)?;
    Ok(Rc::new(chunk))
}

/// Serialize a prototype tree into the binary chunk format
pub fn dump(chunk: &Chunk) -> LuaResult<Vec<u8>> {
    let mut buf = Vec::new();
    write_header(&mut buf);
    buf.push(chunk.upvalue_descs.len() as u8);
    write_function(&mut buf, chunk, None)?;
    Ok(buf)
}

fn check_header(cursor: &mut Cursor<&[u8]>) -> LuaResult<()> {
    if read_bytes(cursor, 4)? != LUA_SIGNATURE {
        return Err(LuaError::chunk("not a precompiled chunk"));
    }
    if read_u8(cursor)? != LUAC_VERSION {
        return Err(LuaError::chunk("version mismatch"));
    }
    if read_u8(cursor)? != LUAC_FORMAT {
        return Err(LuaError::chunk("format mismatch"));
    }
    if read_bytes(cursor, 6)? != LUAC_DATA {
        return Err(LuaError::chunk("corrupted"));
    }
    for (expected, what) in [
        (CINT_SIZE, "int"),
        (CSIZET_SIZE, "size_t"),
        (INSTRUCTION_SIZE, "Instruction"),
        (LUA_INTEGER_SIZE, "lua_Integer"),
        (LUA_NUMBER_SIZE, "lua_Number"),
    ] {
        if read_u8(cursor)? != expected {
            return Err(LuaError::chunk(format!("{} size mismatch", what)));
        }
    }
    if read_i64(cursor)? != LUAC_INT {
        return Err(LuaError::chunk("endianness mismatch"));
    }
    if read_f64(cursor)? != LUAC_NUM {
        return Err(LuaError::chunk("float format mismatch"));
    }
    Ok(())
}

fn read_function(cursor: &mut Cursor<&[u8]>, parent_source: Option<&SmolStr>) -> LuaResult<Chunk> {
    let source = match read_string(cursor)? {
        Some(bytes) => Some(SmolStr::new(String::from_utf8_lossy(&bytes))),
        None => parent_source.cloned(),
    };
    let line_defined = read_u32(cursor)?;
    let last_line_defined = read_u32(cursor)?;
    let num_params = read_u8(cursor)?;
    let is_vararg = read_u8(cursor)? != 0;
    let max_stack_size = read_u8(cursor)?;

    let n = read_count(cursor, 4)?;
    let mut code = Vec::with_capacity(n);
    for _ in 0..n {
        code.push(Instruction::from_u32(read_u32(cursor)?));
    }

    let n = read_count(cursor, 1)?;
    let mut constants = Vec::with_capacity(n);
    for _ in 0..n {
        constants.push(read_constant(cursor)?);
    }

    let n = read_count(cursor, 2)?;
    let mut upvalue_descs = Vec::with_capacity(n);
    for _ in 0..n {
        let in_stack = read_u8(cursor)? != 0;
        let index = read_u8(cursor)?;
        upvalue_descs.push(UpvalueDesc { in_stack, index });
    }

    let n = read_count(cursor, 1)?;
    let mut child_protos = Vec::with_capacity(n);
    for _ in 0..n {
        child_protos.push(Rc::new(read_function(cursor, source.as_ref())?));
    }

    let n = read_count(cursor, 4)?;
    let mut line_info = Vec::with_capacity(n);
    for _ in 0..n {
        line_info.push(read_u32(cursor)?);
    }

    let n = read_count(cursor, 9)?;
    let mut locals = Vec::with_capacity(n);
    for _ in 0..n {
        let name = read_name(cursor)?;
        let start_pc = read_u32(cursor)?;
        let end_pc = read_u32(cursor)?;
        locals.push(LocVar {
            name,
            start_pc,
            end_pc,
        });
    }

    let n = read_count(cursor, 1)?;
    let mut upvalue_names = Vec::with_capacity(n);
    for _ in 0..n {
        upvalue_names.push(read_name(cursor)?);
    }

    Ok(Chunk {
        source,
        line_defined,
        last_line_defined,
        num_params,
        is_vararg,
        max_stack_size,
        code,
        constants,
        upvalue_descs,
        child_protos,
        line_info,
        locals,
        upvalue_names,
    })
}

fn read_constant(cursor: &mut Cursor<&[u8]>) -> LuaResult<LuaValue> {
    let tag = read_u8(cursor)?;
    match tag {
        TAG_NIL => Ok(LuaValue::Nil),
        TAG_BOOLEAN => Ok(LuaValue::Boolean(read_u8(cursor)? != 0)),
        TAG_INTEGER => Ok(LuaValue::Integer(read_i64(cursor)?)),
        TAG_NUMBER => Ok(LuaValue::Float(read_f64(cursor)?)),
        TAG_SHORT_STR | TAG_LONG_STR => {
            let bytes = read_string(cursor)?.unwrap_or_default();
            Ok(LuaValue::String(LuaString::from(bytes)))
        }
        _ => Err(LuaError::chunk(format!("unknown constant tag 0x{:02x}", tag))),
    }
}

fn write_header(buf: &mut Vec<u8>) {
    buf.extend_from_slice(LUA_SIGNATURE);
    buf.push(LUAC_VERSION);
    buf.push(LUAC_FORMAT);
    buf.extend_from_slice(LUAC_DATA);
    buf.extend_from_slice(&[
        CINT_SIZE,
        CSIZET_SIZE,
        INSTRUCTION_SIZE,
        LUA_INTEGER_SIZE,
        LUA_NUMBER_SIZE,
    ]);
    write_i64(buf, LUAC_INT);
    write_f64(buf, LUAC_NUM);
}

fn write_function(buf: &mut Vec<u8>, chunk: &Chunk, parent_source: Option<&SmolStr>) -> LuaResult<()> {
    // a child sharing its parent's source stores none
    match &chunk.source {
        Some(source) if Some(source) != parent_source => write_string(buf, Some(source.as_bytes())),
        _ => write_string(buf, None),
    }
    write_u32(buf, chunk.line_defined);
    write_u32(buf, chunk.last_line_defined);
    buf.push(chunk.num_params);
    buf.push(chunk.is_vararg as u8);
    buf.push(chunk.max_stack_size);

    write_u32(buf, chunk.code.len() as u32);
    for instr in &chunk.code {
        write_u32(buf, instr.as_u32());
    }

    write_u32(buf, chunk.constants.len() as u32);
    for constant in &chunk.constants {
        write_constant(buf, constant)?;
    }

    write_u32(buf, chunk.upvalue_descs.len() as u32);
    for desc in &chunk.upvalue_descs {
        buf.push(desc.in_stack as u8);
        buf.push(desc.index);
    }

    write_u32(buf, chunk.child_protos.len() as u32);
    for child in &chunk.child_protos {
        write_function(buf, child, chunk.source.as_ref())?;
    }

    write_u32(buf, chunk.line_info.len() as u32);
    for &line in &chunk.line_info {
        write_u32(buf, line);
    }

    write_u32(buf, chunk.locals.len() as u32);
    for local in &chunk.locals {
        write_string(buf, Some(local.name.as_bytes()));
        write_u32(buf, local.start_pc);
        write_u32(buf, local.end_pc);
    }

    write_u32(buf, chunk.upvalue_names.len() as u32);
    for name in &chunk.upvalue_names {
        write_string(buf, Some(name.as_bytes()));
    }
    Ok(())
}

fn write_constant(buf: &mut Vec<u8>, value: &LuaValue) -> LuaResult<()> {
    match value {
        LuaValue::Nil => buf.push(TAG_NIL),
        LuaValue::Boolean(b) => {
            buf.push(TAG_BOOLEAN);
            buf.push(*b as u8);
        }
        LuaValue::Integer(i) => {
            buf.push(TAG_INTEGER);
            write_i64(buf, *i);
        }
        LuaValue::Float(f) => {
            buf.push(TAG_NUMBER);
            write_f64(buf, *f);
        }
        LuaValue::String(s) => {
            // LUAI_MAXSHORTLEN
            buf.push(if s.len() <= 40 { TAG_SHORT_STR } else { TAG_LONG_STR });
            write_string(buf, Some(s.as_bytes()));
        }
        other => {
            return Err(LuaError::chunk(format!(
                "cannot dump a {} constant",
                other.type_name()
            )));
        }
    }
    Ok(())
}

fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_i64(buf: &mut Vec<u8>, value: i64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Size byte holds length + 1 (0 = no string); 0xFF escapes to an 8-byte size
fn write_string(buf: &mut Vec<u8>, s: Option<&[u8]>) {
    let Some(s) = s else {
        buf.push(0);
        return;
    };
    let size = s.len() + 1;
    if size < 0xFF {
        buf.push(size as u8);
    } else {
        buf.push(0xFF);
        buf.extend_from_slice(&(size as u64).to_le_bytes());
    }
    buf.extend_from_slice(s);
}

fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    let len = cursor.get_ref().len() as u64;
    len.saturating_sub(cursor.position()) as usize
}

fn read_bytes(cursor: &mut Cursor<&[u8]>, n: usize) -> LuaResult<Vec<u8>> {
    if n > remaining(cursor) {
        return Err(LuaError::chunk("truncated chunk"));
    }
    let mut bytes = vec![0u8; n];
    cursor
        .read_exact(&mut bytes)
        .map_err(|e| LuaError::chunk(format!("truncated chunk: {}", e)))?;
    Ok(bytes)
}

fn read_array<const N: usize>(cursor: &mut Cursor<&[u8]>) -> LuaResult<[u8; N]> {
    let mut bytes = [0u8; N];
    cursor
        .read_exact(&mut bytes)
        .map_err(|e| LuaError::chunk(format!("truncated chunk: {}", e)))?;
    Ok(bytes)
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> LuaResult<u8> {
    Ok(read_array::<1>(cursor)?[0])
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> LuaResult<u32> {
    Ok(u32::from_le_bytes(read_array(cursor)?))
}

fn read_i64(cursor: &mut Cursor<&[u8]>) -> LuaResult<i64> {
    Ok(i64::from_le_bytes(read_array(cursor)?))
}

fn read_f64(cursor: &mut Cursor<&[u8]>) -> LuaResult<f64> {
    Ok(f64::from_le_bytes(read_array(cursor)?))
}

/// Element count of an array whose elements take at least `min_elem_size` bytes each
fn read_count(cursor: &mut Cursor<&[u8]>, min_elem_size: usize) -> LuaResult<usize> {
    let n = read_u32(cursor)? as usize;
    if n.saturating_mul(min_elem_size) > remaining(cursor) {
        return Err(LuaError::chunk(format!("corrupt length {}", n)));
    }
    Ok(n)
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> LuaResult<Option<Vec<u8>>> {
    let mut size = read_u8(cursor)? as u64;
    if size == 0xFF {
        size = u64::from_le_bytes(read_array(cursor)?);
    }
    if size == 0 {
        return Ok(None);
    }
    let len = usize::try_from(size - 1).map_err(|_| LuaError::chunk("corrupt string length"))?;
    read_bytes(cursor, len).map(Some)
}

fn read_name(cursor: &mut Cursor<&[u8]>) -> LuaResult<SmolStr> {
    let bytes = read_string(cursor)?.unwrap_or_default();
    Ok(SmolStr::new(String::from_utf8_lossy(&bytes)))
}
