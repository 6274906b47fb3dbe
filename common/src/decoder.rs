
use crate::isa::Reg;

// One meaning per opcode byte. The machine's encoding reuses a few byte
// values historically claimed by segment-register push/pop; those spellings
// lost the collision and are not encodable (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    MovImm,   // 0x01: reg, imm16 (high byte first)
    Add,      // 0x02: reg, reg
    Jmp,      // 0x03: addr16
    Sub,      // 0x04: reg, reg
    And,      // 0x05
    Shl,      // 0x06: reg, count
    Or,       // 0x07
    Xor,      // 0x08
    Not,      // 0x09: reg
    Cmp,      // 0x0A: reg, reg (flags only)
    Jz,       // 0x0B: addr16
    Call,     // 0x0C: addr16
    Ret,      // 0x0D
    Inc,      // 0x0E: reg
    Dec,      // 0x0F: reg
    Mul,      // 0x10: reg (AX * reg -> DX:AX)
    Div,      // 0x11: reg (DX:AX / reg)
    Loop,     // 0x12: reg, rel8
    IntFlag,  // 0x13: 0x01 = STI, else CLI
    Jnz,      // 0x14: addr16
    Jg,       // 0x15: addr16 (signed)
    Test,     // 0x17: reg, reg (flags only)
    JmpShort, // 0x1B: rel8
    Jc,       // 0x1C: addr16
    Jnc,      // 0x1D: addr16
    StoreAx,  // 0x1E: mov [bx], ax
    LoadAx,   // 0x1F: mov ax, [bx]
    Adc,      // 0x20: reg, reg
    Sbb,      // 0x21: reg, reg
    Clc,      // 0x22
    Stc,      // 0x23
    Lodsb,    // 0x24: al <- [ds:si]
    Stosb,    // 0x25: [es:di] <- al
    Pusha,    // 0x26
    Popa,     // 0x27
    Rol,      // 0x28: reg, count
    Ror,      // 0x29: reg, count
    Push(Reg), // 0x50..=0x57
    Pop(Reg),  // 0x58..=0x5F
    Lea,      // 0x8D: reg, addr16
    PushFlags, // 0x9C
    PopFlags,  // 0x9D
    Movsb,    // 0xA4
    Cmpsb,    // 0xA6
    Scasb,    // 0xAE
    MovAxImm, // 0xB8: imm16 (low byte first)
    Int,      // 0xCD: intnum
    In,       // 0xE4: port8
    Out,      // 0xE6: port8
    Rep,      // 0xF3 prefix
    Cld,      // 0xFC
    Std,      // 0xFD
    Halt,     // 0xFF
    Db(u8),   // Anything unmapped executes as a no-op
}

pub fn decode(byte: u8) -> Opcode {
    use Opcode::*;
    match byte {
        0x01 => MovImm,
        0x02 => Add,
        0x03 => Jmp,
        0x04 => Sub,
        0x05 => And,
        0x06 => Shl,
        0x07 => Or,
        0x08 => Xor,
        0x09 => Not,
        0x0A => Cmp,
        0x0B => Jz,
        0x0C => Call,
        0x0D => Ret,
        0x0E => Inc,
        0x0F => Dec,
        0x10 => Mul,
        0x11 => Div,
        0x12 => Loop,
        0x13 => IntFlag,
        0x14 => Jnz,
        0x15 => Jg,
        0x17 => Test,
        0x1B => JmpShort,
        0x1C => Jc,
        0x1D => Jnc,
        0x1E => StoreAx,
        0x1F => LoadAx,
        0x20 => Adc,
        0x21 => Sbb,
        0x22 => Clc,
        0x23 => Stc,
        0x24 => Lodsb,
        0x25 => Stosb,
        0x26 => Pusha,
        0x27 => Popa,
        0x28 => Rol,
        0x29 => Ror,
        0x50..=0x57 => Push(Reg::push_order(byte - 0x50)),
        0x58..=0x5F => Pop(Reg::push_order(byte - 0x58)),
        0x8D => Lea,
        0x9C => PushFlags,
        0x9D => PopFlags,
        0xA4 => Movsb,
        0xA6 => Cmpsb,
        0xAE => Scasb,
        0xB8 => MovAxImm,
        0xCD => Int,
        0xE4 => In,
        0xE6 => Out,
        0xF3 => Rep,
        0xFC => Cld,
        0xFD => Std,
        0xFF => Halt,
        other => Db(other),
    }
}

impl Opcode {
    // Bytes of immediate/register-index operands following the opcode byte.
    pub fn operand_len(self) -> u16 {
        use Opcode::*;
        match self {
            MovImm | Lea => 3,
            Add | Sub | And | Or | Xor | Cmp | Test | Adc | Sbb => 2,
            Shl | Rol | Ror | Loop => 2,
            Jmp | Jz | Jnz | Jg | Jc | Jnc | Call => 2,
            MovAxImm => 2,
            Not | Inc | Dec | Mul | Div | IntFlag | JmpShort | Int | In | Out => 1,
            _ => 0,
        }
    }
}

fn reg_reg(mnemonic: &str, window: &[u8]) -> String {
    format!(
        "{mnemonic} {}, {}",
        Reg::general(window[1]),
        Reg::general(window[2])
    )
}

fn addr16(mnemonic: &str, window: &[u8]) -> String {
    let addr = ((window[1] as u16) << 8) | window[2] as u16;
    format!("{mnemonic} 0x{addr:04X}")
}

// Render the instruction at the front of `window` (which must hold at least
// one byte), returning the text and the full instruction length. A window
// too short for the operands renders as raw data.
pub fn disasm_one(window: &[u8]) -> (String, u16) {
    use Opcode::*;
    let op = decode(window[0]);
    let len = 1 + op.operand_len();
    if (window.len() as u16) < len {
        return (format!("db 0x{:02X}", window[0]), 1);
    }

    let text = match op {
        MovImm => {
            let imm = ((window[2] as u16) << 8) | window[3] as u16;
            format!("mov {}, 0x{imm:04X}", Reg::general(window[1]))
        }
        Add => reg_reg("add", window),
        Sub => reg_reg("sub", window),
        And => reg_reg("and", window),
        Or => reg_reg("or", window),
        Xor => reg_reg("xor", window),
        Cmp => reg_reg("cmp", window),
        Test => reg_reg("test", window),
        Adc => reg_reg("adc", window),
        Sbb => reg_reg("sbb", window),
        Shl => format!("shl {}, {}", Reg::general(window[1]), window[2]),
        Rol => format!("rol {}, {}", Reg::general(window[1]), window[2]),
        Ror => format!("ror {}, {}", Reg::general(window[1]), window[2]),
        Not => format!("not {}", Reg::general(window[1])),
        Inc => format!("inc {}", Reg::general(window[1])),
        Dec => format!("dec {}", Reg::general(window[1])),
        Mul => format!("mul {}", Reg::general(window[1])),
        Div => format!("div {}", Reg::general(window[1])),
        Jmp => addr16("jmp", window),
        Jz => addr16("jz", window),
        Jnz => addr16("jnz", window),
        Jg => addr16("jg", window),
        Jc => addr16("jc", window),
        Jnc => addr16("jnc", window),
        Call => addr16("call", window),
        Ret => "ret".into(),
        Loop => format!("loop {}, {:+}", Reg::general(window[1]), window[2] as i8),
        IntFlag => (if window[1] == 0x01 { "sti" } else { "cli" }).into(),
        JmpShort => format!("jmp short {:+}", window[1] as i8),
        StoreAx => "mov [bx], ax".into(),
        LoadAx => "mov ax, [bx]".into(),
        Clc => "clc".into(),
        Stc => "stc".into(),
        Lodsb => "lodsb".into(),
        Stosb => "stosb".into(),
        Pusha => "pusha".into(),
        Popa => "popa".into(),
        Push(reg) => format!("push {reg}"),
        Pop(reg) => format!("pop {reg}"),
        Lea => {
            let addr = ((window[2] as u16) << 8) | window[3] as u16;
            format!("lea {}, [0x{addr:04X}]", Reg::general(window[1]))
        }
        PushFlags => "pushf".into(),
        PopFlags => "popf".into(),
        Movsb => "movsb".into(),
        Cmpsb => "cmpsb".into(),
        Scasb => "scasb".into(),
        MovAxImm => {
            let imm = (window[1] as u16) | ((window[2] as u16) << 8);
            format!("mov ax, 0x{imm:04X}")
        }
        Int => format!("int 0x{:02X}", window[1]),
        In => format!("in al, 0x{:02X}", window[1]),
        Out => format!("out 0x{:02X}, al", window[1]),
        Rep => "rep".into(),
        Cld => "cld".into(),
        Std => "std".into(),
        Halt => "hlt".into(),
        Db(byte) => format!("db 0x{byte:02X}"),
    };

    (text, len)
}
