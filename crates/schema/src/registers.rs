//! Engine register names. The position of a name is the numeric register id
//! the engine expects in `register_id` parameters.

pub const REGISTER_NAMES: [&str; 120] = [
    "rax", "eax", "ax", "ah", "al", "rcx", "ecx", "cx", //
    "ch", "cl", "rdx", "edx", "dx", "dh", "dl", "rbx", //
    "ebx", "bx", "bh", "bl", "rsp", "esp", "sp", "spl", //
    "rbp", "ebp", "bp", "bpl", "rsi", "esi", "si", "sil", //
    "rdi", "edi", "di", "dil", "r8", "r8d", "r8w", "r8h", //
    "r8l", "r9", "r9d", "r9w", "r9h", "r9l", "r10", "r10d", //
    "r10w", "r10h", "r10l", "r11", "r11d", "r11w", "r11h", "r11l", //
    "r12", "r12d", "r12w", "r12h", "r12l", "r13", "r13d", "r13w", //
    "r13h", "r13l", "r14", "r14d", "r14w", "r14h", "r14l", "r15", //
    "r15d", "r15w", "r15h", "r15l", "ds", "es", "fs", "gs", //
    "cs", "ss", "rflags", "eflags", "flags", "cf", "pf", "af", //
    "zf", "sf", "tf", "if", "df", "of", "iopl", "nt", //
    "rf", "vm", "ac", "vif", "vip", "id", "rip", "eip", //
    "ip", "idtr", "ldtr", "gdtr", "tr", "cr0", "cr2", "cr3", //
    "cr4", "cr8", "dr0", "dr1", "dr2", "dr3", "dr6", "dr7", //
];

/// Register id for a name, case-insensitive.
pub fn register_id(name: &str) -> Option<u8> {
    let name = name.trim();
    REGISTER_NAMES
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name))
        .and_then(|idx| u8::try_from(idx).ok())
}

pub fn register_name(id: u8) -> Option<&'static str> {
    REGISTER_NAMES.get(usize::from(id)).copied()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_table_order() {
        assert_eq!(register_id("rax"), Some(0));
        assert_eq!(register_id("RIP"), Some(102));
        assert_eq!(register_id("dr7"), Some(119));
        assert_eq!(register_id("xmm0"), None);
    }

    #[test]
    fn test_names_are_unique() {
        for (idx, name) in REGISTER_NAMES.iter().enumerate() {
            assert_eq!(register_id(name), Some(idx as u8), "{name}");
            assert_eq!(register_name(idx as u8), Some(*name));
        }
        assert_eq!(register_name(120), None);
    }
}
