//! Bit-packing for the 24-bit machine word.
//!
//! The wire format is the 6-hex-digit uppercase rendering of these 24 bits; the struct layouts
//! below exist only to give the packing a name, never to be relied on for their native in-memory
//! representation (no `#[repr(C)]` bitfields — those aren't portable and aren't the contract).

use super::opcodes::AddressingMode;

const WORD_MASK: u32 = 0xFF_FFFF;
const FUNCT_MASK: u32 = 0x1F;
const REG_MASK: u32 = 0x7;
const MODE_MASK: u32 = 0x3;
const OPCODE_MASK: u32 = 0x3F;
const PAYLOAD_MASK: u32 = 0x1F_FFFF;
/// Extension word payload is a signed 21-bit field.
const PAYLOAD_BITS: u32 = 21;

/// The first word of every instruction: E/R/A relocation bits, the funct/opcode pair, and the
/// two operand slots (register number + addressing mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstWord {
    pub e: bool,
    pub r: bool,
    pub a: bool,
    pub funct: u8,
    pub dest_reg: u8,
    pub dest_mode: AddressingMode,
    pub src_reg: u8,
    pub src_mode: AddressingMode,
    pub opcode_value: u8,
}

impl FirstWord {
    /// The first word of a normal (non-relocated, non-external) instruction: A=1, R=0, E=0.
    pub fn absolute(opcode_value: u8, funct: u8) -> FirstWord {
        FirstWord {
            e: false,
            r: false,
            a: true,
            funct,
            dest_reg: 0,
            dest_mode: AddressingMode::Immediate,
            src_reg: 0,
            src_mode: AddressingMode::Immediate,
            opcode_value,
        }
    }

    pub fn encode(&self) -> u32 {
        let mut value = 0u32;
        value |= (self.e as u32) << 0;
        value |= (self.r as u32) << 1;
        value |= (self.a as u32) << 2;
        value |= (self.funct as u32 & FUNCT_MASK) << 3;
        value |= (self.dest_reg as u32 & REG_MASK) << 8;
        value |= (self.dest_mode.value() as u32 & MODE_MASK) << 11;
        value |= (self.src_reg as u32 & REG_MASK) << 13;
        value |= (self.src_mode.value() as u32 & MODE_MASK) << 16;
        value |= (self.opcode_value as u32 & OPCODE_MASK) << 18;
        value & WORD_MASK
    }

    pub fn decode(value: u32) -> FirstWord {
        let mode_of = |bits: u32| match bits {
            0 => AddressingMode::Immediate,
            1 => AddressingMode::Direct,
            2 => AddressingMode::Relative,
            _ => AddressingMode::Register,
        };
        FirstWord {
            e: value & 0x1 != 0,
            r: (value >> 1) & 0x1 != 0,
            a: (value >> 2) & 0x1 != 0,
            funct: ((value >> 3) & FUNCT_MASK) as u8,
            dest_reg: ((value >> 8) & REG_MASK) as u8,
            dest_mode: mode_of((value >> 11) & MODE_MASK),
            src_reg: ((value >> 13) & REG_MASK) as u8,
            src_mode: mode_of((value >> 16) & MODE_MASK),
            opcode_value: ((value >> 18) & OPCODE_MASK) as u8,
        }
    }
}

/// An operand extension word: same 24-bit slot, carrying a signed 21-bit payload instead of the
/// opcode fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionWord {
    pub e: bool,
    pub r: bool,
    pub a: bool,
    pub payload: i32,
}

impl ExtensionWord {
    /// An immediate operand's extension word: A=1, R=0, E=0, same as the first word of a normal
    /// instruction.
    pub fn immediate(payload: i32) -> ExtensionWord {
        ExtensionWord { e: false, r: false, a: true, payload }
    }

    /// A direct reference to a locally-defined (relocatable) symbol: A=0, R=1, E=0.
    pub fn relocatable(address: u32) -> ExtensionWord {
        ExtensionWord { e: false, r: true, a: false, payload: address as i32 }
    }

    /// A direct reference to an `extern` symbol: A=0, R=0, E=1, payload filled in later by the
    /// linker.
    pub fn external() -> ExtensionWord {
        ExtensionWord { e: true, r: false, a: false, payload: 0 }
    }

    /// A `&label` relative displacement: A=1, R=0, E=0.
    pub fn relative(displacement: i32) -> ExtensionWord {
        ExtensionWord { e: false, r: false, a: true, payload: displacement }
    }

    pub fn encode(&self) -> u32 {
        let payload_bits = (self.payload as u32) & PAYLOAD_MASK;
        let mut value = 0u32;
        value |= (self.e as u32) << 0;
        value |= (self.r as u32) << 1;
        value |= (self.a as u32) << 2;
        value |= payload_bits << 3;
        value & WORD_MASK
    }

    pub fn decode(value: u32) -> ExtensionWord {
        let raw = (value >> 3) & PAYLOAD_MASK;
        let sign_bit = 1u32 << (PAYLOAD_BITS - 1);
        let payload = ((raw ^ sign_bit).wrapping_sub(sign_bit)) as i32;
        ExtensionWord {
            e: value & 0x1 != 0,
            r: (value >> 1) & 0x1 != 0,
            a: (value >> 2) & 0x1 != 0,
            payload,
        }
    }
}

/// Render a packed 24-bit word as the fixed-width uppercase hex the object file uses.
pub fn hex6(value: u32) -> String {
    format!("{:06X}", value & WORD_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::opcodes::AddressingMode::*;

    #[test]
    fn mov_r3_r5_encodes_as_scenario_one() {
        let word = FirstWord {
            e: false,
            r: false,
            a: true,
            funct: 0,
            dest_reg: 5,
            dest_mode: Register,
            src_reg: 3,
            src_mode: Register,
            opcode_value: 0,
        };
        assert_eq!(FirstWord::decode(word.encode()), word);
    }

    #[test]
    fn negative_immediate_round_trips_through_21_bits() {
        let ext = ExtensionWord::immediate(-1);
        let decoded = ExtensionWord::decode(ext.encode());
        assert_eq!(decoded.payload, -1);
        // Bits 0-2 are A/R/E (A=1 here), so the all-ones 21-bit payload leaves the low nibble
        // as 0xC rather than the 0xF a tagless 24-bit data word would show for the same -1.
        assert_eq!(hex6(ext.encode()), "FFFFFC");
    }

    #[test]
    fn negative_data_word_has_no_tag_bits() {
        // Unlike an extension word, a plain data cell is the full 24-bit two's-complement value.
        assert_eq!(hex6((-1i32) as u32), "FFFFFF");
    }

    #[test]
    fn relative_displacement_of_four_round_trips() {
        let ext = ExtensionWord::relative(4);
        assert_eq!(ExtensionWord::decode(ext.encode()).payload, 4);
    }

    #[test]
    fn external_reference_has_only_e_set() {
        let ext = ExtensionWord::external();
        let encoded = ext.encode();
        assert_eq!(encoded & 0x7, 0b001);
    }

    #[test]
    fn hex_rendering_is_six_uppercase_digits() {
        assert_eq!(hex6(0xA), "00000A");
        assert_eq!(hex6(0xFFFFFF), "FFFFFF");
    }
}
