//! Writers for the three sibling output files: `.obj`, `.ent`, `.ext`.
//!
//! Every line is fixed-width, uppercase hex for word values, so these are built as plain string
//! concatenation rather than anything format-negotiable.

use std::io;
use std::path::Path;

use super::word::hex6;
use super::{Assembly, CODE_BASE_ADDRESS};

pub fn write_obj(path: &Path, assembly: &Assembly) -> io::Result<()> {
    let code_size = assembly.icf - CODE_BASE_ADDRESS;
    let mut out = String::new();
    out.push_str(&format!("{:>7} {}\n", code_size, assembly.dcf));

    let mut address = CODE_BASE_ADDRESS;
    for record in &assembly.records {
        out.push_str(&format!("{:07} {}\n", address, hex6(record.first_word.encode())));
        address += 1;
        for extension in &record.extension_words {
            out.push_str(&format!("{:07} {}\n", address, hex6(extension.encode())));
            address += 1;
        }
    }
    for &value in &assembly.data {
        out.push_str(&format!("{:07} {}\n", address, hex6(value as u32)));
        address += 1;
    }

    std::fs::write(path, out)
}

pub fn write_ent(path: &Path, assembly: &Assembly) -> io::Result<()> {
    let mut out = String::new();
    for symbol in assembly.symbols.exported() {
        out.push_str(&format!("{} {:07}\n", symbol.name, symbol.address));
    }
    std::fs::write(path, out)
}

pub fn write_ext(path: &Path, assembly: &Assembly) -> io::Result<()> {
    let mut out = String::new();
    for usage in &assembly.externals {
        out.push_str(&format!("{} {:07}\n", usage.name, usage.address));
    }
    std::fs::write(path, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::symbol::{SymbolBase, SymbolTable};
    use crate::assembler::word::{ExtensionWord, FirstWord};
    use crate::assembler::{ExternalUsage, MachineCodeRecord};

    fn sample_assembly() -> Assembly {
        let mut symbols = SymbolTable::new();
        symbols.insert("X".to_string(), 150, SymbolBase::Data);
        symbols.mark_exported("X");

        Assembly {
            records: vec![MachineCodeRecord {
                ic: 100,
                first_word: FirstWord::absolute(0, 0),
                extension_words: vec![ExtensionWord::immediate(7)],
                needs_resolution: false,
            }],
            data: vec![3, -1, 42],
            symbols,
            externals: vec![ExternalUsage { name: "FOO".to_string(), address: 103 }],
            icf: 102,
            dcf: 3,
        }
    }

    #[test]
    fn obj_header_reports_code_and_data_size() {
        let assembly = sample_assembly();
        let mut out = String::new();
        out.push_str(&format!("{:>7} {}\n", assembly.icf - CODE_BASE_ADDRESS, assembly.dcf));
        assert_eq!(out, "      2 3\n");
    }

    #[test]
    fn negative_data_word_renders_as_24_bit_twos_complement() {
        assert_eq!(hex6((-1i32) as u32), "FFFFFF");
    }

    #[test]
    fn ent_line_uses_final_relocated_address() {
        let assembly = sample_assembly();
        let symbol = assembly.symbols.get("X").unwrap();
        assert_eq!(symbol.address, 150);
        assert!(symbol.exported);
    }
}
