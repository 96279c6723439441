#[cfg(test)]
mod tests {
    use crate::virtual_machine::isa::{Instruction, Variant};
    use std::collections::HashSet;

    /// Flattened view of one `for_each_instruction!` entry.
    struct Entry {
        name: &'static str,
        opcode: i64,
        mnemonic: &'static str,
        kinds: &'static [&'static str],
        variant: Variant,
    }

    macro_rules! collect_isa {
        (
            $( $(#[$doc:meta])* $name:ident = $opcode:literal, $mnemonic:literal => [ $( $field:ident : $kind:ident ),* $(,)? ], $variant:ident ),* $(,)?
        ) => {
            vec![
                $(
                    Entry {
                        name: stringify!($name),
                        opcode: $opcode,
                        mnemonic: $mnemonic,
                        kinds: &[ $( stringify!($kind) ),* ],
                        variant: Variant::$variant,
                    },
                )*
            ]
        };
    }

    fn entries() -> Vec<Entry> {
        crate::for_each_instruction!(collect_isa)
    }

    #[test]
    fn opcodes_fit_in_two_digits() {
        for entry in entries() {
            assert!(
                (1..100).contains(&entry.opcode),
                "{} has opcode {}",
                entry.name,
                entry.opcode
            );
        }
    }

    #[test]
    fn opcodes_and_mnemonics_are_unique() {
        let entries = entries();
        let opcodes: HashSet<_> = entries.iter().map(|e| e.opcode).collect();
        let mnemonics: HashSet<_> = entries.iter().map(|e| e.mnemonic).collect();
        assert_eq!(opcodes.len(), entries.len());
        assert_eq!(mnemonics.len(), entries.len());
    }

    #[test]
    fn write_parameter_is_always_last() {
        for entry in entries() {
            if let Some(pos) = entry.kinds.iter().position(|k| *k == "Write") {
                assert_eq!(pos, entry.kinds.len() - 1, "{}", entry.name);
            }
        }
    }

    #[test]
    fn generated_enum_matches_table() {
        for entry in entries() {
            let instr = Instruction::try_from(entry.opcode).unwrap();
            assert_eq!(instr.mnemonic(), entry.mnemonic);
            assert_eq!(instr.variant(), entry.variant);
        }
        assert_eq!(Instruction::ALL.len(), entries().len());
    }
}
