use log::debug;

use crate::air::{Air, Linked, Operand, Resolved};
use crate::error::AsmError;

/// Second pass: replace every label reference with the address of the statement carrying it.
///
/// Forward references are fine; the whole program is searched.
pub fn backpatch(air: &Air) -> Result<Vec<Linked>, AsmError> {
    let linked = air
        .iter()
        .map(|stmt| {
            let operands = stmt
                .operands
                .iter()
                .map(|op| resolve(air, op))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Linked {
                label: stmt.label.as_ref().map(|l| l.name.clone()),
                desc: stmt.desc,
                operands,
                // Compilation guarantees every address fits in memory
                addr: stmt.addr as u8,
            })
        })
        .collect::<Result<Vec<_>, AsmError>>()?;
    debug!("linked {} statements", linked.len());
    Ok(linked)
}

fn resolve(air: &Air, op: &Operand) -> Result<Resolved, AsmError> {
    Ok(match op {
        Operand::Ref { label, span } => {
            let target = air
                .dereference(label)
                .ok_or_else(|| AsmError::UnresolvedReference {
                    label: label.clone(),
                    span: *span,
                })?;
            Resolved::Addr(target.addr as u8)
        }
        Operand::Byte(val) => Resolved::Byte(*val),
        Operand::Bytes(bytes) => Resolved::Bytes(bytes.clone()),
        Operand::Operator(op) => Resolved::Operator(*op),
    })
}
