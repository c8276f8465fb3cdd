use crate::{ArrayKind, AsmError, AssembledClass, AssembledMethod, Insn, MethodCode, Opcode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const ARTIFACT_MAGIC: [u8; 4] = *b"FJCL";
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub version: u32,
    pub class: AssembledClass,
}

pub fn encode_file(class: &AssembledClass) -> Result<Vec<u8>, AsmError> {
    let file = ArtifactFile {
        version: ARTIFACT_VERSION,
        class: class.clone(),
    };
    let mut encoded = Vec::new();
    encoded.extend_from_slice(&ARTIFACT_MAGIC);
    encoded.extend_from_slice(&ARTIFACT_VERSION.to_le_bytes());
    encoded.extend_from_slice(&bincode::serialize(&file)?);
    Ok(encoded)
}

pub fn decode_file(bytes: &[u8]) -> Result<ArtifactFile, AsmError> {
    if bytes.len() < 8 {
        return Err(AsmError::Format {
            message: "artifact header too short".to_string(),
        });
    }
    if bytes[..4] != ARTIFACT_MAGIC {
        return Err(AsmError::Format {
            message: "invalid artifact magic".to_string(),
        });
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != ARTIFACT_VERSION {
        return Err(AsmError::Format {
            message: format!(
                "unsupported artifact version {}, expected {}",
                version, ARTIFACT_VERSION
            ),
        });
    }
    let file: ArtifactFile = bincode::deserialize(&bytes[8..]).map_err(AsmError::Decode)?;
    if file.version != ARTIFACT_VERSION {
        return Err(AsmError::Format {
            message: format!(
                "artifact payload version {} does not match expected {}",
                file.version, ARTIFACT_VERSION
            ),
        });
    }
    validate_class(&file.class)?;
    Ok(file)
}

pub fn validate_class(class: &AssembledClass) -> Result<(), AsmError> {
    if class.header.name.is_empty() {
        return Err(AsmError::Format {
            message: "class has no name".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for method in &class.methods {
        if !seen.insert((method.header.name.as_str(), method.header.desc.as_str())) {
            return Err(AsmError::Format {
                message: format!(
                    "duplicate method {}{}",
                    method.header.name, method.header.desc
                ),
            });
        }
        validate_method(method)?;
    }
    Ok(())
}

fn validate_method(method: &AssembledMethod) -> Result<(), AsmError> {
    let Some(code) = &method.code else {
        return Ok(());
    };
    let name = format!("{}{}", method.header.name, method.header.desc);
    let mut bound = HashSet::new();
    for insn in &code.insns {
        if let Insn::Label(label) = insn {
            if !bound.insert(*label) {
                return Err(AsmError::Format {
                    message: format!("method {} binds {} twice", name, label),
                });
            }
        }
    }
    for insn in &code.insns {
        validate_insn(insn, code, &bound, &name)?;
    }
    for entry in &code.try_catches {
        for label in [entry.start, entry.end, entry.handler] {
            if !bound.contains(&label) {
                return Err(AsmError::Format {
                    message: format!("method {} try/catch uses unbound {}", name, label),
                });
            }
        }
    }
    Ok(())
}

fn validate_insn(
    insn: &Insn,
    code: &MethodCode,
    bound: &HashSet<crate::Label>,
    method: &str,
) -> Result<(), AsmError> {
    for target in insn.targets() {
        if !bound.contains(&target) {
            return Err(AsmError::Format {
                message: format!("method {} jumps to unbound {}", method, target),
            });
        }
    }
    match insn {
        Insn::Var { op, slot } => {
            let width = op.var_width().unwrap_or(1);
            if slot + width > code.max_locals {
                return Err(AsmError::Format {
                    message: format!(
                        "method {} uses local {} but max_locals is {}",
                        method, slot, code.max_locals
                    ),
                });
            }
        }
        Insn::Int {
            op: Opcode::Newarray,
            operand,
        } => {
            if ArrayKind::from_code(*operand).is_none() {
                return Err(AsmError::Format {
                    message: format!("method {} has invalid newarray type {}", method, operand),
                });
            }
        }
        Insn::TableSwitch {
            min, max, labels, ..
        } => {
            let expected = i64::from(*max) - i64::from(*min) + 1;
            if expected != labels.len() as i64 {
                return Err(AsmError::Format {
                    message: format!("method {} has tableswitch length mismatch", method),
                });
            }
        }
        Insn::LookupSwitch { keys, labels, .. } => {
            if keys.len() != labels.len() {
                return Err(AsmError::Format {
                    message: format!("method {} has lookupswitch length mismatch", method),
                });
            }
            if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
                return Err(AsmError::Format {
                    message: format!("method {} has unsorted lookupswitch keys", method),
                });
            }
        }
        Insn::LineNumber { start, .. } => {
            if !bound.contains(start) {
                return Err(AsmError::Format {
                    message: format!("method {} has line number at unbound {}", method, start),
                });
            }
        }
        _ => {}
    }
    Ok(())
}
