//! Slot widths read off field and method descriptors.

use crate::AsmError;

/// Parses one field type starting at `pos`, returning its width and the
/// position after it.
fn parse_field_type(desc: &[u8], pos: usize) -> Result<(u16, usize), AsmError> {
    let malformed = || AsmError::Descriptor {
        message: format!(
            "malformed descriptor {:?} at {}",
            String::from_utf8_lossy(desc),
            pos
        ),
    };
    match desc.get(pos) {
        Some(b'J') | Some(b'D') => Ok((2, pos + 1)),
        Some(b'Z') | Some(b'B') | Some(b'C') | Some(b'S') | Some(b'I') | Some(b'F') => {
            Ok((1, pos + 1))
        }
        Some(b'L') => {
            let end = desc[pos..]
                .iter()
                .position(|byte| *byte == b';')
                .ok_or_else(malformed)?;
            Ok((1, pos + end + 1))
        }
        Some(b'[') => {
            let mut next = pos;
            while desc.get(next) == Some(&b'[') {
                next += 1;
            }
            let (_, after) = parse_field_type(desc, next)?;
            Ok((1, after))
        }
        _ => Err(malformed()),
    }
}

/// Width in slots of a value with this field descriptor.
pub fn field_width(desc: &str) -> Result<u16, AsmError> {
    let bytes = desc.as_bytes();
    let (width, end) = parse_field_type(bytes, 0)?;
    if end != bytes.len() {
        return Err(AsmError::Descriptor {
            message: format!("trailing characters in field descriptor {:?}", desc),
        });
    }
    Ok(width)
}

/// Total argument width and return width of a method descriptor.
pub fn method_widths(desc: &str) -> Result<(u16, u16), AsmError> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(AsmError::Descriptor {
            message: format!("method descriptor {:?} must start with '('", desc),
        });
    }
    let mut pos = 1;
    let mut args = 0;
    while bytes.get(pos) != Some(&b')') {
        let (width, next) = parse_field_type(bytes, pos)?;
        args += width;
        pos = next;
    }
    let ret = match bytes.get(pos + 1) {
        Some(b'V') if pos + 2 == bytes.len() => 0,
        _ => field_width(&desc[pos + 1..])?,
    };
    Ok((args, ret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_of_common_descriptors() {
        assert_eq!(field_width("I").unwrap(), 1);
        assert_eq!(field_width("J").unwrap(), 2);
        assert_eq!(field_width("[[D").unwrap(), 1);
        assert_eq!(field_width("Ljava/lang/String;").unwrap(), 1);
        assert_eq!(method_widths("()V").unwrap(), (0, 0));
        assert_eq!(method_widths("(IJLjava/lang/Object;[D)D").unwrap(), (5, 2));
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert!(field_width("Ljava/lang/String").is_err());
        assert!(method_widths("I)V").is_err());
        assert!(method_widths("(Q)V").is_err());
        assert!(field_width("II").is_err());
    }
}
