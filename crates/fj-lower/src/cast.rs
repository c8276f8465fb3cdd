use fj_asm::Opcode;
use fj_ir::PrimitiveType;

/// Conversion sequence between two primitive types. Every pair has a rule;
/// an empty sequence means the value is already in the right form.
pub fn primitive_cast(from: PrimitiveType, to: PrimitiveType) -> &'static [Opcode] {
    use Opcode::*;
    use PrimitiveType::{Boolean, Byte, Char, Double, Float, Int, Long, Short};
    match (from, to) {
        (Long, Long) | (Float, Float) | (Double, Double) => &[],

        (Long, Int | Boolean) => &[L2i],
        (Long, Byte) => &[L2i, I2b],
        (Long, Short) => &[L2i, I2s],
        (Long, Char) => &[L2i, I2c],
        (Long, Float) => &[L2f],
        (Long, Double) => &[L2d],

        (Float, Int | Boolean) => &[F2i],
        (Float, Byte) => &[F2i, I2b],
        (Float, Short) => &[F2i, I2s],
        (Float, Char) => &[F2i, I2c],
        (Float, Long) => &[F2l],
        (Float, Double) => &[F2d],

        (Double, Int | Boolean) => &[D2i],
        (Double, Byte) => &[D2i, I2b],
        (Double, Short) => &[D2i, I2s],
        (Double, Char) => &[D2i, I2c],
        (Double, Long) => &[D2l],
        (Double, Float) => &[D2f],

        (Boolean | Byte | Char | Short | Int, Long) => &[I2l],
        (Boolean | Byte | Char | Short | Int, Float) => &[I2f],
        (Boolean | Byte | Char | Short | Int, Double) => &[I2d],
        (Boolean | Byte | Char | Short | Int, Int | Boolean) => &[],

        (Boolean | Byte, Byte) => &[],
        (Char | Short | Int, Byte) => &[I2b],

        (Boolean | Byte | Short, Short) => &[],
        (Char | Int, Short) => &[I2s],

        (Boolean | Char, Char) => &[],
        (Byte | Short | Int, Char) => &[I2c],
    }
}
