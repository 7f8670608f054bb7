/*!
 * Width-generic carry arithmetic shared by the 8-bit and 16-bit instruction handlers.
 */

use num::traits::{WrappingAdd, WrappingSub};
use num::PrimInt;

use crate::cpu::catalog::InstructionClass;

/// Low nibble of an 8-bit operand; half carry is the carry out of bit 3.
pub const NIBBLE_MASK_8: u8 = 0x0f;
/// Low 12 bits of a 16-bit operand; half carry is the carry out of bit 11.
pub const NIBBLE_MASK_16: u16 = 0x0fff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult<T> {
    pub value: T,
    pub half_carry: bool,
    pub carry: bool,
}

fn carry_value<T: PrimInt>(carry: bool) -> T {
    if carry {
        T::one()
    } else {
        T::zero()
    }
}

/// `lhs + rhs + carry_in` with the carries out of the nibble boundary and the top bit.
pub fn add<T>(lhs: T, rhs: T, carry_in: bool, nibble_mask: T) -> AluResult<T>
where
    T: PrimInt + WrappingAdd,
{
    let carry_in = carry_value::<T>(carry_in);
    let carry = match lhs.checked_add(&rhs) {
        Some(partial) => partial.checked_add(&carry_in).is_none(),
        None => true,
    };
    let half_carry = (lhs & nibble_mask) + (rhs & nibble_mask) + carry_in > nibble_mask;

    AluResult {
        value: lhs.wrapping_add(&rhs).wrapping_add(&carry_in),
        half_carry,
        carry,
    }
}

/// `lhs - rhs - borrow_in` with the borrows into the nibble boundary and the top bit.
pub fn sub<T>(lhs: T, rhs: T, borrow_in: bool, nibble_mask: T) -> AluResult<T>
where
    T: PrimInt + WrappingSub,
{
    let borrow_in = carry_value::<T>(borrow_in);
    let carry = match lhs.checked_sub(&rhs) {
        Some(partial) => partial.checked_sub(&borrow_in).is_none(),
        None => true,
    };
    let half_carry = (lhs & nibble_mask) < (rhs & nibble_mask) + borrow_in;

    AluResult {
        value: lhs.wrapping_sub(&rhs).wrapping_sub(&borrow_in),
        half_carry,
        carry,
    }
}

/// SP plus a signed displacement. H and C come from the unsigned addition of the low
/// byte of SP and the displacement byte.
pub fn offset_sp(sp: u16, displacement: i8) -> AluResult<u16> {
    let low = add(sp as u8, displacement as u8, false, NIBBLE_MASK_8);
    AluResult {
        value: sp.wrapping_add_signed(displacement.into()),
        half_carry: low.half_carry,
        carry: low.carry,
    }
}

/// Rotates and shifts of the CB table and the accumulator rotates. Returns the result and
/// the bit shifted out.
pub fn shift(class: InstructionClass, value: u8, carry_in: bool) -> Option<(u8, bool)> {
    let bit7 = value & 0x80 != 0;
    let bit0 = value & 0x01 != 0;
    let carry_in = u8::from(carry_in);

    let shifted = match class {
        InstructionClass::Rlc | InstructionClass::Rlca => (value.rotate_left(1), bit7),
        InstructionClass::Rrc | InstructionClass::Rrca => (value.rotate_right(1), bit0),
        InstructionClass::Rl | InstructionClass::Rla => ((value << 1) | carry_in, bit7),
        InstructionClass::Rr | InstructionClass::Rra => ((value >> 1) | (carry_in << 7), bit0),
        InstructionClass::Sla => (value << 1, bit7),
        InstructionClass::Sra => ((value >> 1) | (value & 0x80), bit0),
        InstructionClass::Srl => (value >> 1, bit0),
        InstructionClass::Swap => (value.rotate_left(4), false),
        _ => return None,
    };
    Some(shifted)
}

/// Decimal adjust of the accumulator after a BCD addition or subtraction. Returns the
/// adjusted value and the new carry.
pub fn decimal_adjust(a: u8, subtract: bool, half_carry: bool, carry: bool) -> (u8, bool) {
    let mut value = a;
    let mut carry_out = carry;

    if !subtract {
        // After an addition, adjust if (half-)carry occured or result is out of bounds.
        if carry || value > 0x99 {
            value = value.wrapping_add(0x60);
            carry_out = true;
        }
        if half_carry || (value & 0x0f) > 0x09 {
            value = value.wrapping_add(0x06);
        }
    } else {
        // After a subtraction, only adjust if (half-)carry occured.
        if carry {
            value = value.wrapping_sub(0x60);
        }
        if half_carry {
            value = value.wrapping_sub(0x06);
        }
    }

    (value, carry_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_8_bit_carries() {
        let r = add(0x0fu8, 0x01, false, NIBBLE_MASK_8);
        assert_eq!((0x10, true, false), (r.value, r.half_carry, r.carry));

        let r = add(0xffu8, 0x01, false, NIBBLE_MASK_8);
        assert_eq!((0x00, true, true), (r.value, r.half_carry, r.carry));

        let r = add(0xfeu8, 0x01, true, NIBBLE_MASK_8);
        assert_eq!((0x00, true, true), (r.value, r.half_carry, r.carry));
    }

    #[test]
    fn test_add_16_bit_carries() {
        let r = add(0x0fffu16, 0x0001, false, NIBBLE_MASK_16);
        assert_eq!((0x1000, true, false), (r.value, r.half_carry, r.carry));

        let r = add(0x8000u16, 0x8000, false, NIBBLE_MASK_16);
        assert_eq!((0x0000, false, true), (r.value, r.half_carry, r.carry));
    }

    #[test]
    fn test_sub_borrows() {
        let r = sub(0x10u8, 0x01, false, NIBBLE_MASK_8);
        assert_eq!((0x0f, true, false), (r.value, r.half_carry, r.carry));

        let r = sub(0x00u8, 0x01, false, NIBBLE_MASK_8);
        assert_eq!((0xff, true, true), (r.value, r.half_carry, r.carry));

        let r = sub(0x01u8, 0x00, true, NIBBLE_MASK_8);
        assert_eq!((0x00, false, false), (r.value, r.half_carry, r.carry));
    }

    #[test]
    fn test_offset_sp_uses_low_byte() {
        let r = offset_sp(0x00ff, 1);
        assert_eq!((0x0100, true, true), (r.value, r.half_carry, r.carry));

        let r = offset_sp(0x1000, -1);
        assert_eq!((0x0fff, false, false), (r.value, r.half_carry, r.carry));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(Some((0x0b, true)), shift(InstructionClass::Rlc, 0x85, false));
        assert_eq!(Some((0x0a, true)), shift(InstructionClass::Rl, 0x85, false));
        assert_eq!(Some((0xc2, true)), shift(InstructionClass::Rr, 0x85, true));
        assert_eq!(Some((0xc2, true)), shift(InstructionClass::Sra, 0x85, false));
        assert_eq!(Some((0x42, true)), shift(InstructionClass::Srl, 0x85, true));
        assert_eq!(Some((0x58, false)), shift(InstructionClass::Swap, 0x85, true));
        assert_eq!(None, shift(InstructionClass::Add, 0x85, true));
    }

    #[test]
    fn test_decimal_adjust() {
        // 0x15 + 0x27 = 0x3c, which is 42 in BCD after adjusting.
        assert_eq!((0x42, false), decimal_adjust(0x3c, false, false, false));
        // 0x99 + 0x01 = 0x9a, adjusts to 00 with carry.
        assert_eq!((0x00, true), decimal_adjust(0x9a, false, false, false));
        // 0x42 - 0x15 = 0x2d with half borrow, adjusts to 27.
        assert_eq!((0x27, false), decimal_adjust(0x2d, true, true, false));
    }
}
