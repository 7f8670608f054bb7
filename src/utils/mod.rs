/// A byte viewed as eight individually addressable bits, bit 0 being the least significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField(pub u8);

impl BitField {
    pub fn get_bit(&self, index: u8) -> bool {
        debug_assert!(index < 8);
        self.0 & (1 << index) != 0
    }

    pub fn set_bit(&mut self, index: u8, value: bool) {
        debug_assert!(index < 8);

        if value {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    pub fn with_bit(mut self, index: u8, value: bool) -> Self {
        self.set_bit(index, value);
        self
    }
}
