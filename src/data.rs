//! Helpers used to read/write values to/from frame buffers, at byte or bit granularity.

use core::fmt;


/// number of bytes needed to hold the given number of bits
pub const fn bits_to_bytes(bits: usize) -> usize  {bits.div_ceil(8)}

/// order in which multi-byte values are laid out in frames
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ByteOrder {
    /// least significant byte first, bits are packed from the LSB of each byte
    Little,
    /// most significant byte first, bits are packed from the MSB of each byte
    Big,
}

/// byte order used for every signal of every frame, fixed at build time with the `big-endian` feature
pub const BYTE_ORDER: ByteOrder = if cfg!(feature = "big-endian") {ByteOrder::Big} else {ByteOrder::Little};


/** Enum to identify errors raised when packing or unpacking values
*/
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PackingError {
    /// the buffer is too small for the requested access, contains the buffer size
    BadSize(usize, &'static str),
    /// the requested bit length is not supported, contains the requested length
    BadLength(usize, &'static str),
}

pub type PackingResult<T> = Result<T, PackingError>;

/// maximum number of bits of one value
pub const MAX_BITS: usize = 64;

/// mask keeping the `bits` lowest bits of a value
pub const fn mask(bits: usize) -> u64 {
    if bits >= MAX_BITS  {u64::MAX}
    else                 {(1 << bits) - 1}
}

fn check(data: &[u8], bit: usize, bits: usize) -> PackingResult<()> {
    if bits == 0 || bits > MAX_BITS
        {return Err(PackingError::BadLength(bits, "values must be 1 to 64 bits long"))}
    if bit + bits > data.len() * 8
        {return Err(PackingError::BadSize(data.len(), "not enough bytes for value"))}
    Ok(())
}

/// extract `bits` bits starting at bit `bit` of `data`
pub fn get_bits(data: &[u8], bit: usize, bits: usize, order: ByteOrder) -> PackingResult<u64> {
    check(data, bit, bits)?;
    // byte aligned values are simply copied
    if bit % 8 == 0 && bits % 8 == 0 {
        let bytes = &data[bit/8 ..][.. bits/8];
        let mut value = 0u64;
        match order {
            ByteOrder::Little => for &byte in bytes.iter().rev()  {value = (value << 8) | u64::from(byte)},
            ByteOrder::Big => for &byte in bytes  {value = (value << 8) | u64::from(byte)},
        }
        return Ok(value)
    }
    let mut value = 0u64;
    for i in 0 .. bits {
        let position = bit + i;
        let byte = data[position / 8];
        match order {
            ByteOrder::Little => {
                let set = (byte >> (position % 8)) & 1;
                value |= u64::from(set) << i;
            },
            ByteOrder::Big => {
                let set = (byte >> (7 - position % 8)) & 1;
                value |= u64::from(set) << (bits - 1 - i);
            },
        }
    }
    Ok(value)
}

/// dump the `bits` lowest bits of `value` starting at bit `bit` of `data`, other bits of `data` are left untouched
pub fn set_bits(data: &mut [u8], bit: usize, bits: usize, value: u64, order: ByteOrder) -> PackingResult<()> {
    check(data, bit, bits)?;
    let value = value & mask(bits);
    if bit % 8 == 0 && bits % 8 == 0 {
        let bytes = &mut data[bit/8 ..][.. bits/8];
        let n = bytes.len();
        for (i, byte) in bytes.iter_mut().enumerate() {
            let shift = match order {
                ByteOrder::Little => 8*i,
                ByteOrder::Big => 8*(n - 1 - i),
            };
            *byte = (value >> shift) as u8;
        }
        return Ok(())
    }
    for i in 0 .. bits {
        let position = bit + i;
        let (set, mask) = match order {
            ByteOrder::Little => ((value >> i) & 1, 1u8 << (position % 8)),
            ByteOrder::Big => ((value >> (bits - 1 - i)) & 1, 0x80u8 >> (position % 8)),
        };
        let byte = &mut data[position / 8];
        if set == 1  {*byte |= mask}
        else         {*byte &= !mask}
    }
    Ok(())
}



/**
    locate some data in a frame by its bit position, element bit length and number of elements

    It does not hold the data, only where it lies in a frame, so the same field can be applied to any buffer of the same layout. Every access is bound checked against the buffer it is applied to.

    Array elements are laid out back to back, with no alignment between elements.
*/
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct BitField {
    /// start bit index of the first element
    pub bit: usize,
    /// bit length of one element
    pub bits: usize,
    /// number of elements
    pub count: usize,
}
impl BitField {
    /// build a field from its content
    pub const fn new(bit: usize, bits: usize, count: usize) -> Self {
        Self{bit, bits, count}
    }
    /// build a field of one element starting at the given byte
    pub const fn scalar(byte: usize, bits: usize) -> Self {
        Self{bit: byte*8, bits, count: 1}
    }
    /// total bit size of the field
    pub const fn len(&self) -> usize  {self.bits * self.count}
    /// byte size occupied by the field
    pub const fn byte_len(&self) -> usize  {bits_to_bytes(self.len())}

    /// extract the element at `index` in the given byte array
    pub fn get(&self, data: &[u8], index: usize, order: ByteOrder) -> PackingResult<u64> {
        if index >= self.count
            {return Err(PackingError::BadSize(self.count, "element index out of field"))}
        get_bits(data, self.bit + index*self.bits, self.bits, order)
    }
    /// dump the given element at `index` in the byte array
    pub fn set(&self, data: &mut [u8], index: usize, value: u64, order: ByteOrder) -> PackingResult<()> {
        if index >= self.count
            {return Err(PackingError::BadSize(self.count, "element index out of field"))}
        set_bits(data, self.bit + index*self.bits, self.bits, value, order)
    }
    /// extract all elements of the field
    pub fn unpack(&self, data: &[u8], order: ByteOrder) -> PackingResult<Vec<u64>> {
        let mut cursor = BitCursor::at(data, self.bit, order);
        (0 .. self.count)
            .map(|_| cursor.read(self.bits))
            .collect()
    }
    /// dump all elements of the field, `values` must contain exactly [Self::count] elements
    pub fn pack(&self, data: &mut [u8], values: &[u64], order: ByteOrder) -> PackingResult<()> {
        if values.len() != self.count
            {return Err(PackingError::BadSize(values.len(), "wrong number of elements for field"))}
        let mut cursor = BitCursor::at(data, self.bit, order);
        for &value in values {
            cursor.write(value, self.bits)?;
        }
        Ok(())
    }
}
impl fmt::Debug for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitField{{{}, {}x{}}}", self.bit, self.count, self.bits)
    }
}



/** helper to read/write sequential data from/to a byte slice

    It is close to what [std::io::Cursor] is doing, but this struct returns slices without copying the data and reports overflows as [PackingError] instead of truncating.
*/
pub struct Cursor<T> {
    position: usize,
    data: T,
}
impl<T> Cursor<T> {
    /// cursor at the start of `data`
    pub fn new(data: T) -> Self  {Self{position: 0, data}}
    /// number of bytes already written
    pub fn position(&self) -> usize  {self.position}
}
impl<'a> Cursor<&'a mut [u8]> {
    /// copy `value` at the current position and move past it
    pub fn write(&mut self, value: &[u8]) -> PackingResult<()> {
        let end = self.position + value.len();
        if end > self.data.len()
            {return Err(PackingError::BadSize(self.data.len(), "not enough bytes left in buffer"))}
        self.data[self.position .. end].copy_from_slice(value);
        self.position = end;
        Ok(())
    }
    /// bytes not written yet, the position is not changed
    pub fn remain(&mut self) -> &'_ mut [u8] {
        &mut self.data[self.position ..]
    }
}


/** bit level equivalent of [Cursor]

    the position is counted in bits, so values can start and end anywhere in a byte and span byte boundaries.
*/
pub struct BitCursor<T> {
    position: usize,
    order: ByteOrder,
    data: T,
}
impl<T> BitCursor<T> {
    /// create a new cursor starting at bit zero in the given slice
    pub fn new(data: T, order: ByteOrder) -> Self  {Self::at(data, 0, order)}
    /// create a new cursor starting at the given bit in the given slice
    pub fn at(data: T, bit: usize, order: ByteOrder) -> Self  {Self{position: bit, order, data}}
    /// current bit position
    pub fn position(&self) -> usize  {self.position}
    /// byte containing the current bit
    pub fn byte(&self) -> usize  {self.position / 8}
    /// bit offset of the current bit in its byte
    pub fn bit(&self) -> usize  {self.position % 8}
    /// advance the cursor without reading nor writing
    pub fn skip(&mut self, bits: usize)  {self.position += bits}
    /// advance the cursor to the next byte boundary, unless already on one
    pub fn align(&mut self)  {self.position = bits_to_bytes(self.position) * 8}
}
impl<T: AsRef<[u8]>> BitCursor<T> {
    /// read the next `bits` bits and increment the position
    pub fn read(&mut self, bits: usize) -> PackingResult<u64> {
        let value = get_bits(self.data.as_ref(), self.position, bits, self.order)?;
        self.position += bits;
        Ok(value)
    }
}
impl<'a> BitCursor<&'a mut [u8]> {
    /// write the `bits` lowest bits of `value` and increment the position
    pub fn write(&mut self, value: u64, bits: usize) -> PackingResult<()> {
        set_bits(self.data, self.position, bits, value, self.order)?;
        self.position += bits;
        Ok(())
    }
}
