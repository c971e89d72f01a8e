//! Streaming CRC32 over the encoded payload bytes.
//!
//! Reflected CRC32 with polynomial 0xEDB88320. The first four bytes are
//! shifted in complemented while a mask of pending bootstrap bytes drains;
//! after that the usual table update runs. For streams of four bytes or more
//! the result equals the zlib CRC32.

const POLYNOMIAL: u32 = 0xEDB8_8320;

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = make_table();

/// Run four zero-byte table steps over the bootstrap accumulator
fn bootstrap_fold(mut temp: u32) -> u32 {
    for _ in 0..4 {
        temp = (temp >> 8) ^ TABLE[(temp & 0xff) as usize];
    }
    temp
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32 {
    temp: u32,
    xor: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Self {
            temp: 0,
            xor: u32::MAX,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        while self.xor != 0 {
            let Some((&b, tail)) = rest.split_first() else {
                return;
            };
            self.temp = (self.temp >> 8) | (u32::from(!b) << 24);
            self.xor >>= 8;
            if self.xor == 0 {
                self.temp = bootstrap_fold(self.temp);
            }
            rest = tail;
        }
        for &b in rest {
            self.temp = TABLE[((self.temp ^ u32::from(b)) & 0xff) as usize] ^ (self.temp >> 8);
        }
    }

    /// Checksum of everything fed so far; the accumulator is left untouched
    pub fn finalize(&self) -> u32 {
        if self.xor != 0 {
            !(self.xor ^ bootstrap_fold(self.temp))
        } else {
            !self.temp
        }
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot checksum of a byte slice
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(bytes);
    crc.finalize()
}
