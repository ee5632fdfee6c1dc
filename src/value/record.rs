//! Fixed-size records
//!
//! A `Record` has one exact byte length. That length is what the store must
//! report for a key before a fixed-size cell accepts the stored blob.

/// Plain data with a fixed little-endian byte layout
///
/// Implement it by hand for your own structs:
///
/// ```
/// use nvscell::Record;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Calibration {
///     offset: i16,
///     gain: u16,
/// }
///
/// impl Record for Calibration {
///     const SIZE: usize = 4;
///
///     fn encode(&self, buf: &mut [u8]) {
///         self.offset.encode(&mut buf[0..2]);
///         self.gain.encode(&mut buf[2..4]);
///     }
///
///     fn decode(buf: &[u8]) -> Self {
///         Self {
///             offset: i16::decode(&buf[0..2]),
///             gain: u16::decode(&buf[2..4]),
///         }
///     }
/// }
///
/// assert_eq!(Calibration { offset: -3, gain: 512 }.to_bytes(), vec![0xfd, 0xff, 0x00, 0x02]);
/// ```
pub trait Record: Clone {
    /// Exact encoded length in bytes
    const SIZE: usize;

    /// Write `Self::SIZE` bytes into `buf` (`buf.len() == Self::SIZE`)
    fn encode(&self, buf: &mut [u8]);

    /// Read a value from `Self::SIZE` bytes (`buf.len() == Self::SIZE`)
    fn decode(buf: &[u8]) -> Self;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Self::SIZE];
        self.encode(&mut buf);
        buf
    }
}

macro_rules! impl_record_le {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn encode(&self, buf: &mut [u8]) {
                    buf.copy_from_slice(&self.to_le_bytes());
                }

                fn decode(buf: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(buf);
                    <$ty>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_record_le!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl Record for bool {
    const SIZE: usize = 1;

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = u8::from(*self);
    }

    fn decode(buf: &[u8]) -> Self {
        buf[0] != 0
    }
}

impl<T: Record, const N: usize> Record for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn encode(&self, buf: &mut [u8]) {
        for (item, chunk) in self.iter().zip(buf.chunks_exact_mut(T::SIZE.max(1))) {
            item.encode(chunk);
        }
    }

    fn decode(buf: &[u8]) -> Self {
        std::array::from_fn(|i| T::decode(&buf[i * T::SIZE..(i + 1) * T::SIZE]))
    }
}
