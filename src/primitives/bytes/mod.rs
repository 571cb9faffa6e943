#![forbid(unsafe_code)]
//! Fixed-width encoders and a slice cursor shared by the page codecs.

pub mod le {
    //! Little-endian fixed-width integers used for every on-page field.

    use core::fmt::Debug;
    use core::hash::Hash;

    /// An unsigned integer with a fixed on-page width.
    ///
    /// Every identifier and offset stored in a page is one of these. The
    /// width is a property of the type, so a page format that picks `u16`
    /// record offsets gets two-byte fields everywhere they appear.
    pub trait FixedWidth: Copy + Clone + Debug + Default + Eq + Ord + Hash + Send + Sync + 'static {
        /// Encoded width in bytes.
        const WIDTH: usize;
        /// Largest value representable in `WIDTH` bytes.
        const MAX: u64;

        /// Writes `self` into the first `WIDTH` bytes of `dst`.
        fn put(self, dst: &mut [u8]);

        /// Reads a value from the first `WIDTH` bytes of `src`.
        fn get(src: &[u8]) -> Self;

        /// Widens to `u64`.
        fn to_u64(self) -> u64;

        /// Narrows from `u64`, returning `None` when the value does not fit.
        fn from_u64(value: u64) -> Option<Self>;
    }

    macro_rules! fixed_width {
        ($($ty:ty),*) => {$(
            impl FixedWidth for $ty {
                const WIDTH: usize = core::mem::size_of::<$ty>();
                const MAX: u64 = <$ty>::MAX as u64;

                #[inline]
                fn put(self, dst: &mut [u8]) {
                    assert!(dst.len() >= Self::WIDTH, "destination too small");
                    dst[..Self::WIDTH].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn get(src: &[u8]) -> Self {
                    let head = src.get(..Self::WIDTH).unwrap_or_else(|| {
                        panic!(
                            "{}-byte source shorter than field (have {})",
                            Self::WIDTH,
                            src.len()
                        )
                    });
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(head);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn to_u64(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_u64(value: u64) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )*};
    }

    fixed_width!(u8, u16, u32, u64);

    /// Narrows a `usize` into `T`, returning `None` when it does not fit.
    #[inline]
    pub fn narrow<T: FixedWidth>(value: usize) -> Option<T> {
        u64::try_from(value).ok().and_then(T::from_u64)
    }
}

pub mod buf {
    //! A simple slice-backed cursor for ergonomic parsing.

    use core::fmt;

    /// A cursor for reading bytes from a slice with offset tracking.
    pub struct Cursor<'a> {
        /// The underlying byte slice.
        pub buf: &'a [u8],
        /// Current read offset.
        pub off: usize,
    }

    impl<'a> Cursor<'a> {
        /// Creates a new cursor starting at offset 0.
        pub fn new(buf: &'a [u8]) -> Self {
            Self { buf, off: 0 }
        }

        /// Takes the next `n` bytes, or `None` if fewer remain.
        pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
            let end = self.off.checked_add(n)?;
            let slice = self.buf.get(self.off..end)?;
            self.off = end;
            Some(slice)
        }

        /// Returns the number of bytes remaining in the buffer.
        pub fn remaining(&self) -> usize {
            self.buf.len().saturating_sub(self.off)
        }
    }

    impl<'a> fmt::Debug for Cursor<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Cursor")
                .field("off", &self.off)
                .field("remaining", &self.remaining())
                .finish()
        }
    }
}
