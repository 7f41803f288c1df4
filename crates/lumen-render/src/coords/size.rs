/// Size in device pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ISize {
    pub width: u32,
    pub height: u32,
}

impl ISize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when both dimensions are at least those of `other`.
    #[inline]
    pub const fn covers(self, other: ISize) -> bool {
        self.width >= other.width && self.height >= other.height
    }

    #[inline]
    pub const fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
