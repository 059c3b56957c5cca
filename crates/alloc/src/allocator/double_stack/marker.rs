//! Sides and markers of a double stack

use core::fmt;

/// One of the two stacks of a [`DoubleStackAllocator`](super::DoubleStackAllocator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Grows upward from the start of the buffer
    Left,
    /// Grows downward from the end of the buffer
    Right,
}

impl Side {
    /// The opposite side
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        })
    }
}

/// Cursor position of one side, captured by
/// [`DoubleStackAllocator::marker`](super::DoubleStackAllocator::marker)
///
/// For the left side `index` is the first free byte; for the right side it
/// is the lowest used byte (the capacity when that side is empty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoubleStackMarker {
    pub(super) side: Side,
    pub(super) index: usize,
}

impl DoubleStackMarker {
    /// Side this marker belongs to
    #[inline]
    pub const fn side(self) -> Side {
        self.side
    }

    /// Cursor offset captured by this marker
    #[inline]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for DoubleStackMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.side, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Left.to_string(), "LEFT");
        assert_eq!(Side::Right.to_string(), "RIGHT");
        assert_eq!(Side::Left.other(), Side::Right);
    }

    #[test]
    fn test_marker_display() {
        let marker = DoubleStackMarker {
            side: Side::Right,
            index: 96,
        };
        assert_eq!(marker.to_string(), "RIGHT@96");
    }
}
