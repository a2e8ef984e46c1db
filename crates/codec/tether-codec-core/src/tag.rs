//! Wire tags and header packing.

/// Type tag stored in the top byte of every header.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Undefined = 0,
    Null,
    True,
    False,
    String,
    Function,
    Array,
    Object,
    Int32,
    Uint32,
    Number,
    Date,
    Regexp,
    ListModel,
    Sequence,
}

impl Tag {
    pub fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Tag::Undefined,
            1 => Tag::Null,
            2 => Tag::True,
            3 => Tag::False,
            4 => Tag::String,
            5 => Tag::Function,
            6 => Tag::Array,
            7 => Tag::Object,
            8 => Tag::Int32,
            9 => Tag::Uint32,
            10 => Tag::Number,
            11 => Tag::Date,
            12 => Tag::Regexp,
            13 => Tag::ListModel,
            14 => Tag::Sequence,
            _ => return None,
        })
    }
}

/// Pack a header word. `size` is masked to 24 bits.
#[inline]
pub const fn header(tag: Tag, size: u32) -> u32 {
    ((tag as u32) << 24) | (size & 0x00FF_FFFF)
}

/// Split a header word into its raw tag byte and size.
#[inline]
pub const fn split_header(word: u32) -> (u8, u32) {
    ((word >> 24) as u8, word & 0x00FF_FFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_packs_tag_in_top_byte() {
        assert_eq!(header(Tag::String, 5), 0x0400_0005);
        assert_eq!(split_header(header(Tag::Sequence, 0xFF_FFFF)), (14, 0xFF_FFFF));
        assert_eq!(Tag::from_u8(12), Some(Tag::Regexp));
        assert_eq!(Tag::from_u8(15), None);
    }
}
