//! Field iteration over a descriptor table.
//!
//! Offsets are recomputed incrementally as the cursor moves:
//!
//! ```text
//! data(next) = data(prev) + span(prev) + next.data_offset
//! size(next) = data(next) + next.size_offset
//! ```
//!
//! Wrapping back to the first field restarts from the image base. There is
//! no random access by index, only sequential steps and [`FieldIter::find`].

use crate::field::{FieldDescriptor, MessageDescriptor};

/// One field together with its absolute offsets in a record image.
#[derive(Debug, Clone, Copy)]
pub struct FieldSlot<'m> {
    /// Position in the descriptor table, also the presence bit index.
    pub index: usize,
    /// The field's descriptor.
    pub field: &'m FieldDescriptor,
    /// Offset of the value storage.
    pub data: usize,
    /// Offset of the size slot (presence flag or element count).
    pub size: usize,
}

/// A wrapping cursor over the fields of one message.
#[derive(Debug, Clone)]
pub struct FieldIter<'m> {
    fields: &'m [FieldDescriptor],
    index: usize,
    data: usize,
    size: usize,
}

impl<'m> FieldIter<'m> {
    /// Positions a cursor on the first field.
    ///
    /// Returns `None` for a message without fields.
    pub fn new(msg: &'m MessageDescriptor) -> Option<Self> {
        let first = msg.fields.first()?;
        let data = first.data_offset;
        Some(FieldIter {
            fields: msg.fields,
            index: 0,
            data,
            size: data.wrapping_add_signed(first.size_offset),
        })
    }

    /// Position of the current field in the table.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Descriptor of the current field.
    #[inline]
    pub fn field(&self) -> &'m FieldDescriptor {
        &self.fields[self.index]
    }

    /// Offset of the current field's value storage.
    #[inline]
    pub fn data(&self) -> usize {
        self.data
    }

    /// Offset of the current field's size slot.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The current field with its offsets.
    pub fn slot(&self) -> FieldSlot<'m> {
        FieldSlot {
            index: self.index,
            field: self.field(),
            data: self.data,
            size: self.size,
        }
    }

    /// Moves to the next field, wrapping to the first after the last.
    ///
    /// Returns `false` when the move wrapped.
    pub fn advance(&mut self) -> bool {
        let mut prev_span = self.field().span();
        let mut not_wrapped = true;

        self.index += 1;
        if self.index == self.fields.len() {
            self.index = 0;
            self.data = 0;
            prev_span = 0;
            not_wrapped = false;
        }

        let field = self.field();
        self.data = self
            .data
            .saturating_add(prev_span)
            .saturating_add(field.data_offset);
        self.size = self.data.wrapping_add_signed(field.size_offset);
        not_wrapped
    }

    /// Scans forward from the current field for `tag`, wrapping once.
    ///
    /// On a miss the cursor ends where it started.
    pub fn find(&mut self, tag: u32) -> bool {
        let start = self.index;
        loop {
            if self.field().tag == tag {
                return true;
            }
            self.advance();
            if self.index == start {
                return false;
            }
        }
    }
}

/// A single forward pass over every field, in descriptor order.
#[derive(Debug, Clone)]
pub struct Slots<'m> {
    iter: Option<FieldIter<'m>>,
}

impl<'m> Slots<'m> {
    /// Starts a forward pass over `msg`.
    pub fn new(msg: &'m MessageDescriptor) -> Self {
        Slots {
            iter: FieldIter::new(msg),
        }
    }
}

impl<'m> Iterator for Slots<'m> {
    type Item = FieldSlot<'m>;

    fn next(&mut self) -> Option<Self::Item> {
        let iter = self.iter.as_mut()?;
        let slot = iter.slot();
        if !iter.advance() {
            self.iter = None;
        }
        Some(slot)
    }
}

/// A single backward pass over every field, last field first.
///
/// The image end is found by summing every field's offset and span up front,
/// then each step subtracts its way back, so no offset table is needed.
#[derive(Debug, Clone)]
pub struct RevSlots<'m> {
    fields: &'m [FieldDescriptor],
    index: usize,
    end: usize,
}

impl<'m> RevSlots<'m> {
    /// Starts a backward pass over `msg`.
    pub fn new(msg: &'m MessageDescriptor) -> Self {
        let end = msg.fields.iter().fold(0usize, |end, field| {
            end.saturating_add(field.data_offset)
                .saturating_add(field.span())
        });
        RevSlots {
            fields: msg.fields,
            index: msg.fields.len(),
            end,
        }
    }
}

impl<'m> Iterator for RevSlots<'m> {
    type Item = FieldSlot<'m>;

    fn next(&mut self) -> Option<Self::Item> {
        self.index = self.index.checked_sub(1)?;
        let field = &self.fields[self.index];
        let data = self.end.saturating_sub(field.span());
        self.end = data.saturating_sub(field.data_offset);
        Some(FieldSlot {
            index: self.index,
            field,
            data,
            size: data.wrapping_add_signed(field.size_offset),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Cardinality, FieldLink, FieldType, WireKind, common};

    // bitmap(1) | a: u32 @1 | has_b(4) b: u32 @9 | c: [u64; 3] @13, count @37 | d: u8 @41
    static FIELDS: [FieldDescriptor; 4] = [
        common::REQUIRED_VARINT32.with_tag(1).with_data_offset(1),
        common::OPTIONAL_VARINT32.with_tag(2),
        FieldDescriptor {
            tag: 5,
            ty: FieldType::new(Cardinality::Array, WireKind::Fixed64),
            data_offset: 0,
            size_offset: 24,
            data_size: 8,
            array_size: 3,
            link: FieldLink::None,
        },
        common::REQUIRED_BOOL.with_tag(9).with_data_offset(4),
    ];
    static MSG: MessageDescriptor = MessageDescriptor::new(&FIELDS, 42);

    #[test]
    fn test_offsets_follow_layout() {
        let offsets: Vec<_> = MSG.slots().map(|s| (s.index, s.data, s.size)).collect();
        assert_eq!(offsets, [(0, 1, 1), (1, 9, 5), (2, 13, 37), (3, 41, 41)]);
    }

    #[test]
    fn test_reverse_matches_forward() {
        let forward: Vec<_> = MSG.slots().map(|s| (s.index, s.data, s.size)).collect();
        let mut backward: Vec<_> = MSG.slots_rev().map(|s| (s.index, s.data, s.size)).collect();
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_advance_wraps() {
        let mut iter = FieldIter::new(&MSG).unwrap();
        assert!(iter.advance());
        assert!(iter.advance());
        assert!(iter.advance());
        assert_eq!(iter.field().tag, 9);
        assert!(!iter.advance());
        assert_eq!(iter.index(), 0);
        assert_eq!(iter.data(), 1);
    }

    #[test]
    fn test_find_wraps_around() {
        let mut iter = FieldIter::new(&MSG).unwrap();
        assert!(iter.find(5));
        assert_eq!(iter.index(), 2);
        assert_eq!(iter.data(), 13);
        assert_eq!(iter.size(), 37);

        assert!(iter.find(2));
        assert_eq!(iter.index(), 1);
        assert_eq!(iter.data(), 9);
    }

    #[test]
    fn test_find_miss_keeps_position() {
        let mut iter = FieldIter::new(&MSG).unwrap();
        assert!(iter.find(5));
        assert!(!iter.find(42));
        assert_eq!(iter.index(), 2);
        assert_eq!(iter.data(), 13);
    }

    #[test]
    fn test_empty_message() {
        static EMPTY: MessageDescriptor = MessageDescriptor::new(&[], 0);
        assert!(FieldIter::new(&EMPTY).is_none());
        assert_eq!(EMPTY.slots().count(), 0);
        assert_eq!(EMPTY.slots_rev().count(), 0);
    }
}
