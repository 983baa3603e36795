//! Auto-growing byte arena and typed record views
//!
//! Accumulates variable amounts of glyph bitmaps, metadata and codepoints
//! while packing. Storage is a run of 64-byte aligned blocks so any
//! [`bytemuck::Pod`] record type can be viewed in place.
//!
//! Offsets and indices returned by these buffers stay valid across growth.
//! Slices borrowed from a buffer do not (the borrow checker enforces this).

use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::error::BufferError;

/// Allocation granularity in bytes
pub const BUFFER_ALIGNMENT: usize = 64;

/// Minimum buffer size (one block)
const INITIAL_BUFFER_SIZE: usize = BUFFER_ALIGNMENT;

/// Growth factor when buffer needs to expand (2x)
const BUFFER_GROWTH_FACTOR: usize = 2;

#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C, align(64))]
struct Block([u8; BUFFER_ALIGNMENT]);

/// Round `value` up to the buffer allocation granularity
fn aligned_size(value: usize) -> Option<usize> {
    value.checked_next_multiple_of(BUFFER_ALIGNMENT)
}

/// Growable byte arena
///
/// Live data is `0..len()`, spare capacity is `len()..capacity()`.
/// Every allocated byte is initialised, so capacity bytes past the tail are
/// either zero or leftovers from [`forget_last`](Self::forget_last).
pub struct GrowableBuffer {
    blocks: Vec<Block>,
    tail: usize,
    /// Largest length the buffer may reach, if capped
    limit: Option<usize>,
    label: &'static str,
}

impl GrowableBuffer {
    /// Allocate a zero-filled buffer holding at least `capacity_hint` bytes
    pub fn new(label: &'static str, capacity_hint: usize) -> Result<Self, BufferError> {
        let requested = aligned_size(capacity_hint.max(INITIAL_BUFFER_SIZE))
            .ok_or(BufferError::OutOfMemory {
                requested: capacity_hint,
            })?;

        let mut blocks = Vec::new();
        blocks
            .try_reserve_exact(requested / BUFFER_ALIGNMENT)
            .map_err(|_| BufferError::OutOfMemory { requested })?;
        blocks.resize(requested / BUFFER_ALIGNMENT, Block::zeroed());

        Ok(Self {
            blocks,
            tail: 0,
            limit: None,
            label,
        })
    }

    /// Cap the live length at `max_len` bytes
    ///
    /// Any operation that would take the buffer past the cap fails with
    /// [`BufferError::OutOfMemory`], exactly like a failed allocation.
    pub fn with_limit(mut self, max_len: usize) -> Self {
        self.limit = Some(max_len);
        self
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn check_limit(&self, required: usize) -> Result<(), BufferError> {
        match self.limit {
            Some(limit) if required > limit => Err(BufferError::OutOfMemory { requested: required }),
            _ => Ok(()),
        }
    }

    /// Current used bytes
    pub fn len(&self) -> usize {
        self.tail
    }

    pub fn is_empty(&self) -> bool {
        self.tail == 0
    }

    /// Current capacity in bytes
    pub fn capacity(&self) -> usize {
        self.blocks.len() * BUFFER_ALIGNMENT
    }

    /// True if `n_bytes` can be appended without growing
    pub fn can_add(&self, n_bytes: usize) -> bool {
        self.tail
            .checked_add(n_bytes)
            .is_some_and(|end| end <= self.capacity() && self.limit.is_none_or(|l| end <= l))
    }

    /// Ensure the buffer has room for `n_bytes` past the tail
    ///
    /// On failure nothing changes: content, length and capacity are those
    /// from before the call.
    pub fn ensure_capacity_for(&mut self, n_bytes: usize) -> Result<(), BufferError> {
        if self.can_add(n_bytes) {
            return Ok(());
        }
        let required = self
            .tail
            .checked_add(n_bytes)
            .ok_or(BufferError::OutOfMemory {
                requested: usize::MAX,
            })?;
        self.check_limit(required)?;
        self.grow_to(required)
    }

    fn grow_to(&mut self, required: usize) -> Result<(), BufferError> {
        let capacity = self.capacity();
        if required <= capacity {
            return Ok(());
        }

        // At least double, or enough for required
        let wanted = required.max(capacity.saturating_mul(BUFFER_GROWTH_FACTOR));
        let new_capacity =
            aligned_size(wanted).ok_or(BufferError::OutOfMemory { requested: wanted })?;
        let new_blocks = new_capacity / BUFFER_ALIGNMENT;

        self.blocks
            .try_reserve_exact(new_blocks - self.blocks.len())
            .map_err(|_| BufferError::OutOfMemory {
                requested: new_capacity,
            })?;

        tracing::debug!(
            "Growing buffer '{}': {} -> {} bytes (preserving {} bytes)",
            self.label,
            capacity,
            new_capacity,
            self.tail
        );

        self.blocks.resize(new_blocks, Block::zeroed());
        Ok(())
    }

    fn storage(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blocks)
    }

    fn storage_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.blocks)
    }

    /// Append bytes at the tail
    ///
    /// Returns the byte offset where data was written.
    pub fn append(&mut self, data: &[u8]) -> Result<usize, BufferError> {
        self.ensure_capacity_for(data.len())?;
        let offset = self.tail;
        self.storage_mut()[offset..offset + data.len()].copy_from_slice(data);
        self.tail += data.len();
        Ok(offset)
    }

    /// Append `count` zero bytes at the tail
    pub fn append_zeroed(&mut self, count: usize) -> Result<usize, BufferError> {
        self.ensure_capacity_for(count)?;
        let offset = self.tail;
        self.storage_mut()[offset..offset + count].fill(0);
        self.tail += count;
        Ok(offset)
    }

    /// Drop the last `n_bytes` from the live region without zeroing them
    ///
    /// Forgetting more than is stored empties the buffer.
    pub fn forget_last(&mut self, n_bytes: usize) {
        self.tail -= n_bytes.min(self.tail);
    }

    /// Write bytes at an absolute offset
    ///
    /// Grows the buffer to cover `offset + data.len()` and extends the tail
    /// if the write ends past it. Bytes between the old tail and `offset`
    /// are zeroed.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) -> Result<(), BufferError> {
        let end = offset
            .checked_add(data.len())
            .ok_or(BufferError::OutOfMemory {
                requested: usize::MAX,
            })?;
        self.check_limit(end)?;
        self.grow_to(end)?;

        let tail = self.tail;
        let storage = self.storage_mut();
        if offset > tail {
            storage[tail..offset].fill(0);
        }
        storage[offset..end].copy_from_slice(data);
        self.tail = tail.max(end);
        Ok(())
    }

    /// Move the region `[from, len)` so it starts at `to`
    ///
    /// The tail becomes `to + (len - from)`. Shifting towards the start
    /// overwrites (deletes) `[to, from)`; shifting towards the end opens a
    /// gap and may grow the buffer.
    pub fn shift(&mut self, from: usize, to: usize) -> Result<(), BufferError> {
        if from > self.tail {
            return Err(BufferError::OutOfBounds {
                offset: from,
                len: self.tail,
            });
        }
        let moved = self.tail - from;
        let new_tail = to.checked_add(moved).ok_or(BufferError::OutOfMemory {
            requested: usize::MAX,
        })?;
        self.check_limit(new_tail)?;
        self.grow_to(new_tail)?;

        let tail = self.tail;
        self.storage_mut().copy_within(from..tail, to);
        self.tail = new_tail;
        Ok(())
    }

    /// Empty the buffer, keeping its capacity
    pub fn reset(&mut self) {
        self.tail = 0;
    }

    /// Live bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage()[..self.tail]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let tail = self.tail;
        &mut self.storage_mut()[..tail]
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl AsRef<[u8]> for GrowableBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for GrowableBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("label", &self.label)
            .field("len", &self.tail)
            .field("capacity", &self.capacity())
            .field("limit", &self.limit)
            .finish()
    }
}

// ============================================================================
// Typed view
// ============================================================================

/// A [`GrowableBuffer`] seen as a resizable array of `T` records
///
/// All growth goes through the byte arena; this type only converts
/// record counts to byte counts.
pub struct TypedBuffer<T: Pod> {
    raw: GrowableBuffer,
    _marker: PhantomData<T>,
}

impl<T: Pod> TypedBuffer<T> {
    const RECORD_SIZE: usize = size_of::<T>();

    /// Allocate room for at least `capacity` records
    pub fn new(label: &'static str, capacity: usize) -> Result<Self, BufferError> {
        const {
            assert!(size_of::<T>() > 0, "zero-sized records are not supported");
            assert!(align_of::<T>() <= BUFFER_ALIGNMENT);
        }
        let bytes = capacity
            .checked_mul(Self::RECORD_SIZE)
            .ok_or(BufferError::OutOfMemory {
                requested: usize::MAX,
            })?;
        Ok(Self {
            raw: GrowableBuffer::new(label, bytes)?,
            _marker: PhantomData,
        })
    }

    /// Cap the buffer at `max_records` records
    pub fn with_limit(self, max_records: usize) -> Self {
        Self {
            raw: self
                .raw
                .with_limit(max_records.saturating_mul(Self::RECORD_SIZE)),
            _marker: PhantomData,
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.raw.len() / Self::RECORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Capacity in records
    pub fn capacity(&self) -> usize {
        self.raw.capacity() / Self::RECORD_SIZE
    }

    pub fn can_add(&self, count: usize) -> bool {
        count
            .checked_mul(Self::RECORD_SIZE)
            .is_some_and(|bytes| self.raw.can_add(bytes))
    }

    pub fn ensure_capacity_for(&mut self, count: usize) -> Result<(), BufferError> {
        let bytes = count
            .checked_mul(Self::RECORD_SIZE)
            .ok_or(BufferError::OutOfMemory {
                requested: usize::MAX,
            })?;
        self.raw.ensure_capacity_for(bytes)
    }

    /// Append one record, returning its index
    pub fn push(&mut self, value: T) -> Result<usize, BufferError> {
        let offset = self.raw.append(bytemuck::bytes_of(&value))?;
        Ok(offset / Self::RECORD_SIZE)
    }

    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<(), BufferError> {
        self.raw.append(bytemuck::cast_slice(values)).map(|_| ())
    }

    /// Append `count` zeroed records, returning the index of the first
    pub fn push_zeroed(&mut self, count: usize) -> Result<usize, BufferError> {
        let bytes = count
            .checked_mul(Self::RECORD_SIZE)
            .ok_or(BufferError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let offset = self.raw.append_zeroed(bytes)?;
        Ok(offset / Self::RECORD_SIZE)
    }

    pub fn at(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Overwrite the record at `index`, growing if it lies past the end
    pub fn write_at(&mut self, index: usize, value: T) -> Result<(), BufferError> {
        let offset = index
            .checked_mul(Self::RECORD_SIZE)
            .ok_or(BufferError::OutOfMemory {
                requested: usize::MAX,
            })?;
        self.raw.write_at(offset, bytemuck::bytes_of(&value))
    }

    /// Remove the record at `index`, shifting later records down
    pub fn delete(&mut self, index: usize) -> Result<(), BufferError> {
        if index >= self.len() {
            return Err(BufferError::OutOfBounds {
                offset: index,
                len: self.len(),
            });
        }
        self.raw.shift(
            (index + 1) * Self::RECORD_SIZE,
            index * Self::RECORD_SIZE,
        )
    }

    /// Drop the last `count` records
    pub fn forget_last(&mut self, count: usize) {
        self.raw
            .forget_last(count.saturating_mul(Self::RECORD_SIZE));
    }

    /// Keep only the first `len` records
    pub fn truncate(&mut self, len: usize) {
        let current = self.len();
        if len < current {
            self.forget_last(current - len);
        }
    }

    pub fn reset(&mut self) {
        self.raw.reset();
    }

    pub fn as_slice(&self) -> &[T] {
        bytemuck::cast_slice(self.raw.as_bytes())
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(self.raw.as_bytes_mut())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Live records as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.raw.as_bytes()
    }
}

impl<'a, T: Pod> IntoIterator for &'a TypedBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Pod + std::fmt::Debug> std::fmt::Debug for TypedBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(buf: &GrowableBuffer) {
        assert!(buf.len() <= buf.capacity());
        assert_eq!(buf.capacity() % BUFFER_ALIGNMENT, 0);
        assert_eq!(buf.as_bytes().len(), buf.len());
    }

    #[test]
    fn test_new_is_zeroed_and_aligned() {
        let buf = GrowableBuffer::new("test", 100).unwrap();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 128);
        assert!(buf.storage().iter().all(|&b| b == 0));
        assert_eq!(buf.storage().as_ptr() as usize % BUFFER_ALIGNMENT, 0);
    }

    #[test]
    fn test_zero_hint_gets_minimum() {
        let buf = GrowableBuffer::new("test", 0).unwrap();
        assert_eq!(buf.capacity(), INITIAL_BUFFER_SIZE);
    }

    #[test]
    fn test_can_add_boundary() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        assert!(buf.can_add(64));
        assert!(!buf.can_add(65));
        buf.append(&[1; 60]).unwrap();
        assert!(buf.can_add(4));
        assert!(!buf.can_add(5));
        assert!(!buf.can_add(usize::MAX));
    }

    #[test]
    fn test_length_tracks_appends_and_forgets() {
        let mut buf = GrowableBuffer::new("test", 8).unwrap();
        let mut expected = 0usize;
        for i in 0..50usize {
            let chunk = vec![i as u8; i % 7 + 1];
            buf.append(&chunk).unwrap();
            expected += chunk.len();
            if i % 5 == 0 {
                buf.forget_last(2);
                expected -= 2.min(expected);
            }
            buf.ensure_capacity_for(i).unwrap();
            assert_invariants(&buf);
            assert_eq!(buf.len(), expected);
        }
    }

    #[test]
    fn test_growth_preserves_content() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        let first: Vec<u8> = (0..64).collect();
        buf.append(&first).unwrap();
        let offset = buf.append(&[0xAA; 100]).unwrap();
        assert_eq!(offset, 64);
        assert!(buf.capacity() >= 164);
        assert_eq!(&buf.as_bytes()[..64], first.as_slice());
        assert!(buf.as_bytes()[64..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_growth_doubles_at_least() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(&[0; 64]).unwrap();
        buf.ensure_capacity_for(1).unwrap();
        assert_eq!(buf.capacity(), 128);
    }

    #[test]
    fn test_failed_growth_is_noop() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(b"glyphs").unwrap();
        let capacity = buf.capacity();

        let err = buf.ensure_capacity_for(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, BufferError::OutOfMemory { .. }));
        assert!(buf.append(&vec![0; 16]).is_ok());
        buf.forget_last(16);

        assert!(buf.ensure_capacity_for(usize::MAX).is_err());
        assert_eq!(buf.as_bytes(), b"glyphs");
        assert_eq!(buf.capacity(), capacity);
    }

    #[test]
    fn test_forget_more_than_stored() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(&[1, 2, 3]).unwrap();
        buf.forget_last(10);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_append_zeroed_clears_leftovers() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(&[9; 8]).unwrap();
        buf.forget_last(8);
        buf.append_zeroed(8).unwrap();
        assert_eq!(buf.as_bytes(), &[0; 8]);
    }

    #[test]
    fn test_write_at_grows_and_extends_tail() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(&[1, 2]).unwrap();
        buf.write_at(200, &[7, 7]).unwrap();
        assert_eq!(buf.len(), 202);
        assert!(buf.capacity() >= 202);
        assert_eq!(&buf.as_bytes()[..2], &[1, 2]);
        assert!(buf.as_bytes()[2..200].iter().all(|&b| b == 0));

        // Overwrite inside the live region keeps the tail
        buf.write_at(0, &[5]).unwrap();
        assert_eq!(buf.len(), 202);
        assert_eq!(buf.as_bytes()[0], 5);
    }

    #[test]
    fn test_shift_deletes() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(&[0, 1, 2, 3, 4, 5]).unwrap();
        buf.shift(3, 1).unwrap();
        assert_eq!(buf.as_bytes(), &[0, 3, 4, 5]);
    }

    #[test]
    fn test_shift_opens_gap() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(&[0, 1, 2]).unwrap();
        buf.shift(1, 100).unwrap();
        assert_eq!(buf.len(), 102);
        assert_eq!(&buf.as_bytes()[100..], &[1, 2]);
    }

    #[test]
    fn test_shift_past_tail_fails() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(&[0, 1]).unwrap();
        assert!(matches!(
            buf.shift(3, 0),
            Err(BufferError::OutOfBounds { offset: 3, len: 2 })
        ));
        assert_eq!(buf.as_bytes(), &[0, 1]);
    }

    #[test]
    fn test_reset_keeps_capacity() {
        let mut buf = GrowableBuffer::new("test", 64).unwrap();
        buf.append(&[0; 300]).unwrap();
        let capacity = buf.capacity();
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity(), capacity);
    }

    #[test]
    fn test_limit_below_capacity() {
        let mut buf = GrowableBuffer::new("test", 256).unwrap().with_limit(10);
        buf.append(&[1; 8]).unwrap();
        assert!(buf.can_add(2));
        assert!(!buf.can_add(3));

        let err = buf.append(&[2; 3]).unwrap_err();
        assert_eq!(err, BufferError::OutOfMemory { requested: 11 });
        assert_eq!(buf.as_bytes(), &[1; 8]);

        assert!(buf.write_at(9, &[0, 0]).is_err());
        assert!(buf.shift(0, 4).is_err());
        assert_eq!(buf.len(), 8);
        buf.append(&[3, 3]).unwrap();
        assert_eq!(buf.len(), 10);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
    #[repr(C)]
    struct Record {
        a: u32,
        b: u16,
        c: u16,
    }

    #[test]
    fn test_typed_push_and_at() {
        let mut records = TypedBuffer::<Record>::new("records", 2).unwrap();
        for i in 0..40u32 {
            let index = records
                .push(Record {
                    a: i,
                    b: i as u16 * 2,
                    c: 0,
                })
                .unwrap();
            assert_eq!(index, i as usize);
        }
        assert_eq!(records.len(), 40);
        assert_eq!(records.at(39).unwrap().a, 39);
        assert_eq!(records.at(10).unwrap().b, 20);
        assert!(records.at(40).is_none());
        assert_eq!(records.last().unwrap().a, 39);
    }

    #[test]
    fn test_typed_delete() {
        let mut values = TypedBuffer::<u32>::new("values", 4).unwrap();
        values.extend_from_slice(&[10, 20, 30, 40]).unwrap();
        values.delete(1).unwrap();
        assert_eq!(values.as_slice(), &[10, 30, 40]);
        values.delete(2).unwrap();
        assert_eq!(values.as_slice(), &[10, 30]);
        assert!(values.delete(2).is_err());
    }

    #[test]
    fn test_typed_forget_and_truncate() {
        let mut values = TypedBuffer::<u16>::new("values", 4).unwrap();
        values.extend_from_slice(&[1, 2, 3, 4, 5]).unwrap();
        values.forget_last(2);
        assert_eq!(values.as_slice(), &[1, 2, 3]);
        values.truncate(1);
        assert_eq!(values.as_slice(), &[1]);
        values.truncate(5);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_typed_push_zeroed_and_write_at() {
        let mut values = TypedBuffer::<u32>::new("values", 1).unwrap();
        let first = values.push_zeroed(3).unwrap();
        assert_eq!(first, 0);
        values.write_at(1, 7).unwrap();
        values.write_at(5, 9).unwrap();
        assert_eq!(values.as_slice(), &[0, 7, 0, 0, 0, 9]);
    }

    #[test]
    fn test_typed_iter_matches_slice() {
        let mut values = TypedBuffer::<u32>::new("values", 4).unwrap();
        values.extend_from_slice(&[3, 1, 2]).unwrap();
        values.as_mut_slice().sort_unstable();
        let collected: Vec<u32> = (&values).into_iter().copied().collect();
        assert_eq!(collected, vec![1, 2, 3]);
        assert_eq!(values.as_bytes().len(), 12);
    }

    #[test]
    fn test_typed_limit_in_records() {
        let mut values = TypedBuffer::<u32>::new("values", 16).unwrap().with_limit(2);
        values.push(1).unwrap();
        values.push(2).unwrap();
        assert!(!values.can_add(1));
        assert!(matches!(
            values.push(3),
            Err(BufferError::OutOfMemory { requested: 12 })
        ));
        assert_eq!(values.as_slice(), &[1, 2]);
    }
}
