use crate::ZstdOutcome;

/// Staging area between the encoder and the output sink. Data is written
/// into the buffer, stays uncommitted until the sink accepts it, then gets
/// committed, which frees the space again.
pub trait Buffer {
    /// Get the writable slice of the buffer.
    fn writable(&mut self) -> &mut [u8];

    /// Mark the first `len` bytes of the writable slice as written.
    ///
    /// ## Panics
    ///
    /// Implementations may panic if `len > self.writable().len()`.
    fn written(&mut self, len: usize);

    /// Get the data that was written but not yet committed.
    fn uncommitted(&self) -> &[u8];

    /// Mark the first `len` uncommitted bytes as handed to the sink.
    ///
    /// ## Panics
    ///
    /// Implementations may panic if `len > self.uncommitted().len()`.
    fn commit(&mut self, len: usize);

    /// Drop any uncommitted data.
    fn clear(&mut self);
}

/// A [Buffer] over a fixed-size array-like type, tracked by two indices:
///
/// ```plain
/// |--------------------- buffer ---------------------|
/// |-- (committed) --|-- uncommitted --|-- writable --|
///                 ^ head            ^ tail
/// ```
///
/// Both indices reset to zero once everything is committed.
pub struct FixedBuffer<T> {
    buffer: T,
    head: usize,
    tail: usize,
}

impl<T> FixedBuffer<T> {
    pub fn new(buffer: T) -> Self {
        Self {
            buffer,
            head: 0,
            tail: 0,
        }
    }

    /// A buffer whose contents are already fully written, waiting to be
    /// moved elsewhere.
    pub fn filled(buffer: T) -> Self
    where
        T: AsRef<[u8]>,
    {
        let tail = buffer.as_ref().len();
        Self {
            buffer,
            head: 0,
            tail,
        }
    }
}

impl<T> Buffer for FixedBuffer<T>
where
    T: AsRef<[u8]> + AsMut<[u8]>,
{
    fn writable(&mut self) -> &mut [u8] {
        let buffer = self.buffer.as_mut();
        &mut buffer[self.tail..]
    }

    fn written(&mut self, len: usize) {
        self.tail += len;
        assert!(self.tail <= self.buffer.as_ref().len());
    }

    fn uncommitted(&self) -> &[u8] {
        let buffer = self.buffer.as_ref();
        &buffer[self.head..self.tail]
    }

    fn commit(&mut self, len: usize) {
        self.head += len;
        assert!(self.head <= self.tail);

        if self.head == self.tail {
            self.head = 0;
            self.tail = 0;
        }
    }

    fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }
}

/// Move as much uncommitted data from `src` into `dst` as fits. Returns
/// [`HasMore(_)`](ZstdOutcome::HasMore) with the bytes left in `src` if
/// `dst` filled up first.
pub fn move_buffer(src: &mut impl Buffer, dst: &mut impl Buffer) -> ZstdOutcome<()> {
    let src_uncommitted = src.uncommitted();
    let dst_writable = dst.writable();

    let movable = src_uncommitted.len().min(dst_writable.len());
    let unmovable = src_uncommitted.len() - movable;

    dst_writable[..movable].copy_from_slice(&src_uncommitted[..movable]);
    src.commit(movable);
    dst.written(movable);

    if unmovable == 0 {
        ZstdOutcome::Complete(())
    } else {
        ZstdOutcome::HasMore {
            remaining_bytes: unmovable,
        }
    }
}

/// Call a function that uses a [`zstd::stream::raw::OutBuffer`] by wrapping
/// a [`Buffer`]. Returns the function's output and the number of bytes it
/// wrote into the buffer.
pub fn with_zstd_out_buffer<R>(
    buffer: &mut impl Buffer,
    f: impl FnOnce(&mut zstd::stream::raw::OutBuffer<'_, [u8]>) -> R,
) -> (R, usize) {
    let mut out_buffer = zstd::stream::raw::OutBuffer::around(buffer.writable());
    let result = f(&mut out_buffer);
    let written = out_buffer.pos();
    buffer.written(written);
    (result, written)
}
