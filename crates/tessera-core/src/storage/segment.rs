//! Column segments: typed append-only storage with lock-free publication.
//!
//! A segment is one column's storage within one chunk. The engine keeps
//! a closed set of segment shapes — plain value storage, dictionary
//! encoding and positional reference indirection — dispatched through a
//! tagged enum rather than virtual calls, so consumers can branch on
//! the shape once and then iterate on native types.
//!
//! The mutable building block is [`TypedVec`]: a fixed-capacity vector
//! whose appends claim a slot, write it, and only then publish the new
//! length with release ordering. Readers acquire-load the published
//! length and can therefore never observe a partially written row, even
//! while a writer is appending on another thread.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};

use arcstr::ArcStr;
use tessera_common::types::{ChunkOffset, DataType, Value};

use super::reference_segment::ReferenceSegment;

/// Fixed-capacity, append-only vector with atomic length publication.
///
/// Appends are expected to be serialized by the owner (the table append
/// lock); the publication protocol nevertheless tolerates concurrent
/// appenders by making each one wait for its predecessor slot to be
/// published. Reads are lock-free.
pub struct TypedVec<T> {
    cells: Box<[UnsafeCell<MaybeUninit<T>>]>,
    /// Slots handed out to writers.
    reserved: AtomicU32,
    /// Slots whose contents are visible to readers; always <= reserved.
    published: AtomicU32,
}

// Readers only ever touch cells below `published`, which are never
// written again; writers own their reserved cell exclusively.
unsafe impl<T: Send + Sync> Sync for TypedVec<T> {}
unsafe impl<T: Send> Send for TypedVec<T> {}

impl<T> TypedVec<T> {
    /// Creates an empty vector with the given fixed capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let cells = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            cells,
            reserved: AtomicU32::new(0),
            published: AtomicU32::new(0),
        }
    }

    /// Returns the fixed capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Returns the number of published (readable) elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.published.load(Ordering::Acquire) as usize
    }

    /// Returns `true` if no element has been published yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a value, publishing it to concurrent readers.
    ///
    /// # Panics
    /// Panics if the vector is full; callers rotate to a fresh chunk
    /// before capacity is exceeded.
    pub fn push(&self, value: T) {
        let idx = self.reserved.fetch_add(1, Ordering::Relaxed) as usize;
        assert!(
            idx < self.cells.len(),
            "segment append past fixed capacity {}",
            self.cells.len()
        );

        unsafe {
            (*self.cells[idx].get()).write(value);
        }

        // Publish in slot order so readers never see a gap.
        while self.published.load(Ordering::Acquire) != idx as u32 {
            std::hint::spin_loop();
        }
        self.published.store(idx as u32 + 1, Ordering::Release);
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Panics
    /// Panics if `index` is not a published element.
    #[must_use]
    pub fn get(&self, index: usize) -> &T {
        let len = self.len();
        assert!(index < len, "segment offset {index} out of range ({len} rows)");
        unsafe { (*self.cells[index].get()).assume_init_ref() }
    }

    /// Returns the published prefix as a slice.
    ///
    /// The prefix is immutable once published, so the slice stays valid
    /// for the lifetime of the borrow regardless of concurrent appends.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        let len = self.len();
        // UnsafeCell<MaybeUninit<T>> has the same layout as T and the
        // published prefix is fully initialized.
        unsafe { std::slice::from_raw_parts(self.cells.as_ptr().cast::<T>(), len) }
    }

    /// Approximate heap size of the backing storage.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.capacity() * std::mem::size_of::<T>()
    }
}

impl<T> Drop for TypedVec<T> {
    fn drop(&mut self) {
        let len = *self.published.get_mut() as usize;
        for cell in &mut self.cells[..len] {
            unsafe {
                cell.get_mut().assume_init_drop();
            }
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for TypedVec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// One nullable column's mutable storage: values plus null flags.
///
/// Non-nullable columns skip the flag vector entirely.
#[derive(Debug)]
pub struct TypedColumn<T> {
    values: TypedVec<T>,
    nulls: Option<TypedVec<bool>>,
}

impl<T: Default> TypedColumn<T> {
    /// Creates an empty column with the given fixed capacity.
    #[must_use]
    pub fn new(nullable: bool, capacity: usize) -> Self {
        Self {
            values: TypedVec::with_capacity(capacity),
            nulls: nullable.then(|| TypedVec::with_capacity(capacity)),
        }
    }

    /// Appends a value or a null.
    ///
    /// # Panics
    /// Panics when appending null to a non-nullable column.
    pub fn push(&self, value: Option<T>) {
        match (value, &self.nulls) {
            (Some(v), Some(nulls)) => {
                self.values.push(v);
                nulls.push(false);
            }
            (Some(v), None) => self.values.push(v),
            (None, Some(nulls)) => {
                self.values.push(T::default());
                nulls.push(true);
            }
            (None, None) => panic!("cannot append null to a non-nullable column"),
        }
    }
}

impl<T> TypedColumn<T> {
    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the column holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns whether the column accepts nulls.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nulls.is_some()
    }

    /// Returns the value at `offset`, or `None` if it is null.
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<&T> {
        if self.is_null(offset) {
            None
        } else {
            Some(self.values.get(offset))
        }
    }

    /// Returns whether the row at `offset` is null.
    #[must_use]
    pub fn is_null(&self, offset: usize) -> bool {
        match &self.nulls {
            Some(nulls) => *nulls.get(offset),
            None => {
                // Bounds discipline even for the non-null fast answer.
                let _ = self.values.get(offset);
                false
            }
        }
    }

    /// Returns the published values as a slice (nulls hold `T::default()`).
    #[must_use]
    pub fn values(&self) -> &[T] {
        self.values.as_slice()
    }

    /// Returns the null flags, if the column is nullable.
    #[must_use]
    pub fn null_flags(&self) -> Option<&[bool]> {
        self.nulls.as_ref().map(TypedVec::as_slice)
    }

    /// Approximate heap size of the column.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.values.memory_usage()
            + self.nulls.as_ref().map_or(0, TypedVec::memory_usage)
    }
}

/// Plain value storage for one column of one chunk.
#[derive(Debug)]
pub enum ValueSegment {
    /// 64-bit integers.
    Int64(TypedColumn<i64>),
    /// 64-bit floats.
    Float64(TypedColumn<f64>),
    /// Booleans.
    Bool(TypedColumn<bool>),
    /// UTF-8 strings.
    Text(TypedColumn<ArcStr>),
}

impl ValueSegment {
    /// Creates an empty segment of the given type and capacity.
    #[must_use]
    pub fn new(data_type: DataType, nullable: bool, capacity: usize) -> Self {
        match data_type {
            DataType::Int64 => Self::Int64(TypedColumn::new(nullable, capacity)),
            DataType::Float64 => Self::Float64(TypedColumn::new(nullable, capacity)),
            DataType::Bool => Self::Bool(TypedColumn::new(nullable, capacity)),
            DataType::Text => Self::Text(TypedColumn::new(nullable, capacity)),
        }
    }

    /// Returns the segment's data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Bool(_) => DataType::Bool,
            Self::Text(_) => DataType::Text,
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int64(c) => c.len(),
            Self::Float64(c) => c.len(),
            Self::Bool(c) => c.len(),
            Self::Text(c) => c.len(),
        }
    }

    /// Returns `true` if the segment holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a dynamic value.
    ///
    /// # Panics
    /// Panics on a type mismatch between the value and the segment.
    pub fn push_value(&self, value: &Value) {
        match (self, value) {
            (Self::Int64(c), Value::Int64(v)) => c.push(Some(*v)),
            (Self::Float64(c), Value::Float64(v)) => c.push(Some(*v)),
            (Self::Bool(c), Value::Bool(v)) => c.push(Some(*v)),
            (Self::Text(c), Value::Text(v)) => c.push(Some(v.clone())),
            (Self::Int64(c), Value::Null) => c.push(None),
            (Self::Float64(c), Value::Null) => c.push(None),
            (Self::Bool(c), Value::Null) => c.push(None),
            (Self::Text(c), Value::Null) => c.push(None),
            (seg, value) => panic!(
                "type mismatch: cannot append {value:?} to {} segment",
                seg.data_type()
            ),
        }
    }

    /// Materializes the value at `offset` (null-tagged).
    #[must_use]
    pub fn value_at(&self, offset: ChunkOffset) -> Value {
        let idx = offset.as_usize();
        match self {
            Self::Int64(c) => c.get(idx).map_or(Value::Null, |v| Value::Int64(*v)),
            Self::Float64(c) => c.get(idx).map_or(Value::Null, |v| Value::Float64(*v)),
            Self::Bool(c) => c.get(idx).map_or(Value::Null, |v| Value::Bool(*v)),
            Self::Text(c) => c.get(idx).map_or(Value::Null, |v| Value::Text(v.clone())),
        }
    }

    /// Approximate heap size, including string payloads.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        match self {
            Self::Int64(c) => c.memory_usage(),
            Self::Float64(c) => c.memory_usage(),
            Self::Bool(c) => c.memory_usage(),
            Self::Text(c) => {
                c.memory_usage() + c.values().iter().map(|s| s.len()).sum::<usize>()
            }
        }
    }
}

/// Immutable dictionary-encoded storage: sorted distinct values plus one
/// code per row. The code `dictionary.len()` encodes null.
#[derive(Debug, Clone)]
pub struct DictColumn<T> {
    dictionary: Vec<T>,
    codes: Vec<u32>,
}

impl<T: Clone> DictColumn<T> {
    fn from_rows(rows: &[T], nulls: Option<&[bool]>, cmp: impl Fn(&T, &T) -> std::cmp::Ordering) -> Self {
        let mut dictionary: Vec<T> = Vec::new();
        for (i, v) in rows.iter().enumerate() {
            if nulls.is_some_and(|n| n[i]) {
                continue;
            }
            dictionary.push(v.clone());
        }
        dictionary.sort_by(&cmp);
        dictionary.dedup_by(|a, b| cmp(a, b) == std::cmp::Ordering::Equal);

        let null_code = dictionary.len() as u32;
        let codes = rows
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if nulls.is_some_and(|n| n[i]) {
                    null_code
                } else {
                    dictionary
                        .binary_search_by(|d| cmp(d, v))
                        .expect("dictionary misses a non-null row value") as u32
                }
            })
            .collect();

        Self { dictionary, codes }
    }

    /// Returns the value at `offset`, or `None` for null.
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<&T> {
        let code = self.codes[offset] as usize;
        self.dictionary.get(code)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns the sorted distinct values.
    #[must_use]
    pub fn dictionary(&self) -> &[T] {
        &self.dictionary
    }

    /// Returns the per-row codes.
    #[must_use]
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    fn memory_usage(&self) -> usize {
        self.dictionary.capacity() * std::mem::size_of::<T>()
            + self.codes.capacity() * std::mem::size_of::<u32>()
    }
}

/// Dictionary-encoded counterpart of [`ValueSegment`].
#[derive(Debug, Clone)]
pub enum DictionarySegment {
    /// 64-bit integers.
    Int64(DictColumn<i64>),
    /// 64-bit floats.
    Float64(DictColumn<f64>),
    /// Booleans.
    Bool(DictColumn<bool>),
    /// UTF-8 strings.
    Text(DictColumn<ArcStr>),
}

impl DictionarySegment {
    /// Builds a dictionary encoding of a finalized value segment.
    #[must_use]
    pub fn compress(segment: &ValueSegment) -> Self {
        use tessera_common::types::OrderedFloat64;
        match segment {
            ValueSegment::Int64(c) => {
                Self::Int64(DictColumn::from_rows(c.values(), c.null_flags(), i64::cmp))
            }
            ValueSegment::Float64(c) => Self::Float64(DictColumn::from_rows(
                c.values(),
                c.null_flags(),
                |a, b| OrderedFloat64(*a).cmp(&OrderedFloat64(*b)),
            )),
            ValueSegment::Bool(c) => {
                Self::Bool(DictColumn::from_rows(c.values(), c.null_flags(), bool::cmp))
            }
            ValueSegment::Text(c) => {
                Self::Text(DictColumn::from_rows(c.values(), c.null_flags(), ArcStr::cmp))
            }
        }
    }

    /// Returns the segment's data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Bool(_) => DataType::Bool,
            Self::Text(_) => DataType::Text,
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int64(c) => c.len(),
            Self::Float64(c) => c.len(),
            Self::Bool(c) => c.len(),
            Self::Text(c) => c.len(),
        }
    }

    /// Materializes the value at `offset` (null-tagged).
    #[must_use]
    pub fn value_at(&self, offset: ChunkOffset) -> Value {
        let idx = offset.as_usize();
        match self {
            Self::Int64(c) => c.get(idx).map_or(Value::Null, |v| Value::Int64(*v)),
            Self::Float64(c) => c.get(idx).map_or(Value::Null, |v| Value::Float64(*v)),
            Self::Bool(c) => c.get(idx).map_or(Value::Null, |v| Value::Bool(*v)),
            Self::Text(c) => c.get(idx).map_or(Value::Null, |v| Value::Text(v.clone())),
        }
    }

    /// Approximate heap size.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        match self {
            Self::Int64(c) => c.memory_usage(),
            Self::Float64(c) => c.memory_usage(),
            Self::Bool(c) => c.memory_usage(),
            Self::Text(c) => {
                c.memory_usage() + c.dictionary().iter().map(|s| s.len()).sum::<usize>()
            }
        }
    }
}

/// A column's storage within one chunk: the closed set of shapes.
#[derive(Debug)]
pub enum Segment {
    /// Plain typed value storage.
    Value(ValueSegment),
    /// Dictionary-encoded immutable storage.
    Dictionary(DictionarySegment),
    /// Positional indirection into another table's segments.
    Reference(ReferenceSegment),
}

impl Segment {
    /// Returns the segment's data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Value(s) => s.data_type(),
            Self::Dictionary(s) => s.data_type(),
            Self::Reference(s) => s.data_type(),
        }
    }

    /// Returns the number of rows this segment exposes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Value(s) => s.len(),
            Self::Dictionary(s) => s.len(),
            Self::Reference(s) => s.len(),
        }
    }

    /// Returns `true` if the segment exposes no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for reference segments.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// Materializes the value at `offset` (null-tagged).
    #[must_use]
    pub fn value_at(&self, offset: ChunkOffset) -> Value {
        match self {
            Self::Value(s) => s.value_at(offset),
            Self::Dictionary(s) => s.value_at(offset),
            Self::Reference(s) => s.value_at(offset.as_usize()),
        }
    }

    /// Approximate heap size.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        match self {
            Self::Value(s) => s.memory_usage(),
            Self::Dictionary(s) => s.memory_usage(),
            Self::Reference(s) => s.memory_usage(),
        }
    }
}

/// A resolved, branch-light read handle over one physical segment.
///
/// Built once per segment (the "check once" step), then dereferenced per
/// row without chunk lookups or shape re-resolution.
pub enum SegmentAccessor<'a, T> {
    /// View over plain value storage.
    Plain {
        /// Published values; nulls hold the type's default.
        values: &'a [T],
        /// Null flags for nullable columns.
        nulls: Option<&'a [bool]>,
    },
    /// View over dictionary-encoded storage.
    Dictionary {
        /// Per-row codes; `dictionary.len()` encodes null.
        codes: &'a [u32],
        /// Sorted distinct values.
        dictionary: &'a [T],
    },
}

impl<T: Clone> SegmentAccessor<'_, T> {
    /// Returns the value at `offset`, or `None` for null.
    ///
    /// # Panics
    /// Panics if `offset` is out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, offset: ChunkOffset) -> Option<T> {
        let idx = offset.as_usize();
        match self {
            Self::Plain { values, nulls } => {
                if nulls.is_some_and(|n| n[idx]) {
                    // Keep bounds discipline for the value slot too.
                    assert!(idx < values.len(), "segment offset {idx} out of range");
                    None
                } else {
                    Some(values[idx].clone())
                }
            }
            Self::Dictionary { codes, dictionary } => {
                dictionary.get(codes[idx] as usize).cloned()
            }
        }
    }

    /// Returns the number of rows behind this accessor.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Plain { values, .. } => values.len(),
            Self::Dictionary { codes, .. } => codes.len(),
        }
    }

    /// Returns `true` if the accessor covers no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maps a native Rust type to its segment shape.
///
/// This is what lets scan and iteration code stay generic over the
/// column type while still reading plain slices on the hot path.
pub trait SegmentType: Clone + Send + Sync + Sized + 'static {
    /// The engine data type this native type stores.
    const DATA_TYPE: DataType;

    /// Builds a read accessor over a physical segment.
    ///
    /// # Panics
    /// Panics on a data type mismatch, and on reference segments —
    /// reference-to-reference chains are a configuration error.
    fn accessor(segment: &Segment) -> SegmentAccessor<'_, Self>;

    /// Wraps a native value into a [`Value`].
    fn into_value(self) -> Value;

    /// Extracts a native value from a [`Value`], if the type matches.
    fn from_value(value: &Value) -> Option<Self>;
}

fn accessor_mismatch(expected: DataType, segment: &Segment) -> ! {
    if segment.is_reference() {
        panic!("reference segment pointing at a reference segment is not allowed");
    }
    panic!(
        "segment type mismatch: expected {expected}, found {}",
        segment.data_type()
    );
}

impl SegmentType for i64 {
    const DATA_TYPE: DataType = DataType::Int64;

    fn accessor(segment: &Segment) -> SegmentAccessor<'_, Self> {
        match segment {
            Segment::Value(ValueSegment::Int64(c)) => SegmentAccessor::Plain {
                values: c.values(),
                nulls: c.null_flags(),
            },
            Segment::Dictionary(DictionarySegment::Int64(c)) => SegmentAccessor::Dictionary {
                codes: c.codes(),
                dictionary: c.dictionary(),
            },
            other => accessor_mismatch(Self::DATA_TYPE, other),
        }
    }

    fn into_value(self) -> Value {
        Value::Int64(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int64()
    }
}

impl SegmentType for f64 {
    const DATA_TYPE: DataType = DataType::Float64;

    fn accessor(segment: &Segment) -> SegmentAccessor<'_, Self> {
        match segment {
            Segment::Value(ValueSegment::Float64(c)) => SegmentAccessor::Plain {
                values: c.values(),
                nulls: c.null_flags(),
            },
            Segment::Dictionary(DictionarySegment::Float64(c)) => SegmentAccessor::Dictionary {
                codes: c.codes(),
                dictionary: c.dictionary(),
            },
            other => accessor_mismatch(Self::DATA_TYPE, other),
        }
    }

    fn into_value(self) -> Value {
        Value::Float64(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float64()
    }
}

impl SegmentType for bool {
    const DATA_TYPE: DataType = DataType::Bool;

    fn accessor(segment: &Segment) -> SegmentAccessor<'_, Self> {
        match segment {
            Segment::Value(ValueSegment::Bool(c)) => SegmentAccessor::Plain {
                values: c.values(),
                nulls: c.null_flags(),
            },
            Segment::Dictionary(DictionarySegment::Bool(c)) => SegmentAccessor::Dictionary {
                codes: c.codes(),
                dictionary: c.dictionary(),
            },
            other => accessor_mismatch(Self::DATA_TYPE, other),
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl SegmentType for ArcStr {
    const DATA_TYPE: DataType = DataType::Text;

    fn accessor(segment: &Segment) -> SegmentAccessor<'_, Self> {
        match segment {
            Segment::Value(ValueSegment::Text(c)) => SegmentAccessor::Plain {
                values: c.values(),
                nulls: c.null_flags(),
            },
            Segment::Dictionary(DictionarySegment::Text(c)) => SegmentAccessor::Dictionary {
                codes: c.codes(),
                dictionary: c.dictionary(),
            },
            other => accessor_mismatch(Self::DATA_TYPE, other),
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_typed_vec_push_and_read() {
        let vec = TypedVec::with_capacity(4);
        assert!(vec.is_empty());
        vec.push(10i64);
        vec.push(20);
        assert_eq!(vec.len(), 2);
        assert_eq!(*vec.get(0), 10);
        assert_eq!(vec.as_slice(), &[10, 20]);
    }

    #[test]
    #[should_panic(expected = "past fixed capacity")]
    fn test_typed_vec_capacity_overflow() {
        let vec = TypedVec::with_capacity(1);
        vec.push(1i64);
        vec.push(2i64);
    }

    #[test]
    fn test_typed_vec_concurrent_readers() {
        let vec = Arc::new(TypedVec::with_capacity(10_000));
        let reader = {
            let vec = Arc::clone(&vec);
            std::thread::spawn(move || {
                // Every published prefix must be fully readable.
                loop {
                    let slice = vec.as_slice();
                    for (i, v) in slice.iter().enumerate() {
                        assert_eq!(*v, i as i64);
                    }
                    if slice.len() == 10_000 {
                        break;
                    }
                }
            })
        };
        for i in 0..10_000 {
            vec.push(i as i64);
        }
        reader.join().unwrap();
    }

    #[test]
    fn test_typed_column_nulls() {
        let col: TypedColumn<i64> = TypedColumn::new(true, 4);
        col.push(Some(1));
        col.push(None);
        assert_eq!(col.get(0), Some(&1));
        assert_eq!(col.get(1), None);
        assert!(col.is_null(1));
        assert_eq!(col.null_flags(), Some(&[false, true][..]));
    }

    #[test]
    #[should_panic(expected = "non-nullable")]
    fn test_typed_column_null_into_non_nullable() {
        let col: TypedColumn<i64> = TypedColumn::new(false, 4);
        col.push(None);
    }

    #[test]
    fn test_value_segment_roundtrip() {
        let seg = ValueSegment::new(DataType::Text, true, 4);
        seg.push_value(&Value::Text("a".into()));
        seg.push_value(&Value::Null);
        assert_eq!(seg.len(), 2);
        assert_eq!(seg.value_at(ChunkOffset::new(0)), Value::Text("a".into()));
        assert_eq!(seg.value_at(ChunkOffset::new(1)), Value::Null);
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn test_value_segment_type_mismatch() {
        let seg = ValueSegment::new(DataType::Int64, false, 4);
        seg.push_value(&Value::Float64(1.0));
    }

    #[test]
    fn test_dictionary_compression_roundtrip() {
        let seg = ValueSegment::new(DataType::Int64, true, 8);
        for v in [3i64, 1, 3, 2] {
            seg.push_value(&Value::Int64(v));
        }
        seg.push_value(&Value::Null);

        let dict = DictionarySegment::compress(&seg);
        assert_eq!(dict.len(), 5);
        for offset in 0..5 {
            let offset = ChunkOffset::new(offset);
            assert_eq!(dict.value_at(offset), seg.value_at(offset));
        }
        match &dict {
            DictionarySegment::Int64(c) => {
                assert_eq!(c.dictionary(), &[1, 2, 3]);
                assert_eq!(c.codes()[4], 3); // null code
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_segment_accessor_plain_and_dict() {
        let seg = ValueSegment::new(DataType::Int64, true, 4);
        seg.push_value(&Value::Int64(5));
        seg.push_value(&Value::Null);

        let plain = Segment::Value(seg);
        let accessor = i64::accessor(&plain);
        assert_eq!(accessor.get(ChunkOffset::new(0)), Some(5));
        assert_eq!(accessor.get(ChunkOffset::new(1)), None);

        let dict = match &plain {
            Segment::Value(v) => Segment::Dictionary(DictionarySegment::compress(v)),
            _ => unreachable!(),
        };
        let accessor = i64::accessor(&dict);
        assert_eq!(accessor.get(ChunkOffset::new(0)), Some(5));
        assert_eq!(accessor.get(ChunkOffset::new(1)), None);
    }

    #[test]
    #[should_panic(expected = "segment type mismatch")]
    fn test_segment_accessor_type_mismatch() {
        let seg = Segment::Value(ValueSegment::new(DataType::Int64, false, 4));
        let _ = f64::accessor(&seg);
    }
}
