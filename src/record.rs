/// Values that can live in a slot.
///
/// Records are copied into and out of the raw region byte-for-byte and may
/// sit at any alignment. A region can also be reattached after a restart,
/// so the bytes a record is read back from were not necessarily written by
/// this process.
///
/// # Safety
///
/// Implementors must be plain data:
/// - every bit pattern of `size_of::<Self>()` bytes is a valid value
///   (the zero-filled region is read as records too);
/// - the type has no padding bytes;
/// - the type holds no pointers, references, or handles whose meaning
///   depends on the process.
///
/// `#[repr(C)]` structs built only from `Record` fields with no implicit
/// padding satisfy this.
pub unsafe trait Record: Copy + 'static {}

macro_rules! impl_record {
    ($($t:ty),* $(,)?) => {
        $(unsafe impl Record for $t {})*
    };
}

impl_record!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

unsafe impl<T: Record, const N: usize> Record for [T; N] {}
