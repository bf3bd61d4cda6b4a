/// Define an arena handle type, with optional vector and slice aliases indexed by it.
#[macro_export]
macro_rules! new_id {
    ($it:ident) => {
        index_vec::define_index_type! {
            pub struct $it = u32;
            DISPLAY_FORMAT = "{}";
        }
    };
    ($it:ident, $vt:ident) => {
        $crate::type_utils::new_id!($it);
        #[allow(dead_code)]
        pub type $vt<T> = index_vec::IndexVec<$it, T>;
    };
    ($it:ident, $vt:ident, $st: ident) => {
        $crate::type_utils::new_id!($it, $vt);
        #[allow(dead_code)]
        pub type $st<T> = index_vec::IndexSlice<$it, [T]>;
    };
}
pub(crate) use new_id;

/// Pack a sequence of booleans into an integer, first element in the least significant bit.
pub fn pack_bits(bits: impl IntoIterator<Item = bool>) -> usize {
    bits.into_iter()
        .enumerate()
        .fold(0, |acc, (i, bit)| acc | (usize::from(bit) << i))
}

/// Inverse of [`pack_bits`] for `width` bits.
pub fn unpack_bits(value: usize, width: usize) -> impl Iterator<Item = bool> {
    (0..width).map(move |i| (value >> i) & 1 == 1)
}
