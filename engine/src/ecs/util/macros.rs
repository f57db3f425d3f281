/// Implement another macro for every prefix of a list of `(Type, index)` pairs.
///
/// `for_every_tuple!(m !! [] (A, 0), (B, 1))` expands to `m!((A, 0));` and `m!((A, 0), (B, 1));`.
/// Prefixes keep each type paired with its tuple field index.
#[macro_export]
macro_rules! for_every_tuple {
    ($m:ident !! [$($done:tt),*]) => {};
    ($m:ident !! [$($done:tt),*] $next:tt $(, $rest:tt)*) => {
        $m!($($done,)* $next);
        $crate::for_every_tuple!($m !! [$($done,)* $next] $($rest),*);
    };
}

/// Apply a macro to all tuple arities from 1 to 12, passing each element as `(Type, index)`.
#[macro_export]
macro_rules! all_tuples {
    ($m:ident) => {
        $crate::for_every_tuple!($m !! []
            (A, 0), (B, 1), (C, 2), (D, 3), (E, 4), (F, 5),
            (G, 6), (H, 7), (I, 8), (J, 9), (K, 10), (L, 11)
        );
    };
}
