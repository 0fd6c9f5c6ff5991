/// Parallel iteration when the `parallel` feature is on, plain iteration otherwise.
///
/// Only `into_par_iter` is shimmed; the adaptor chain after it resolves to
/// the standard `Iterator` methods in sequential builds, so call sites read
/// the same either way and produce items in the same order.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
