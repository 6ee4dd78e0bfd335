//! Transforms applied by a value on every update cycle
//!
//! A transform maps `(incoming, state)` to the next candidate state. Within
//! a cycle, transforms compose over their inputs: each one receives the
//! previous transform's output as `incoming`, while the [`State`] view keeps
//! reporting the state as it was when the cycle began.

use std::marker::PhantomData;
use std::sync::Arc;

/// Read-only view of a value's state at the start of the current cycle
#[derive(Debug, Clone, PartialEq)]
pub struct State<T>(T);

impl<T> State<T> {
    pub fn new(state: T) -> Self {
        Self(state)
    }

    /// The pre-cycle state
    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

/// One step of a value's update chain
///
/// Transforms must be pure and total: the same `(incoming, state)` always
/// yields the same result, and no call panics.
pub trait Transform<T>: Send + Sync {
    /// Identifier used in traces
    fn name(&self) -> &str;

    /// Compute the next candidate state
    fn apply(&self, incoming: T, state: &State<T>) -> T;
}

/// Shared handle to a transform
pub type TransformRef<T> = Arc<dyn Transform<T>>;

/// Types that [`Accumulate`] can sum
///
/// Integer addition wraps on overflow; float addition follows IEEE 754.
pub trait Numeric: Copy + Default + PartialEq + Send + Sync + 'static {
    fn accumulate(self, rhs: Self) -> Self;
}

macro_rules! impl_numeric_int {
    ($($t:ty),*) => {
        $(impl Numeric for $t {
            fn accumulate(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }
        })*
    };
}

macro_rules! impl_numeric_float {
    ($($t:ty),*) => {
        $(impl Numeric for $t {
            fn accumulate(self, rhs: Self) -> Self {
                self + rhs
            }
        })*
    };
}

impl_numeric_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_numeric_float!(f32, f64);

/// Adds each incoming value to the running state
pub struct Accumulate<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Numeric> Accumulate<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Create a shared handle, ready to put in a transform chain
    pub fn shared() -> TransformRef<T> {
        Arc::new(Self::new())
    }
}

impl<T: Numeric> Default for Accumulate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Numeric> Transform<T> for Accumulate<T> {
    fn name(&self) -> &str {
        "Accumulate"
    }

    fn apply(&self, incoming: T, state: &State<T>) -> T {
        state.get().accumulate(incoming)
    }
}

/// A named closure used as a transform
///
/// The closure receives the incoming value and the pre-cycle state.
pub struct FnTransform<T, F> {
    name: String,
    f: F,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T, F> FnTransform<T, F>
where
    T: 'static,
    F: Fn(T, &T) -> T + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _marker: PhantomData,
        }
    }

    /// Create a shared handle, ready to put in a transform chain
    pub fn shared(name: impl Into<String>, f: F) -> TransformRef<T> {
        Arc::new(Self::new(name, f))
    }
}

impl<T, F> Transform<T> for FnTransform<T, F>
where
    F: Fn(T, &T) -> T + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, incoming: T, state: &State<T>) -> T {
        (self.f)(incoming, state.get())
    }
}

/// Run a chain against an incoming value and a pre-cycle state
///
/// Calls `observe(name, input, output)` after each step.
pub(crate) fn run_chain<T: Clone>(
    transforms: &[TransformRef<T>],
    incoming: T,
    state: &State<T>,
    mut observe: impl FnMut(&str, &T, &T),
) -> T {
    transforms.iter().fold(incoming, |acc, t| {
        let next = t.apply(acc.clone(), state);
        observe(t.name(), &acc, &next);
        next
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accumulate() {
        let acc = Accumulate::<i64>::new();
        assert_eq!(acc.name(), "Accumulate");
        assert_eq!(acc.apply(3, &State::new(4)), 7);
        assert_eq!(acc.apply(-3, &State::new(0)), -3);
    }

    #[test]
    fn test_accumulate_wraps() {
        let acc = Accumulate::<u8>::new();
        assert_eq!(acc.apply(10, &State::new(250)), 4);

        let acc = Accumulate::<i32>::new();
        assert_eq!(acc.apply(1, &State::new(i32::MAX)), i32::MIN);
    }

    #[test]
    fn test_accumulate_float() {
        let acc = Accumulate::<f64>::new();
        assert_eq!(acc.apply(0.5, &State::new(1.25)), 1.75);
    }

    #[test]
    fn test_fn_transform() {
        let double = FnTransform::new("Double", |x: i32, _s: &i32| x * 2);
        assert_eq!(double.name(), "Double");
        assert_eq!(double.apply(21, &State::new(100)), 42);
    }

    #[test]
    fn test_chain_composes_over_inputs() {
        // Both steps see the same pre-cycle state, not each other's output
        let chain = vec![Accumulate::<i64>::shared(), Accumulate::shared()];
        let mut steps = Vec::new();
        let result = run_chain(&chain, 2, &State::new(5), |name, input, output| {
            steps.push((name.to_string(), *input, *output));
        });

        assert_eq!(result, 12);
        assert_eq!(
            steps,
            vec![
                ("Accumulate".to_string(), 2, 7),
                ("Accumulate".to_string(), 7, 12),
            ]
        );
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain: Vec<TransformRef<i64>> = Vec::new();
        assert_eq!(run_chain(&chain, 9, &State::new(1), |_, _, _| {}), 9);
    }

    proptest! {
        #[test]
        fn prop_chain_matches_nested_application(
            x in any::<i64>(),
            s0 in any::<i64>(),
            offsets in proptest::collection::vec(any::<i64>(), 0..8),
        ) {
            let chain: Vec<TransformRef<i64>> = offsets
                .iter()
                .map(|&k| {
                    FnTransform::shared(format!("Add{k}"), move |x: i64, s: &i64| {
                        x.wrapping_add(k).wrapping_mul(3).wrapping_sub(*s)
                    })
                })
                .collect();

            let expected = offsets
                .iter()
                .fold(x, |acc, &k| acc.wrapping_add(k).wrapping_mul(3).wrapping_sub(s0));
            let state = State::new(s0);
            prop_assert_eq!(run_chain(&chain, x, &state, |_, _, _| {}), expected);
        }

        #[test]
        fn prop_accumulate_u16_wraps(s in any::<u16>(), x in any::<u16>()) {
            let acc = Accumulate::<u16>::new();
            prop_assert_eq!(acc.apply(x, &State::new(s)), s.wrapping_add(x));
        }
    }
}
