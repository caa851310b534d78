use std::marker::PhantomData;
use std::sync::Arc;

/// Receives the events of an observable.
pub trait Observer<A>: Send + Sync {
    /// Called once per dispatched value.
    fn push(&self, value: &A);

    /// Called once when the observable finishes.
    fn finish(&self) {}
}

/// Observer built from a single value callback; finish events are ignored.
pub(crate) struct FnObserver<F>(pub(crate) F);

impl<A, F> Observer<A> for FnObserver<F>
where
    F: Fn(&A) + Send + Sync,
{
    fn push(&self, value: &A) {
        (self.0)(value)
    }
}

/// Observer built from a value callback and a finish callback.
pub(crate) struct Hooks<A, P, D> {
    on_push: P,
    on_finish: D,
    _value: PhantomData<fn(&A)>,
}

impl<A, P, D> Hooks<A, P, D>
where
    A: 'static,
    P: Fn(&A) + Send + Sync + 'static,
    D: Fn() + Send + Sync + 'static,
{
    pub(crate) fn observer(on_push: P, on_finish: D) -> Arc<dyn Observer<A>> {
        Arc::new(Self {
            on_push,
            on_finish,
            _value: PhantomData,
        })
    }
}

impl<A, P, D> Observer<A> for Hooks<A, P, D>
where
    P: Fn(&A) + Send + Sync,
    D: Fn() + Send + Sync,
{
    fn push(&self, value: &A) {
        (self.on_push)(value)
    }

    fn finish(&self) {
        (self.on_finish)()
    }
}
