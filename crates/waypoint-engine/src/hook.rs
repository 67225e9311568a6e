//! Callback types shared by steps, actions and the engine.
//!
//! Every guard, lifecycle hook and effect is stored as a reference-counted
//! closure returning a boxed future, so synchronous and asynchronous author
//! code go through the same path. Hooks receive a fresh [`WizardContext`]
//! snapshot each time they are invoked.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{self, BoxFuture};

use crate::context::WizardContext;
use crate::error::HookError;

/// Bounds required of the wizard's data bag.
pub trait WizardData: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> WizardData for T {}

/// Result of a hook invocation.
pub type HookResult<T> = Result<T, HookError>;

/// The future every hook returns.
pub type HookFuture<T> = BoxFuture<'static, HookResult<T>>;

/// Skip predicate evaluated against the data bag. Resolving `Ok(true)` hides
/// the step.
pub type SkipPredicate<D> = Arc<dyn Fn(Arc<D>) -> HookFuture<bool> + Send + Sync>;

/// Transition or action guard. Resolving `Ok(false)` is a soft rejection.
pub type Guard<D> = Arc<dyn Fn(WizardContext<D>) -> HookFuture<bool> + Send + Sync>;

/// Lifecycle hook or action effect.
///
/// Resolving `Ok(Some(values))` replaces the data bag before the next hook
/// runs. `Ok(None)` leaves it untouched.
pub type Hook<D> = Arc<dyn Fn(WizardContext<D>) -> HookFuture<Option<D>> + Send + Sync>;

/// Callback run when the wizard completes.
pub type CompletionHook<D> = Arc<dyn Fn(WizardContext<D>) -> HookFuture<()> + Send + Sync>;

pub(crate) fn skip_from<D, F, Fut>(f: F) -> SkipPredicate<D>
where
  D: WizardData,
  F: Fn(Arc<D>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = HookResult<bool>> + Send + 'static,
{
  Arc::new(move |values| f(values).boxed())
}

pub(crate) fn skip_from_fn<D, F>(f: F) -> SkipPredicate<D>
where
  D: WizardData,
  F: Fn(&D) -> bool + Send + Sync + 'static,
{
  Arc::new(move |values: Arc<D>| {
    let skipped = f(values.as_ref());
    future::ready(Ok(skipped)).boxed()
  })
}

pub(crate) fn guard_from<D, F, Fut>(f: F) -> Guard<D>
where
  D: WizardData,
  F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = HookResult<bool>> + Send + 'static,
{
  Arc::new(move |ctx| f(ctx).boxed())
}

pub(crate) fn guard_from_fn<D, F>(f: F) -> Guard<D>
where
  D: WizardData,
  F: Fn(&WizardContext<D>) -> bool + Send + Sync + 'static,
{
  Arc::new(move |ctx| {
    let allowed = f(&ctx);
    future::ready(Ok(allowed)).boxed()
  })
}

pub(crate) fn hook_from<D, F, Fut>(f: F) -> Hook<D>
where
  D: WizardData,
  F: Fn(WizardContext<D>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = HookResult<Option<D>>> + Send + 'static,
{
  Arc::new(move |ctx| f(ctx).boxed())
}

pub(crate) fn hook_from_fn<D, F>(f: F) -> Hook<D>
where
  D: WizardData,
  F: Fn(&WizardContext<D>) -> Option<D> + Send + Sync + 'static,
{
  Arc::new(move |ctx| {
    let values = f(&ctx);
    future::ready(Ok(values)).boxed()
  })
}

/// Run a hook, converting panics into [`HookError::Panicked`].
///
/// Both the synchronous call that builds the future and the future itself are
/// guarded.
pub(crate) async fn invoke<T>(call: impl FnOnce() -> HookFuture<T>) -> HookResult<T> {
  let hook_future = match std::panic::catch_unwind(AssertUnwindSafe(call)) {
    Ok(hook_future) => hook_future,
    Err(payload) => return Err(HookError::panicked(panic_message(payload.as_ref()))),
  };

  match AssertUnwindSafe(hook_future).catch_unwind().await {
    Ok(result) => result,
    Err(payload) => Err(HookError::panicked(panic_message(payload.as_ref()))),
  }
}

/// Run a synchronous callback, converting panics into [`HookError::Panicked`].
pub(crate) fn invoke_sync<T>(call: impl FnOnce() -> T) -> HookResult<T> {
  std::panic::catch_unwind(AssertUnwindSafe(call))
    .map_err(|payload| HookError::panicked(panic_message(payload.as_ref())))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_invoke_passes_through_results() {
    let ok = invoke(|| future::ready(Ok::<_, HookError>(7)).boxed()).await;
    assert_eq!(ok, Ok(7));

    let err = invoke(|| future::ready(Err::<u8, _>(HookError::new("nope"))).boxed()).await;
    assert_eq!(err, Err(HookError::new("nope")));
  }

  #[tokio::test]
  async fn test_invoke_catches_panic_inside_future() {
    fn explode() -> bool {
      panic!("guard exploded")
    }

    let result: HookResult<bool> = invoke(|| async { Ok(explode()) }.boxed()).await;

    assert_eq!(result, Err(HookError::panicked("guard exploded")));
  }

  #[tokio::test]
  async fn test_invoke_catches_panic_while_building_future() {
    let result: HookResult<bool> = invoke(|| {
      let reason = format!("bad {}", "input");
      panic!("{}", reason);
    })
    .await;

    assert_eq!(result, Err(HookError::panicked("bad input")));
  }

  #[test]
  fn test_invoke_sync_catches_panic() {
    assert_eq!(invoke_sync(|| 3), Ok(3));

    let result: HookResult<u8> = invoke_sync(|| panic!("provider exploded"));
    assert_eq!(result, Err(HookError::panicked("provider exploded")));
  }

  #[tokio::test]
  async fn test_skip_forms_agree() {
    let sync_skip: SkipPredicate<u8> = skip_from_fn(|n: &u8| *n > 2);
    let async_skip: SkipPredicate<u8> = skip_from(|n: Arc<u8>| async move { Ok(*n > 2) });

    for n in [1u8, 3] {
      let values = Arc::new(n);
      let expected = n > 2;
      assert_eq!(invoke(|| sync_skip(Arc::clone(&values))).await, Ok(expected));
      assert_eq!(invoke(|| async_skip(Arc::clone(&values))).await, Ok(expected));
    }
  }
}
