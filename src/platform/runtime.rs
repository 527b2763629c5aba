use std::future::Future;
use std::time::Duration;

/// Runs `future` in the background without waiting for it.
///
/// Outside a tokio runtime the task goes to a private current-thread runtime, which
/// only makes progress while it is driven.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    use std::sync::LazyLock;
    use tokio::runtime::{Builder, Handle, Runtime};

    static BACKGROUND_RUNTIME: LazyLock<Option<Runtime>> =
        LazyLock::new(|| Builder::new_current_thread().enable_all().build().ok());

    if let Ok(handle) = Handle::try_current() {
        handle.spawn(future);
    } else if let Some(runtime) = BACKGROUND_RUNTIME.as_ref() {
        runtime.spawn(future);
    }
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// Without `wasm-web` there is no browser executor; the task is dropped unrun.
#[cfg(all(target_arch = "wasm32", not(feature = "wasm-web")))]
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    drop(future);
}

/// Pause between retry attempts: a browser timer on wasm32, the tokio timer elsewhere.
/// A zero duration does not yield.
pub async fn sleep(duration: Duration) {
    if !duration.is_zero() {
        timer(duration).await;
    }
}

#[cfg(target_arch = "wasm32")]
async fn timer(duration: Duration) {
    gloo_timers::future::sleep(duration).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn timer(duration: Duration) {
    tokio::time::sleep(duration).await;
}
