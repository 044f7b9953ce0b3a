//! Background environment running [`Task`]s alongside the [`Service`].

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::{Service, Task};

/// Boxed error of a failed background [`Task`].
type BoxError = Box<dyn Error + 'static>;

/// Background environment running [`Task`]s alongside the [`Service`].
///
/// Nothing runs until this [`Background`] is awaited. Dropping it without
/// awaiting cancels all the spawned [`Task`]s.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Names and handles of the spawned [`Task`]s.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), BoxError>>)>,
}

impl Background {
    /// Spawns a new named [`Task`] inside this [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `{name}` background task");
        let handle = self
            .set
            .spawn_local(future.map_err(|e| BoxError::from(Box::new(e))));
        self.handles.push((name, handle));
    }

    /// Returns the number of [`Task`]s spawned in this [`Background`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Indicates whether no [`Task`]s were spawned in this [`Background`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), BoxError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks = handles.into_iter().map(|(name, h)| {
            h.map(move |r| {
                let res = match r {
                    Ok(res) => res,
                    Err(e) => Err(BoxError::from(Box::new(e))),
                };
                if let Err(e) = &res {
                    log::error!("`{name}` background task failed: {e}");
                }
                res
            })
            .boxed_local()
        });
        future::try_join_all(iter::once(set.map(Ok).boxed_local()).chain(tasks))
            .map_ok(drop)
            .boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::{fmt, time::Duration};

    use super::Background;

    #[derive(Debug)]
    struct Failure;

    impl fmt::Display for Failure {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("failure")
        }
    }

    impl std::error::Error for Failure {}

    #[tokio::test]
    async fn completes_once_all_tasks_are_done() {
        let mut bg = Background::default();
        assert!(bg.is_empty());
        bg.spawn("sleep", async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok::<_, Failure>(())
        });
        bg.spawn("noop", async { Ok::<_, Failure>(()) });
        assert_eq!(bg.len(), 2);

        bg.await.unwrap();
    }

    #[tokio::test]
    async fn propagates_task_failure() {
        let mut bg = Background::default();
        bg.spawn("failing", async { Err(Failure) });

        let err = bg.await.unwrap_err();

        assert_eq!(err.to_string(), "failure");
    }
}
