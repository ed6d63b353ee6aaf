use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use mealview_shared::{Error, Result};
use tokio::{
    sync::Mutex,
    task::{AbortHandle, JoinHandle},
};

use crate::{DeleteOutcome, FetchTicket, MealPlanApi, MealPlanView, Session};

struct Mounted {
    view: MealPlanView,
    fetch: Option<AbortHandle>,
    last_seen: Instant,
}

impl Mounted {
    fn touch(&mut self) -> &mut MealPlanView {
        self.last_seen = Instant::now();
        &mut self.view
    }
}

/// The mounted view `id`, provided `caller` is the session it was mounted with.
fn owned<'a>(
    views: &'a mut HashMap<String, Mounted>,
    id: &str,
    caller: &Session,
) -> Result<&'a mut Mounted> {
    let mounted = views.get_mut(id).ok_or(Error::NotFound)?;
    if mounted.view.session() != caller {
        return Err(Error::Forbidden);
    }

    Ok(mounted)
}

impl Drop for Mounted {
    fn drop(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }
    }
}

/// Mounted meal plan views, keyed by view id.
///
/// Each view owns the task fetching its list: unmounting a view (explicitly or
/// through [`ViewRegistry::sweep`]) aborts a fetch still in flight, and a fetch
/// never settles a view it no longer belongs to.
#[derive(Clone)]
pub struct ViewRegistry {
    api: Arc<dyn MealPlanApi>,
    views: Arc<Mutex<HashMap<String, Mounted>>>,
    idle_timeout: Duration,
}

impl ViewRegistry {
    pub fn new(api: Arc<dyn MealPlanApi>, idle_timeout: Duration) -> Self {
        Self {
            api,
            views: Default::default(),
            idle_timeout,
        }
    }

    pub async fn len(&self) -> usize {
        self.views.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.views.lock().await.is_empty()
    }

    #[tracing::instrument(skip_all, fields(user = session.user_id))]
    pub async fn mount(&self, session: Session) -> String {
        let id = ulid::Ulid::new().to_string();
        let view = MealPlanView::new(session);
        let ticket = view.begin_fetch();

        let mut views = self.views.lock().await;
        let fetch = self.spawn_fetch(&id, ticket);
        views.insert(
            id.to_owned(),
            Mounted {
                view,
                fetch: Some(fetch),
                last_seen: Instant::now(),
            },
        );

        tracing::debug!(view = id, "View mounted");

        id
    }

    /// Re-enters an existing view. Only a different user triggers a new fetch.
    pub async fn remount(&self, id: &str, session: Session) -> Result<MealPlanView> {
        let mut views = self.views.lock().await;
        let mounted = views.get_mut(id).ok_or(Error::NotFound)?;

        if mounted.touch().remount(session) {
            if let Some(previous) = mounted.fetch.take() {
                previous.abort();
            }

            let ticket = mounted.view.begin_fetch();
            mounted.fetch = Some(self.spawn_fetch(id, ticket));

            tracing::debug!(view = id, "User changed, fetching again");
        }

        Ok(mounted.view.clone())
    }

    pub async fn snapshot(&self, id: &str, caller: &Session) -> Result<MealPlanView> {
        let mut views = self.views.lock().await;
        let mounted = owned(&mut views, id, caller)?;

        Ok(mounted.touch().clone())
    }

    pub async fn select(
        &self,
        id: &str,
        caller: &Session,
        meal_plan_id: &str,
    ) -> Result<MealPlanView> {
        let mut views = self.views.lock().await;
        let mounted = owned(&mut views, id, caller)?;
        let view = mounted.touch();
        view.select(meal_plan_id)?;

        Ok(view.clone())
    }

    pub async fn close(&self, id: &str, caller: &Session) -> Result<MealPlanView> {
        let mut views = self.views.lock().await;
        let mounted = owned(&mut views, id, caller)?;
        let view = mounted.touch();
        view.close();

        Ok(view.clone())
    }

    /// Deletes the selected meal plan. The view lock is released while the
    /// remote call is in flight.
    #[tracing::instrument(skip(self, caller))]
    pub async fn delete_selected(
        &self,
        id: &str,
        caller: &Session,
    ) -> Result<(DeleteOutcome, MealPlanView)> {
        let ticket = {
            let mut views = self.views.lock().await;
            let mounted = owned(&mut views, id, caller)?;
            let view = mounted.touch();

            match view.begin_delete() {
                Some(ticket) => ticket,
                None => return Ok((DeleteOutcome::NothingSelected, view.clone())),
            }
        };

        let result = self
            .api
            .delete(&ticket.session, &ticket.meal_plan_id)
            .await;

        if let Err(err) = &result {
            tracing::error!(
                user = ticket.session.user_id,
                meal_plan = ticket.meal_plan_id,
                err = %err,
                "Failed to delete meal plan"
            );
        }

        let mut views = self.views.lock().await;
        let mounted = owned(&mut views, id, caller)?;
        let view = mounted.touch();
        let outcome = view.finish_delete(&ticket, result);

        Ok((outcome, view.clone()))
    }

    pub async fn unmount(&self, id: &str, caller: &Session) -> Result<()> {
        let mut views = self.views.lock().await;
        owned(&mut views, id, caller)?;
        views.remove(id);

        tracing::debug!(view = id, "View unmounted");

        Ok(())
    }

    /// Unmounts views idle for longer than the idle timeout.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut views = self.views.lock().await;
        let before = views.len();
        views.retain(|_, mounted| now.saturating_duration_since(mounted.last_seen) < self.idle_timeout);

        let evicted = before - views.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = views.len(), "Idle views unmounted");
        }

        evicted
    }

    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                registry.sweep(Instant::now()).await;
            }
        })
    }

    fn spawn_fetch(&self, id: &str, ticket: FetchTicket) -> AbortHandle {
        let api = self.api.clone();
        let views = self.views.clone();
        let id = id.to_owned();

        tokio::spawn(async move {
            let result = api.list_by_user(&ticket.session).await;

            if let Err(err) = &result {
                tracing::error!(user = ticket.session.user_id, err = %err, "Failed to fetch meal plans");
            }

            let mut views = views.lock().await;
            match views.get_mut(&id) {
                Some(mounted) => {
                    if mounted.view.finish_fetch(&ticket, result) {
                        mounted.fetch = None;
                    }
                }
                None => tracing::debug!(view = id, "View gone before its fetch settled"),
            }
        })
        .abort_handle()
    }
}
