use mealview_shared::{Error, Result};

use crate::{MealPlan, Session};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch meal plans. Please try again later.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete meal plan. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Error(String),
    Loaded(Vec<MealPlan>),
}

/// The selected plan. The overlay is open exactly while a selection exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub meal_plan_id: String,
}

/// Issued when a fetch starts; only the fetch of the current generation may
/// settle the view.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub generation: u64,
    pub session: Session,
}

#[derive(Debug, Clone)]
pub struct DeleteTicket {
    pub generation: u64,
    pub session: Session,
    pub meal_plan_id: String,
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    Failed(Error),
    NothingSelected,
}

#[derive(Debug, Clone)]
pub struct MealPlanView {
    session: Session,
    state: ViewState,
    selection: Option<Selection>,
    generation: u64,
}

impl MealPlanView {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: ViewState::Loading,
            selection: None,
            generation: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    pub fn meal_plans(&self) -> &[MealPlan] {
        match &self.state {
            ViewState::Loaded(plans) => plans,
            _ => &[],
        }
    }

    pub fn selected(&self) -> Option<&MealPlan> {
        let selection = self.selection.as_ref()?;

        self.meal_plans()
            .iter()
            .find(|p| p.meal_plan_id == selection.meal_plan_id)
    }

    /// Applies a session read at view entry. Returns true when the user changed,
    /// in which case the view is back to loading and a new fetch is due.
    pub fn remount(&mut self, session: Session) -> bool {
        if self.session.user_id == session.user_id {
            self.session = session;
            return false;
        }

        self.session = session;
        self.state = ViewState::Loading;
        self.selection = None;
        self.generation += 1;

        true
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            session: self.session.clone(),
        }
    }

    /// Settles a fetch. Stale tickets and already settled views are ignored.
    pub fn finish_fetch(&mut self, ticket: &FetchTicket, result: Result<Vec<MealPlan>>) -> bool {
        if ticket.generation != self.generation || !self.is_loading() {
            return false;
        }

        self.state = match result {
            Ok(plans) => ViewState::Loaded(plans),
            Err(err) => ViewState::Error(
                err.server_message()
                    .unwrap_or(FETCH_FAILED_MESSAGE)
                    .to_owned(),
            ),
        };

        true
    }

    pub fn select(&mut self, meal_plan_id: &str) -> Result<&MealPlan> {
        let Some(index) = self
            .meal_plans()
            .iter()
            .position(|p| p.meal_plan_id == meal_plan_id)
        else {
            return Err(Error::NotFound);
        };

        self.selection = Some(Selection {
            meal_plan_id: meal_plan_id.to_owned(),
        });

        Ok(&self.meal_plans()[index])
    }

    pub fn close(&mut self) {
        self.selection = None;
    }

    pub fn begin_delete(&self) -> Option<DeleteTicket> {
        let selected = self.selected()?;

        Some(DeleteTicket {
            generation: self.generation,
            session: self.session.clone(),
            meal_plan_id: selected.meal_plan_id.to_owned(),
        })
    }

    /// List and selection only change once the server confirmed the delete.
    pub fn finish_delete(&mut self, ticket: &DeleteTicket, result: Result<()>) -> DeleteOutcome {
        if let Err(err) = result {
            return DeleteOutcome::Failed(err);
        }

        if ticket.generation == self.generation
            && let ViewState::Loaded(plans) = &mut self.state
        {
            plans.retain(|p| p.meal_plan_id != ticket.meal_plan_id);
        }

        if self
            .selection
            .as_ref()
            .is_some_and(|s| s.meal_plan_id == ticket.meal_plan_id)
        {
            self.selection = None;
        }

        DeleteOutcome::Deleted
    }
}
