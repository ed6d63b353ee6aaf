use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use mealview_shared::{Error, Result};
use tokio::sync::Semaphore;

use crate::{MealPlan, MealPlanApi, Session};

/// In-memory [`MealPlanApi`] that records calls and can be scripted to fail.
#[derive(Default)]
pub struct MemoryMealPlanApi {
    plans: Mutex<HashMap<String, Vec<MealPlan>>>,
    list_failure: Mutex<Option<Option<String>>>,
    delete_failure: Mutex<Option<Option<String>>>,
    gate: Mutex<Option<std::sync::Arc<Semaphore>>>,
    list_calls: AtomicUsize,
    settled_list_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl MemoryMealPlanApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(self, user_id: impl Into<String>, plans: Vec<MealPlan>) -> Self {
        self.plans
            .lock()
            .expect("memory api lock")
            .insert(user_id.into(), plans);
        self
    }

    pub fn fail_list(&self, message: Option<&str>) {
        *self.list_failure.lock().expect("memory api lock") = Some(message.map(str::to_owned));
    }

    pub fn fail_delete(&self, message: Option<&str>) {
        *self.delete_failure.lock().expect("memory api lock") = Some(message.map(str::to_owned));
    }

    pub fn succeed_delete(&self) {
        *self.delete_failure.lock().expect("memory api lock") = None;
    }

    /// Holds every list request until [`MemoryMealPlanApi::release_list`] is called.
    pub fn hold_list(&self) {
        *self.gate.lock().expect("memory api lock") = Some(std::sync::Arc::new(Semaphore::new(0)));
    }

    pub fn release_list(&self) {
        if let Some(gate) = self.gate.lock().expect("memory api lock").as_ref() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// List calls that got past [`MemoryMealPlanApi::hold_list`] and answered.
    pub fn settled_list_calls(&self) -> usize {
        self.settled_list_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().expect("memory api lock").clone()
    }
}

fn failure(message: Option<String>) -> Error {
    Error::Request {
        status: Some(500),
        message,
    }
}

#[async_trait]
impl MealPlanApi for MemoryMealPlanApi {
    async fn list_by_user(&self, session: &Session) -> Result<Vec<MealPlan>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().expect("memory api lock").clone();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| Error::Unknown(e.into()))?;
        }

        self.settled_list_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.list_failure.lock().expect("memory api lock").clone() {
            return Err(failure(message));
        }

        Ok(self
            .plans
            .lock()
            .expect("memory api lock")
            .get(&session.user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(&self, session: &Session, meal_plan_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.delete_failure.lock().expect("memory api lock").clone() {
            return Err(failure(message));
        }

        if let Some(plans) = self
            .plans
            .lock()
            .expect("memory api lock")
            .get_mut(&session.user_id)
        {
            plans.retain(|p| p.meal_plan_id != meal_plan_id);
        }

        self.deleted
            .lock()
            .expect("memory api lock")
            .push(meal_plan_id.to_owned());

        Ok(())
    }
}
