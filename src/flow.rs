//! The setup and reconfigure steps.
//!
//! Each step either renders its form, or takes a submission, checks it
//! against the schema, probes the device, and then creates or updates an
//! entry. Every failure ends up as an error code on a redisplayed form.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::client::Fetcher;
use crate::error::FlowErrorCode;
use crate::schema::{FormField, InputError, parse_input, reconfigure_schema, user_schema};
use crate::store::EntryStore;
use crate::types::{ConfigEntry, EntryData, ValidationInfo};
use crate::validator::Validator;
use crate::Error;

pub const ABORT_RECONFIGURE_SUCCESSFUL: &str = "reconfigure_successful";
pub const ABORT_ENTRY_NOT_FOUND: &str = "entry_not_found";

const BASE_ERROR_KEY: &str = "base";

type EntryCallback = Box<dyn Fn(&ConfigEntry) + Send + Sync>;
type FormErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    User,
    Reconfigure,
}

/// What a step hands back to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    Form {
        step_id: StepId,
        data_schema: Vec<FormField>,
        errors: FormErrors,
    },
    CreateEntry {
        entry_id: String,
        title: String,
        data: EntryData,
    },
    Abort {
        reason: &'static str,
    },
}

impl FlowResult {
    /// The base error of a redisplayed form, if any.
    pub fn base_error(&self) -> Option<&str> {
        match self {
            FlowResult::Form { errors, .. } => errors.get(BASE_ERROR_KEY).map(String::as_str),
            _ => None,
        }
    }
}

pub struct ConfigFlowBuilder<F, S> {
    fetcher: F,
    store: S,
    validation_timeout: Option<Duration>,
    created_callbacks: Vec<EntryCallback>,
    updated_callbacks: Vec<EntryCallback>,
}

impl<F: Fetcher, S: EntryStore> ConfigFlowBuilder<F, S> {
    pub fn new(fetcher: F, store: S) -> Self {
        Self {
            fetcher,
            store,
            validation_timeout: None,
            created_callbacks: Vec::new(),
            updated_callbacks: Vec::new(),
        }
    }

    pub fn validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = Some(timeout);
        self
    }

    pub fn on_entry_created(mut self, f: impl Fn(&ConfigEntry) + Send + Sync + 'static) -> Self {
        self.created_callbacks.push(Box::new(f));
        self
    }

    /// Called after a reconfigure step replaced an entry's data. This is where
    /// the host reloads the entry.
    pub fn on_entry_updated(mut self, f: impl Fn(&ConfigEntry) + Send + Sync + 'static) -> Self {
        self.updated_callbacks.push(Box::new(f));
        self
    }

    pub fn build(self) -> ConfigFlow<F, S> {
        let mut validator = Validator::new(self.fetcher);
        if let Some(timeout) = self.validation_timeout {
            validator = validator.with_timeout(timeout);
        }
        ConfigFlow {
            validator,
            store: self.store,
            created_callbacks: self.created_callbacks,
            updated_callbacks: self.updated_callbacks,
        }
    }
}

pub struct ConfigFlow<F, S> {
    validator: Validator<F>,
    store: S,
    created_callbacks: Vec<EntryCallback>,
    updated_callbacks: Vec<EntryCallback>,
}

impl<F: Fetcher, S: EntryStore> ConfigFlow<F, S> {
    pub fn builder(fetcher: F, store: S) -> ConfigFlowBuilder<F, S> {
        ConfigFlowBuilder::new(fetcher, store)
    }

    pub fn new(fetcher: F, store: S) -> Self {
        ConfigFlowBuilder::new(fetcher, store).build()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Initial setup. With no input, renders the empty form.
    pub async fn step_user(&mut self, user_input: Option<&Value>) -> FlowResult {
        let Some(input) = user_input else {
            return form(StepId::User, user_schema(), FormErrors::new());
        };

        let (data, info) = match self.check(input).await {
            Ok(checked) => checked,
            Err(errors) => return form(StepId::User, user_schema(), errors),
        };

        let entry = ConfigEntry::new(info.title, data);
        if let Err(e) = self.store.insert(entry.clone()) {
            error!(error = %e, "failed to store config entry");
            return form(StepId::User, user_schema(), base_error(FlowErrorCode::Unknown));
        }

        debug!(entry_id = %entry.entry_id, title = %entry.title, "config entry created");
        for cb in &self.created_callbacks {
            cb(&entry);
        }

        FlowResult::CreateEntry {
            entry_id: entry.entry_id,
            title: entry.title,
            data: entry.data,
        }
    }

    /// Reconfigure `entry_id`. On success the entry keeps its id and title
    /// and the step aborts with `reconfigure_successful`.
    pub async fn step_reconfigure(&mut self, entry_id: &str, user_input: Option<&Value>) -> FlowResult {
        let Some(current) = self.store.get(entry_id) else {
            warn!(entry_id, "reconfigure requested for unknown entry");
            return FlowResult::Abort {
                reason: ABORT_ENTRY_NOT_FOUND,
            };
        };
        let schema = reconfigure_schema(&current.data);

        let Some(input) = user_input else {
            return form(StepId::Reconfigure, schema, FormErrors::new());
        };

        let (data, _) = match self.check(input).await {
            Ok(checked) => checked,
            Err(errors) => return form(StepId::Reconfigure, schema, errors),
        };

        let updated = match self.store.update_data(entry_id, data) {
            Ok(updated) => updated,
            Err(e) => {
                error!(entry_id, error = %e, "failed to update config entry");
                return form(StepId::Reconfigure, schema, base_error(FlowErrorCode::Unknown));
            }
        };

        debug!(entry_id, "config entry reconfigured");
        for cb in &self.updated_callbacks {
            cb(&updated);
        }

        FlowResult::Abort {
            reason: ABORT_RECONFIGURE_SUCCESSFUL,
        }
    }

    /// Schema check followed by the device probe. Errors come back ready to
    /// be shown on the form.
    async fn check(&self, input: &Value) -> Result<(EntryData, ValidationInfo), FormErrors> {
        let data = match parse_input(input) {
            Ok(data) => data,
            Err(Error::InvalidInput(errors)) => {
                debug!(count = errors.len(), "input rejected by schema");
                return Err(input_errors(&errors));
            }
            Err(e) => {
                error!(error = %e, "unexpected error while parsing input");
                return Err(base_error(FlowErrorCode::Unknown));
            }
        };

        let outcome = AssertUnwindSafe(self.validator.validate(&data))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(info)) => Ok((data, info)),
            Ok(Err(e)) => {
                let code = FlowErrorCode::from(&e);
                if code == FlowErrorCode::Unknown {
                    error!(error = ?e, "unexpected error during validation");
                } else {
                    debug!(error = %e, code = %code, "validation failed");
                }
                Err(base_error(code))
            }
            Err(payload) => {
                error!(
                    panic = panic_message(payload.as_ref()),
                    "unexpected exception during validation"
                );
                Err(base_error(FlowErrorCode::Unknown))
            }
        }
    }
}

fn form(step_id: StepId, data_schema: Vec<FormField>, errors: FormErrors) -> FlowResult {
    FlowResult::Form {
        step_id,
        data_schema,
        errors,
    }
}

fn base_error(code: FlowErrorCode) -> FormErrors {
    let mut errors = FormErrors::new();
    errors.insert(BASE_ERROR_KEY.to_string(), code.as_str().to_string());
    errors
}

fn input_errors(errors: &[InputError]) -> FormErrors {
    errors
        .iter()
        .map(|e| (e.field.clone(), e.kind.code().to_string()))
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
