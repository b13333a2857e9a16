mod client;
mod error;
mod flow;
mod logger;
pub mod protocol;
mod schema;
mod store;
mod types;
mod validator;

pub use client::{DeviceClient, DeviceClientBuilder, Fetcher, HttpResponse};
pub use error::{Error, FlowErrorCode, Result};
pub use flow::{
    ABORT_ENTRY_NOT_FOUND, ABORT_RECONFIGURE_SUCCESSFUL, ConfigFlow, ConfigFlowBuilder,
    FlowResult, StepId,
};
pub use logger::MessageLogMode;
pub use schema::{
    FieldType, FormField, InputError, InputErrorKind, parse_input, reconfigure_schema,
    user_schema,
};
pub use store::{EntryStore, FileStore, MemoryStore};
pub use types::*;
pub use validator::Validator;
