//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `automation` - Automation definitions and their email sequences
//! - `email` - Email template request/response DTOs
//! - `event` - Trigger requests, processing reports, and event views
//! - `error` - Common error response DTOs
//! - `pagination` - Pagination-related DTOs

mod automation;
mod email;
mod error;
mod event;
mod pagination;

pub use automation::{
    AutomationResponse, CreateAutomationRequest, SequenceStepRequest, SequenceStepResponse,
    UpdateAutomationRequest,
};
pub use email::{CreateEmailRequest, EmailResponse, UpdateEmailRequest};
pub use error::ErrorResponse;
pub use event::{
    EventFilterParams, EventResponse, ProcessResponse, RequeueStaleResponse, TriggerRequest,
    TriggerResponse,
};
pub use pagination::{PagedResponse, PaginationMeta, PaginationParams};
