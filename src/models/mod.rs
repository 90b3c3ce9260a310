mod automation;
mod email;
mod event;
mod user;

pub use automation::{
    Automation, AutomationEmailLink, NewAutomation, NewAutomationEmailLink, SequenceStep,
    TriggerType, UpdateAutomation,
};
pub use email::{Email, EmailStatus, EmailType, NewEmail, UpdateEmail};
pub use event::{AutomationEvent, EventStatus, NewAutomationEvent};
pub use user::User;
