pub mod form;
pub mod legacy;
pub mod types;

pub use form::{FormState, Transition};
pub use legacy::Schema;
pub use types::{ConfigPayload, ModuleConfig, PortField, ProviderSummary};
