pub mod actor;
pub mod logging;
pub mod request_id;

pub use actor::{actor, actor_admin};
pub use logging::log_error_responses;
pub use request_id::{request_id, request_span, RequestId};
