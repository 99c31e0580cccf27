pub mod identity;
pub mod request_id;

pub use identity::CurrentUser;
pub use request_id::RequestId;
