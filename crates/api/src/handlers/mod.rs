pub mod edit;
pub mod edit_request;
pub mod history;
pub mod lease;
