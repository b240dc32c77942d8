pub mod auth;
pub mod crm;
pub mod email;
pub mod forms;
pub mod series;
pub mod sermons;
pub mod slug;
pub mod spam;
pub mod uploads;
pub mod validation;
