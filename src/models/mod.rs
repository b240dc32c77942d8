mod form;
mod sermon;
mod series;
mod upload;
mod user;

pub use form::*;
pub use sermon::*;
pub use series::*;
pub use upload::*;
pub use user::*;
