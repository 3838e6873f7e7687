mod user;
mod club;
mod event;
mod notification;

pub use user::*;
pub use club::*;
pub use event::*;
pub use notification::*;
