pub mod contact;
pub mod job;
pub mod setting;
pub mod subscriber;
pub mod user;

pub use contact::*;
pub use job::*;
pub use setting::*;
pub use subscriber::*;
pub use user::*;
