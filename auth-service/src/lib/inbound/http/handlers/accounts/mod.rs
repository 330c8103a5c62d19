pub mod forgot_password;
pub mod login;
pub mod logout;
pub mod register;
pub mod reset_password;
pub mod verify;

pub use forgot_password::forgot_password;
pub use login::login;
pub use logout::logout;
pub use register::register;
pub use reset_password::reset_password;
pub use verify::verify;
