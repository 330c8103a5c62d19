pub mod current_user;
pub mod delete_user;
pub mod list_users;

pub use current_user::current_user;
pub use delete_user::delete_user;
pub use list_users::list_users;
