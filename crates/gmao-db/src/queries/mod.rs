pub mod assets;
pub mod plans;
pub mod users;
pub mod work_orders;
