mod auth_service_impl;
mod like_service_impl;

pub use auth_service_impl::*;
pub use like_service_impl::*;
