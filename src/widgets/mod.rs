//! User interface components which are reused between different parts of
//! the site.

pub mod actions;
pub mod alert;
pub mod toast;
