pub mod default;
pub mod install;
pub mod ls;
pub mod ls_ver;
pub mod search;
