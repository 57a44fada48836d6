mod alerts;
mod auth;
mod calibrations;
mod common;
mod estimate;
mod institution;
mod reports;
mod resources;
mod root;
mod sensors;
mod users;

pub(crate) use root::get_args;
