//! HTTP middleware module

pub mod auth;
