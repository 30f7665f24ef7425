//! Integration tests for the layered configuration engine

mod live_application;
mod test_utils;
