//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the full router
//! (permission gates, handlers, store) with deterministic tokens.

#![cfg(test)]

mod helpers;

mod test_create_drink;
mod test_delete_drink;
mod test_forbidden;
mod test_get_drinks;
mod test_get_drinks_detail;
mod test_not_found;
mod test_sqlite_store;
mod test_unauthorized;
mod test_update_drink;
