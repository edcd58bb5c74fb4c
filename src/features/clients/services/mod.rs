mod client_service;

pub use client_service::{hash_token, ClientService};
