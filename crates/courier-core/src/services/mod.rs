//! Shared services for client apps

mod courier;

pub use courier::CourierService;
