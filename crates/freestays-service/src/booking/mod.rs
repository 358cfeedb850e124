//! Booking flow against the live provider.

mod booking_service;

pub use booking_service::BookingService;
