// app/src/models/mod.rs

//! Typed rows and projections. Every gateway row is decoded into one of these
//! right after the call.

pub mod booking;
pub mod cart_item;
pub mod catalog;
pub mod order;
pub mod order_item;
pub mod product;
pub mod review;

pub use booking::{Booking, BookingType, NewBooking, TicketDetails, TransportMode};
pub use cart_item::{CartItem, LineItem, NewCartItem, MAX_LINE_QUANTITY};
pub use catalog::{Destination, DestinationSummary, Hotel, SavedDestination, TravelPackage};
pub use order::{NewOrder, Order, OrderStatus};
pub use order_item::{NewOrderItem, OrderItem};
pub use product::Product;
pub use review::{NewReview, Review};
