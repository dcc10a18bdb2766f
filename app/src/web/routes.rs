// app/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{booking_handlers, cart_handlers, catalog_handlers, checkout_handlers, order_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(catalog_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(catalog_handlers::get_product_handler)),
      )
      .service(
        web::scope("/destinations")
          .route("", web::get().to(catalog_handlers::list_destinations_handler))
          .route("/{destination_id}", web::get().to(catalog_handlers::get_destination_handler)),
      )
      .route("/hotels", web::get().to(catalog_handlers::list_hotels_handler))
      .route("/packages", web::get().to(catalog_handlers::list_packages_handler))
      .service(
        web::scope("/saved-destinations")
          .route("", web::get().to(catalog_handlers::list_saved_destinations_handler))
          .route("", web::post().to(catalog_handlers::toggle_saved_destination_handler)),
      )
      .service(
        web::scope("/cart")
          .route("", web::get().to(cart_handlers::view_cart_handler))
          .route("", web::post().to(cart_handlers::add_to_cart_handler))
          .route("/{product_id}", web::put().to(cart_handlers::update_quantity_handler)),
      )
      .route("/checkout", web::post().to(checkout_handlers::checkout_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler)),
      )
      .service(
        web::scope("/reviews")
          .route("", web::get().to(order_handlers::list_reviews_handler))
          .route("", web::post().to(order_handlers::submit_review_handler)),
      )
      .service(
        web::scope("/bookings")
          .route("", web::get().to(booking_handlers::list_bookings_handler))
          .route("", web::post().to(booking_handlers::create_booking_handler))
          .route("/{booking_id}", web::delete().to(booking_handlers::cancel_booking_handler)),
      ),
  );
}
