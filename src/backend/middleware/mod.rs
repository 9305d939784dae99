/**
 * Middleware Module
 *
 * HTTP middleware shared by the request handlers.
 */

pub mod auth;
