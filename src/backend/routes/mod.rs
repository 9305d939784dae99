/**
 * Routes Module
 *
 * Router assembly and the HTTP draft handlers.
 */

pub mod draft_routes;
pub mod router;
