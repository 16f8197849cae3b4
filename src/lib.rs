// Module layout (Clean Architecture style)
// - bootstrap: configuration, composition root and server lifecycle
// - infrastructure: database adapters
// - presentation: HTTP handlers, routing and middleware
// - application: ports and use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
