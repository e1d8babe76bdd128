//! # CLI Module
//!
//! Command-line interface of the `servlet-engine` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Deploy every application below the application base and start listening:
//!
//! ```bash
//! servlet-engine serve --config config.yaml
//! servlet-engine serve --app-base webapps --addr 127.0.0.1:8080
//! ```
//!
//! Flags override values from the configuration file.
//!
//! ### `routes`
//!
//! Print the servlet and secured route tables of each application:
//!
//! ```bash
//! servlet-engine routes --app-base webapps
//! ```
//!
//! ### `locate`
//!
//! Resolve a path the way the server would, without starting it:
//!
//! ```bash
//! servlet-engine locate --app-base webapps --host shop.example.com /admin/users
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands, ServeArgs};
