//! CLI module for PMP API Gateway
//!
//! - `serve`: run the gateway (data plane and admin API on one port)
//! - `routes`: print the built-in route table

pub mod routes;
pub mod serve;

use clap::{Parser, Subcommand};

/// PMP API Gateway - route, protect and observe internal services
#[derive(Parser)]
#[command(name = "pmp-api-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the gateway server
    Serve,

    /// Print the default route table as JSON
    Routes(routes::RoutesArgs),
}
