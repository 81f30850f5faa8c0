//! Serve command - starts the API server.

use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;
use std::time::Duration;

use od_api::{ApiServer, ApiServerConfig, AppState};
use od_core::db::{create_pool, ensure_admin_staff, run_migrations};

use crate::config::AppConfig;

/// Server configuration from CLI arguments.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Port to listen on.
    pub port: u16,
    /// Hostname to bind to.
    pub host: String,
    /// Database URL.
    pub database_url: String,
    /// Enable Swagger UI.
    pub enable_swagger: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            database_url: "sqlite://orgdesk.db?mode=rwc".to_string(),
            enable_swagger: true,
            timeout_secs: 30,
        }
    }
}

/// Runs the API server.
pub async fn run_server(config: ServeConfig, app_config: AppConfig) -> Result<()> {
    println!("{} Starting orgdesk API server...", "[server]".cyan());

    println!("  {} Database: {}", "→".green(), config.database_url);
    let db_pool = create_pool(&config.database_url)
        .await
        .context("Failed to create database connection pool")?;

    println!("  {} Running migrations...", "→".green());
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    println!("  {} Migrations complete", "✓".green());

    // Bootstrap an admin profile when the staff directory is empty. The
    // seeder reads OD_ADMIN_USER_ID; a config value takes precedence.
    if let Some(admin_id) = &app_config.admin_user_id {
        std::env::set_var("OD_ADMIN_USER_ID", admin_id);
    }
    if let Some(profile) = ensure_admin_staff(&db_pool)
        .await
        .context("Failed to seed admin staff profile")?
    {
        println!(
            "  {} Seeded admin profile for account {}",
            "✓".green(),
            profile.user_id
        );
    }

    let state = AppState::new(db_pool);

    let bind_address: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    let server_config = ApiServerConfig {
        bind_address,
        request_timeout: Duration::from_secs(config.timeout_secs),
        enable_swagger: config.enable_swagger,
        shutdown_timeout: Duration::from_secs(30),
    };

    println!();
    println!("{}", "orgdesk API Server".bold());
    println!("{}", "═".repeat(40));
    println!("  {} http://{}", "Address:".cyan(), bind_address);
    println!("  {} {}", "Database:".cyan(), config.database_url);

    if config.enable_swagger {
        println!(
            "  {} http://{}/swagger-ui",
            "Swagger UI:".cyan(),
            bind_address
        );
    }

    println!();
    println!("{}", "Endpoints:".bold());
    println!("  GET  /health                     - Health check");
    println!("  GET  /api/categories             - Organization categories");
    println!("  GET  /api/organizations          - Organization directory");
    println!("  GET  /api/org-units/tree         - Org structure tree");
    println!("  GET  /api/staff/profiles         - Staff directory");
    println!("  GET  /api/cert/letters           - Cert letter registry");
    println!("  GET  /api/external/letters       - External letter log");
    println!("  GET  /api/statistics/org-replies - Reply timeliness stats");
    println!("  GET  /api/audit                  - Audit trail");
    println!();
    println!("Press {} to stop", "Ctrl+C".yellow());
    println!();

    let server = ApiServer::new(state, server_config);
    server.run().await.context("Server error")?;

    println!();
    println!("{} Server stopped", "[server]".cyan());

    Ok(())
}
