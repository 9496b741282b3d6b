mod app_state;
pub mod cli;
mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
mod utils;

pub use app_state::AppState;
pub use error::{AppError, AppResult};

use cli::{Cli, Commands};
use config::ConfigService;

/// 执行一条命令行指令
pub async fn run(cli: Cli) -> AppResult<()> {
    let service = ConfigService::new()?;

    if let Commands::Config { show, init } = &cli.command {
        if *init {
            if commands::init_config(&service)? {
                println!("已写入配置: {}", service.config_path().display());
            } else {
                println!("配置文件已存在: {}", service.config_path().display());
            }
        }
        if *show || !*init {
            let config = commands::effective_config(&service)?;
            println!("# {}", service.config_path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        return Ok(());
    }

    let mut config = service.load()?;
    if let Some(db) = &cli.db {
        config.database_path = db.to_string_lossy().to_string();
    }
    let state = AppState::init(config).await?;

    match cli.command {
        Commands::Ingest { paths, yes } => commands::ingest(&state, &paths, yes).await?,
        Commands::Search { query, limit } => {
            let orders = commands::search_orders(&state, &query, limit).await?;
            commands::print_orders(&orders);
        }
        Commands::Track { order_code, tracking } => {
            let order = commands::set_tracking(&state, &order_code, tracking.as_deref()).await?;
            commands::print_orders(std::slice::from_ref(&order));
        }
        Commands::Round {
            name,
            clear,
            order_codes,
        } => {
            let round = if clear {
                None
            } else {
                Some(name.unwrap_or_else(commands::default_round_name))
            };
            let rows = commands::assign_round(&state, &order_codes, round.as_deref()).await?;
            match round {
                Some(round) => println!("已将 {} 个订单设为批次 {}", rows, round),
                None => println!("已清除 {} 个订单的批次", rows),
            }
        }
        Commands::Orders {
            status,
            open,
            limit,
        } => {
            let orders = commands::list_orders(&state, status.as_deref(), open, limit).await?;
            commands::print_orders(&orders);
        }
        Commands::AddOrder {
            order_code,
            contact,
            status,
        } => {
            let order = commands::add_order(&state, &order_code, &contact, &status).await?;
            println!("已新增订单 {} (id={})", order.order_code, order.order_id);
        }
        Commands::Config { .. } => {}
    }

    state.db.close().await;
    Ok(())
}
