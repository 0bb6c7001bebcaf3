use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use warehouse_store::{
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::{space, warehouse, SpaceKey},
    errors::ServiceError,
    services::{
        CreateSpaceInput, CreateWarehouseInput, DeletePolicy, ImportSummary, LayoutService,
        SpaceService, UpdateWarehouseInput, WarehouseService,
    },
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {:#}", err);
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ServiceError>())
            .map_or(1, ServiceError::exit_code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Schema management commands must see the database as it is.
    let auto_migrate = !matches!(cli.command, Commands::Db(_));
    let context = CliContext::initialize(auto_migrate).await?;

    match cli.command {
        Commands::Db(command) => handle_db_command(&context, command, cli.json).await?,
        Commands::Warehouse(command) => {
            handle_warehouse_command(&context, command, cli.json).await?
        }
        Commands::Space(command) => handle_space_command(&context, command, cli.json).await?,
        Commands::Layout(command) => handle_layout_command(&context, command, cli.json).await?,
        Commands::Grid(args) => handle_grid(&context, args, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "warehouse-cli",
    about = "Manage warehouse grids and their spaces",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Db(DbCommands),
    #[command(subcommand)]
    Warehouse(WarehouseCommands),
    #[command(subcommand)]
    Space(SpaceCommands),
    #[command(subcommand)]
    Layout(LayoutCommands),
    Grid(GridArgs),
}

#[derive(Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Roll back every migration, dropping both tables
    Rollback,
    /// Drop and recreate both tables
    Reset,
    /// List pending migrations
    Status,
    /// Ping the database
    Check,
}

#[derive(Subcommand)]
enum WarehouseCommands {
    Create(CreateWarehouseArgs),
    Get(WarehouseIdArgs),
    List,
    Update(UpdateWarehouseArgs),
    Delete(DeleteWarehouseArgs),
}

#[derive(Args)]
struct CreateWarehouseArgs {
    #[arg(long, help = "Grid width in cells")]
    width: i32,
    #[arg(long, help = "Grid height in cells")]
    height: i32,
    #[arg(long, help = "Display name; the column default is used when omitted")]
    name: Option<String>,
}

#[derive(Args)]
struct WarehouseIdArgs {
    #[arg(long, help = "Warehouse identifier")]
    id: i32,
}

#[derive(Args)]
struct UpdateWarehouseArgs {
    #[arg(long, help = "Warehouse identifier")]
    id: i32,
    #[arg(long, help = "New display name")]
    name: Option<String>,
    #[arg(long, help = "New grid width")]
    width: Option<i32>,
    #[arg(long, help = "New grid height")]
    height: Option<i32>,
}

#[derive(Args)]
struct DeleteWarehouseArgs {
    #[arg(long, help = "Warehouse identifier")]
    id: i32,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Also delete the warehouse's spaces"
    )]
    cascade: bool,
}

#[derive(Subcommand)]
enum SpaceCommands {
    Create(CreateSpaceArgs),
    Get(SpaceKeyArgs),
    List(ListSpacesArgs),
    SetKind(SetKindArgs),
    Delete(SpaceKeyArgs),
    Audit(WarehouseRefArgs),
}

#[derive(Args)]
struct SpaceKeyArgs {
    #[arg(long, help = "Owning warehouse identifier")]
    warehouse_id: i32,
    #[arg(long, allow_hyphen_values = true, help = "Column (xPos)")]
    x: i32,
    #[arg(long, allow_hyphen_values = true, help = "Row (yPos)")]
    y: i32,
}

impl SpaceKeyArgs {
    fn key(&self) -> SpaceKey {
        SpaceKey::new(self.warehouse_id, self.x, self.y)
    }
}

#[derive(Args)]
struct CreateSpaceArgs {
    #[command(flatten)]
    key: SpaceKeyArgs,
    #[arg(long, help = "Space type label, e.g. path or shelf")]
    kind: String,
}

#[derive(Args)]
struct ListSpacesArgs {
    #[arg(long, help = "Owning warehouse identifier")]
    warehouse_id: i32,
    #[arg(long, help = "Only list spaces with this type label")]
    kind: Option<String>,
}

#[derive(Args)]
struct SetKindArgs {
    #[command(flatten)]
    key: SpaceKeyArgs,
    #[arg(long, help = "New type label")]
    kind: String,
}

#[derive(Args)]
struct WarehouseRefArgs {
    #[arg(long, help = "Warehouse identifier")]
    warehouse_id: i32,
}

#[derive(Subcommand)]
enum LayoutCommands {
    Import(ImportLayoutArgs),
    Export(WarehouseRefArgs),
}

#[derive(Args)]
struct ImportLayoutArgs {
    #[arg(long, help = "Path to a P/S text layout")]
    file: PathBuf,
    #[arg(long, help = "Name for the new warehouse")]
    name: Option<String>,
}

#[derive(Args)]
struct GridArgs {
    #[arg(long, help = "Warehouse identifier")]
    warehouse_id: i32,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize(auto_migrate: bool) -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        if auto_migrate && config.auto_migrate {
            db::run_migrations(&db_pool)
                .await
                .context("failed to apply migrations")?;
        }

        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    fn warehouse_service(&self) -> WarehouseService {
        WarehouseService::new(self.db.clone(), self.config.strict_space_bounds)
    }

    fn space_service(&self) -> SpaceService {
        SpaceService::new(self.db.clone(), self.config.strict_space_bounds)
    }

    fn layout_service(&self) -> LayoutService {
        LayoutService::new(self.db.clone())
    }
}

async fn handle_db_command(context: &CliContext, command: DbCommands, json: bool) -> Result<()> {
    let pool = context.db.as_ref();
    match command {
        DbCommands::Migrate => {
            db::run_migrations(pool).await?;
            report(json, "migrated", "Migrations applied")?;
        }
        DbCommands::Rollback => {
            db::rollback_migrations(pool).await?;
            report(json, "rolled_back", "All migrations rolled back")?;
        }
        DbCommands::Reset => {
            db::reset_schema(pool).await?;
            report(json, "reset", "Tables dropped and recreated")?;
        }
        DbCommands::Status => {
            let pending = db::pending_migrations(pool).await?;
            if json {
                print_json(&json!({ "pending": pending }))?;
            } else if pending.is_empty() {
                println!("Schema is up to date");
            } else {
                println!("{} pending migration(s)", pending.len());
                for name in &pending {
                    println!("- {}", name);
                }
            }
        }
        DbCommands::Check => {
            db::check_connection(pool).await?;
            report(json, "ok", "Database reachable")?;
        }
    }
    Ok(())
}

async fn handle_warehouse_command(
    context: &CliContext,
    command: WarehouseCommands,
    json: bool,
) -> Result<()> {
    let service = context.warehouse_service();
    match command {
        WarehouseCommands::Create(args) => {
            let created = service
                .create_warehouse(CreateWarehouseInput {
                    name: args.name,
                    width: args.width,
                    height: args.height,
                })
                .await?;
            output(json, &created, render_warehouse)?;
        }
        WarehouseCommands::Get(args) => {
            let found = service.get_warehouse(args.id).await?;
            output(json, &found, render_warehouse)?;
        }
        WarehouseCommands::List => {
            let warehouses = service.list_warehouses().await?;
            if json {
                print_json(&warehouses)?;
            } else {
                println!("Warehouses: {}", warehouses.len());
                warehouses.iter().for_each(render_warehouse);
            }
        }
        WarehouseCommands::Update(args) => {
            let updated = service
                .update_warehouse(
                    args.id,
                    UpdateWarehouseInput {
                        name: args.name,
                        width: args.width,
                        height: args.height,
                    },
                )
                .await?;
            output(json, &updated, render_warehouse)?;
        }
        WarehouseCommands::Delete(args) => {
            let policy = if args.cascade {
                DeletePolicy::Cascade
            } else {
                DeletePolicy::Restrict
            };
            let result = service.delete_warehouse(args.id, policy).await?;
            if json {
                print_json(&result)?;
            } else {
                println!(
                    "Deleted warehouse {} ({} space(s) removed)",
                    result.warehouse_id, result.spaces_deleted
                );
            }
        }
    }
    Ok(())
}

async fn handle_space_command(
    context: &CliContext,
    command: SpaceCommands,
    json: bool,
) -> Result<()> {
    let service = context.space_service();
    match command {
        SpaceCommands::Create(args) => {
            let created = service
                .create_space(CreateSpaceInput {
                    warehouse_id: args.key.warehouse_id,
                    x_pos: args.key.x,
                    y_pos: args.key.y,
                    kind: args.kind,
                })
                .await?;
            output(json, &created, render_space)?;
        }
        SpaceCommands::Get(args) => {
            let found = service.get_space(args.key()).await?;
            output(json, &found, render_space)?;
        }
        SpaceCommands::List(args) => {
            let spaces = match args.kind {
                Some(kind) => service.list_spaces_by_kind(args.warehouse_id, &kind).await?,
                None => service.list_spaces(args.warehouse_id).await?,
            };
            if json {
                print_json(&spaces)?;
            } else {
                println!("Spaces in warehouse {}: {}", args.warehouse_id, spaces.len());
                spaces.iter().for_each(render_space);
            }
        }
        SpaceCommands::SetKind(args) => {
            let updated = service.update_space_kind(args.key.key(), args.kind).await?;
            output(json, &updated, render_space)?;
        }
        SpaceCommands::Delete(args) => {
            let key = args.key();
            service.delete_space(key).await?;
            if json {
                print_json(&json!({ "deleted": key }))?;
            } else {
                println!("Deleted space {}", key);
            }
        }
        SpaceCommands::Audit(args) => {
            let stray = service.out_of_bounds_spaces(args.warehouse_id).await?;
            if json {
                print_json(&stray)?;
            } else if stray.is_empty() {
                println!("All spaces of warehouse {} are in bounds", args.warehouse_id);
            } else {
                println!("{} space(s) outside warehouse bounds", stray.len());
                stray.iter().for_each(render_space);
            }
        }
    }
    Ok(())
}

async fn handle_layout_command(
    context: &CliContext,
    command: LayoutCommands,
    json: bool,
) -> Result<()> {
    let service = context.layout_service();
    match command {
        LayoutCommands::Import(args) => {
            let summary = service
                .import_layout_file(args.name, &args.file)
                .await
                .with_context(|| format!("failed to import {}", args.file.display()))?;
            output(json, &summary, render_import)?;
        }
        LayoutCommands::Export(args) => {
            let layout = service.export_layout(args.warehouse_id).await?;
            if json {
                print_json(&layout)?;
            } else {
                print!("{}", layout);
            }
        }
    }
    Ok(())
}

async fn handle_grid(context: &CliContext, args: GridArgs, json: bool) -> Result<()> {
    let grid = context
        .space_service()
        .occupancy_grid(args.warehouse_id)
        .await?;
    if json {
        print_json(&grid)?;
    } else {
        print!("{}", grid);
    }
    Ok(())
}

fn report(json: bool, status: &str, message: &str) -> Result<()> {
    if json {
        print_json(&json!({ "status": status }))
    } else {
        println!("{}", message);
        Ok(())
    }
}

fn output<T: Serialize>(json: bool, value: &T, render: fn(&T)) -> Result<()> {
    if json {
        print_json(value)
    } else {
        render(value);
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_warehouse(warehouse: &warehouse::Model) {
    println!(
        "- Warehouse {} • {} • {}x{}",
        warehouse.warehouse_id,
        warehouse.display_name(),
        warehouse.width,
        warehouse.height
    );
}

fn render_space(space: &space::Model) {
    println!(
        "  • Space {} • type {}",
        space.key(),
        space.kind.as_deref().unwrap_or("-")
    );
}

fn render_import(summary: &ImportSummary) {
    render_warehouse(&summary.warehouse);
    println!(
        "  {} path and {} shelf space(s) imported",
        summary.paths, summary.shelves
    );
}
