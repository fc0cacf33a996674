//! Bootstrap utility for back-office admin accounts.

use std::error::Error;
use std::io::{BufRead, Write};

use clap::{Args, Parser, Subcommand};
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ActiveValue, Database, DatabaseConnection, EntityTrait};

use engine::admins;

#[derive(Parser, Debug)]
#[command(name = "tessera_admin")]
#[command(about = "Admin utilities for Tessera (bootstrap back-office accounts)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./tessera.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Admin(Admin),
}

#[derive(Args, Debug)]
struct Admin {
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Create(AdminCreateArgs),
    Delete(AdminDeleteArgs),
}

#[derive(Args, Debug)]
struct AdminCreateArgs {
    #[arg(long)]
    username: String,
    /// Prompted on stderr when omitted.
    #[arg(long)]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct AdminDeleteArgs {
    #[arg(long)]
    username: String,
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    eprint!("{prompt}");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn connect(url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let db = connect(&cli.database_url).await?;

    let Command::Admin(admin) = cli.command;
    match admin.command {
        AdminCommand::Create(args) => {
            let password = match args.password {
                Some(password) => password,
                None => prompt_password("password: ")?,
            };
            if password.is_empty() {
                return Err("password must not be empty".into());
            }
            if admins::Entity::find_by_id(&args.username)
                .one(&db)
                .await?
                .is_some()
            {
                return Err(format!("admin {:?} already exists", args.username).into());
            }

            admins::ActiveModel {
                username: ActiveValue::Set(args.username.clone()),
                password: ActiveValue::Set(password),
            }
            .insert(&db)
            .await?;
            println!("admin {:?} created", args.username);
        }
        AdminCommand::Delete(args) => {
            let result = admins::Entity::delete_by_id(&args.username).exec(&db).await?;
            if result.rows_affected == 0 {
                return Err(format!("admin {:?} not found", args.username).into());
            }
            println!("admin {:?} deleted", args.username);
        }
    }

    Ok(())
}
