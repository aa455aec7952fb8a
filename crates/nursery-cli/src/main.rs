use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use nursery_cli::accounts::{
    DEFAULT_UNVERIFIED_DAYS, SuperuserInput, cleanup_unverified, create_superuser,
};
use nursery_cli::seeder::{self, SeedConfig};
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "nursery-cli")]
#[command(about = "Nursery CLI - administrative tools for the Nursery API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a super admin account
    CreateSuperuser {
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        #[arg(short = 'l', long)]
        last_name: Option<String>,

        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Prompted for securely when omitted
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Delete parent accounts that never verified their email
    CleanupUnverified {
        /// Minimum account age in days
        #[arg(short = 'd', long, default_value_t = DEFAULT_UNVERIFIED_DAYS)]
        days: i32,
    },
    /// Seed classes, teachers, parents and children for development
    Seed {
        #[arg(long, default_value = "4")]
        classes: usize,

        #[arg(long, default_value = "6")]
        teachers: usize,

        #[arg(long, default_value = "30")]
        parents: usize,

        #[arg(long, default_value = "2")]
        children_per_parent: usize,
    },
    /// Remove everything created by `seed`
    ClearSeed,
}

fn prompt(label: &str, value: Option<String>) -> Result<String, dialoguer::Error> {
    match value {
        Some(value) => Ok(value),
        None => Input::new().with_prompt(label).interact_text(),
    }
}

async fn run(pool: &PgPool, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::CreateSuperuser {
            first_name,
            last_name,
            email,
            password,
        } => {
            let first_name = prompt("First name", first_name)?;
            let last_name = prompt("Last name", last_name)?;
            let email = prompt("Email address", email)?;
            let password = match password {
                Some(password) => password,
                None => Password::new()
                    .with_prompt("Password")
                    .with_confirmation("Confirm password", "Passwords don't match")
                    .interact()?,
            };

            let input = SuperuserInput {
                first_name,
                last_name,
                email,
                password,
            };
            let user_id = create_superuser(pool, input).await?;
            println!("\n✅ Super admin created successfully!");
            println!("   User ID: {}", user_id);
        }
        Commands::CleanupUnverified { days } => {
            let deleted = cleanup_unverified(pool, days).await?;
            println!(
                "✅ Deleted {} unverified parent account(s) older than {} day(s)",
                deleted, days
            );
        }
        Commands::Seed {
            classes,
            teachers,
            parents,
            children_per_parent,
        } => {
            let config = SeedConfig {
                classes,
                teachers,
                parents,
                children_per_parent,
            };
            seeder::seed_all(pool, config).await?;
        }
        Commands::ClearSeed => {
            seeder::clear_all(pool).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("❌ DATABASE_URL must be set");
            std::process::exit(1);
        }
    };

    let pool = match sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&pool, cli.command).await {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}
